//! The bind dispatcher: hooks routed through a remappable bind table.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
    sync::Arc,
};

use bindmap::{Bind, BindTable, FileParser, Key, Mods, PadButton, Trigger};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace, warn};

use crate::{
    callable::{Callable, MethodKey, Subscriber},
    dispatch,
    error::{Error, Result},
    event::{Event, EventKind},
    registry::CallableRegistry,
    spawn::{Spawner, ThreadSpawner},
    tagger::{DeferredTagger, DispatcherId, Pending},
    tracker::InstanceTracker,
};

/// The canonical bind table shared by every dispatcher of one kind.
pub type SharedBindTable<T> = Arc<RwLock<BindTable<T>>>;

/// Routing key inside the bind dispatcher's registry: bind name plus event
/// subtype.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookKey {
    bind: String,
    kind: EventKind,
}

impl HookKey {
    fn new(bind: &str, kind: EventKind) -> Self {
        Self {
            bind: bind.to_string(),
            kind,
        }
    }
}

/// Pending-registration entry for the bind dispatcher.
#[derive(Debug, Clone)]
pub struct BindTag<T: Trigger> {
    dispatcher: DispatcherId,
    bind: String,
    trigger: Option<T>,
    mods: Option<Mods>,
    kind: EventKind,
}

impl<T: Trigger> Pending for BindTag<T> {
    fn dispatcher(&self) -> DispatcherId {
        self.dispatcher
    }
}

/// Dispatches trigger events through the bind table to hooked callables and
/// captured methods.
///
/// All dispatchers of one kind consult a single canonical [`BindTable`]
/// (passed in explicitly, normally owned by a [`BindHub`]); callable
/// registries and instance tracking are per-dispatcher. Cloning produces
/// another handle to the same dispatcher.
#[derive(Clone)]
pub struct BindDispatcher<T: Trigger> {
    handle: String,
    id: DispatcherId,
    table: SharedBindTable<T>,
    tagger: Arc<DeferredTagger<BindTag<T>>>,
    registry: Arc<Mutex<CallableRegistry<HookKey, T>>>,
    tracker: Arc<Mutex<InstanceTracker>>,
    spawner: Arc<dyn Spawner>,
}

/// Bind dispatcher for keyboard triggers.
pub type KeyDispatcher = BindDispatcher<Key>;
/// Bind dispatcher for pad-button triggers.
pub type PadDispatcher = BindDispatcher<PadButton>;

impl<T: Trigger> BindDispatcher<T> {
    /// Create a dispatcher over a shared table and tagger, with the default
    /// thread-per-hook spawner.
    pub fn new(
        handle: impl Into<String>,
        table: SharedBindTable<T>,
        tagger: Arc<DeferredTagger<BindTag<T>>>,
    ) -> Self {
        Self::with_spawner(handle, table, tagger, Arc::new(ThreadSpawner))
    }

    /// Create a dispatcher with an explicit spawner.
    pub fn with_spawner(
        handle: impl Into<String>,
        table: SharedBindTable<T>,
        tagger: Arc<DeferredTagger<BindTag<T>>>,
        spawner: Arc<dyn Spawner>,
    ) -> Self {
        Self {
            handle: handle.into(),
            id: DispatcherId::next(),
            table,
            tagger,
            registry: Arc::new(Mutex::new(CallableRegistry::new())),
            tracker: Arc::new(Mutex::new(InstanceTracker::new())),
            spawner,
        }
    }

    /// This dispatcher's handle.
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// The shared table this dispatcher consults.
    pub fn table(&self) -> SharedBindTable<T> {
        self.table.clone()
    }

    /// Hook a callable to a bind name for one event subtype.
    ///
    /// Generates the bind if it does not exist yet; an existing bind keeps
    /// its current trigger and modifier requirement regardless of the
    /// defaults supplied here.
    pub fn bind(
        &self,
        name: &str,
        default_trigger: Option<T>,
        default_mods: Option<Mods>,
        kind: EventKind,
        hook: Callable<T>,
    ) {
        self.table.write().generate(name, default_trigger, default_mods);
        let hook_name = hook.name();
        if self.registry.lock().add_callable(HookKey::new(name, kind), hook) {
            debug!(dispatcher = %self.handle, bind = name, callable = hook_name, %kind, "hooked callable");
        } else {
            warn!(dispatcher = %self.handle, bind = name, callable = hook_name, "callable already hooked to bind");
        }
    }

    /// Tag a method of `C` for capture under a bind name when `C` is
    /// registered with this dispatcher. The bind itself is generated at
    /// registration time, not here.
    pub fn bind_method<C: Any>(
        &self,
        name: &str,
        default_trigger: Option<T>,
        default_mods: Option<Mods>,
        kind: EventKind,
        method_name: &'static str,
    ) {
        self.tagger.tag(
            MethodKey::of::<C>(method_name),
            BindTag {
                dispatcher: self.id,
                bind: name.to_string(),
                trigger: default_trigger,
                mods: default_mods,
                kind,
            },
        );
    }

    /// Register a type: capture every tagged method naming this dispatcher,
    /// generating default binds as recorded at tag time.
    ///
    /// Entries naming other dispatchers are left for them to consume. Tags
    /// naming this dispatcher but referencing a method the type does not
    /// declare can never be consumed and are dropped with a warning.
    pub fn register_class<C: Subscriber<T>>(&self) {
        debug!(dispatcher = %self.handle, type_name = std::any::type_name::<C>(), "registering class");
        for method in C::hooks() {
            for tag in self.tagger.consume(method.key(), self.id) {
                self.table.write().generate(&tag.bind, tag.trigger, tag.mods);
                let captured = self
                    .registry
                    .lock()
                    .add_method(HookKey::new(&tag.bind, tag.kind), method.clone());
                if captured {
                    debug!(
                        dispatcher = %self.handle,
                        bind = %tag.bind,
                        method = method.name(),
                        "captured method"
                    );
                } else {
                    warn!(
                        dispatcher = %self.handle,
                        bind = %tag.bind,
                        method = method.name(),
                        "method already captured for that bind"
                    );
                }
            }
        }
        for (key, tag) in self.tagger.drain_type(TypeId::of::<C>(), self.id) {
            warn!(
                dispatcher = %self.handle,
                bind = %tag.bind,
                method = key.name(),
                "tag references a method the type does not declare"
            );
        }
    }

    /// Drop a type: its instance bucket and every method captured for it.
    pub fn deregister_class<C: Any>(&self) {
        let had_bucket = self.tracker.lock().remove_type(TypeId::of::<C>());
        let removed = self.registry.lock().remove_class(TypeId::of::<C>());
        if !had_bucket && removed == 0 {
            warn!(
                dispatcher = %self.handle,
                type_name = std::any::type_name::<C>(),
                "type was never registered"
            );
        }
    }

    /// Record a live instance so captured methods fan out to it.
    pub fn track<C: Any + Send + Sync>(&self, instance: &Arc<C>) {
        self.tracker.lock().track(instance);
    }

    /// Move a bind to a new trigger, returning its previous placement.
    ///
    /// Warns and does nothing when the bind was never generated; callers
    /// should generate (via [`BindDispatcher::bind`] or a tagged method)
    /// before rebinding.
    pub fn rebind(
        &self,
        name: &str,
        new_trigger: Option<T>,
        new_mods: Option<Mods>,
    ) -> Option<(Option<T>, Option<Mods>)> {
        let mut table = self.table.write();
        if !table.contains(name) {
            warn!(
                dispatcher = %self.handle,
                bind = name,
                "cannot rebind: bind does not exist; generate it first"
            );
            return None;
        }
        let previous = table.rebind(Bind::new(name, new_mods), new_trigger);
        info!(dispatcher = %self.handle, bind = name, trigger = ?new_trigger, "rebound");
        previous
    }

    /// Current placement of a bind in the shared table.
    pub fn bound_trigger(&self, name: &str) -> Result<(Option<T>, Option<Mods>)> {
        Ok(self.table.read().bound_trigger(name)?)
    }

    /// Remove a callable from one bind, or from every bind when no name is
    /// given. Removing something that was never hooked is a warning, not an
    /// error.
    pub fn unbind(&self, hook: &Callable<T>, bind_name: Option<&str>) {
        let mut registry = self.registry.lock();
        match bind_name {
            Some(name) => {
                let keys = registry.keys_where(|key| key.bind == name);
                if keys.is_empty() {
                    warn!(dispatcher = %self.handle, bind = name, "bind has no hooks");
                    return;
                }
                let mut removed = 0;
                for key in &keys {
                    if registry.remove_callable(key, hook) {
                        removed += 1;
                    }
                }
                if removed == 0 {
                    warn!(
                        dispatcher = %self.handle,
                        bind = name,
                        callable = hook.name(),
                        "callable is not hooked to that bind"
                    );
                }
            }
            None => {
                let removed = registry.remove_callable_all(hook);
                if removed.is_empty() {
                    warn!(dispatcher = %self.handle, callable = hook.name(), "callable is not hooked");
                }
                for key in removed {
                    info!(
                        dispatcher = %self.handle,
                        bind = %key.bind,
                        callable = hook.name(),
                        "removed callable"
                    );
                }
            }
        }
    }

    /// Remove a method from every bind it was captured under.
    pub fn unbind_method(&self, key: MethodKey) {
        if self.registry.lock().remove_method(key) == 0 {
            warn!(dispatcher = %self.handle, method = key.name(), "method is not captured");
        }
    }

    /// Clear every callable and method hooked under a bind name. With
    /// `eliminate`, the bind itself is also removed from the shared table.
    pub fn clear_bind(&self, name: &str, eliminate: bool) {
        let keys = {
            let mut registry = self.registry.lock();
            let keys = registry.keys_where(|key| key.bind == name);
            for key in &keys {
                registry.clear_key(key);
            }
            keys
        };
        if eliminate {
            let mut table = self.table.write();
            if table.contains(name) {
                table.remove(name, None);
                info!(dispatcher = %self.handle, bind = name, "eliminated bind");
            } else if keys.is_empty() {
                warn!(dispatcher = %self.handle, bind = name, "cannot remove bind: does not exist");
            }
            return;
        }
        if keys.is_empty() {
            warn!(dispatcher = %self.handle, bind = name, "bind has no hooks");
        } else {
            info!(dispatcher = %self.handle, bind = name, "cleared bind hooks");
        }
    }

    /// Dispatch a trigger event through the bind table.
    ///
    /// Binds sharing the event's trigger are matched independently against
    /// its modifier state, so only the matching ones fire.
    pub fn notify(&self, event: &Event<T>) {
        let binds: Vec<Bind> = self.table.read().binds_at(event.trigger).to_vec();
        if binds.is_empty() {
            return;
        }
        for bind in binds.iter().filter(|bind| bind.matches(event.mods)) {
            trace!(dispatcher = %self.handle, bind = %bind.name, kind = %event.kind, "bind matched");
            let snap = self
                .registry
                .lock()
                .snapshot(&HookKey::new(&bind.name, event.kind));
            if let Some(snap) = snap {
                dispatch::fan_out(&self.handle, &snap, event, &self.tracker, &self.spawner);
            }
        }
    }
}

/// Named registry of bind dispatchers sharing one canonical table and one
/// tagger.
///
/// The explicit replacement for process-wide dispatcher state: create one
/// hub per trigger kind at startup and pass it by reference. The hub also
/// owns table persistence.
pub struct BindHub<T: Trigger> {
    table: SharedBindTable<T>,
    tagger: Arc<DeferredTagger<BindTag<T>>>,
    spawner: Arc<dyn Spawner>,
    dispatchers: Mutex<HashMap<String, BindDispatcher<T>>>,
}

/// Hub for keyboard-bind dispatchers.
pub type KeyHub = BindHub<Key>;
/// Hub for pad-bind dispatchers.
pub type PadHub = BindHub<PadButton>;

impl<T: Trigger> BindHub<T> {
    /// Create a hub with an empty table and the default spawner.
    pub fn new() -> Self {
        Self::with_spawner(Arc::new(ThreadSpawner))
    }

    /// Create a hub whose dispatchers use an explicit spawner.
    pub fn with_spawner(spawner: Arc<dyn Spawner>) -> Self {
        Self {
            table: Arc::new(RwLock::new(BindTable::new())),
            tagger: Arc::new(DeferredTagger::new()),
            spawner,
            dispatchers: Mutex::new(HashMap::new()),
        }
    }

    /// The canonical table shared by this hub's dispatchers.
    pub fn table(&self) -> SharedBindTable<T> {
        self.table.clone()
    }

    /// Look up a dispatcher by handle, creating it on first use.
    pub fn dispatcher(&self, handle: &str) -> BindDispatcher<T> {
        self.dispatchers
            .lock()
            .entry(handle.to_string())
            .or_insert_with(|| {
                BindDispatcher::with_spawner(
                    handle,
                    self.table.clone(),
                    self.tagger.clone(),
                    self.spawner.clone(),
                )
            })
            .clone()
    }

    /// Pass an event to every dispatcher in the hub.
    pub fn notify_all(&self, event: &Event<T>) {
        let dispatchers: Vec<BindDispatcher<T>> =
            self.dispatchers.lock().values().cloned().collect();
        for dispatcher in dispatchers {
            dispatcher.notify(event);
        }
    }

    /// Merge binds from a file into the canonical table.
    ///
    /// Existing entries win: a loaded bind whose name is already in the
    /// table changes nothing, so programmatically-registered defaults are
    /// never clobbered by a stale file. Load before registering defaults to
    /// get the opposite policy.
    pub fn load_from_file<P: FileParser<T>>(&self, path: impl AsRef<Path>, parser: &P) -> Result<()> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let loaded = parser
            .load(reader)
            .map_err(|err| Error::Parser(Box::new(err)))?;
        let mut table = self.table.write();
        table.merge(&loaded);
        info!(path = %path.display(), binds = table.len(), "merged binds from file");
        Ok(())
    }

    /// Save the canonical table to a file.
    pub fn save_to_file<P: FileParser<T>>(&self, path: impl AsRef<Path>, parser: &P) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(File::create(path)?);
        let table = self.table.read();
        parser
            .save(&table, writer)
            .map_err(|err| Error::Parser(Box::new(err)))?;
        info!(path = %path.display(), binds = table.len(), "saved binds to file");
        Ok(())
    }
}

impl<T: Trigger> Default for BindHub<T> {
    fn default() -> Self {
        Self::new()
    }
}
