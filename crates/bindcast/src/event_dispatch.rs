//! The raw-event dispatcher: hooks routed by event subtype alone.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

use bindmap::Trigger;
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::{
    callable::{Callable, MethodKey, Subscriber},
    dispatch,
    event::{Event, EventKind},
    registry::CallableRegistry,
    spawn::{Spawner, ThreadSpawner},
    tagger::{DeferredTagger, DispatcherId, Pending},
    tracker::InstanceTracker,
};

/// Pending-registration entry for the raw-event dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct EventTag {
    dispatcher: DispatcherId,
    kind: EventKind,
}

impl Pending for EventTag {
    fn dispatcher(&self) -> DispatcherId {
        self.dispatcher
    }
}

/// Dispatches runtime events to hooks registered per event subtype.
///
/// Cloning produces another handle to the same dispatcher: registrations and
/// tracked instances are shared. Dispatchers of this kind share a tagger (the
/// [`EventHub`] owns it) so a method can carry tags for several dispatcher
/// instances before its owning type is registered with any of them.
#[derive(Clone)]
pub struct EventDispatcher<T: Trigger> {
    handle: String,
    id: DispatcherId,
    tagger: Arc<DeferredTagger<EventTag>>,
    registry: Arc<Mutex<CallableRegistry<EventKind, T>>>,
    tracker: Arc<Mutex<InstanceTracker>>,
    spawner: Arc<dyn Spawner>,
}

impl<T: Trigger> EventDispatcher<T> {
    /// Create a dispatcher sharing the given tagger, with the default
    /// thread-per-hook spawner.
    pub fn new(handle: impl Into<String>, tagger: Arc<DeferredTagger<EventTag>>) -> Self {
        Self::with_spawner(handle, tagger, Arc::new(ThreadSpawner))
    }

    /// Create a dispatcher with an explicit spawner.
    pub fn with_spawner(
        handle: impl Into<String>,
        tagger: Arc<DeferredTagger<EventTag>>,
        spawner: Arc<dyn Spawner>,
    ) -> Self {
        Self {
            handle: handle.into(),
            id: DispatcherId::next(),
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

    /// Hook a callable to an event subtype.
    pub fn register(&self, kind: EventKind, hook: Callable<T>) {
        let name = hook.name();
        if self.registry.lock().add_callable(kind, hook) {
            debug!(dispatcher = %self.handle, callable = name, %kind, "registered callable");
        } else {
            warn!(dispatcher = %self.handle, callable = name, %kind, "callable already registered");
        }
    }

    /// Remove a callable from one subtype, or from every subtype when no
    /// kind is given. Removing something that was never registered is a
    /// warning, not an error.
    pub fn deregister(&self, hook: &Callable<T>, kind: Option<EventKind>) {
        let mut registry = self.registry.lock();
        match kind {
            Some(kind) => {
                if !registry.remove_callable(&kind, hook) {
                    warn!(
                        dispatcher = %self.handle,
                        callable = hook.name(),
                        %kind,
                        "callable is not registered for that event"
                    );
                }
            }
            None => {
                let removed = registry.remove_callable_all(hook);
                if removed.is_empty() {
                    warn!(dispatcher = %self.handle, callable = hook.name(), "callable is not registered");
                }
                for kind in removed {
                    info!(dispatcher = %self.handle, callable = hook.name(), %kind, "removed callable");
                }
            }
        }
    }

    /// Tag a method of `C` for capture under an event subtype when `C` is
    /// registered with this dispatcher.
    pub fn register_method<C: Any>(&self, kind: EventKind, method_name: &'static str) {
        self.tagger.tag(
            MethodKey::of::<C>(method_name),
            EventTag {
                dispatcher: self.id,
                kind,
            },
        );
    }

    /// Register a type: capture every tagged method naming this dispatcher.
    ///
    /// Entries naming other dispatchers are left for them to consume. Tags
    /// naming this dispatcher but referencing a method the type does not
    /// declare can never be consumed and are dropped with a warning.
    pub fn register_class<C: Subscriber<T>>(&self) {
        debug!(dispatcher = %self.handle, type_name = std::any::type_name::<C>(), "registering class");
        let mut registry = self.registry.lock();
        for method in C::hooks() {
            for tag in self.tagger.consume(method.key(), self.id) {
                if registry.add_method(tag.kind, method.clone()) {
                    debug!(
                        dispatcher = %self.handle,
                        method = method.name(),
                        kind = %tag.kind,
                        "captured method"
                    );
                } else {
                    warn!(
                        dispatcher = %self.handle,
                        method = method.name(),
                        kind = %tag.kind,
                        "method already captured for that event"
                    );
                }
            }
        }
        for (key, _tag) in self.tagger.drain_type(TypeId::of::<C>(), self.id) {
            warn!(
                dispatcher = %self.handle,
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

    /// Remove a method from every subtype it was captured under.
    pub fn unbind_method(&self, key: MethodKey) {
        if self.registry.lock().remove_method(key) == 0 {
            warn!(dispatcher = %self.handle, method = key.name(), "method is not captured");
        }
    }

    /// Clear every hook from one subtype, callables and methods alike.
    pub fn purge(&self, kind: EventKind) {
        if self.registry.lock().clear_key(&kind) {
            info!(dispatcher = %self.handle, %kind, "purged event hooks");
        } else {
            warn!(dispatcher = %self.handle, %kind, "event has no registered hooks");
        }
    }

    /// Record a live instance so captured methods fan out to it.
    pub fn track<C: Any + Send + Sync>(&self, instance: &Arc<C>) {
        self.tracker.lock().track(instance);
    }

    /// Dispatch an event to everything hooked on its subtype.
    pub fn notify(&self, event: &Event<T>) {
        let snap = self.registry.lock().snapshot(&event.kind);
        let Some(snap) = snap else {
            trace!(dispatcher = %self.handle, kind = %event.kind, "no hooks for event");
            return;
        };
        dispatch::fan_out(&self.handle, &snap, event, &self.tracker, &self.spawner);
    }
}

/// Named registry of raw-event dispatchers sharing one tagger.
///
/// The explicit replacement for a process-wide dispatcher map: create one at
/// startup and pass it to whatever needs to look dispatchers up by handle or
/// broadcast events to all of them.
pub struct EventHub<T: Trigger> {
    tagger: Arc<DeferredTagger<EventTag>>,
    spawner: Arc<dyn Spawner>,
    dispatchers: Mutex<HashMap<String, EventDispatcher<T>>>,
}

impl<T: Trigger> EventHub<T> {
    /// Create a hub with the default thread-per-hook spawner.
    pub fn new() -> Self {
        Self::with_spawner(Arc::new(ThreadSpawner))
    }

    /// Create a hub whose dispatchers use an explicit spawner.
    pub fn with_spawner(spawner: Arc<dyn Spawner>) -> Self {
        Self {
            tagger: Arc::new(DeferredTagger::new()),
            spawner,
            dispatchers: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a dispatcher by handle, creating it on first use.
    pub fn dispatcher(&self, handle: &str) -> EventDispatcher<T> {
        self.dispatchers
            .lock()
            .entry(handle.to_string())
            .or_insert_with(|| {
                EventDispatcher::with_spawner(handle, self.tagger.clone(), self.spawner.clone())
            })
            .clone()
    }

    /// Pass an event to every dispatcher in the hub.
    pub fn notify_all(&self, event: &Event<T>) {
        let dispatchers: Vec<EventDispatcher<T>> =
            self.dispatchers.lock().values().cloned().collect();
        for dispatcher in dispatchers {
            dispatcher.notify(event);
        }
    }
}

impl<T: Trigger> Default for EventHub<T> {
    fn default() -> Self {
        Self::new()
    }
}
