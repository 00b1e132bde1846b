//! Callables, type-erased instance methods, and their execution markers.

use std::{
    any::{self, Any, TypeId},
    fmt,
    sync::Arc,
};

use bindmap::Trigger;

use crate::event::Event;

/// Execution class of a hook.
///
/// Concurrent hooks each run on an independent fire-and-forget worker;
/// sequential hooks run inline on the dispatching thread, in registration
/// order. The marker is mutually exclusive: applying one replaces the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecMode {
    /// Run on an independent worker (the default).
    #[default]
    Concurrent,
    /// Run inline on the dispatching thread.
    Sequential,
}

type HookFn<T> = dyn Fn(&Event<T>) + Send + Sync;
type MethodFn<T> = dyn Fn(&(dyn Any + Send + Sync), &Event<T>) + Send + Sync;

/// A free function or closure hooked to a dispatcher.
///
/// Identity is pointer identity of the underlying function, so a cloned
/// handle (including one whose execution marker was changed) still names the
/// same registration for unbinding purposes.
#[derive(Clone)]
pub struct Callable<T: Trigger> {
    name: &'static str,
    mode: ExecMode,
    func: Arc<HookFn<T>>,
}

impl<T: Trigger> Callable<T> {
    /// Wrap a function as a concurrent callable.
    pub fn new(name: &'static str, func: impl Fn(&Event<T>) + Send + Sync + 'static) -> Self {
        Self {
            name,
            mode: ExecMode::Concurrent,
            func: Arc::new(func),
        }
    }

    /// Mark this callable to run sequentially. Clears the concurrent marker.
    pub fn sequential(mut self) -> Self {
        self.mode = ExecMode::Sequential;
        self
    }

    /// Mark this callable to run concurrently. Clears the sequential marker.
    pub fn concurrent(mut self) -> Self {
        self.mode = ExecMode::Concurrent;
        self
    }

    /// Display name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current execution marker.
    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    /// Whether two handles wrap the same underlying function.
    pub fn same_hook(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }

    pub(crate) fn call(&self, event: &Event<T>) {
        (self.func)(event);
    }
}

impl<T: Trigger> fmt::Debug for Callable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Stable identity of an instance method: owning type plus method name.
///
/// This is what the deferred tagger and the registry reverse indexes key on,
/// so a method can be referred to before its owning type is registered and
/// after the original [`Method`] handle is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodKey {
    owner: TypeId,
    name: &'static str,
}

impl MethodKey {
    /// Key for a method of type `C` by name.
    pub fn of<C: Any>(name: &'static str) -> Self {
        Self {
            owner: TypeId::of::<C>(),
            name,
        }
    }

    /// Owning type.
    pub fn owner(&self) -> TypeId {
        self.owner
    }

    /// Method name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// A type-erased instance method hooked to a dispatcher.
///
/// Built from a plain `Fn(&C, &Event)` and invoked against every live
/// tracked instance of `C` when a matching event arrives.
#[derive(Clone)]
pub struct Method<T: Trigger> {
    key: MethodKey,
    owner_name: &'static str,
    mode: ExecMode,
    func: Arc<MethodFn<T>>,
}

impl<T: Trigger> Method<T> {
    /// Erase a method of `C` under the given name.
    pub fn of<C, F>(name: &'static str, func: F) -> Self
    where
        C: Any + Send + Sync,
        F: Fn(&C, &Event<T>) + Send + Sync + 'static,
    {
        Self {
            key: MethodKey::of::<C>(name),
            owner_name: any::type_name::<C>(),
            mode: ExecMode::Concurrent,
            func: Arc::new(move |instance, event| {
                if let Some(concrete) = instance.downcast_ref::<C>() {
                    func(concrete, event);
                }
            }),
        }
    }

    /// Mark this method to run sequentially. Clears the concurrent marker.
    pub fn sequential(mut self) -> Self {
        self.mode = ExecMode::Sequential;
        self
    }

    /// Mark this method to run concurrently. Clears the sequential marker.
    pub fn concurrent(mut self) -> Self {
        self.mode = ExecMode::Concurrent;
        self
    }

    /// Stable identity of this method.
    pub fn key(&self) -> MethodKey {
        self.key
    }

    /// Owning type.
    pub fn owner(&self) -> TypeId {
        self.key.owner()
    }

    /// Owning type's name, for logs.
    pub fn owner_name(&self) -> &'static str {
        self.owner_name
    }

    /// Method name.
    pub fn name(&self) -> &'static str {
        self.key.name()
    }

    /// Current execution marker.
    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    pub(crate) fn call(&self, instance: &(dyn Any + Send + Sync), event: &Event<T>) {
        (self.func)(instance, event);
    }
}

impl<T: Trigger> fmt::Debug for Method<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("owner", &self.owner_name)
            .field("name", &self.key.name())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Implemented by types whose instance methods can be captured by a
/// dispatcher.
///
/// `hooks` declares the methods eligible for registration; it is consulted
/// once, when the type is registered via `register_class`. Instances are made
/// visible to dispatch with an explicit `track` call.
pub trait Subscriber<T: Trigger>: Any + Send + Sync {
    /// The instance methods this type exposes for event dispatch.
    fn hooks() -> Vec<Method<T>>;
}

#[cfg(test)]
mod tests {
    use bindmap::Key;

    use super::*;
    use crate::event::EventKind;

    struct Probe {
        tag: u8,
    }

    #[test]
    fn marker_is_mutually_exclusive() {
        let hook = Callable::<Key>::new("probe", |_| {});
        assert_eq!(hook.mode(), ExecMode::Concurrent);
        let hook = hook.sequential();
        assert_eq!(hook.mode(), ExecMode::Sequential);
        let hook = hook.concurrent();
        assert_eq!(hook.mode(), ExecMode::Concurrent);
    }

    #[test]
    fn identity_survives_marker_changes() {
        let hook = Callable::<Key>::new("probe", |_| {});
        let remarked = hook.clone().sequential();
        assert!(hook.same_hook(&remarked));
        let other = Callable::<Key>::new("probe", |_| {});
        assert!(!hook.same_hook(&other));
    }

    #[test]
    fn method_downcasts_to_owner() {
        use std::sync::atomic::{AtomicU8, Ordering};
        static SEEN: AtomicU8 = AtomicU8::new(0);

        let method = Method::<Key>::of::<Probe, _>("observe", |probe, _event| {
            SEEN.store(probe.tag, Ordering::SeqCst);
        });
        let probe = Probe { tag: 7 };
        method.call(&probe, &Event::new(EventKind::KEY_DOWN));
        assert_eq!(SEEN.load(Ordering::SeqCst), 7);
        assert_eq!(method.key(), MethodKey::of::<Probe>("observe"));
    }
}
