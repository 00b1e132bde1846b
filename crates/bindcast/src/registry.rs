//! Storage for hooked callables and captured methods, keyed by routing key.

use std::{any::TypeId, collections::HashMap, fmt, hash::Hash};

use bindmap::Trigger;

use crate::callable::{Callable, ExecMode, Method, MethodKey};

/// Callables and methods hooked under one routing key, partitioned by
/// execution class.
pub struct HookSet<T: Trigger> {
    concurrent: Vec<Callable<T>>,
    sequential: Vec<Callable<T>>,
    concurrent_methods: Vec<Method<T>>,
    sequential_methods: Vec<Method<T>>,
}

impl<T: Trigger> HookSet<T> {
    fn new() -> Self {
        Self {
            concurrent: Vec::new(),
            sequential: Vec::new(),
            concurrent_methods: Vec::new(),
            sequential_methods: Vec::new(),
        }
    }

    fn contains_hook(&self, hook: &Callable<T>) -> bool {
        self.concurrent
            .iter()
            .chain(&self.sequential)
            .any(|c| c.same_hook(hook))
    }

    fn contains_method(&self, key: MethodKey) -> bool {
        self.concurrent_methods
            .iter()
            .chain(&self.sequential_methods)
            .any(|m| m.key() == key)
    }

    fn hook_count(&self) -> usize {
        self.concurrent.len() + self.sequential.len()
    }

    fn method_count(&self) -> usize {
        self.concurrent_methods.len() + self.sequential_methods.len()
    }
}

/// A point-in-time copy of one routing key's hooks, taken under the registry
/// lock and executed without it.
#[derive(Clone)]
pub struct HookSnapshot<T: Trigger> {
    /// Callables to fan out to workers.
    pub concurrent: Vec<Callable<T>>,
    /// Callables to run inline, in registration order.
    pub sequential: Vec<Callable<T>>,
    /// Methods to fan out to workers, once per live instance.
    pub concurrent_methods: Vec<Method<T>>,
    /// Methods to run inline, once per live instance.
    pub sequential_methods: Vec<Method<T>>,
}

/// Registration store shared by both dispatcher flavors.
///
/// `K` is the routing key: the raw-event dispatcher routes on the event
/// subtype alone, the bind dispatcher on (bind name, subtype). Reverse
/// indexes are maintained on every mutation so a method can be unbound from
/// everywhere by identity, and a whole class at once, without scanning.
pub struct CallableRegistry<K, T: Trigger> {
    slots: HashMap<K, HookSet<T>>,
    /// Method identity → routing keys it is captured under.
    captured: HashMap<MethodKey, Vec<K>>,
    /// Owning type → methods captured for it.
    classes: HashMap<TypeId, Vec<MethodKey>>,
}

impl<K, T> CallableRegistry<K, T>
where
    K: Clone + Eq + Hash + fmt::Debug,
    T: Trigger,
{
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            captured: HashMap::new(),
            classes: HashMap::new(),
        }
    }

    /// Add a callable under a routing key.
    ///
    /// Returns false (and stores nothing) when the same underlying function
    /// is already hooked under this exact key, in either execution class.
    pub fn add_callable(&mut self, key: K, hook: Callable<T>) -> bool {
        let set = self.slots.entry(key).or_insert_with(HookSet::new);
        if set.contains_hook(&hook) {
            return false;
        }
        match hook.mode() {
            ExecMode::Concurrent => set.concurrent.push(hook),
            ExecMode::Sequential => set.sequential.push(hook),
        }
        true
    }

    /// Remove a callable from one routing key. Returns whether it was there.
    pub fn remove_callable(&mut self, key: &K, hook: &Callable<T>) -> bool {
        let Some(set) = self.slots.get_mut(key) else {
            return false;
        };
        let before = set.hook_count();
        set.concurrent.retain(|c| !c.same_hook(hook));
        set.sequential.retain(|c| !c.same_hook(hook));
        before != set.hook_count()
    }

    /// Remove a callable from every routing key, returning the keys it was
    /// actually removed from.
    pub fn remove_callable_all(&mut self, hook: &Callable<T>) -> Vec<K> {
        let mut removed = Vec::new();
        for (key, set) in &mut self.slots {
            let before = set.hook_count();
            set.concurrent.retain(|c| !c.same_hook(hook));
            set.sequential.retain(|c| !c.same_hook(hook));
            if before != set.hook_count() {
                removed.push(key.clone());
            }
        }
        removed
    }

    /// Capture a method under a routing key, maintaining the reverse indexes.
    ///
    /// Returns false when the method is already captured under this exact
    /// key. The same method may be captured under several keys.
    pub fn add_method(&mut self, key: K, method: Method<T>) -> bool {
        let mkey = method.key();
        let set = self.slots.entry(key.clone()).or_insert_with(HookSet::new);
        if set.contains_method(mkey) {
            return false;
        }
        match method.mode() {
            ExecMode::Concurrent => set.concurrent_methods.push(method),
            ExecMode::Sequential => set.sequential_methods.push(method),
        }
        let keys = self.captured.entry(mkey).or_default();
        if !keys.contains(&key) {
            keys.push(key);
        }
        let methods = self.classes.entry(mkey.owner()).or_default();
        if !methods.contains(&mkey) {
            methods.push(mkey);
        }
        true
    }

    /// Remove a method from every routing key it was captured under.
    /// Returns the number of registrations dropped.
    pub fn remove_method(&mut self, mkey: MethodKey) -> usize {
        let Some(keys) = self.captured.remove(&mkey) else {
            return 0;
        };
        let mut removed = 0;
        for key in &keys {
            if let Some(set) = self.slots.get_mut(key) {
                let before = set.method_count();
                set.concurrent_methods.retain(|m| m.key() != mkey);
                set.sequential_methods.retain(|m| m.key() != mkey);
                removed += before - set.method_count();
            }
        }
        self.forget_class_method(mkey);
        removed
    }

    /// Drop every method captured for an owning type. Returns the number of
    /// registrations dropped; zero means the type was never captured.
    pub fn remove_class(&mut self, owner: TypeId) -> usize {
        let Some(methods) = self.classes.remove(&owner) else {
            return 0;
        };
        methods.into_iter().map(|m| self.remove_method(m)).sum()
    }

    /// Drop one routing key entirely, callables and methods alike.
    /// Returns whether the key existed.
    pub fn clear_key(&mut self, key: &K) -> bool {
        let Some(set) = self.slots.remove(key) else {
            return false;
        };
        for mkey in set
            .concurrent_methods
            .iter()
            .chain(&set.sequential_methods)
            .map(Method::key)
        {
            if let Some(keys) = self.captured.get_mut(&mkey) {
                keys.retain(|k| k != key);
                if keys.is_empty() {
                    self.captured.remove(&mkey);
                    self.forget_class_method(mkey);
                }
            }
        }
        true
    }

    /// Copy out one routing key's hooks for lock-free execution.
    pub fn snapshot(&self, key: &K) -> Option<HookSnapshot<T>> {
        self.slots.get(key).map(|set| HookSnapshot {
            concurrent: set.concurrent.clone(),
            sequential: set.sequential.clone(),
            concurrent_methods: set.concurrent_methods.clone(),
            sequential_methods: set.sequential_methods.clone(),
        })
    }

    /// Routing keys satisfying a predicate.
    pub fn keys_where(&self, pred: impl Fn(&K) -> bool) -> Vec<K> {
        self.slots.keys().filter(|k| pred(k)).cloned().collect()
    }

    /// Drop a method from its class's reverse index, pruning empty entries.
    fn forget_class_method(&mut self, mkey: MethodKey) {
        if let Some(methods) = self.classes.get_mut(&mkey.owner()) {
            methods.retain(|m| *m != mkey);
            if methods.is_empty() {
                self.classes.remove(&mkey.owner());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bindmap::Key;

    use super::*;
    use crate::event::EventKind;

    struct Widget;

    fn hook(name: &'static str) -> Callable<Key> {
        Callable::new(name, |_| {})
    }

    fn method(name: &'static str) -> Method<Key> {
        Method::of::<Widget, _>(name, |_, _| {})
    }

    #[test]
    fn callable_dedup_is_per_key() {
        let mut reg: CallableRegistry<EventKind, Key> = CallableRegistry::new();
        let probe = hook("probe");
        assert!(reg.add_callable(EventKind::KEY_DOWN, probe.clone()));
        assert!(!reg.add_callable(EventKind::KEY_DOWN, probe.clone()));
        // Same hook under a different key is a separate registration.
        assert!(reg.add_callable(EventKind::KEY_UP, probe.clone()));
        // A re-marked clone is still the same hook.
        assert!(!reg.add_callable(EventKind::KEY_DOWN, probe.clone().sequential()));
    }

    #[test]
    fn remove_callable_everywhere() {
        let mut reg: CallableRegistry<EventKind, Key> = CallableRegistry::new();
        let probe = hook("probe");
        reg.add_callable(EventKind::KEY_DOWN, probe.clone());
        reg.add_callable(EventKind::KEY_UP, probe.clone());
        let mut keys = reg.remove_callable_all(&probe);
        keys.sort();
        assert_eq!(keys, vec![EventKind::KEY_DOWN, EventKind::KEY_UP]);
        assert!(!reg.remove_callable(&EventKind::KEY_DOWN, &probe));
    }

    #[test]
    fn method_reverse_index_tracks_keys() {
        let mut reg: CallableRegistry<EventKind, Key> = CallableRegistry::new();
        let observe = method("observe");
        reg.add_method(EventKind::KEY_DOWN, observe.clone());
        reg.add_method(EventKind::KEY_UP, observe.clone());
        assert!(!reg.add_method(EventKind::KEY_DOWN, observe.clone()));
        assert_eq!(reg.remove_method(observe.key()), 2);
        assert_eq!(reg.remove_method(observe.key()), 0);
    }

    #[test]
    fn remove_class_drops_all_methods() {
        let mut reg: CallableRegistry<EventKind, Key> = CallableRegistry::new();
        reg.add_method(EventKind::KEY_DOWN, method("observe"));
        reg.add_method(EventKind::KEY_UP, method("react"));
        assert_eq!(reg.remove_class(std::any::TypeId::of::<Widget>()), 2);
        assert_eq!(reg.remove_class(std::any::TypeId::of::<Widget>()), 0);
        assert!(reg.snapshot(&EventKind::KEY_DOWN).is_none_or(|s| s.concurrent_methods.is_empty()));
    }

    #[test]
    fn clear_key_repairs_reverse_indexes() {
        let mut reg: CallableRegistry<EventKind, Key> = CallableRegistry::new();
        let observe = method("observe");
        reg.add_method(EventKind::KEY_DOWN, observe.clone());
        reg.add_method(EventKind::KEY_UP, observe.clone());
        assert!(reg.clear_key(&EventKind::KEY_DOWN));
        // Still captured under the other key.
        assert_eq!(reg.remove_method(observe.key()), 1);
        // Clearing the last key forgets the class entirely.
        reg.add_method(EventKind::KEY_DOWN, observe.clone());
        reg.clear_key(&EventKind::KEY_DOWN);
        assert_eq!(reg.remove_class(std::any::TypeId::of::<Widget>()), 0);
    }
}
