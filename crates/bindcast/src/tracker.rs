//! Weak tracking of live instances per registered type.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{Arc, Weak},
};

use tracing::debug;

/// A live instance, type-erased for storage and dispatch.
pub type AnyInstance = Arc<dyn Any + Send + Sync>;

/// Weakly-held live instances, bucketed by owning type.
///
/// Membership never extends an instance's lifetime: an instance dropped by
/// the embedding application silently disappears from iteration. Dead
/// handles are pruned whenever a bucket is read.
#[derive(Default)]
pub struct InstanceTracker {
    instances: HashMap<TypeId, Vec<Weak<dyn Any + Send + Sync>>>,
}

impl InstanceTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a live instance. Tracking the same instance twice is ignored,
    /// so dispatch fans out to it exactly once.
    pub fn track<C: Any + Send + Sync>(&mut self, instance: &Arc<C>) -> bool {
        let erased: AnyInstance = instance.clone();
        let weak = Arc::downgrade(&erased);
        let bucket = self.instances.entry(TypeId::of::<C>()).or_default();
        if bucket.iter().any(|held| held.ptr_eq(&weak)) {
            debug!(type_name = std::any::type_name::<C>(), "instance already tracked");
            return false;
        }
        bucket.push(weak);
        true
    }

    /// Upgrade the live instances of a type, pruning dead handles.
    pub fn live(&mut self, owner: TypeId) -> Vec<AnyInstance> {
        let Some(bucket) = self.instances.get_mut(&owner) else {
            return Vec::new();
        };
        let mut alive = Vec::with_capacity(bucket.len());
        bucket.retain(|weak| match weak.upgrade() {
            Some(instance) => {
                alive.push(instance);
                true
            }
            None => false,
        });
        alive
    }

    /// Drop a type's bucket entirely. Returns whether one existed.
    pub fn remove_type(&mut self, owner: TypeId) -> bool {
        self.instances.remove(&owner).is_some()
    }

    /// Number of currently-live instances of a type.
    pub fn live_count(&mut self, owner: TypeId) -> usize {
        self.live(owner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Actor;

    #[test]
    fn tracks_each_instance_once() {
        let mut tracker = InstanceTracker::new();
        let actor = Arc::new(Actor);
        assert!(tracker.track(&actor));
        assert!(!tracker.track(&actor));
        assert_eq!(tracker.live_count(TypeId::of::<Actor>()), 1);
    }

    #[test]
    fn dropped_instances_disappear() {
        let mut tracker = InstanceTracker::new();
        let keep = Arc::new(Actor);
        let drop_me = Arc::new(Actor);
        tracker.track(&keep);
        tracker.track(&drop_me);
        assert_eq!(tracker.live_count(TypeId::of::<Actor>()), 2);
        drop(drop_me);
        assert_eq!(tracker.live_count(TypeId::of::<Actor>()), 1);
        // The tracker itself never keeps an instance alive.
        drop(keep);
        assert_eq!(tracker.live_count(TypeId::of::<Actor>()), 0);
    }

    #[test]
    fn remove_type_drops_the_bucket() {
        let mut tracker = InstanceTracker::new();
        let actor = Arc::new(Actor);
        tracker.track(&actor);
        assert!(tracker.remove_type(TypeId::of::<Actor>()));
        assert!(!tracker.remove_type(TypeId::of::<Actor>()));
        assert_eq!(tracker.live_count(TypeId::of::<Actor>()), 0);
    }
}
