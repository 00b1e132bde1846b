//! Deferred registration metadata for methods awaiting class registration.

use std::{
    any::TypeId,
    collections::HashMap,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use tracing::trace;

use crate::callable::MethodKey;

/// Identity of one dispatcher instance, used by pending tags to name which
/// dispatcher should capture a method at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatcherId(u64);

impl DispatcherId {
    /// Allocate a fresh process-unique id.
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for DispatcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dispatcher#{}", self.0)
    }
}

/// A pending-registration entry held by the tagger.
pub trait Pending {
    /// The dispatcher that should consume this entry.
    fn dispatcher(&self) -> DispatcherId;
}

/// Side table of pending-registration metadata, keyed by method identity.
///
/// Methods are tagged before their owning type is registered with any
/// dispatcher; several dispatcher instances may tag the same method
/// independently. Each dispatcher consumes only the entries naming itself
/// when the owning type is registered, and consuming the last entry removes
/// the key so no metadata dangles.
///
/// One tagger is shared by all dispatchers of a kind (the hub owns it). A
/// method tagged for a dispatcher that never registers the owning type keeps
/// its entry: harmless, and visible via [`DeferredTagger::pending_count`].
pub struct DeferredTagger<P> {
    pending: Mutex<HashMap<MethodKey, Vec<P>>>,
}

impl<P: Pending> DeferredTagger<P> {
    /// Create an empty tagger.
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Append a pending entry for a method.
    pub fn tag(&self, key: MethodKey, entry: P) {
        trace!(method = key.name(), dispatcher = %entry.dispatcher(), "tagging method");
        self.pending.lock().entry(key).or_default().push(entry);
    }

    /// Remove and return every entry for `key` naming `id`.
    ///
    /// Matches are collected in one pass under the lock, so concurrent
    /// taggers never observe a partially-consumed list. The key itself is
    /// dropped once its list empties.
    pub fn consume(&self, key: MethodKey, id: DispatcherId) -> Vec<P> {
        let mut pending = self.pending.lock();
        let Some(entries) = pending.get_mut(&key) else {
            return Vec::new();
        };
        let mut matched = Vec::new();
        let mut index = 0;
        while index < entries.len() {
            if entries[index].dispatcher() == id {
                matched.push(entries.remove(index));
            } else {
                index += 1;
            }
        }
        if entries.is_empty() {
            pending.remove(&key);
        }
        matched
    }

    /// Remove and return leftover entries naming `id` on any method of the
    /// given owning type. Used after registration to surface tags that could
    /// never be consumed (e.g. a method name the type does not declare).
    pub fn drain_type(&self, owner: TypeId, id: DispatcherId) -> Vec<(MethodKey, P)> {
        let mut pending = self.pending.lock();
        let keys: Vec<MethodKey> = pending
            .keys()
            .filter(|key| key.owner() == owner)
            .copied()
            .collect();
        let mut drained = Vec::new();
        for key in keys {
            if let Some(entries) = pending.get_mut(&key) {
                let mut index = 0;
                while index < entries.len() {
                    if entries[index].dispatcher() == id {
                        drained.push((key, entries.remove(index)));
                    } else {
                        index += 1;
                    }
                }
                if entries.is_empty() {
                    pending.remove(&key);
                }
            }
        }
        drained
    }

    /// Number of pending entries currently attached to a method.
    pub fn pending_count(&self, key: MethodKey) -> usize {
        self.pending.lock().get(&key).map_or(0, Vec::len)
    }
}

impl<P: Pending> Default for DeferredTagger<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tag(DispatcherId);

    impl Pending for Tag {
        fn dispatcher(&self) -> DispatcherId {
            self.0
        }
    }

    struct Owner;

    #[test]
    fn consume_takes_only_own_entries() {
        let tagger = DeferredTagger::new();
        let key = MethodKey::of::<Owner>("observe");
        let first = DispatcherId::next();
        let second = DispatcherId::next();
        tagger.tag(key, Tag(first));
        tagger.tag(key, Tag(second));
        tagger.tag(key, Tag(first));

        assert_eq!(tagger.consume(key, first).len(), 2);
        assert_eq!(tagger.pending_count(key), 1);
        assert_eq!(tagger.consume(key, second).len(), 1);
        // Last entry consumed: the key is gone entirely.
        assert_eq!(tagger.pending_count(key), 0);
        assert!(tagger.consume(key, first).is_empty());
    }

    #[test]
    fn drain_type_scopes_by_owner_and_dispatcher() {
        struct Other;

        let tagger = DeferredTagger::new();
        let id = DispatcherId::next();
        let stranger = DispatcherId::next();
        tagger.tag(MethodKey::of::<Owner>("observe"), Tag(id));
        tagger.tag(MethodKey::of::<Owner>("react"), Tag(stranger));
        tagger.tag(MethodKey::of::<Other>("observe"), Tag(id));

        let drained = tagger.drain_type(TypeId::of::<Owner>(), id);
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].0.name(), "observe");
        // The stranger's entry and the other type's entry are untouched.
        assert_eq!(tagger.pending_count(MethodKey::of::<Owner>("react")), 1);
        assert_eq!(tagger.pending_count(MethodKey::of::<Other>("observe")), 1);
    }
}
