//! The execution core shared by both dispatcher flavors.

use std::{
    any::TypeId,
    collections::HashMap,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use bindmap::Trigger;
use parking_lot::Mutex;
use tracing::warn;

use crate::{
    event::Event,
    registry::HookSnapshot,
    spawn::Spawner,
    tracker::{AnyInstance, InstanceTracker},
};

/// Execute one routing key's hooks for an event.
///
/// Concurrent callables and concurrent method/instance pairs each go to one
/// fire-and-forget worker; nothing is joined and nothing propagates back.
/// Sequential hooks run inline in registration order, each isolated so one
/// panicking handler cannot stop the rest. Methods fan out across every
/// currently-live instance of their owning type.
pub fn fan_out<T: Trigger>(
    handle: &str,
    snap: &HookSnapshot<T>,
    event: &Event<T>,
    tracker: &Mutex<InstanceTracker>,
    spawner: &Arc<dyn Spawner>,
) {
    for hook in &snap.concurrent {
        let hook = hook.clone();
        let event = *event;
        spawner.spawn(Box::new(move || hook.call(&event)));
    }

    // One upgrade pass per owning type, shared by both execution classes.
    let mut live: HashMap<TypeId, Vec<AnyInstance>> = HashMap::new();
    {
        let mut tracker = tracker.lock();
        for method in snap.concurrent_methods.iter().chain(&snap.sequential_methods) {
            live.entry(method.owner())
                .or_insert_with(|| tracker.live(method.owner()));
        }
    }

    for method in &snap.concurrent_methods {
        for instance in live.get(&method.owner()).into_iter().flatten() {
            let method = method.clone();
            let instance = instance.clone();
            let event = *event;
            spawner.spawn(Box::new(move || method.call(instance.as_ref(), &event)));
        }
    }

    for hook in &snap.sequential {
        if panic::catch_unwind(AssertUnwindSafe(|| hook.call(event))).is_err() {
            warn!(
                dispatcher = handle,
                callable = hook.name(),
                "sequential hook panicked; continuing with remaining hooks"
            );
        }
    }

    for method in &snap.sequential_methods {
        for instance in live.get(&method.owner()).into_iter().flatten() {
            let ok = panic::catch_unwind(AssertUnwindSafe(|| method.call(instance.as_ref(), event)));
            if ok.is_err() {
                warn!(
                    dispatcher = handle,
                    owner = method.owner_name(),
                    method = method.name(),
                    "sequential hook panicked; continuing with remaining hooks"
                );
            }
        }
    }
}
