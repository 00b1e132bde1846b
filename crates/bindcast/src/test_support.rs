//! Test support utilities for the engine's unit and integration tests.
//!
//! Public so the integration suite can use them; not part of the stable API.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use bindmap::Trigger;

use crate::{callable::Callable, spawn::Spawner};

/// A spawner that runs every job inline on the calling thread, making
/// concurrent fan-out deterministic in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineSpawner;

impl Spawner for InlineSpawner {
    fn spawn(&self, job: Box<dyn FnOnce() + Send + 'static>) {
        job();
    }
}

/// A callable that counts its invocations.
pub fn counting_hook<T: Trigger>(name: &'static str) -> (Callable<T>, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    let hook = Callable::new(name, move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    (hook, count)
}
