//! The scheduling seam for concurrent hook execution.

use std::thread;

use tracing::warn;

/// Launches fire-and-forget workers for concurrent hooks.
///
/// This is a contract, not a thread pool: implementations must run the job
/// to completion independently of the dispatcher, and the dispatcher never
/// joins or tracks what it spawned. Tests substitute an inline
/// implementation to make execution deterministic.
pub trait Spawner: Send + Sync {
    /// Run `job` on an independent unit of concurrency.
    fn spawn(&self, job: Box<dyn FnOnce() + Send + 'static>);
}

/// Default spawner: one OS thread per job.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSpawner;

impl Spawner for ThreadSpawner {
    fn spawn(&self, job: Box<dyn FnOnce() + Send + 'static>) {
        let spawned = thread::Builder::new()
            .name("bindcast-hook".into())
            .spawn(job);
        if let Err(err) = spawned {
            warn!(%err, "failed to spawn hook worker");
        }
    }
}
