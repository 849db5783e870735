use crate::scheduler::Shared;
use core::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

static ACTIVE_WORKERS: AtomicUsize = AtomicUsize::new(0);

/// Number of live worker threads across every scheduler in the process.
#[must_use]
pub fn active_worker_threads() -> usize {
    ACTIVE_WORKERS.load(Ordering::Relaxed)
}

struct ActiveWorker;

impl ActiveWorker {
    fn register() -> Self {
        ACTIVE_WORKERS.fetch_add(1, Ordering::Relaxed);
        Self
    }
}

impl Drop for ActiveWorker {
    fn drop(&mut self) {
        ACTIVE_WORKERS.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Body of a dedicated worker: take the front task, run its jobs until none
/// are left to claim, repeat until the scheduler shuts down.
pub(super) fn worker_loop(shared: &Shared, index: usize) {
    let _active = ActiveWorker::register();
    debug!(worker = index, "worker started");
    while let Some(task) = shared.queue.next_blocking() {
        while let Some(job_index) = task.claim() {
            task.execute(job_index);
        }
    }
    debug!(worker = index, "worker stopped");
}

impl Shared {
    /// One job slice from the front of the queue, if any is claimable.
    pub(crate) fn work_on_it(&self) -> bool {
        while let Some(task) = self.queue.try_next() {
            if let Some(job_index) = task.claim() {
                task.execute(job_index);
                return true;
            }
        }
        false
    }
}
