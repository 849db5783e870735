mod execute;
mod queue;
mod setup;

pub use crate::scheduler::{execute::active_worker_threads, setup::SchedulerSetupError};
use crate::{
    config::SchedulerConfig,
    scheduler::{queue::WorkQueue, setup::spawn_workers},
    sync::{Arc, JoinHandle},
    task::{Job, Task},
    types::JobIndex,
};
use derive_more::Debug;
use std::borrow::Cow;
use tracing::{debug, error};

/// Scheduler context: the global work queue plus a fixed pool of worker
/// threads.
///
/// Every [`Task`] is created through a scheduler and is queued on it when it
/// activates. Dropping the scheduler lets the workers drain the queue, joins
/// them, and runs anything still queued on the dropping thread. Tasks that are
/// still waiting for dependencies at that point are never queued again: they
/// only run inside `wait(true)` or `work_on_it` calls on themselves.
#[must_use]
#[derive(Debug)]
pub struct Scheduler {
    shared: Arc<Shared>,
    #[debug(skip)]
    workers: Vec<JoinHandle<()>>,
}

/// State shared by the scheduler handle, its workers and its tasks.
#[derive(Debug)]
pub(crate) struct Shared {
    #[debug(skip)]
    pub(crate) queue: WorkQueue,
    pub(crate) track_dependencies: bool,
    num_workers: usize,
}

impl Scheduler {
    /// Start a scheduler and its worker threads.
    ///
    /// # Errors
    /// If a worker thread cannot be spawned. Workers started before the
    /// failure are shut down and joined.
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerSetupError> {
        let num_workers = config.threads.resolve();
        let mut scheduler = Self {
            shared: Arc::new(Shared {
                queue: WorkQueue::new(config.start_paused),
                track_dependencies: config.track_dependencies,
                num_workers,
            }),
            workers: Vec::with_capacity(num_workers),
        };
        spawn_workers(&scheduler.shared, &config, num_workers, &mut scheduler.workers)?;
        debug!(
            workers = num_workers,
            track_dependencies = config.track_dependencies,
            paused = config.start_paused,
            "scheduler started"
        );
        Ok(scheduler)
    }

    /// Create a task in [`TaskStatus::Initializing`] state.
    ///
    /// [`TaskStatus::Initializing`]: crate::types::TaskStatus::Initializing
    pub fn task(&self, name: impl Into<Cow<'static, str>>, job: impl Job + 'static) -> Task {
        Task::new(self, name, job)
    }

    /// Create a task whose jobs run `run` and whose `finish` does nothing.
    pub fn task_fn<F>(&self, name: impl Into<Cow<'static, str>>, run: F) -> Task
    where
        F: Fn(JobIndex) + Send + Sync + 'static,
    {
        Task::new(self, name, run)
    }

    /// Execute one job slice from the front of the queue.
    ///
    /// Never blocks. Returns whether a job slice was executed.
    pub fn work_on_it(&self) -> bool {
        self.shared.work_on_it()
    }

    /// Stop dedicated workers from taking new tasks. Jobs already claimed run
    /// to completion, and waiters keep executing work.
    pub fn pause(&self) {
        self.shared.queue.set_paused(true);
    }

    /// Let dedicated workers take tasks again.
    pub fn resume(&self) {
        self.shared.queue.set_paused(false);
    }

    /// Number of dedicated worker threads.
    #[must_use]
    pub fn num_workers(&self) -> usize {
        self.shared.num_workers
    }

    /// Number of queued tasks that still have unclaimed jobs.
    #[must_use]
    pub fn queued_tasks(&self) -> usize {
        self.shared.queue.len()
    }

    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shared.queue.shutdown();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("worker thread panicked");
            }
        }
        // Without workers (or when work is pushed after they exit) the dropping
        // thread drains the queue itself.
        loop {
            while self.shared.work_on_it() {}
            if self.shared.queue.close() {
                break;
            }
        }
        debug!("scheduler shut down");
    }
}

#[cfg(not(feature = "loom"))]
static GLOBAL: std::sync::OnceLock<Scheduler> = std::sync::OnceLock::new();

/// Install the process-wide scheduler with `num_threads` workers: `-1` for
/// one per hardware thread, `0` for none, `n` for exactly `n`.
///
/// # Errors
/// - [`SchedulerSetupError::InvalidThreadCount`] for any other `num_threads`.
/// - [`SchedulerSetupError::AlreadyInitialized`] on every call after the first
///   successful one.
/// - [`SchedulerSetupError::Spawn`] if a worker cannot be started.
#[cfg(not(feature = "loom"))]
pub fn init_task_system(num_threads: i64) -> Result<&'static Scheduler, SchedulerSetupError> {
    let threads = crate::config::ThreadCount::try_from(num_threads)?;
    if GLOBAL.get().is_some() {
        return Err(SchedulerSetupError::AlreadyInitialized);
    }
    let scheduler = Scheduler::new(SchedulerConfig::default().with_threads(threads))?;
    // A racing initializer may have won; the loser's workers are joined here.
    GLOBAL
        .set(scheduler)
        .map_err(|_| SchedulerSetupError::AlreadyInitialized)?;
    global().ok_or(SchedulerSetupError::AlreadyInitialized)
}

/// The scheduler installed by [`init_task_system`], if any.
#[cfg(not(feature = "loom"))]
#[must_use]
pub fn global() -> Option<&'static Scheduler> {
    GLOBAL.get()
}
