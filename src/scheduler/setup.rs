use crate::{
    config::SchedulerConfig,
    scheduler::{Shared, execute::worker_loop},
    sync::{Arc, JoinHandle, spawn_worker},
};
use thiserror::Error;

/// Error kind for scheduler construction failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchedulerSetupError {
    /// A raw thread count other than `-1`, `0` or a positive number.
    #[error("invalid thread count {0}: expected -1 (auto), 0 (caller only) or a positive number")]
    InvalidThreadCount(i64),
    /// A thread count string that is neither `auto` nor an integer.
    #[error("cannot parse thread count {0:?}")]
    UnparsableThreadCount(String),
    /// The process-wide task system was initialized more than once.
    #[error("task system is already initialized")]
    AlreadyInitialized,
    /// The OS refused to spawn a worker thread.
    #[error("failed to spawn worker thread")]
    Spawn(#[source] std::io::Error),
}

/// Spawn `num_workers` named workers into `workers`.
///
/// Handles are pushed as soon as each thread starts, so on error the caller
/// still owns (and joins) the partially started pool.
pub(super) fn spawn_workers(
    shared: &Arc<Shared>,
    config: &SchedulerConfig,
    num_workers: usize,
    workers: &mut Vec<JoinHandle<()>>,
) -> Result<(), SchedulerSetupError> {
    for index in 0..num_workers {
        let shared = Arc::clone(shared);
        let name = format!("{}-{index}", config.thread_name_prefix);
        let handle = spawn_worker(name, move || worker_loop(&shared, index))
            .map_err(SchedulerSetupError::Spawn)?;
        workers.push(handle);
    }
    Ok(())
}
