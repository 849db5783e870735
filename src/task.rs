use crate::{
    scheduler::{Scheduler, Shared},
    sync::{Arc, AtomicU8, AtomicUsize, Condvar, Mutex, Ordering, lock, wait},
    types::{CachePadded, JobIndex, ScheduleOrder, TaskStatus},
    utils::AbortOnUnwind,
};
use core::fmt;
use std::borrow::Cow;
use tracing::trace;

/// The work a [`Task`] performs.
///
/// `run` is invoked exactly once for every job index in `[0, job_count)`,
/// possibly from several threads at the same time and in any order. `finish`
/// is invoked exactly once, after every `run` has returned and before the task
/// is reported as completed.
///
/// Both callbacks must not panic: a panic escaping either of them aborts the
/// process.
pub trait Job: Send + Sync {
    /// Execute the job slice `job_index`.
    fn run(&self, job_index: JobIndex);
    /// Called once after the last job slice has run.
    fn finish(&self) {}
}

impl<F> Job for F
where
    F: Fn(JobIndex) + Send + Sync,
{
    fn run(&self, job_index: JobIndex) {
        self(job_index);
    }
}

/// Shared handle to a schedulable unit of work.
///
/// Cloning is cheap; every clone refers to the same task. A task lives as long
/// as any handle, the global queue, or a not-yet-notified predecessor refers
/// to it.
///
/// # Dependency cycles
/// Cycles are not detected. A task that (transitively) depends on itself, or
/// on a task that is never scheduled, stays [`TaskStatus::Scheduled`] forever
/// and `wait` on it never returns.
#[derive(Debug, Clone)]
pub struct Task {
    pub(crate) inner: Arc<TaskInner>,
}

pub(crate) struct TaskInner {
    name: Cow<'static, str>,
    job: Box<dyn Job>,
    scheduler: Arc<Shared>,
    /// Mirror of the status for lock-free readers. Only written while `links`
    /// is locked.
    status: AtomicU8,
    /// Set once by `schedule`, before the task can be activated.
    job_count: AtomicUsize,
    jobs_claimed: CachePadded<AtomicUsize>,
    jobs_completed: CachePadded<AtomicUsize>,
    missing_dependencies: CachePadded<AtomicUsize>,
    links: Mutex<TaskLinks>,
    completed: Condvar,
}

impl fmt::Debug for TaskInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("status", &format_args!("{}", self.status()))
            .field("job_count", &self.job_count())
            .field("jobs_claimed", &self.jobs_claimed.load(Ordering::Relaxed))
            .field("jobs_completed", &self.jobs_completed.load(Ordering::Relaxed))
            .field(
                "missing_dependencies",
                &self.missing_dependencies.load(Ordering::Relaxed),
            )
            .finish_non_exhaustive()
    }
}

struct TaskLinks {
    order: ScheduleOrder,
    /// Successors to notify on completion. Drained when the task completes.
    dependents: Vec<Arc<TaskInner>>,
}

impl Task {
    pub(crate) fn new(
        scheduler: &Scheduler,
        name: impl Into<Cow<'static, str>>,
        job: impl Job + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(TaskInner {
                name: name.into(),
                job: Box::new(job),
                scheduler: Arc::clone(scheduler.shared()),
                status: AtomicU8::new(TaskStatus::Initializing as u8),
                job_count: AtomicUsize::new(0),
                jobs_claimed: CachePadded::new(AtomicUsize::new(0)),
                jobs_completed: CachePadded::new(AtomicUsize::new(0)),
                missing_dependencies: CachePadded::new(AtomicUsize::new(0)),
                links: Mutex::new(TaskLinks {
                    order: ScheduleOrder::default(),
                    dependents: Vec::new(),
                }),
                completed: Condvar::new(),
            }),
        }
    }

    /// Diagnostic label given at construction.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.inner.status()
    }

    /// `true` once `finish` has returned.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.inner.is_completed()
    }

    /// Number of job slices given to `schedule`, or `0` before that.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.inner.job_count()
    }

    /// Number of job slices that have finished running.
    #[must_use]
    pub fn jobs_completed(&self) -> usize {
        self.inner.jobs_completed.load(Ordering::Acquire)
    }

    /// Number of predecessors that have not completed yet.
    #[must_use]
    pub fn missing_dependencies(&self) -> usize {
        self.inner.missing_dependencies.load(Ordering::Acquire)
    }

    /// Prevent this task from activating before `predecessor` completes.
    ///
    /// Does nothing if `predecessor` has already completed.
    ///
    /// # Panics
    /// - If dependency tracking is disabled for the scheduler.
    /// - If `predecessor` is this task or belongs to another scheduler.
    /// - If this task is already active or completed.
    pub fn add_dependency(&self, predecessor: &Task) {
        let (this, pred) = (&self.inner, &predecessor.inner);
        assert!(
            this.scheduler.track_dependencies,
            "Task `{}`: dependency tracking is disabled for this scheduler",
            this.name
        );
        assert!(
            !Arc::ptr_eq(this, pred),
            "Task `{}` depends on itself",
            this.name
        );
        assert!(
            Arc::ptr_eq(&this.scheduler, &pred.scheduler),
            "Task `{}` depends on `{}` from another scheduler",
            this.name,
            pred.name
        );
        // Holding our own lock keeps a concurrent final decrement from
        // activating us between the status check and the increment below.
        let _links = lock(&this.links);
        let status = this.status();
        assert!(
            matches!(status, TaskStatus::Initializing | TaskStatus::Scheduled),
            "Task `{}`: dependency added while {status}",
            this.name
        );
        let mut pred_links = lock(&pred.links);
        if pred.is_completed() {
            return;
        }
        this.missing_dependencies.fetch_add(1, Ordering::AcqRel);
        pred_links.dependents.push(Arc::clone(this));
    }

    /// Schedule `num_jobs` job slices. The task is queued on `order`'s side as
    /// soon as all its dependencies have completed.
    ///
    /// # Panics
    /// If `num_jobs` is zero or the task was already scheduled.
    pub fn schedule(&self, num_jobs: usize, order: ScheduleOrder) {
        let inner = &self.inner;
        assert!(
            num_jobs >= 1,
            "Task `{}` is scheduled with zero jobs",
            inner.name
        );
        let activated = {
            let mut links = lock(&inner.links);
            let status = inner.status();
            assert_eq!(
                status,
                TaskStatus::Initializing,
                "Task `{}` is scheduled while {status}",
                inner.name
            );
            inner.job_count.store(num_jobs, Ordering::Relaxed);
            links.order = order;
            inner.set_status(TaskStatus::Scheduled);
            inner.try_activate(&links)
        };
        if let Some(order) = activated {
            inner.scheduler.queue.push(Arc::clone(inner), order);
        }
    }

    /// Block until the task has completed.
    ///
    /// With `work_on_it` the calling thread executes job slices while it
    /// waits: this task's own first, then whatever is at the front of the
    /// global queue. It only sleeps when neither has claimable work. This is
    /// what makes a scheduler without worker threads make progress.
    pub fn wait(&self, work_on_it: bool) {
        let inner = &self.inner;
        if work_on_it {
            while !inner.is_completed() {
                if self.work_on_it() {
                    continue;
                }
                inner
                    .scheduler
                    .queue
                    .sleep_until(|| inner.is_completed() || inner.has_claimable_jobs());
            }
            return;
        }
        let mut links = lock(&inner.links);
        while !inner.is_completed() {
            links = wait(&inner.completed, links);
        }
    }

    /// Like `wait(false)`, but gives up after `timeout`.
    ///
    /// Returns whether the task has completed.
    #[cfg(not(feature = "loom"))]
    pub fn wait_timeout(&self, timeout: std::time::Duration) -> bool {
        let inner = &self.inner;
        let links = lock(&inner.links);
        let _links = inner
            .completed
            .wait_timeout_while(links, timeout, |_| !inner.is_completed())
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.is_completed()
    }

    /// `schedule` followed by `wait(true)`.
    pub fn schedule_and_wait(&self, num_jobs: usize, order: ScheduleOrder) {
        self.schedule(num_jobs, order);
        self.wait(true);
    }

    /// Execute one job slice: of this task if it has one left to claim,
    /// otherwise of the task at the front of the global queue.
    ///
    /// Never blocks. Returns whether a job slice was executed.
    pub fn work_on_it(&self) -> bool {
        let inner = &self.inner;
        if let Some(job_index) = inner.claim() {
            inner.execute(job_index);
            return true;
        }
        inner.scheduler.work_on_it()
    }
}

impl TaskInner {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn status(&self) -> TaskStatus {
        TaskStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub(crate) fn is_completed(&self) -> bool {
        self.status() == TaskStatus::Completed
    }

    fn set_status(&self, status: TaskStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    fn job_count(&self) -> usize {
        self.job_count.load(Ordering::Relaxed)
    }

    /// `Scheduled → Active` if nothing is missing. Must be called with `links`
    /// locked; the caller pushes the task on the returned side.
    fn try_activate(&self, links: &TaskLinks) -> Option<ScheduleOrder> {
        if self.status() != TaskStatus::Scheduled {
            return None;
        }
        if self.scheduler.track_dependencies
            && self.missing_dependencies.load(Ordering::Acquire) != 0
        {
            return None;
        }
        self.set_status(TaskStatus::Active);
        trace!(task = %self.name, order = %links.order, "task activated");
        Some(links.order)
    }

    /// Called once by every predecessor when it completes.
    fn one_dependency_completed(self: &Arc<Self>) {
        if self.missing_dependencies.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }
        let activated = {
            let links = lock(&self.links);
            self.try_activate(&links)
        };
        if let Some(order) = activated {
            self.scheduler.queue.push(Arc::clone(self), order);
        }
    }

    /// Whether an active task still has job slices nobody has claimed.
    pub(crate) fn has_claimable_jobs(&self) -> bool {
        self.status() == TaskStatus::Active
            && self.jobs_claimed.load(Ordering::Acquire) < self.job_count()
    }

    /// Claim the next unexecuted job index, if any.
    ///
    /// The counter never moves past `job_count`, and only active tasks hand
    /// out jobs.
    pub(crate) fn claim(&self) -> Option<JobIndex> {
        if self.status() != TaskStatus::Active {
            return None;
        }
        let job_count = self.job_count();
        self.jobs_claimed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |claimed| {
                (claimed < job_count).then_some(claimed + 1)
            })
            .ok()
    }

    /// Run a claimed job slice. The thread running the last one completes the
    /// task.
    pub(crate) fn execute(self: &Arc<Self>, job_index: JobIndex) {
        {
            let _guard = AbortOnUnwind {
                task: &self.name,
                callback: "run",
            };
            self.job.run(job_index);
        }
        let completed = self.jobs_completed.fetch_add(1, Ordering::AcqRel) + 1;
        if completed == self.job_count() {
            self.complete();
        }
    }

    fn complete(self: &Arc<Self>) {
        {
            let _guard = AbortOnUnwind {
                task: &self.name,
                callback: "finish",
            };
            self.job.finish();
        }
        let dependents = {
            let mut links = lock(&self.links);
            self.set_status(TaskStatus::Completed);
            core::mem::take(&mut links.dependents)
        };
        self.completed.notify_all();
        self.scheduler.queue.notify_completion();
        trace!(
            task = %self.name,
            dependents = dependents.len(),
            "task completed"
        );
        for dependent in &dependents {
            dependent.one_dependency_completed();
        }
    }
}
