use crate::{
    sync::{Arc, Condvar, Mutex, lock, wait},
    task::TaskInner,
    types::ScheduleOrder,
};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// The global queue of activated tasks.
///
/// A task stays at the front while it has unclaimed jobs, so every thread that
/// pops it works on the same task. Entries whose jobs are all claimed are
/// dropped lazily once they reach the front.
///
/// The condvar is shared by idle workers and by waiters helping to drain the
/// queue; it is signalled on every push and, for waiters, on every task
/// completion.
///
/// Once closed the queue stays empty: a task activated after its scheduler is
/// gone only runs inside `wait` or `work_on_it` calls on that task.
pub(crate) struct WorkQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

struct QueueState {
    tasks: VecDeque<Arc<TaskInner>>,
    paused: bool,
    shutdown: bool,
    closed: bool,
    sleeping_helpers: usize,
}

impl QueueState {
    fn drop_exhausted(&mut self) {
        while self
            .tasks
            .front()
            .is_some_and(|task| !task.has_claimable_jobs())
        {
            self.tasks.pop_front();
        }
    }

    fn front(&mut self) -> Option<Arc<TaskInner>> {
        self.drop_exhausted();
        self.tasks.front().cloned()
    }
}

impl WorkQueue {
    pub(crate) fn new(paused: bool) -> Self {
        Self {
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                paused,
                shutdown: false,
                closed: false,
                sleeping_helpers: 0,
            }),
            available: Condvar::new(),
        }
    }

    pub(crate) fn push(&self, task: Arc<TaskInner>, order: ScheduleOrder) {
        let queued = {
            let mut state = lock(&self.state);
            if state.closed {
                drop(state);
                debug!(
                    task = task.name(),
                    "scheduler is gone, task runs only through its waiters"
                );
                return;
            }
            match order {
                ScheduleOrder::FrontOfQueue => state.tasks.push_front(task),
                ScheduleOrder::BackOfQueue => state.tasks.push_back(task),
            }
            state.tasks.len()
        };
        trace!(%order, queued, "task queued");
        self.available.notify_all();
    }

    /// Front task with claimable jobs, without blocking. Ignores `paused`.
    pub(crate) fn try_next(&self) -> Option<Arc<TaskInner>> {
        lock(&self.state).front()
    }

    /// Front task with claimable jobs, blocking while the queue is empty or
    /// paused. Returns `None` once shut down and drained.
    pub(crate) fn next_blocking(&self) -> Option<Arc<TaskInner>> {
        let mut state = lock(&self.state);
        loop {
            if !state.paused || state.shutdown {
                if let Some(task) = state.front() {
                    return Some(task);
                }
                if state.shutdown {
                    return None;
                }
            }
            state = wait(&self.available, state);
        }
    }

    /// Sleep once unless the queue has claimable work or `ready` holds.
    ///
    /// `ready` is evaluated under the queue lock, so a completion or push that
    /// makes it true cannot slip in between the check and the sleep.
    pub(crate) fn sleep_until(&self, ready: impl Fn() -> bool) {
        let mut state = lock(&self.state);
        state.drop_exhausted();
        if !state.tasks.is_empty() || ready() {
            return;
        }
        state.sleeping_helpers += 1;
        let mut state = wait(&self.available, state);
        state.sleeping_helpers -= 1;
    }

    /// Wake helpers sleeping in [`WorkQueue::sleep_until`] after a task has
    /// completed.
    pub(crate) fn notify_completion(&self) {
        let state = lock(&self.state);
        if state.sleeping_helpers > 0 {
            self.available.notify_all();
        }
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        lock(&self.state).paused = paused;
        if !paused {
            self.available.notify_all();
        }
    }

    pub(crate) fn shutdown(&self) {
        lock(&self.state).shutdown = true;
        self.available.notify_all();
    }

    /// Close the queue if no entry has claimable jobs left, dropping the
    /// exhausted ones. Returns `false` if there is still work to drain.
    ///
    /// Entries hold their task and tasks hold the scheduler state owning this
    /// queue, so nothing may be queued after the scheduler is dropped.
    pub(crate) fn close(&self) -> bool {
        let mut state = lock(&self.state);
        if state.tasks.iter().any(|task| task.has_claimable_jobs()) {
            return false;
        }
        state.tasks.clear();
        state.closed = true;
        true
    }

    /// Number of queued tasks that still have unclaimed jobs.
    pub(crate) fn len(&self) -> usize {
        lock(&self.state)
            .tasks
            .iter()
            .filter(|task| task.has_claimable_jobs())
            .count()
    }
}
