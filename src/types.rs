use derive_more::{Deref, Display};

/// Index of a single job slice inside a task, in `[0, job_count)`.
pub type JobIndex = usize;

/// Lifecycle of a [`Task`](crate::task::Task).
///
/// Transitions only move forward:
/// `Initializing → Scheduled → Active → Completed`.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskStatus {
    /// Constructed, `schedule` not called yet. Dependencies may be added.
    #[display("initializing")]
    Initializing = 0,
    /// Scheduled but waiting for at least one dependency to complete.
    #[display("scheduled")]
    Scheduled = 1,
    /// Queued; job slices can be claimed.
    #[display("active")]
    Active = 2,
    /// Every job ran and `finish` returned.
    #[display("completed")]
    Completed = 3,
}

impl TaskStatus {
    pub(crate) const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Initializing,
            1 => Self::Scheduled,
            2 => Self::Active,
            _ => Self::Completed,
        }
    }
}

/// Side of the global queue an activated task is inserted at.
///
/// Tasks are always taken from the front, so `FrontOfQueue` lets a task
/// overtake everything already queued.
#[derive(Debug, Display, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ScheduleOrder {
    /// Run after everything already in the queue.
    #[default]
    #[display("back")]
    BackOfQueue,
    /// Run before everything already in the queue.
    #[display("front")]
    FrontOfQueue,
}

/// Keeps a hot counter on its own cache line(s).
#[derive(Debug, Deref)]
#[repr(align(128))]
pub(crate) struct CachePadded<T>(T);

impl<T> CachePadded<T> {
    pub(crate) const fn new(val: T) -> Self {
        Self(val)
    }
}
