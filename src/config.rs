use crate::scheduler::SchedulerSetupError;
use core::{fmt, num::NonZeroUsize, str::FromStr};

/// Environment variable read by [`SchedulerConfig::from_env`].
pub const THREADS_ENV_VAR: &str = "TASKSYS_THREADS";

/// Number of dedicated worker threads a scheduler spawns.
///
/// Mirrors the raw integer convention `-1` (all hardware threads), `0` (no
/// workers) and `n > 0` (exactly `n` workers) through `TryFrom<i64>`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ThreadCount {
    /// One worker per hardware thread reported by the OS.
    #[default]
    Auto,
    /// No dedicated workers: all jobs run inside `wait` and `work_on_it` calls
    /// made by caller threads.
    CallerOnly,
    /// Exactly this many workers.
    Fixed(NonZeroUsize),
}

impl ThreadCount {
    /// Number of worker threads to spawn on this machine.
    #[must_use]
    pub fn resolve(self) -> usize {
        match self {
            Self::Auto => std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
            Self::CallerOnly => 0,
            Self::Fixed(n) => n.get(),
        }
    }
}

impl TryFrom<i64> for ThreadCount {
    type Error = SchedulerSetupError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            -1 => Ok(Self::Auto),
            0 => Ok(Self::CallerOnly),
            n => usize::try_from(n)
                .ok()
                .and_then(NonZeroUsize::new)
                .map(Self::Fixed)
                .ok_or(SchedulerSetupError::InvalidThreadCount(raw)),
        }
    }
}

impl FromStr for ThreadCount {
    type Err = SchedulerSetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        let raw: i64 = s
            .parse()
            .map_err(|_| SchedulerSetupError::UnparsableThreadCount(s.to_owned()))?;
        Self::try_from(raw)
    }
}

impl fmt::Display for ThreadCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::CallerOnly => f.write_str("0"),
            Self::Fixed(n) => write!(f, "{n}"),
        }
    }
}

/// Construction parameters of a [`Scheduler`](crate::scheduler::Scheduler).
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct SchedulerConfig {
    /// How many dedicated worker threads to spawn.
    pub threads: ThreadCount,
    /// Whether tasks may declare dependencies. When disabled, `schedule`
    /// activates a task immediately.
    pub track_dependencies: bool,
    /// Worker threads are named `<prefix>-<index>`.
    pub thread_name_prefix: String,
    /// Keep workers idle until [`Scheduler::resume`] is called.
    ///
    /// [`Scheduler::resume`]: crate::scheduler::Scheduler::resume
    pub start_paused: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            threads: ThreadCount::Auto,
            track_dependencies: true,
            thread_name_prefix: "tasksys-worker".to_owned(),
            start_paused: false,
        }
    }
}

impl SchedulerConfig {
    /// Default configuration with `threads` taken from [`THREADS_ENV_VAR`]
    /// when it is set.
    ///
    /// # Errors
    /// If the variable is set but is not a valid [`ThreadCount`].
    pub fn from_env() -> Result<Self, SchedulerSetupError> {
        Self::default().with_threads_var(std::env::var(THREADS_ENV_VAR).ok().as_deref())
    }

    fn with_threads_var(mut self, raw: Option<&str>) -> Result<Self, SchedulerSetupError> {
        if let Some(raw) = raw {
            self.threads = raw.parse()?;
        }
        Ok(self)
    }

    /// Sets [`SchedulerConfig::threads`].
    pub fn with_threads(mut self, threads: ThreadCount) -> Self {
        self.threads = threads;
        self
    }

    /// Sets [`SchedulerConfig::track_dependencies`].
    pub fn with_track_dependencies(mut self, track_dependencies: bool) -> Self {
        self.track_dependencies = track_dependencies;
        self
    }

    /// Sets [`SchedulerConfig::thread_name_prefix`].
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Sets [`SchedulerConfig::start_paused`].
    pub fn with_start_paused(mut self, start_paused: bool) -> Self {
        self.start_paused = start_paused;
        self
    }
}
