use tracing::error;

/// Aborts the process if dropped while a user callback is unwinding.
///
/// A panic escaping `run` or `finish` would leave the job counters of the task
/// short forever and release (or strand) its dependents, so it is fatal.
pub(crate) struct AbortOnUnwind<'a> {
    pub(crate) task: &'a str,
    pub(crate) callback: &'static str,
}

impl Drop for AbortOnUnwind<'_> {
    #[inline]
    fn drop(&mut self) {
        if std::thread::panicking() {
            error!(
                task = self.task,
                callback = self.callback,
                "task callback panicked, aborting"
            );
            std::process::abort();
        }
    }
}
