#![allow(dead_code)]

use std::{
    num::NonZeroUsize,
    sync::Once,
    time::{Duration, Instant},
};
use tasksys::{
    config::{SchedulerConfig, ThreadCount},
    scheduler::Scheduler,
};
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Output is captured per test and only shown for failures (or with
/// `--nocapture`). Enable levels with e.g. `RUST_LOG=tasksys=trace`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

pub fn scheduler_with(threads: usize) -> Scheduler {
    init_tracing();
    let threads = NonZeroUsize::new(threads).map_or(ThreadCount::CallerOnly, ThreadCount::Fixed);
    Scheduler::new(SchedulerConfig::default().with_threads(threads)).expect("scheduler")
}

/// Poll `condition` until it holds or five seconds have passed.
pub fn eventually(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}
