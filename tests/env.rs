#![allow(missing_docs)]
#![cfg(not(feature = "loom"))]

use tasksys::{
    config::{SchedulerConfig, THREADS_ENV_VAR, ThreadCount},
    scheduler::SchedulerSetupError,
};

// The environment is process-wide, so every case lives in this single test.
#[test]
fn threads_are_read_from_the_environment() {
    // SAFETY: this binary runs a single test; no other thread reads the
    // environment concurrently.
    unsafe { std::env::remove_var(THREADS_ENV_VAR) };
    assert_eq!(SchedulerConfig::from_env().unwrap().threads, ThreadCount::Auto);

    unsafe { std::env::set_var(THREADS_ENV_VAR, "0") };
    assert_eq!(
        SchedulerConfig::from_env().unwrap().threads,
        ThreadCount::CallerOnly
    );

    unsafe { std::env::set_var(THREADS_ENV_VAR, "6") };
    assert_eq!(SchedulerConfig::from_env().unwrap().threads.resolve(), 6);

    unsafe { std::env::set_var(THREADS_ENV_VAR, "six") };
    assert!(matches!(
        SchedulerConfig::from_env(),
        Err(SchedulerSetupError::UnparsableThreadCount(s)) if s == "six"
    ));

    unsafe { std::env::remove_var(THREADS_ENV_VAR) };
}
