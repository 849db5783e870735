//! Dependency-aware, job-parallel task scheduler.
//!
//! A [`Task`](task::Task) is a named unit of work made of `job_count`
//! independent job slices plus a completion callback. This crate:
//! - Runs tasks on a fixed pool of worker threads fed by one shared queue with
//!   two insertion points (front and back).
//! - Hands out job indices with an atomic claim, so every index runs exactly
//!   once no matter how many threads work on the task.
//! - Delays a task until all of its dependencies have completed; the
//!   predecessor whose completion brings the missing-dependency count to zero
//!   activates it, exactly once.
//! - Lets a thread blocked in `wait` execute jobs instead of sleeping, so a
//!   scheduler without any worker thread still makes progress.
//!
//! Key modules:
//! - `config`: worker count, dependency tracking and other construction
//!   parameters.
//! - `scheduler`: the scheduler context (queue and worker pool) and the
//!   optional process-wide instance.
//! - `task`: the `Job` callbacks and the `Task` handle with its scheduling
//!   operations.
//! - `types`: task status and queue order enums.
//!
//! Quick start:
//! 1. Build a `Scheduler` from a `SchedulerConfig` (or call
//!    `init_task_system`).
//! 2. Create tasks with `Scheduler::task`, passing a closure or a `Job`
//!    implementation.
//! 3. Declare ordering with `Task::add_dependency`, then `schedule` every task
//!    and `wait` on the ones whose results you need.
//!
//! Dependency cycles are not detected: tasks on a cycle never activate and
//! waiting on them blocks forever. Keeping the graph acyclic is the caller's
//! responsibility.

/// Construction parameters of a scheduler.
///
/// Defines `SchedulerConfig` and `ThreadCount`, which follows the `-1` (auto),
/// `0` (caller threads only), `n` (fixed) convention.
pub mod config;
/// The scheduler context.
///
/// Owns the global work queue and the worker threads, and exposes the
/// process-wide `init_task_system` entry point and worker-count telemetry.
pub mod scheduler;
mod sync;
/// Tasks and their scheduling operations.
///
/// Defines the `Job` trait (`run`, `finish`) and the `Task` handle
/// (`add_dependency`, `schedule`, `wait`, `work_on_it`).
pub mod task;
/// Status and ordering enums shared by the public API.
pub mod types;
mod utils;
