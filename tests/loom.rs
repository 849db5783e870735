#![allow(missing_docs)]
#![cfg(feature = "loom")]

use loom::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
};
use tasksys::{
    config::{SchedulerConfig, ThreadCount},
    scheduler::Scheduler,
    task::{Job, Task},
    types::{JobIndex, ScheduleOrder, TaskStatus},
};

fn model(f: impl Fn() + Sync + Send + 'static) {
    let mut builder = loom::model::Builder::new();
    builder.preemption_bound = Some(3);
    builder.check(f);
}

fn caller_only() -> Scheduler {
    Scheduler::new(SchedulerConfig::default().with_threads(ThreadCount::CallerOnly))
        .expect("scheduler")
}

#[derive(Debug, Clone)]
struct Counts {
    runs: Arc<AtomicUsize>,
    finishes: Arc<AtomicUsize>,
}

impl Counts {
    fn new() -> Self {
        Self {
            runs: Arc::new(AtomicUsize::new(0)),
            finishes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Job for Counts {
    fn run(&self, _: JobIndex) {
        self.runs.fetch_add(1, Ordering::Relaxed);
    }

    fn finish(&self) {
        self.finishes.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn loom_concurrent_predecessors_activate_join_once() {
    model(|| {
        // Graph:
        //   A     B
        //    \   /
        //     JOIN
        // A and B complete on different threads; exactly one of them must
        // observe the missing-dependency count reach zero.
        let scheduler = caller_only();
        let join_counts = Counts::new();
        let a = scheduler.task_fn("a", |_| {});
        let b = scheduler.task_fn("b", |_| {});
        let join = scheduler.task("join", join_counts.clone());
        join.add_dependency(&a);
        join.add_dependency(&b);
        join.schedule(1, ScheduleOrder::BackOfQueue);

        let a_thread = {
            let a = a.clone();
            thread::spawn(move || a.schedule_and_wait(1, ScheduleOrder::BackOfQueue))
        };
        b.schedule_and_wait(1, ScheduleOrder::BackOfQueue);
        a_thread.join().unwrap();

        join.wait(true);
        assert_eq!(join.status(), TaskStatus::Completed);
        assert_eq!(join_counts.runs.load(Ordering::Relaxed), 1);
        assert_eq!(join_counts.finishes.load(Ordering::Relaxed), 1);
        assert_eq!(join.missing_dependencies(), 0);
    });
}

#[test]
fn loom_waiter_and_helper_split_jobs() {
    model(|| {
        let scheduler = caller_only();
        let counts = Counts::new();
        let task = scheduler.task("split", counts.clone());
        task.schedule(2, ScheduleOrder::BackOfQueue);

        let helper = {
            let task: Task = task.clone();
            thread::spawn(move || {
                task.work_on_it();
            })
        };
        task.wait(true);
        helper.join().unwrap();

        assert_eq!(counts.runs.load(Ordering::Relaxed), 2);
        assert_eq!(counts.finishes.load(Ordering::Relaxed), 1);
        assert_eq!(task.jobs_completed(), 2);
    });
}

#[test]
fn loom_dependency_added_while_predecessor_completes() {
    model(|| {
        let scheduler = caller_only();
        let finished = Arc::new(AtomicBool::new(false));
        let violations = Arc::new(AtomicUsize::new(0));

        struct Pred(Arc<AtomicBool>);
        impl Job for Pred {
            fn run(&self, _: JobIndex) {}
            fn finish(&self) {
                self.0.store(true, Ordering::Release);
            }
        }

        let pred = scheduler.task("pred", Pred(finished.clone()));
        pred.schedule(1, ScheduleOrder::BackOfQueue);
        let runner = {
            let pred = pred.clone();
            thread::spawn(move || pred.wait(true))
        };

        let succ = {
            let finished = finished.clone();
            let violations = violations.clone();
            scheduler.task_fn("succ", move |_| {
                if !finished.load(Ordering::Acquire) {
                    violations.fetch_add(1, Ordering::Relaxed);
                }
            })
        };
        succ.add_dependency(&pred);
        succ.schedule_and_wait(1, ScheduleOrder::FrontOfQueue);
        runner.join().unwrap();

        assert_eq!(violations.load(Ordering::Relaxed), 0);
        assert_eq!(succ.jobs_completed(), 1);
    });
}
