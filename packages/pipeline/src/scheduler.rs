//! Deferred task execution.
//!
//! Pipeline stages never sleep themselves; they ask a [`Scheduler`] to run
//! the next stage later. [`TokioScheduler`] waits on the real clock,
//! [`ManualScheduler`] only moves when a test calls
//! [`ManualScheduler::advance`].

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::runtime::{Handle, TryCurrentError};

/// Runs tasks after a delay.
pub trait Scheduler: Send + Sync {
    /// Runs `task` once `delay` has elapsed. Fire-and-forget: there is no
    /// cancellation and no completion signal.
    fn schedule_after(&self, delay: Duration, task: BoxFuture<'static, ()>);
}

/// [`Scheduler`] that spawns each task on a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Creates a scheduler bound to the runtime the caller is running on.
    ///
    /// # Errors
    ///
    /// Returns [`TryCurrentError`] if called outside a tokio runtime.
    pub fn current() -> Result<Self, TryCurrentError> {
        Ok(Self::new(Handle::try_current()?))
    }

    /// Creates a scheduler that spawns onto `handle`.
    #[must_use]
    pub const fn new(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, task: BoxFuture<'static, ()>) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
    }
}

struct PendingTask {
    due: Duration,
    sequence: u64,
    task: BoxFuture<'static, ()>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_sequence: u64,
    pending: Vec<PendingTask>,
}

/// [`Scheduler`] driven by a fake clock.
///
/// Time starts at zero and only moves forward through [`Self::advance`].
/// Tasks due at the same instant run in the order they were scheduled.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    /// Creates a scheduler at time zero with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current fake time.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Moves the clock forward by `by`, running every task that falls due
    /// on the way, including tasks those tasks schedule.
    pub async fn advance(&self, by: Duration) {
        let target = self.lock().now + by;

        while let Some(task) = self.pop_due(target) {
            task.await;
        }

        let mut state = self.lock();
        state.now = state.now.max(target);
    }

    /// Advances straight to each next due task until nothing is pending.
    ///
    /// Returns the number of tasks run. Stops after `max_tasks` so a task
    /// that keeps rescheduling itself cannot hang a test.
    pub async fn run_until_idle(&self, max_tasks: usize) -> usize {
        let mut ran = 0;
        while ran < max_tasks {
            let next_due = self.lock().pending.iter().map(|p| p.due).min();
            let Some(due) = next_due else {
                break;
            };
            let Some(task) = self.pop_due(due) else {
                break;
            };
            task.await;
            ran += 1;
        }
        ran
    }

    fn pop_due(&self, target: Duration) -> Option<BoxFuture<'static, ()>> {
        let mut state = self.lock();
        let position = state
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= target)
            .min_by_key(|(_, p)| (p.due, p.sequence))
            .map(|(i, _)| i)?;

        let next = state.pending.swap_remove(position);
        state.now = state.now.max(next.due);
        drop(state);
        Some(next.task)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&self, delay: Duration, task: BoxFuture<'static, ()>) {
        let mut state = self.lock();
        let due = state.now + delay;
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.pending.push(PendingTask {
            due,
            sequence,
            task,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> BoxFuture<'static, ()>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let make = move |name: &'static str| -> BoxFuture<'static, ()> {
            let sink = sink.clone();
            Box::pin(async move {
                sink.lock().unwrap().push(name);
            })
        };
        (log, make)
    }

    #[tokio::test]
    async fn manual_runs_only_due_tasks() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();

        scheduler.schedule_after(Duration::from_secs(5), task("late"));
        scheduler.schedule_after(Duration::from_secs(1), task("early"));

        scheduler.advance(Duration::from_secs(2)).await;
        assert_eq!(*log.lock().unwrap(), vec!["early"]);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.now(), Duration::from_secs(2));

        scheduler.advance(Duration::from_secs(3)).await;
        assert_eq!(*log.lock().unwrap(), vec!["early", "late"]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn manual_breaks_ties_by_schedule_order() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();

        scheduler.schedule_after(Duration::from_secs(1), task("a"));
        scheduler.schedule_after(Duration::from_secs(1), task("b"));
        scheduler.schedule_after(Duration::from_secs(1), task("c"));

        scheduler.advance(Duration::from_secs(1)).await;
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn manual_runs_tasks_scheduled_during_advance() {
        let scheduler = Arc::new(ManualScheduler::new());
        let (log, task) = recorder();

        let inner = scheduler.clone();
        let follow_up = task("second");
        let first = task("first");
        scheduler.schedule_after(
            Duration::from_secs(1),
            Box::pin(async move {
                first.await;
                inner.schedule_after(Duration::from_secs(2), follow_up);
            }),
        );

        scheduler.advance(Duration::from_secs(10)).await;
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(scheduler.now(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn run_until_idle_jumps_to_each_due_time() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();

        scheduler.schedule_after(Duration::from_secs(30), task("x"));
        scheduler.schedule_after(Duration::from_secs(10), task("y"));

        assert_eq!(scheduler.run_until_idle(100).await, 2);
        assert_eq!(*log.lock().unwrap(), vec!["y", "x"]);
        assert_eq!(scheduler.now(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_scheduler_runs_after_delay() {
        let scheduler = TokioScheduler::current().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();

        let started = tokio::time::Instant::now();
        scheduler.schedule_after(
            Duration::from_secs(8),
            Box::pin(async move {
                let _ = tx.send(());
            }),
        );

        rx.await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(8));
    }

    #[test]
    fn tokio_scheduler_requires_runtime() {
        assert!(TokioScheduler::current().is_err());
    }
}
