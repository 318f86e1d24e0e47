//! Disposable Handles
//!
//! Long-lived resources that must be torn down explicitly: subscriptions,
//! repeating intervals and one-shot timeouts.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// A subscription that stops delivering once unsubscribed.
pub trait Subscription: Send {
    fn unsubscribe(&mut self) -> anyhow::Result<()>;
}

/// A scheduled task that can be cancelled.
pub trait Clearable: Send {
    fn clear(&mut self) -> anyhow::Result<()>;
}

impl<T: Send> Clearable for JoinHandle<T> {
    fn clear(&mut self) -> anyhow::Result<()> {
        self.abort();
        Ok(())
    }
}

// == Interval ==
/// Handle to a task that runs `tick` every `period`.
#[derive(Debug)]
pub struct IntervalHandle {
    task: JoinHandle<()>,
    period: Duration,
}

impl IntervalHandle {
    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Clearable for IntervalHandle {
    fn clear(&mut self) -> anyhow::Result<()> {
        self.task.abort();
        Ok(())
    }
}

/// Spawns a task running `tick` every `period`, first after one full period.
///
/// Ticks never overlap; a slow tick delays the next one instead of bursting.
pub fn spawn_interval<F, Fut>(period: Duration, mut tick: F) -> IntervalHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            tick().await;
        }
    });

    IntervalHandle { task, period }
}

// == Timeout ==
/// Handle to a task that runs once after a delay.
#[derive(Debug)]
pub struct TimeoutHandle {
    task: JoinHandle<()>,
}

impl TimeoutHandle {
    /// Whether the task has run (or was cancelled).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Clearable for TimeoutHandle {
    fn clear(&mut self) -> anyhow::Result<()> {
        self.task.abort();
        Ok(())
    }
}

/// Spawns `task` to run once after `delay`.
pub fn spawn_timeout<Fut>(delay: Duration, task: Fut) -> TimeoutHandle
where
    Fut: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(async move {
        time::sleep(delay).await;
        task.await;
    });

    TimeoutHandle { task }
}
