use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Completed(T),
    /// The previous poll was still running.
    Skipped,
}

/// Fixed-interval poller that never overlaps polls.
///
/// A tick that arrives while a poll is in flight is dropped, not queued,
/// and the running poll is never cancelled.
#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    in_flight: Arc<AtomicBool>,
}

struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn try_acquire(&self) -> Option<InFlightGuard> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(InFlightGuard(self.in_flight.clone()))
        }
    }

    pub async fn poll_once<F, Fut, T>(&self, task: F) -> PollOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let Some(_guard) = self.try_acquire() else {
            debug!("Previous poll still running, skipping");
            return PollOutcome::Skipped;
        };
        PollOutcome::Completed(task().await)
    }

    /// Drive `task` every interval until the returned handle is aborted.
    pub fn spawn<F, Fut>(&self, task: F) -> JoinHandle<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let poller = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(poller.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let Some(guard) = poller.try_acquire() else {
                    debug!("Previous poll still running, skipping tick");
                    continue;
                };

                let poll = task();
                tokio::spawn(async move {
                    let _guard = guard;
                    poll.await;
                });
            }
        })
    }
}
