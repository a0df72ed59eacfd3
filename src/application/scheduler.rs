use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Shortest interval accepted for a sweep, to keep it from hogging a shard lock
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Runs a purge function on a fixed interval until cancelled
pub struct PeriodicSweeper {
    interval: Duration,
    task_name: String,
}

impl PeriodicSweeper {
    /// Intervals below [`MIN_SWEEP_INTERVAL`] are raised to it
    pub fn new(interval: Duration, task_name: impl Into<String>) -> Self {
        Self {
            interval: interval.max(MIN_SWEEP_INTERVAL),
            task_name: task_name.into(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn the sweep loop. `sweep` returns how many entries it removed.
    ///
    /// The first sweep happens one full interval after spawning. The loop
    /// exits at the next tick boundary once `shutdown` is cancelled.
    pub fn spawn<F>(self, shutdown: CancellationToken, sweep: F) -> JoinHandle<()>
    where
        F: Fn() -> usize + Send + 'static,
    {
        tokio::spawn(async move {
            info!(task = %self.task_name, interval = ?self.interval, "Starting periodic sweep");

            let mut timer = time::interval_at(time::Instant::now() + self.interval, self.interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = timer.tick() => {
                        let removed = sweep();
                        if removed > 0 {
                            info!(task = %self.task_name, removed, "Sweep removed expired entries");
                        } else {
                            debug!(task = %self.task_name, "Sweep found nothing to remove");
                        }
                    }
                }
            }

            info!(task = %self.task_name, "Stopped periodic sweep");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_interval_has_a_floor() {
        assert_eq!(
            PeriodicSweeper::new(Duration::from_secs(1), "t").interval(),
            MIN_SWEEP_INTERVAL
        );
        assert_eq!(
            PeriodicSweeper::new(Duration::from_secs(60), "t").interval(),
            Duration::from_secs(60)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeps_until_cancelled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let token = CancellationToken::new();

        let counter = calls.clone();
        let handle = PeriodicSweeper::new(Duration::from_secs(10), "test").spawn(
            token.clone(),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                0
            },
        );

        time::sleep(Duration::from_secs(35)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        token.cancel();
        handle.await.unwrap();

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
