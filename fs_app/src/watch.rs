use std::time::Duration;

use fs_limiter::Clock;
use fs_limiter::Limiter;
use fs_limiter::Store;
use tokio::time::MissedTickBehavior;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::shutdown_handler::ShutdownSignal;

/// Outcome counts of a finished watch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub allowed: u64,
    pub rejected: u64,
    pub failed: u64,
}

/// Pass `item` once per `period` until `shutdown` fires
///
/// The first pass happens immediately. Waiting for the next tick is raced
/// against the shutdown signal, so a stop request ends the loop without
/// recording another occurrence.
pub async fn run<S: Store, C: Clock>(limiter: &Limiter<S, C>, item: &str, period: Duration, shutdown: &ShutdownSignal) -> WatchSummary {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut summary = WatchSummary::default();

    info!(item, ?period, "Watching");
    loop {
        tokio::select! {
            biased;
            _ = shutdown.stopped() => break,
            _ = ticker.tick() => {}
        }

        if !shutdown.is_running() {
            break;
        }

        match limiter.pass(item).await {
            Ok(true) => {
                summary.allowed += 1;
                info!(item, "allowed");
            }
            Ok(false) => {
                summary.rejected += 1;
                warn!(item, "rejected");
            }
            Err(err) => {
                summary.failed += 1;
                error!(item, "pass failed: {err}");
            }
        }
    }

    info!(item, allowed = summary.allowed, rejected = summary.rejected, failed = summary.failed, "Watch finished");
    summary
}

#[cfg(test)]
mod tests {
    use fs_limiter::LimiterConfig;
    use fs_limiter::ManualClock;
    use fs_limiter::MemoryStore;
    use fs_limiter::SystemClock;
    use time::macros::datetime;

    use super::*;

    fn manual_limiter(limit: u64) -> Limiter<MemoryStore, ManualClock> {
        let clock = ManualClock::new(datetime!(2024-01-01 00:00:00 UTC));
        Limiter::new(LimiterConfig::new("watch", Duration::from_secs(60), limit), MemoryStore::new(), clock).unwrap()
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_long_period() {
        let limiter = manual_limiter(5);
        let shutdown = ShutdownSignal::new();
        let trigger = shutdown.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.trigger();
        });

        let summary = tokio::time::timeout(Duration::from_secs(5), run(&limiter, "alice", Duration::from_secs(3600), &shutdown)).await.unwrap();

        assert_eq!(summary, WatchSummary { allowed: 1, rejected: 0, failed: 0 });
        assert_eq!(limiter.peek("alice").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_nothing_recorded_after_shutdown() {
        let limiter = manual_limiter(5);
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let summary = run(&limiter, "alice", Duration::from_millis(10), &shutdown).await;

        assert_eq!(summary, WatchSummary::default());
        assert_eq!(limiter.peek("alice").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_counts_rejections_past_limit() {
        let limiter = Limiter::new(LimiterConfig::new("watch", Duration::from_secs(60), 2), MemoryStore::new(), SystemClock).unwrap();
        let shutdown = ShutdownSignal::new();
        let trigger = shutdown.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.trigger();
        });

        let summary = tokio::time::timeout(Duration::from_secs(5), run(&limiter, "bob", Duration::from_millis(5), &shutdown)).await.unwrap();

        assert_eq!(summary.allowed, 2);
        assert!(summary.rejected >= 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(limiter.peek("bob").await.unwrap() as u64, summary.allowed + summary.rejected);
    }
}
