//! Periodic cleanup of in-memory state
//!
//! One task clears expired download tokens and idle rate-limit windows, so
//! no entry ever needs a timer of its own.

use std::time::Duration;

use chrono::Utc;
use commerce::{DownloadService, InMemoryDownloadTokenStore};
use platform::rate_limit::{InMemoryRateLimitStore, RateLimiter};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct Sweeper {
    downloads: DownloadService<InMemoryDownloadTokenStore>,
    limiters: Vec<RateLimiter<InMemoryRateLimitStore>>,
}

/// Entries removed by one pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub download_tokens: usize,
    pub rate_limit_keys: usize,
}

impl Sweeper {
    pub fn new(
        downloads: DownloadService<InMemoryDownloadTokenStore>,
        limiters: Vec<RateLimiter<InMemoryRateLimitStore>>,
    ) -> Self {
        Self {
            downloads,
            limiters,
        }
    }

    pub async fn run_once(&self) -> SweepReport {
        let mut report = SweepReport {
            download_tokens: self.downloads.sweep(Utc::now()).await,
            ..SweepReport::default()
        };
        for limiter in &self.limiters {
            report.rate_limit_keys += limiter.sweep().await;
        }
        report
    }

    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let report = self.run_once().await;
                if report != SweepReport::default() {
                    tracing::debug!(
                        download_tokens = report.download_tokens,
                        rate_limit_keys = report.rate_limit_keys,
                        "Swept expired entries"
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use commerce::DownloadConfig;
    use kernel::id::{OrderId, ProductId, UserId};
    use platform::rate_limit::RateLimitConfig;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sweep_clears_idle_limiter_keys() {
        let limiter = RateLimiter::in_memory(RateLimitConfig::new(5, Duration::from_secs(60)));
        let downloads = DownloadService::new(
            Arc::new(InMemoryDownloadTokenStore::new()),
            &DownloadConfig::default(),
        );
        let sweeper = Sweeper::new(downloads, vec![limiter.clone()]);

        limiter.check("ip:1").await;
        limiter.check("ip:2").await;
        assert_eq!(sweeper.run_once().await, SweepReport::default());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(sweeper.run_once().await.rate_limit_keys, 2);
    }

    #[tokio::test]
    async fn test_sweep_leaves_live_tokens() {
        let store = Arc::new(InMemoryDownloadTokenStore::new());
        let downloads = DownloadService::new(store, &DownloadConfig::default());
        downloads
            .issue(ProductId::new(), OrderId::new(), UserId::new(), 0, Utc::now())
            .await;
        let sweeper = Sweeper::new(downloads.clone(), Vec::new());

        assert_eq!(sweeper.run_once().await.download_tokens, 0);
        assert_eq!(downloads.outstanding().await, 1);
    }
}
