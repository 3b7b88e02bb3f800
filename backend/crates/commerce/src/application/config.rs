//! Commerce configuration

use std::time::Duration;

use platform::rate_limit::RateLimitConfig;

/// Fees and payout rules.
#[derive(Debug, Clone)]
pub struct CommerceConfig {
    /// Share of each sale kept by the platform
    pub platform_fee_percent: u8,
    /// Smallest withdrawal in minor units (NGN 1,000)
    pub min_withdrawal: i64,
    pub currency: String,
}

impl Default for CommerceConfig {
    fn default() -> Self {
        Self {
            platform_fee_percent: 10,
            min_withdrawal: 100_000,
            currency: "NGN".to_string(),
        }
    }
}

/// Download link lifetime and per-user issue throttle.
#[derive(Debug, Clone, Copy)]
pub struct DownloadConfig {
    pub token_ttl: Duration,
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            token_ttl: Duration::from_secs(15 * 60),
            max_requests: 5,
            window: Duration::from_secs(15 * 60),
        }
    }
}

impl DownloadConfig {
    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::new(self.max_requests, self.window)
    }

    pub fn token_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.token_ttl).unwrap_or(chrono::Duration::minutes(15))
    }
}
