//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::crypto::random_bytes;
use platform::password::PasswordCost;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC-SHA256 key for access tokens
    pub jwt_secret: Vec<u8>,
    /// Access token lifetime (15 minutes)
    pub access_ttl: Duration,
    /// Refresh token lifetime (1 week)
    pub refresh_ttl: Duration,
    /// Email verification code lifetime
    pub otp_ttl: Duration,
    /// Password reset link lifetime
    pub reset_ttl: Duration,
    /// Failed logins before lockout
    pub max_login_failures: i32,
    pub lockout: Duration,
    pub password_cost: PasswordCost,
    /// Frontend base URL for links in emails
    pub client_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Vec::new(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(7 * 24 * 3600),
            otp_ttl: Duration::from_secs(10 * 60),
            reset_ttl: Duration::from_secs(3600),
            max_login_failures: 5,
            lockout: Duration::from_secs(15 * 60),
            password_cost: PasswordCost::default(),
            client_url: "http://localhost:3000".to_string(),
        }
    }
}

impl AuthConfig {
    /// Create config with a random signing secret
    pub fn with_random_secret() -> Self {
        Self {
            jwt_secret: random_bytes(32),
            ..Default::default()
        }
    }

    /// Random secret and the cheapest hashing cost
    pub fn development() -> Self {
        Self {
            password_cost: PasswordCost::new(PasswordCost::MIN).unwrap_or_default(),
            ..Self::with_random_secret()
        }
    }

    pub fn access_ttl_chrono(&self) -> chrono::Duration {
        to_chrono(self.access_ttl)
    }

    pub fn refresh_ttl_chrono(&self) -> chrono::Duration {
        to_chrono(self.refresh_ttl)
    }

    pub fn otp_ttl_chrono(&self) -> chrono::Duration {
        to_chrono(self.otp_ttl)
    }

    pub fn reset_ttl_chrono(&self) -> chrono::Duration {
        to_chrono(self.reset_ttl)
    }

    pub fn lockout_chrono(&self) -> chrono::Duration {
        to_chrono(self.lockout)
    }

    pub fn otp_ttl_minutes(&self) -> i64 {
        (self.otp_ttl.as_secs() / 60) as i64
    }

    pub fn reset_ttl_minutes(&self) -> i64 {
        (self.reset_ttl.as_secs() / 60) as i64
    }
}

fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}
