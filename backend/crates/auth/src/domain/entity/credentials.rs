//! Credentials Entity
//!
//! Password hash, lockout counters and one-time secrets for a user.
//! One-time secrets are stored as SHA-256 hex digests, never in clear.

use chrono::{DateTime, Duration, Utc};
use kernel::id::UserId;
use platform::crypto::{constant_time_eq, sha256_hex};
use platform::password::HashedPassword;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: UserId,
    pub password_hash: HashedPassword,
    pub failed_login_count: i32,
    pub locked_until: Option<DateTime<Utc>>,
    /// Email verification code digest.
    pub otp_hash: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    /// Password reset token digest.
    pub reset_token_hash: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub password_changed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of presenting a one-time secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretCheck {
    Valid,
    Expired,
    Mismatch,
}

impl Credentials {
    pub fn new(user_id: UserId, password_hash: HashedPassword, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            password_hash,
            failed_login_count: 0,
            locked_until: None,
            otp_hash: None,
            otp_expires_at: None,
            reset_token_hash: None,
            reset_token_expires_at: None,
            password_changed_at: now,
            updated_at: now,
        }
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    /// Count a failed login. Locks the account once `max_failures` is reached.
    /// Returns true when this failure triggered the lock.
    pub fn record_failure(&mut self, now: DateTime<Utc>, max_failures: i32, lockout: Duration) -> bool {
        self.failed_login_count += 1;
        self.updated_at = now;
        if self.failed_login_count >= max_failures {
            self.locked_until = Some(now + lockout);
            self.failed_login_count = 0;
            return true;
        }
        false
    }

    pub fn reset_failures(&mut self, now: DateTime<Utc>) {
        self.failed_login_count = 0;
        self.locked_until = None;
        self.updated_at = now;
    }

    pub fn set_otp(&mut self, code: &str, ttl: Duration, now: DateTime<Utc>) {
        self.otp_hash = Some(sha256_hex(code.as_bytes()));
        self.otp_expires_at = Some(now + ttl);
        self.updated_at = now;
    }

    pub fn check_otp(&self, code: &str, now: DateTime<Utc>) -> SecretCheck {
        check_secret(self.otp_hash.as_deref(), self.otp_expires_at, code, now)
    }

    pub fn clear_otp(&mut self, now: DateTime<Utc>) {
        self.otp_hash = None;
        self.otp_expires_at = None;
        self.updated_at = now;
    }

    pub fn set_reset_token(&mut self, token: &str, ttl: Duration, now: DateTime<Utc>) {
        self.reset_token_hash = Some(sha256_hex(token.as_bytes()));
        self.reset_token_expires_at = Some(now + ttl);
        self.updated_at = now;
    }

    pub fn check_reset_token(&self, token: &str, now: DateTime<Utc>) -> SecretCheck {
        check_secret(
            self.reset_token_hash.as_deref(),
            self.reset_token_expires_at,
            token,
            now,
        )
    }

    /// Replace the password and consume any outstanding reset token.
    pub fn change_password(&mut self, hash: HashedPassword, now: DateTime<Utc>) {
        self.password_hash = hash;
        self.password_changed_at = now;
        self.reset_token_hash = None;
        self.reset_token_expires_at = None;
        self.reset_failures(now);
    }
}

fn check_secret(
    stored: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
    presented: &str,
    now: DateTime<Utc>,
) -> SecretCheck {
    let (Some(stored), Some(expires_at)) = (stored, expires_at) else {
        return SecretCheck::Mismatch;
    };
    let presented = sha256_hex(presented.trim().as_bytes());
    if !constant_time_eq(stored.as_bytes(), presented.as_bytes()) {
        return SecretCheck::Mismatch;
    }
    if now >= expires_at {
        return SecretCheck::Expired;
    }
    SecretCheck::Valid
}
