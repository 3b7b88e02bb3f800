//! Refresh Token Entity
//!
//! Opaque long-lived token exchanged for new access tokens. Only the
//! SHA-256 digest is persisted; every refresh rotates it.

use chrono::{DateTime, Duration, Utc};
use kernel::id::UserId;
use platform::crypto::{random_hex, sha256_hex};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: UserId,
    pub token_hash: String,
    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Mint a token. Returns the entity to persist and the clear value to hand out.
    pub fn issue(
        user_id: UserId,
        ttl: Duration,
        user_agent: Option<String>,
        now: DateTime<Utc>,
    ) -> (Self, String) {
        let clear = random_hex(32);
        let token = Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash: Self::digest(&clear),
            user_agent,
            expires_at: now + ttl,
            created_at: now,
        };
        (token, clear)
    }

    pub fn digest(clear: &str) -> String {
        sha256_hex(clear.as_bytes())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_stores_digest_only() {
        let now = Utc::now();
        let (token, clear) = RefreshToken::issue(UserId::new(), Duration::days(7), None, now);
        assert_eq!(clear.len(), 64);
        assert_ne!(token.token_hash, clear);
        assert_eq!(token.token_hash, RefreshToken::digest(&clear));
        assert!(!token.is_expired(now));
        assert!(token.is_expired(now + Duration::days(7)));
    }
}
