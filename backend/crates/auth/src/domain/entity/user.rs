//! User Entity
//!
//! Public profile and account state. Secrets live in
//! [`Credentials`](super::credentials::Credentials).

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::value_object::{Email, Role, UserStatus};

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A freshly registered customer awaiting email verification.
    pub fn register(name: impl Into<String>, email: Email, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            name: name.into().trim().to_string(),
            email,
            phone: None,
            avatar_url: None,
            role: Role::Customer,
            status: UserStatus::Pending,
            email_verified_at: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.can_authenticate()
    }

    /// Mark the email verified. Only pending accounts move to active.
    pub fn verify_email(&mut self, now: DateTime<Utc>) {
        self.email_verified_at = Some(now);
        if self.status == UserStatus::Pending {
            self.status = UserStatus::Active;
        }
        self.updated_at = now;
    }

    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.last_login_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::register("  Ada Lovelace ", Email::new("ada@example.com").unwrap(), Utc::now())
    }

    #[test]
    fn test_register_defaults() {
        let user = user();
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.role, Role::Customer);
        assert_eq!(user.status, UserStatus::Pending);
        assert!(!user.is_active());
    }

    #[test]
    fn test_verify_email_activates_pending_only() {
        let mut user = user();
        user.verify_email(Utc::now());
        assert!(user.is_active());
        assert!(user.email_verified_at.is_some());

        let mut suspended = self::user();
        suspended.status = UserStatus::Suspended;
        suspended.verify_email(Utc::now());
        assert_eq!(suspended.status, UserStatus::Suspended);
    }
}
