//! User Status Value Object
//!
//! - **Pending**: registered, email not yet verified
//! - **Active**: verified, may authenticate
//! - **Suspended**: blocked by an admin, reversible
//! - **Deactivated**: closed after an approved deletion request

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Pending,
    Active,
    Suspended,
    Deactivated,
}

impl UserStatus {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Deactivated => "deactivated",
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "suspended" => Some(Self::Suspended),
            "deactivated" => Some(Self::Deactivated),
            _ => None,
        }
    }

    /// Only active accounts pass authentication.
    #[inline]
    pub const fn can_authenticate(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Statuses an admin may set directly.
    #[inline]
    pub const fn is_admin_assignable(&self) -> bool {
        matches!(self, Self::Active | Self::Suspended)
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
