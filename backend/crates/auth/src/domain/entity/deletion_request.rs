//! Deletion Request Entity
//!
//! A user's request to close their account, reviewed by an admin.

use chrono::{DateTime, Utc};
use kernel::id::{DeletionRequestId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletionStatus {
    Pending,
    Approved,
    Rejected,
}

impl DeletionStatus {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeletionRequest {
    pub id: DeletionRequestId,
    pub user_id: UserId,
    pub reason: String,
    pub status: DeletionStatus,
    pub reviewed_by: Option<UserId>,
    pub review_note: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DeletionRequest {
    pub fn new(user_id: UserId, reason: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: DeletionRequestId::new(),
            user_id,
            reason: reason.into(),
            status: DeletionStatus::Pending,
            reviewed_by: None,
            review_note: None,
            reviewed_at: None,
            created_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == DeletionStatus::Pending
    }

    pub fn review(
        &mut self,
        approved: bool,
        reviewer: UserId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.status = if approved {
            DeletionStatus::Approved
        } else {
            DeletionStatus::Rejected
        };
        self.reviewed_by = Some(reviewer);
        self.review_note = note;
        self.reviewed_at = Some(now);
    }
}
