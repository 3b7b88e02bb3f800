//! Vendor Entity

use chrono::{DateTime, Utc};
use kernel::id::{UserId, VendorId};
use serde::{Deserialize, Serialize};

use crate::domain::slug::unique_slug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Suspended,
}

impl VendorStatus {
    pub const fn code(&self) -> &'static str {
        match self {
            VendorStatus::Pending => "pending",
            VendorStatus::Approved => "approved",
            VendorStatus::Rejected => "rejected",
            VendorStatus::Suspended => "suspended",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "pending" => Some(VendorStatus::Pending),
            "approved" => Some(VendorStatus::Approved),
            "rejected" => Some(VendorStatus::Rejected),
            "suspended" => Some(VendorStatus::Suspended),
            _ => None,
        }
    }

    /// Statuses an admin may move a vendor into.
    pub const fn is_admin_assignable(&self) -> bool {
        match self {
            VendorStatus::Pending => false,
            VendorStatus::Approved | VendorStatus::Rejected | VendorStatus::Suspended => true,
        }
    }
}

/// Payout destination for withdrawals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
}

#[derive(Debug, Clone)]
pub struct Vendor {
    pub id: VendorId,
    pub user_id: UserId,
    pub store_name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub status: VendorStatus,
    pub bank: Option<BankDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vendor {
    pub fn new(
        user_id: UserId,
        store_name: impl Into<String>,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let store_name = store_name.into().trim().to_string();
        Self {
            id: VendorId::new(),
            user_id,
            slug: unique_slug(&store_name),
            store_name,
            description,
            logo_url: None,
            status: VendorStatus::Pending,
            bank: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == VendorStatus::Approved
    }

    pub fn set_status(&mut self, status: VendorStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }
}
