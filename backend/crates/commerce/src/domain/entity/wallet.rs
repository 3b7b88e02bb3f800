//! Wallet and Withdrawal Entities

use chrono::{DateTime, Utc};
use kernel::id::{UserId, VendorId, WalletId, WithdrawalId};
use serde::{Deserialize, Serialize};

/// Vendor balances in minor units. Available funds sit in `balance`;
/// requested withdrawals move to `pending_balance` until an admin settles them.
#[derive(Debug, Clone)]
pub struct Wallet {
    pub id: WalletId,
    pub vendor_id: VendorId,
    pub balance: i64,
    pub pending_balance: i64,
    pub total_earned: i64,
    pub total_withdrawn: i64,
    pub currency: String,
    pub updated_at: DateTime<Utc>,
}

/// Where a payout goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutAccount {
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
}

/// The seller side of a user account.
#[derive(Debug, Clone)]
pub struct VendorAccount {
    pub vendor_id: VendorId,
    pub user_id: UserId,
    pub store_name: String,
    pub bank: Option<PayoutAccount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    #[default]
    Pending,
    Completed,
    Rejected,
}

impl WithdrawalStatus {
    pub const fn code(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Completed => "completed",
            WithdrawalStatus::Rejected => "rejected",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "pending" => Some(WithdrawalStatus::Pending),
            "completed" => Some(WithdrawalStatus::Completed),
            "rejected" => Some(WithdrawalStatus::Rejected),
            _ => None,
        }
    }
}

/// Admin verdict on a pending withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalDecision {
    Approve,
    Reject,
}

impl WithdrawalDecision {
    pub const fn outcome(&self) -> WithdrawalStatus {
        match self {
            WithdrawalDecision::Approve => WithdrawalStatus::Completed,
            WithdrawalDecision::Reject => WithdrawalStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Withdrawal {
    pub id: WithdrawalId,
    pub vendor_id: VendorId,
    pub amount: i64,
    pub status: WithdrawalStatus,
    pub account: PayoutAccount,
    pub note: Option<String>,
    pub processed_by: Option<UserId>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Withdrawal {
    pub fn new(vendor_id: VendorId, amount: i64, account: PayoutAccount, now: DateTime<Utc>) -> Self {
        Self {
            id: WithdrawalId::new(),
            vendor_id,
            amount,
            status: WithdrawalStatus::Pending,
            account,
            note: None,
            processed_by: None,
            processed_at: None,
            created_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == WithdrawalStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_outcomes() {
        assert_eq!(WithdrawalDecision::Approve.outcome(), WithdrawalStatus::Completed);
        assert_eq!(WithdrawalDecision::Reject.outcome(), WithdrawalStatus::Rejected);
        let parsed: WithdrawalDecision = serde_json::from_str(r#""approve""#).unwrap();
        assert_eq!(parsed, WithdrawalDecision::Approve);
    }

    #[test]
    fn test_new_withdrawal_is_pending() {
        let account = PayoutAccount {
            bank_name: "First Bank".into(),
            account_number: "0123456789".into(),
            account_name: "Ada Books".into(),
        };
        let w = Withdrawal::new(VendorId::new(), 150_000, account, Utc::now());
        assert!(w.is_pending());
        assert!(w.processed_at.is_none());
        assert_eq!(WithdrawalStatus::from_code(w.status.code()), Some(w.status));
    }
}
