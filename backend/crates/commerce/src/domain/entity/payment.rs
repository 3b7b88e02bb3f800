//! Payment Entity

use chrono::{DateTime, Utc};
use kernel::id::{OrderId, PaymentId, UserId};
use platform::crypto::random_hex;
use serde::{Deserialize, Serialize};

use crate::domain::entity::Order;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub const fn code(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "pending" => Some(PaymentStatus::Pending),
            "success" => Some(PaymentStatus::Success),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub user_id: UserId,
    /// Gateway transaction reference, unique
    pub reference: String,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub channel: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(order: &Order, reference: String, now: DateTime<Utc>) -> Self {
        Self {
            id: PaymentId::new(),
            order_id: order.id,
            user_id: order.user_id,
            reference,
            amount: order.total,
            currency: order.currency.clone(),
            status: PaymentStatus::Pending,
            channel: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `MKT-` followed by 20 uppercase hex characters.
    pub fn new_reference() -> String {
        format!("MKT-{}", random_hex(10).to_ascii_uppercase())
    }

    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }
}

/// What the gateway confirmed, applied when a payment completes.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub channel: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub fee_percent: u8,
}

/// Everything the receipt needs once a payment has gone through.
#[derive(Debug, Clone)]
pub struct CompletedPayment {
    pub reference: String,
    pub order_id: OrderId,
    pub buyer_email: String,
    pub buyer_name: String,
    pub lines: Vec<(String, i64)>,
    pub total: i64,
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_format() {
        let a = Payment::new_reference();
        let b = Payment::new_reference();
        assert_eq!(a.len(), 24);
        assert!(a.starts_with("MKT-"));
        assert!(a[4..].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_new_payment_mirrors_order() {
        let order = Order::place(UserId::new(), Vec::new(), "NGN".into(), Utc::now());
        let payment = Payment::new(&order, "MKT-1".into(), Utc::now());
        assert_eq!(payment.order_id, order.id);
        assert_eq!(payment.user_id, order.user_id);
        assert_eq!(payment.amount, 0);
        assert!(payment.is_pending());
    }
}
