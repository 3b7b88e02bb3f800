//! Notification entity

use chrono::{DateTime, Utc};
use kernel::id::{NotificationId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderPaid,
    NewSale,
    Withdrawal,
    VendorStatus,
    System,
}

impl NotificationKind {
    pub const fn code(&self) -> &'static str {
        match self {
            NotificationKind::OrderPaid => "order_paid",
            NotificationKind::NewSale => "new_sale",
            NotificationKind::Withdrawal => "withdrawal",
            NotificationKind::VendorStatus => "vendor_status",
            NotificationKind::System => "system",
        }
    }

    /// Unknown codes read back as `System`.
    pub fn from_code(code: &str) -> Self {
        match code {
            "order_paid" => NotificationKind::OrderPaid,
            "new_sale" => NotificationKind::NewSale,
            "withdrawal" => NotificationKind::Withdrawal,
            "vendor_status" => NotificationKind::VendorStatus,
            _ => NotificationKind::System,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            data: serde_json::Value::Object(Default::default()),
            read_at: None,
            created_at: now,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// Keeps the first read time.
    pub fn mark_read(&mut self, now: DateTime<Utc>) {
        self.read_at.get_or_insert(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_codes() {
        for kind in [
            NotificationKind::OrderPaid,
            NotificationKind::NewSale,
            NotificationKind::Withdrawal,
            NotificationKind::VendorStatus,
            NotificationKind::System,
        ] {
            assert_eq!(NotificationKind::from_code(kind.code()), kind);
        }
        assert_eq!(NotificationKind::from_code("legacy"), NotificationKind::System);
    }

    #[test]
    fn test_mark_read_keeps_first_time() {
        let t0 = Utc::now();
        let mut n = Notification::new(UserId::new(), NotificationKind::NewSale, "Sale", "Sold", t0)
            .with_data(json!({"orderId": "o1"}));
        assert!(!n.is_read());

        n.mark_read(t0 + chrono::Duration::minutes(1));
        n.mark_read(t0 + chrono::Duration::minutes(5));
        assert_eq!(n.read_at, Some(t0 + chrono::Duration::minutes(1)));
        assert_eq!(n.data["orderId"], "o1");
    }
}
