//! Order Entity

use chrono::{DateTime, Utc};
use kernel::id::{OrderId, ProductId, UserId, VendorId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Cancelled,
}

impl OrderStatus {
    pub const fn code(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Failed => "failed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "pending" => Some(OrderStatus::Pending),
            "paid" => Some(OrderStatus::Paid),
            "failed" => Some(OrderStatus::Failed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

/// A published product from an approved vendor, priced at lookup time.
#[derive(Debug, Clone)]
pub struct PurchasableProduct {
    pub id: ProductId,
    pub vendor_id: VendorId,
    /// The vendor's user account
    pub owner_id: UserId,
    pub title: String,
    pub price: i64,
    pub currency: String,
}

/// One product line. Title and price are frozen at purchase time.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: ProductId,
    pub vendor_id: VendorId,
    pub title: String,
    /// Minor units
    pub price: i64,
    pub download_count: i32,
}

impl From<PurchasableProduct> for OrderItem {
    fn from(product: PurchasableProduct) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id: product.id,
            vendor_id: product.vendor_id,
            title: product.title,
            price: product.price,
            download_count: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    /// Minor units, always the sum of item prices
    pub total: i64,
    pub currency: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// A pending order over `products`. The total is computed here, never
    /// taken from the client.
    pub fn place(
        user_id: UserId,
        products: Vec<PurchasableProduct>,
        currency: String,
        now: DateTime<Utc>,
    ) -> Self {
        let items: Vec<OrderItem> = products.into_iter().map(OrderItem::from).collect();
        let total = items.iter().map(|item| item.price).sum();
        Self {
            id: OrderId::new(),
            user_id,
            status: OrderStatus::Pending,
            items,
            total,
            currency,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.product_id == product_id)
    }
}

/// A paid line as seen by the vendor who sold it.
#[derive(Debug, Clone)]
pub struct VendorSale {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub title: String,
    pub price: i64,
    pub currency: String,
    pub buyer_name: String,
    pub download_count: i32,
    pub paid_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: i64, vendor_id: VendorId) -> PurchasableProduct {
        PurchasableProduct {
            id: ProductId::new(),
            vendor_id,
            owner_id: UserId::new(),
            title: format!("Item {price}"),
            price,
            currency: "NGN".into(),
        }
    }

    #[test]
    fn test_total_is_sum_of_lines() {
        let vendor = VendorId::new();
        let lines = vec![product(250_000, vendor), product(100_050, vendor)];
        let first = lines[0].id;

        let order = Order::place(UserId::new(), lines, "NGN".into(), Utc::now());
        assert_eq!(order.total, 350_050);
        assert!(order.is_pending());
        assert!(order.contains(&first));
        assert!(!order.contains(&ProductId::new()));
        assert!(order.items.iter().all(|i| i.download_count == 0));
    }

    #[test]
    fn test_status_codes() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Failed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(OrderStatus::from_code("refunded"), None);
    }
}
