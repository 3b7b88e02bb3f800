//! Data Transfer Objects

use chrono::{DateTime, Utc};
use kernel::AppError;
use kernel::id::{OrderId, ProductId, VendorId, WalletId, WithdrawalId};
use kernel::pagination::PageQuery;
use kernel::validate::{Validate, Validator};
use serde::{Deserialize, Serialize};

use crate::application::{DashboardStats, InitializedPayment, IssuedDownload, VerifiedPayment};
use crate::domain::entity::{
    Order, OrderItem, OrderStatus, PaymentStatus, PayoutAccount, VendorSale, Wallet, Withdrawal,
    WithdrawalDecision, WithdrawalStatus,
};

/// Largest number of distinct products in one order.
pub const MAX_ORDER_ITEMS: usize = 50;

// ============================================================================
// Orders
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<ProductId>,
}

impl Validate for CreateOrderRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::new()
            .check(!self.items.is_empty(), "items must contain at least one product")
            .check(
                self.items.len() <= MAX_ORDER_ITEMS,
                format!("items must contain at most {MAX_ORDER_ITEMS} products"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: ProductId,
    pub vendor_id: VendorId,
    pub title: String,
    pub price: i64,
    pub download_count: i32,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            vendor_id: item.vendor_id,
            title: item.title,
            price: item.price,
            download_count: item.download_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: OrderId,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
    pub total: i64,
    pub currency: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            status: o.status,
            items: o.items.into_iter().map(OrderItemResponse::from).collect(),
            total: o.total,
            currency: o.currency,
            paid_at: o.paid_at,
            created_at: o.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleResponse {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub title: String,
    pub price: i64,
    pub currency: String,
    pub buyer_name: String,
    pub download_count: i32,
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<VendorSale> for SaleResponse {
    fn from(s: VendorSale) -> Self {
        Self {
            order_id: s.order_id,
            product_id: s.product_id,
            title: s.title,
            price: s.price,
            currency: s.currency,
            buyer_name: s.buyer_name,
            download_count: s.download_count,
            paid_at: s.paid_at,
        }
    }
}

// ============================================================================
// Payments
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializePaymentRequest {
    pub order_id: OrderId,
    pub callback_url: Option<String>,
}

impl Validate for InitializePaymentRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::new()
            .check(
                self.callback_url
                    .as_deref()
                    .is_none_or(|u| u.starts_with("https://") || u.starts_with("http://")),
                "callbackUrl must be an http(s) URL",
            )
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializePaymentResponse {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

impl From<InitializedPayment> for InitializePaymentResponse {
    fn from(p: InitializedPayment) -> Self {
        Self {
            authorization_url: p.authorization_url,
            access_code: p.access_code,
            reference: p.reference,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub reference: String,
    pub order_id: OrderId,
    pub status: PaymentStatus,
}

impl From<VerifiedPayment> for VerifyPaymentResponse {
    fn from(p: VerifiedPayment) -> Self {
        Self {
            reference: p.reference,
            order_id: p.order_id,
            status: p.status,
        }
    }
}

// ============================================================================
// Wallet
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    pub id: WalletId,
    pub vendor_id: VendorId,
    pub balance: i64,
    pub pending_balance: i64,
    pub total_earned: i64,
    pub total_withdrawn: i64,
    pub currency: String,
    pub updated_at: DateTime<Utc>,
}

impl From<Wallet> for WalletResponse {
    fn from(w: Wallet) -> Self {
        Self {
            id: w.id,
            vendor_id: w.vendor_id,
            balance: w.balance,
            pending_balance: w.pending_balance,
            total_earned: w.total_earned,
            total_withdrawn: w.total_withdrawn,
            currency: w.currency,
            updated_at: w.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    /// Minor units
    pub amount: i64,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_name: Option<String>,
}

impl WithdrawalRequest {
    /// Bank details are only taken as a complete set.
    pub fn account(&self) -> Option<PayoutAccount> {
        match (&self.bank_name, &self.account_number, &self.account_name) {
            (Some(bank_name), Some(account_number), Some(account_name)) => Some(PayoutAccount {
                bank_name: bank_name.trim().to_string(),
                account_number: account_number.trim().to_string(),
                account_name: account_name.trim().to_string(),
            }),
            _ => None,
        }
    }
}

impl Validate for WithdrawalRequest {
    fn validate(&self) -> Result<(), AppError> {
        let bank_fields = [&self.bank_name, &self.account_number, &self.account_name]
            .iter()
            .filter(|f| f.is_some())
            .count();

        let mut v = Validator::new();
        v.check(self.amount > 0, "amount must be positive").check(
            bank_fields == 0 || bank_fields == 3,
            "bankName, accountNumber and accountName must be given together",
        );
        if let Some(number) = &self.account_number {
            let number = number.trim();
            v.check(
                number.len() == 10 && number.chars().all(|c| c.is_ascii_digit()),
                "accountNumber must be 10 digits",
            );
        }
        v.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<WithdrawalStatus>,
}

impl WithdrawalListQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalResponse {
    pub id: WithdrawalId,
    pub vendor_id: VendorId,
    pub amount: i64,
    pub status: WithdrawalStatus,
    pub bank: PayoutAccount,
    pub note: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalResponse {
    fn from(w: Withdrawal) -> Self {
        Self {
            id: w.id,
            vendor_id: w.vendor_id,
            amount: w.amount,
            status: w.status,
            bank: w.account,
            note: w.note,
            processed_at: w.processed_at,
            created_at: w.created_at,
        }
    }
}

// ============================================================================
// Admin
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessWithdrawalRequest {
    pub action: WithdrawalDecision,
    pub note: Option<String>,
}

impl Validate for ProcessWithdrawalRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::new()
            .check(
                self.note.as_ref().is_none_or(|n| n.len() <= 500),
                "note must be at most 500 characters",
            )
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_users: i64,
    pub total_vendors: i64,
    pub pending_vendors: i64,
    pub total_products: i64,
    pub total_orders: i64,
    pub total_revenue: i64,
    pub platform_fees: i64,
    pub pending_withdrawals: i64,
}

impl From<DashboardStats> for StatsResponse {
    fn from(s: DashboardStats) -> Self {
        Self {
            total_users: s.counters.users,
            total_vendors: s.counters.vendors,
            pending_vendors: s.counters.pending_vendors,
            total_products: s.counters.products,
            total_orders: s.counters.paid_orders,
            total_revenue: s.counters.revenue,
            platform_fees: s.platform_fees,
            pending_withdrawals: s.counters.pending_withdrawals,
        }
    }
}

// ============================================================================
// Downloads
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub download_url: String,
    pub expires_at: DateTime<Utc>,
}

impl DownloadResponse {
    /// `prefix` is where the redeem route is mounted.
    pub fn new(prefix: &str, issued: IssuedDownload) -> Self {
        Self {
            download_url: format!("{}/{}", prefix.trim_end_matches('/'), issued.token),
            expires_at: issued.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_item_bounds() {
        let empty = CreateOrderRequest { items: Vec::new() };
        assert!(empty.validate().is_err());

        let too_many = CreateOrderRequest {
            items: (0..=MAX_ORDER_ITEMS).map(|_| ProductId::new()).collect(),
        };
        assert!(too_many.validate().is_err());

        let one = CreateOrderRequest {
            items: vec![ProductId::new()],
        };
        assert!(one.validate().is_ok());
    }

    #[test]
    fn test_withdrawal_bank_all_or_nothing() {
        let partial: WithdrawalRequest =
            serde_json::from_str(r#"{"amount":150000,"bankName":"GTBank"}"#).unwrap();
        assert!(partial.validate().is_err());
        assert!(partial.account().is_none());

        let full: WithdrawalRequest = serde_json::from_str(
            r#"{"amount":150000,"bankName":"GTBank","accountNumber":"0123456789","accountName":"Ada"}"#,
        )
        .unwrap();
        assert!(full.validate().is_ok());
        assert_eq!(full.account().unwrap().account_number, "0123456789");

        let negative: WithdrawalRequest = serde_json::from_str(r#"{"amount":-5}"#).unwrap();
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_download_url() {
        let issued = IssuedDownload {
            token: "ab12".into(),
            expires_at: Utc::now(),
        };
        let body = DownloadResponse::new("/api/products/download/", issued);
        assert_eq!(body.download_url, "/api/products/download/ab12");
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("downloadUrl").is_some());
        assert!(json.get("expiresAt").is_some());
    }

    #[test]
    fn test_process_action_parsing() {
        let req: ProcessWithdrawalRequest =
            serde_json::from_str(r#"{"action":"reject","note":"Account name mismatch"}"#).unwrap();
        assert_eq!(req.action, WithdrawalDecision::Reject);
        assert!(serde_json::from_str::<ProcessWithdrawalRequest>(r#"{"action":"hold"}"#).is_err());
    }
}
