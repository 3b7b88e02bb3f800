//! Repository Traits
//!
//! Method names are unique across traits so one store can implement all of them.

use chrono::{DateTime, Utc};
use kernel::id::{OrderId, ProductId, UserId, VendorId, WithdrawalId};
use kernel::pagination::PageQuery;

use crate::domain::entity::{
    CompletedPayment, DownloadToken, Order, Payment, PurchasableProduct, Settlement,
    VendorAccount, VendorSale, Wallet, Withdrawal, WithdrawalDecision, WithdrawalStatus,
};
use crate::error::CommerceResult;

#[trait_variant::make(OrderRepository: Send)]
pub trait LocalOrderRepository {
    /// Published products of approved vendors among `ids`. Missing ids are skipped.
    async fn purchasable_products(&self, ids: &[ProductId]) -> CommerceResult<Vec<PurchasableProduct>>;

    /// Which of `ids` the user already holds through a paid order.
    async fn owned_products(&self, user_id: &UserId, ids: &[ProductId]) -> CommerceResult<Vec<ProductId>>;

    /// Insert the order with all its items.
    async fn create_order(&self, order: &Order) -> CommerceResult<()>;

    async fn find_order(&self, id: &OrderId) -> CommerceResult<Option<Order>>;

    async fn list_orders(&self, user_id: &UserId, page: &PageQuery) -> CommerceResult<(Vec<Order>, i64)>;

    async fn list_vendor_sales(
        &self,
        vendor_id: &VendorId,
        page: &PageQuery,
    ) -> CommerceResult<(Vec<VendorSale>, i64)>;

    async fn find_vendor_account(&self, user_id: &UserId) -> CommerceResult<Option<VendorAccount>>;
}

#[trait_variant::make(PaymentRepository: Send)]
pub trait LocalPaymentRepository {
    async fn create_payment(&self, payment: &Payment) -> CommerceResult<()>;

    async fn find_payment_by_reference(&self, reference: &str) -> CommerceResult<Option<Payment>>;

    /// In one transaction: mark the payment and its order paid, credit each
    /// vendor's wallet net of the platform fee, bump product sales counters
    /// and write buyer and vendor notifications.
    ///
    /// Only a pending payment transitions. `None` means it was already settled.
    async fn complete_payment(
        &self,
        reference: &str,
        settlement: &Settlement,
    ) -> CommerceResult<Option<CompletedPayment>>;

    /// Mark a pending payment and its order failed. `false` if it was not pending.
    async fn fail_payment(&self, reference: &str, now: DateTime<Utc>) -> CommerceResult<bool>;
}

/// Filters for withdrawal listings.
#[derive(Debug, Clone, Default)]
pub struct WithdrawalFilter {
    pub vendor_id: Option<VendorId>,
    pub status: Option<WithdrawalStatus>,
}

/// A processed withdrawal plus who to tell about it.
#[derive(Debug, Clone)]
pub struct SettledWithdrawal {
    pub withdrawal: Withdrawal,
    pub vendor_email: String,
    pub vendor_name: String,
    pub currency: String,
}

#[trait_variant::make(WalletRepository: Send)]
pub trait LocalWalletRepository {
    async fn find_wallet(&self, vendor_id: &VendorId) -> CommerceResult<Option<Wallet>>;

    /// Move the amount from available to pending and record the request.
    /// `false` when the available balance does not cover it.
    async fn request_withdrawal(&self, withdrawal: &Withdrawal) -> CommerceResult<bool>;

    async fn list_withdrawals(
        &self,
        filter: &WithdrawalFilter,
        page: &PageQuery,
    ) -> CommerceResult<(Vec<Withdrawal>, i64)>;

    /// Approve: pending funds leave the wallet. Reject: they return to the
    /// available balance. Either way the vendor is notified.
    async fn settle_withdrawal(
        &self,
        id: &WithdrawalId,
        decision: WithdrawalDecision,
        admin_id: &UserId,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> CommerceResult<SettledWithdrawal>;
}

/// Platform-wide counters for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformStats {
    pub users: i64,
    pub vendors: i64,
    pub pending_vendors: i64,
    pub products: i64,
    pub paid_orders: i64,
    pub revenue: i64,
    pub pending_withdrawals: i64,
}

#[trait_variant::make(StatsRepository: Send)]
pub trait LocalStatsRepository {
    async fn platform_stats(&self) -> CommerceResult<PlatformStats>;
}

#[trait_variant::make(DownloadRepository: Send)]
pub trait LocalDownloadRepository {
    /// Latest paid order of the user that contains the product.
    async fn paid_order_for(&self, user_id: &UserId, product_id: &ProductId) -> CommerceResult<Option<OrderId>>;

    /// Stored file URL, `None` when the product or its file is gone.
    async fn download_location(&self, product_id: &ProductId) -> CommerceResult<Option<String>>;

    /// Append a `download_completed` activity entry and bump the order
    /// line's download counter.
    async fn record_download(&self, token: &DownloadToken, now: DateTime<Utc>) -> CommerceResult<()>;
}

/// Storage for outstanding download tokens, keyed by the opaque token.
#[trait_variant::make(DownloadTokenStore: Send)]
pub trait LocalDownloadTokenStore {
    async fn get(&self, key: &str) -> Option<DownloadToken>;

    async fn set(&self, key: String, token: DownloadToken);

    async fn delete(&self, key: &str);

    /// Bump the redemption counter in place. `None` once the token is gone.
    async fn increment(&self, key: &str) -> Option<u32>;

    /// Remove every expired token. Returns how many were removed.
    async fn sweep(&self, now: DateTime<Utc>) -> usize;

    async fn len(&self) -> usize;
}

/// Everything the commerce handlers need from one store.
pub trait CommerceStore:
    OrderRepository
    + PaymentRepository
    + WalletRepository
    + StatsRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> CommerceStore for T where
    T: OrderRepository
        + PaymentRepository
        + WalletRepository
        + StatsRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
