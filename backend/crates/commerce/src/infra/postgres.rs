//! PostgreSQL Repository Implementation
//!
//! Payment completion and wallet movements each run in one transaction with
//! the affected payment or withdrawal row locked `FOR UPDATE`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use kernel::id::{OrderId, PaymentId, ProductId, UserId, VendorId, WalletId, WithdrawalId};
use kernel::pagination::PageQuery;
use notification::{Notification, NotificationKind, insert_notification};
use platform::mailer::templates::format_amount;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::entity::{
    CompletedPayment, DownloadToken, Order, OrderItem, OrderStatus, Payment, PaymentStatus,
    PayoutAccount, PurchasableProduct, Settlement, VendorAccount, VendorSale, Wallet, Withdrawal,
    WithdrawalDecision, WithdrawalStatus, split_earnings,
};
use crate::domain::repository::{
    DownloadRepository, OrderRepository, PaymentRepository, PlatformStats, SettledWithdrawal,
    StatsRepository, WalletRepository, WithdrawalFilter,
};
use crate::error::{CommerceError, CommerceResult};

const ORDER_COLUMNS: &str = "id, user_id, status, total, currency, paid_at, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, vendor_id, title, price, download_count";

const PAYMENT_COLUMNS: &str = "id, order_id, user_id, reference, amount, currency, status, \
     channel, paid_at, created_at, updated_at";

const WALLET_COLUMNS: &str = "id, vendor_id, balance, pending_balance, total_earned, \
     total_withdrawn, currency, updated_at";

const WITHDRAWAL_COLUMNS: &str = "id, vendor_id, amount, status, bank_name, account_number, \
     account_name, note, processed_by, processed_at, created_at";

/// PostgreSQL-backed commerce repository
#[derive(Clone)]
pub struct PgCommerceRepository {
    pool: PgPool,
}

impl PgCommerceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> CommerceResult<Vec<Order>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let items = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY created_at, id"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for item in items {
            grouped
                .entry(item.order_id)
                .or_default()
                .push(item.into_item());
        }
        rows.into_iter()
            .map(|row| {
                let items = grouped.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }
}

async fn order_items(conn: &mut PgConnection, order_id: Uuid) -> Result<Vec<OrderItem>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY created_at, id"
    ))
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(ItemRow::into_item).collect())
}

// ============================================================================
// Order Repository Implementation
// ============================================================================

impl OrderRepository for PgCommerceRepository {
    async fn purchasable_products(&self, ids: &[ProductId]) -> CommerceResult<Vec<PurchasableProduct>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_uuid()).collect();
        let rows = sqlx::query_as::<_, PurchasableRow>(
            r#"
            SELECT p.id, p.vendor_id, v.user_id AS owner_id, p.title, p.price, p.currency
            FROM products p JOIN vendors v ON v.id = p.vendor_id
            WHERE p.id = ANY($1) AND p.status = 'published' AND v.status = 'approved'
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        // Keep request order for stable order lines.
        let mut by_id: HashMap<Uuid, PurchasableRow> = rows.into_iter().map(|r| (r.id, r)).collect();
        Ok(ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .map(PurchasableRow::into_product)
            .collect())
    }

    async fn owned_products(&self, user_id: &UserId, ids: &[ProductId]) -> CommerceResult<Vec<ProductId>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_uuid()).collect();
        let owned: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT oi.product_id
            FROM order_items oi JOIN orders o ON o.id = oi.order_id
            WHERE o.user_id = $1 AND o.status = 'paid' AND oi.product_id = ANY($2)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(owned.into_iter().map(ProductId::from_uuid).collect())
    }

    async fn create_order(&self, order: &Order) -> CommerceResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, status, total, currency, paid_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.status.code())
        .bind(order.total)
        .bind(&order.currency)
        .bind(order.paid_at)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, vendor_id, title, price, download_count, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(item.id)
            .bind(order.id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(item.vendor_id.as_uuid())
            .bind(&item.title)
            .bind(item.price)
            .bind(item.download_count)
            .bind(order.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_order(&self, id: &OrderId) -> CommerceResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(self.attach_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_orders(&self, user_id: &UserId, page: &PageQuery) -> CommerceResult<(Vec<Order>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id.as_uuid())
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((self.attach_items(rows).await?, total))
    }

    async fn list_vendor_sales(
        &self,
        vendor_id: &VendorId,
        page: &PageQuery,
    ) -> CommerceResult<(Vec<VendorSale>, i64)> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM order_items oi JOIN orders o ON o.id = oi.order_id
            WHERE oi.vendor_id = $1 AND o.status = 'paid'
            "#,
        )
        .bind(vendor_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT oi.order_id, oi.product_id, oi.title, oi.price, o.currency,
                   u.name AS buyer_name, oi.download_count, o.paid_at
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            JOIN users u ON u.id = o.user_id
            WHERE oi.vendor_id = $1 AND o.status = 'paid'
            ORDER BY o.paid_at DESC NULLS LAST, oi.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(vendor_id.as_uuid())
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(SaleRow::into_sale).collect(), total))
    }

    async fn find_vendor_account(&self, user_id: &UserId) -> CommerceResult<Option<VendorAccount>> {
        let row = sqlx::query_as::<_, VendorAccountRow>(
            r#"
            SELECT id, user_id, store_name, bank_name, account_number, account_name
            FROM vendors WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(VendorAccountRow::into_account))
    }
}

// ============================================================================
// Payment Repository Implementation
// ============================================================================

impl PaymentRepository for PgCommerceRepository {
    async fn create_payment(&self, payment: &Payment) -> CommerceResult<()> {
        sqlx::query(&format!(
            "INSERT INTO payments ({PAYMENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(payment.id.as_uuid())
        .bind(payment.order_id.as_uuid())
        .bind(payment.user_id.as_uuid())
        .bind(&payment.reference)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.status.code())
        .bind(&payment.channel)
        .bind(payment.paid_at)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_payment_by_reference(&self, reference: &str) -> CommerceResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE reference = $1"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;
        row.map(PaymentRow::into_payment).transpose()
    }

    async fn complete_payment(
        &self,
        reference: &str,
        settlement: &Settlement,
    ) -> CommerceResult<Option<CompletedPayment>> {
        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE reference = $1 FOR UPDATE"
        ))
        .bind(reference)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CommerceError::PaymentNotFound)?
        .into_payment()?;
        if !payment.is_pending() {
            return Ok(None);
        }

        let now = Utc::now();
        sqlx::query(
            "UPDATE payments SET status = 'success', channel = $2, paid_at = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(payment.id.as_uuid())
        .bind(&settlement.channel)
        .bind(settlement.paid_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE orders SET status = 'paid', paid_at = $2, updated_at = $3 WHERE id = $1")
            .bind(payment.order_id.as_uuid())
            .bind(settlement.paid_at)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let items = order_items(&mut *tx, payment.order_id.into_uuid()).await?;
        let payouts = split_earnings(&items, settlement.fee_percent);
        for payout in &payouts {
            sqlx::query(
                r#"
                UPDATE wallets SET balance = balance + $2, total_earned = total_earned + $2, updated_at = $3
                WHERE vendor_id = $1
                "#,
            )
            .bind(payout.vendor_id.as_uuid())
            .bind(payout.net)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id.into_uuid()).collect();
        sqlx::query("UPDATE products SET sales_count = sales_count + 1 WHERE id = ANY($1)")
            .bind(&product_ids)
            .execute(&mut *tx)
            .await?;

        let (buyer_email, buyer_name): (String, String) =
            sqlx::query_as("SELECT email, name FROM users WHERE id = $1")
                .bind(payment.user_id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;

        let receipt = Notification::new(
            payment.user_id,
            NotificationKind::OrderPaid,
            "Payment successful",
            format!(
                "Your payment of {} was received. Your downloads are ready.",
                format_amount(payment.amount, &payment.currency)
            ),
            now,
        )
        .with_data(json!({ "orderId": payment.order_id, "reference": payment.reference }));
        insert_notification(&mut *tx, &receipt).await?;

        let vendor_ids: Vec<Uuid> = payouts.iter().map(|p| p.vendor_id.into_uuid()).collect();
        let owners: HashMap<Uuid, Uuid> = sqlx::query_as::<_, (Uuid, Uuid)>(
            "SELECT id, user_id FROM vendors WHERE id = ANY($1)",
        )
        .bind(&vendor_ids)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();
        for payout in &payouts {
            let Some(owner) = owners.get(&payout.vendor_id.into_uuid()) else {
                continue;
            };
            let sold = items.iter().filter(|i| i.vendor_id == payout.vendor_id).count();
            let sale = Notification::new(
                UserId::from_uuid(*owner),
                NotificationKind::NewSale,
                "New sale",
                format!(
                    "You sold {sold} item(s). {} was added to your wallet.",
                    format_amount(payout.net, &payment.currency)
                ),
                now,
            )
            .with_data(json!({
                "orderId": payment.order_id,
                "gross": payout.gross,
                "fee": payout.fee,
                "net": payout.net,
            }));
            insert_notification(&mut *tx, &sale).await?;
        }

        tx.commit().await?;

        Ok(Some(CompletedPayment {
            reference: payment.reference,
            order_id: payment.order_id,
            buyer_email,
            buyer_name,
            lines: items.into_iter().map(|i| (i.title, i.price)).collect(),
            total: payment.amount,
            currency: payment.currency,
        }))
    }

    async fn fail_payment(&self, reference: &str, now: DateTime<Utc>) -> CommerceResult<bool> {
        let mut tx = self.pool.begin().await?;

        let order_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE payments SET status = 'failed', updated_at = $2
            WHERE reference = $1 AND status = 'pending'
            RETURNING order_id
            "#,
        )
        .bind(reference)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(order_id) = order_id else {
            return Ok(false);
        };

        sqlx::query(
            "UPDATE orders SET status = 'failed', updated_at = $2 WHERE id = $1 AND status = 'pending'",
        )
        .bind(order_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}

// ============================================================================
// Wallet Repository Implementation
// ============================================================================

impl WalletRepository for PgCommerceRepository {
    async fn find_wallet(&self, vendor_id: &VendorId) -> CommerceResult<Option<Wallet>> {
        let row = sqlx::query_as::<_, WalletRow>(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets WHERE vendor_id = $1"
        ))
        .bind(vendor_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(WalletRow::into_wallet))
    }

    async fn request_withdrawal(&self, withdrawal: &Withdrawal) -> CommerceResult<bool> {
        let mut tx = self.pool.begin().await?;

        let moved = sqlx::query(
            r#"
            UPDATE wallets
            SET balance = balance - $2, pending_balance = pending_balance + $2, updated_at = $3
            WHERE vendor_id = $1 AND balance >= $2
            "#,
        )
        .bind(withdrawal.vendor_id.as_uuid())
        .bind(withdrawal.amount)
        .bind(withdrawal.created_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if moved == 0 {
            return Ok(false);
        }

        sqlx::query(&format!(
            "INSERT INTO withdrawals ({WITHDRAWAL_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(withdrawal.id.as_uuid())
        .bind(withdrawal.vendor_id.as_uuid())
        .bind(withdrawal.amount)
        .bind(withdrawal.status.code())
        .bind(&withdrawal.account.bank_name)
        .bind(&withdrawal.account.account_number)
        .bind(&withdrawal.account.account_name)
        .bind(&withdrawal.note)
        .bind(withdrawal.processed_by.map(|id| id.into_uuid()))
        .bind(withdrawal.processed_at)
        .bind(withdrawal.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn list_withdrawals(
        &self,
        filter: &WithdrawalFilter,
        page: &PageQuery,
    ) -> CommerceResult<(Vec<Withdrawal>, i64)> {
        let vendor_id = filter.vendor_id.map(|id| id.into_uuid());
        let status = filter.status.map(|s| s.code());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM withdrawals \
             WHERE ($1::uuid IS NULL OR vendor_id = $1) AND ($2::text IS NULL OR status = $2)",
        )
        .bind(vendor_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, WithdrawalRow>(&format!(
            "SELECT {WITHDRAWAL_COLUMNS} FROM withdrawals \
             WHERE ($1::uuid IS NULL OR vendor_id = $1) AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        ))
        .bind(vendor_id)
        .bind(status)
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(WithdrawalRow::into_withdrawal)
            .collect::<CommerceResult<Vec<_>>>()?;
        Ok((items, total))
    }

    async fn settle_withdrawal(
        &self,
        id: &WithdrawalId,
        decision: WithdrawalDecision,
        admin_id: &UserId,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> CommerceResult<SettledWithdrawal> {
        let mut tx = self.pool.begin().await?;

        let mut withdrawal = sqlx::query_as::<_, WithdrawalRow>(&format!(
            "SELECT {WITHDRAWAL_COLUMNS} FROM withdrawals WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CommerceError::WithdrawalNotFound)?
        .into_withdrawal()?;
        if !withdrawal.is_pending() {
            return Err(CommerceError::WithdrawalProcessed);
        }

        let wallet_update = match decision {
            WithdrawalDecision::Approve => {
                "UPDATE wallets SET pending_balance = pending_balance - $2, \
                 total_withdrawn = total_withdrawn + $2, updated_at = $3 WHERE vendor_id = $1"
            }
            WithdrawalDecision::Reject => {
                "UPDATE wallets SET pending_balance = pending_balance - $2, \
                 balance = balance + $2, updated_at = $3 WHERE vendor_id = $1"
            }
        };
        sqlx::query(wallet_update)
            .bind(withdrawal.vendor_id.as_uuid())
            .bind(withdrawal.amount)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        withdrawal.status = decision.outcome();
        withdrawal.note = note.map(str::to_string);
        withdrawal.processed_by = Some(*admin_id);
        withdrawal.processed_at = Some(now);
        sqlx::query(
            r#"
            UPDATE withdrawals SET status = $2, note = $3, processed_by = $4, processed_at = $5
            WHERE id = $1
            "#,
        )
        .bind(withdrawal.id.as_uuid())
        .bind(withdrawal.status.code())
        .bind(&withdrawal.note)
        .bind(admin_id.as_uuid())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let (vendor_user, vendor_email, vendor_name, currency): (Uuid, String, String, Option<String>) =
            sqlx::query_as(
                r#"
                SELECT u.id, u.email, u.name, w.currency
                FROM vendors v
                JOIN users u ON u.id = v.user_id
                LEFT JOIN wallets w ON w.vendor_id = v.id
                WHERE v.id = $1
                "#,
            )
            .bind(withdrawal.vendor_id.as_uuid())
            .fetch_one(&mut *tx)
            .await?;
        let currency = currency.unwrap_or_else(|| "NGN".to_string());

        let notice = Notification::new(
            UserId::from_uuid(vendor_user),
            NotificationKind::Withdrawal,
            format!("Withdrawal {}", withdrawal.status.code()),
            format!(
                "Your withdrawal of {} is {}.",
                format_amount(withdrawal.amount, &currency),
                withdrawal.status.code()
            ),
            now,
        )
        .with_data(json!({ "withdrawalId": withdrawal.id, "status": withdrawal.status.code() }));
        insert_notification(&mut *tx, &notice).await?;

        tx.commit().await?;
        Ok(SettledWithdrawal {
            withdrawal,
            vendor_email,
            vendor_name,
            currency,
        })
    }
}

// ============================================================================
// Stats Repository Implementation
// ============================================================================

impl StatsRepository for PgCommerceRepository {
    async fn platform_stats(&self) -> CommerceResult<PlatformStats> {
        let (users, vendors, pending_vendors, products, paid_orders, revenue, pending_withdrawals): (
            i64,
            i64,
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM vendors),
                (SELECT COUNT(*) FROM vendors WHERE status = 'pending'),
                (SELECT COUNT(*) FROM products WHERE status <> 'archived'),
                (SELECT COUNT(*) FROM orders WHERE status = 'paid'),
                (SELECT COALESCE(SUM(total), 0)::BIGINT FROM orders WHERE status = 'paid'),
                (SELECT COUNT(*) FROM withdrawals WHERE status = 'pending')
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(PlatformStats {
            users,
            vendors,
            pending_vendors,
            products,
            paid_orders,
            revenue,
            pending_withdrawals,
        })
    }
}

// ============================================================================
// Download Repository Implementation
// ============================================================================

impl DownloadRepository for PgCommerceRepository {
    async fn paid_order_for(&self, user_id: &UserId, product_id: &ProductId) -> CommerceResult<Option<OrderId>> {
        let id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT o.id FROM orders o JOIN order_items oi ON oi.order_id = o.id
            WHERE o.user_id = $1 AND oi.product_id = $2 AND o.status = 'paid'
            ORDER BY o.paid_at DESC NULLS LAST
            LIMIT 1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(id.map(OrderId::from_uuid))
    }

    async fn download_location(&self, product_id: &ProductId) -> CommerceResult<Option<String>> {
        let url: Option<Option<String>> = sqlx::query_scalar("SELECT file_url FROM products WHERE id = $1")
            .bind(product_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(url.flatten())
    }

    async fn record_download(&self, token: &DownloadToken, now: DateTime<Utc>) -> CommerceResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO activity_logs (id, user_id, action, entity_type, entity_id, metadata, created_at)
            VALUES ($1, $2, 'download_completed', 'product', $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(token.user_id.as_uuid())
        .bind(token.product_id.as_uuid())
        .bind(json!({ "orderId": token.order_id }))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE order_items SET download_count = download_count + 1 WHERE order_id = $1 AND product_id = $2",
        )
        .bind(token.order_id.as_uuid())
        .bind(token.product_id.as_uuid())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

// ============================================================================
// Database Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    status: String,
    total: i64,
    currency: String,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> CommerceResult<Order> {
        let status = OrderStatus::from_code(&self.status)
            .ok_or_else(|| CommerceError::Internal(format!("Invalid order status: {}", self.status)))?;
        Ok(Order {
            id: OrderId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            status,
            items,
            total: self.total,
            currency: self.currency,
            paid_at: self.paid_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    vendor_id: Uuid,
    title: String,
    price: i64,
    download_count: i32,
}

impl ItemRow {
    fn into_item(self) -> OrderItem {
        OrderItem {
            id: self.id,
            product_id: ProductId::from_uuid(self.product_id),
            vendor_id: VendorId::from_uuid(self.vendor_id),
            title: self.title,
            price: self.price,
            download_count: self.download_count,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PurchasableRow {
    id: Uuid,
    vendor_id: Uuid,
    owner_id: Uuid,
    title: String,
    price: i64,
    currency: String,
}

impl PurchasableRow {
    fn into_product(self) -> PurchasableProduct {
        PurchasableProduct {
            id: ProductId::from_uuid(self.id),
            vendor_id: VendorId::from_uuid(self.vendor_id),
            owner_id: UserId::from_uuid(self.owner_id),
            title: self.title,
            price: self.price,
            currency: self.currency,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SaleRow {
    order_id: Uuid,
    product_id: Uuid,
    title: String,
    price: i64,
    currency: String,
    buyer_name: String,
    download_count: i32,
    paid_at: Option<DateTime<Utc>>,
}

impl SaleRow {
    fn into_sale(self) -> VendorSale {
        VendorSale {
            order_id: OrderId::from_uuid(self.order_id),
            product_id: ProductId::from_uuid(self.product_id),
            title: self.title,
            price: self.price,
            currency: self.currency,
            buyer_name: self.buyer_name,
            download_count: self.download_count,
            paid_at: self.paid_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VendorAccountRow {
    id: Uuid,
    user_id: Uuid,
    store_name: String,
    bank_name: Option<String>,
    account_number: Option<String>,
    account_name: Option<String>,
}

impl VendorAccountRow {
    fn into_account(self) -> VendorAccount {
        let bank = match (self.bank_name, self.account_number, self.account_name) {
            (Some(bank_name), Some(account_number), Some(account_name)) => Some(PayoutAccount {
                bank_name,
                account_number,
                account_name,
            }),
            _ => None,
        };
        VendorAccount {
            vendor_id: VendorId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            store_name: self.store_name,
            bank,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    order_id: Uuid,
    user_id: Uuid,
    reference: String,
    amount: i64,
    currency: String,
    status: String,
    channel: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_payment(self) -> CommerceResult<Payment> {
        let status = PaymentStatus::from_code(&self.status)
            .ok_or_else(|| CommerceError::Internal(format!("Invalid payment status: {}", self.status)))?;
        Ok(Payment {
            id: PaymentId::from_uuid(self.id),
            order_id: OrderId::from_uuid(self.order_id),
            user_id: UserId::from_uuid(self.user_id),
            reference: self.reference,
            amount: self.amount,
            currency: self.currency,
            status,
            channel: self.channel,
            paid_at: self.paid_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct WalletRow {
    id: Uuid,
    vendor_id: Uuid,
    balance: i64,
    pending_balance: i64,
    total_earned: i64,
    total_withdrawn: i64,
    currency: String,
    updated_at: DateTime<Utc>,
}

impl WalletRow {
    fn into_wallet(self) -> Wallet {
        Wallet {
            id: WalletId::from_uuid(self.id),
            vendor_id: VendorId::from_uuid(self.vendor_id),
            balance: self.balance,
            pending_balance: self.pending_balance,
            total_earned: self.total_earned,
            total_withdrawn: self.total_withdrawn,
            currency: self.currency,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct WithdrawalRow {
    id: Uuid,
    vendor_id: Uuid,
    amount: i64,
    status: String,
    bank_name: String,
    account_number: String,
    account_name: String,
    note: Option<String>,
    processed_by: Option<Uuid>,
    processed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl WithdrawalRow {
    fn into_withdrawal(self) -> CommerceResult<Withdrawal> {
        let status = WithdrawalStatus::from_code(&self.status).ok_or_else(|| {
            CommerceError::Internal(format!("Invalid withdrawal status: {}", self.status))
        })?;
        Ok(Withdrawal {
            id: WithdrawalId::from_uuid(self.id),
            vendor_id: VendorId::from_uuid(self.vendor_id),
            amount: self.amount,
            status,
            account: PayoutAccount {
                bank_name: self.bank_name,
                account_number: self.account_number,
                account_name: self.account_name,
            },
            note: self.note,
            processed_by: self.processed_by.map(UserId::from_uuid),
            processed_at: self.processed_at,
            created_at: self.created_at,
        })
    }
}
