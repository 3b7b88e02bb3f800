//! Order Use Cases

use std::collections::HashSet;
use std::sync::Arc;

use auth::CurrentUser;
use chrono::Utc;
use kernel::id::{OrderId, ProductId, UserId};
use kernel::pagination::{Page, PageQuery};

use crate::domain::entity::{Order, VendorSale};
use crate::domain::repository::OrderRepository;
use crate::error::{CommerceError, CommerceResult};

pub struct PlaceOrderUseCase<O>
where
    O: OrderRepository,
{
    orders: Arc<O>,
}

impl<O> PlaceOrderUseCase<O>
where
    O: OrderRepository,
{
    pub fn new(orders: Arc<O>) -> Self {
        Self { orders }
    }

    /// Duplicate ids collapse to one line. Prices come from the catalog,
    /// never from the request.
    pub async fn execute(&self, user: &CurrentUser, items: Vec<ProductId>) -> CommerceResult<Order> {
        let mut seen = HashSet::with_capacity(items.len());
        let ids: Vec<ProductId> = items.into_iter().filter(|id| seen.insert(*id)).collect();

        let products = self.orders.purchasable_products(&ids).await?;
        if products.len() != ids.len() {
            return Err(CommerceError::ProductUnavailable);
        }
        if products.iter().any(|p| p.owner_id == user.id) {
            return Err(CommerceError::OwnProduct);
        }
        let currency = match products.first() {
            Some(first) => first.currency.clone(),
            None => return Err(CommerceError::ProductUnavailable),
        };
        if products.iter().any(|p| p.currency != currency) {
            return Err(CommerceError::CurrencyMismatch);
        }
        if !self.orders.owned_products(&user.id, &ids).await?.is_empty() {
            return Err(CommerceError::AlreadyOwned);
        }

        let order = Order::place(user.id, products, currency, Utc::now());
        self.orders.create_order(&order).await?;

        tracing::info!(
            user_id = %user.id,
            order_id = %order.id,
            items = order.items.len(),
            total = order.total,
            "Order placed"
        );
        Ok(order)
    }
}

pub struct ListOrdersUseCase<O>
where
    O: OrderRepository,
{
    orders: Arc<O>,
}

impl<O> ListOrdersUseCase<O>
where
    O: OrderRepository,
{
    pub fn new(orders: Arc<O>) -> Self {
        Self { orders }
    }

    pub async fn execute(&self, user_id: &UserId, page: PageQuery) -> CommerceResult<Page<Order>> {
        let (orders, total) = self.orders.list_orders(user_id, &page).await?;
        Ok(Page::new(orders, &page, total))
    }
}

pub struct GetOrderUseCase<O>
where
    O: OrderRepository,
{
    orders: Arc<O>,
}

impl<O> GetOrderUseCase<O>
where
    O: OrderRepository,
{
    pub fn new(orders: Arc<O>) -> Self {
        Self { orders }
    }

    pub async fn execute(&self, id: &OrderId, user: &CurrentUser) -> CommerceResult<Order> {
        let order = self
            .orders
            .find_order(id)
            .await?
            .ok_or(CommerceError::OrderNotFound)?;
        if !user.owns_or_admin(&order.user_id) {
            return Err(CommerceError::NotOrderOwner);
        }
        Ok(order)
    }
}

pub struct VendorSalesUseCase<O>
where
    O: OrderRepository,
{
    orders: Arc<O>,
}

impl<O> VendorSalesUseCase<O>
where
    O: OrderRepository,
{
    pub fn new(orders: Arc<O>) -> Self {
        Self { orders }
    }

    /// Paid lines of the caller's store, newest first.
    pub async fn execute(&self, user_id: &UserId, page: PageQuery) -> CommerceResult<Page<VendorSale>> {
        let vendor = self
            .orders
            .find_vendor_account(user_id)
            .await?
            .ok_or(CommerceError::NotAVendor)?;
        let (sales, total) = self.orders.list_vendor_sales(&vendor.vendor_id, &page).await?;
        Ok(Page::new(sales, &page, total))
    }
}
