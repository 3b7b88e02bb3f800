//! Vendor Use Cases
//!
//! Opening a store, storefront edits, public storefronts and moderation.

use std::sync::Arc;

use auth::CurrentUser;
use chrono::Utc;
use kernel::AppError;
use kernel::id::{UserId, VendorId};
use kernel::pagination::{Page, PageQuery};

use crate::domain::entity::{BankDetails, Product, Vendor, VendorStatus};
use crate::domain::repository::{ProductFilter, ProductRepository, VendorRepository};
use crate::error::{CatalogError, CatalogResult};

pub struct BecomeVendorUseCase<V>
where
    V: VendorRepository,
{
    vendors: Arc<V>,
}

impl<V> BecomeVendorUseCase<V>
where
    V: VendorRepository,
{
    pub fn new(vendors: Arc<V>) -> Self {
        Self { vendors }
    }

    /// New vendors start `pending` until an admin approves them.
    pub async fn execute(
        &self,
        user: &CurrentUser,
        store_name: String,
        description: Option<String>,
    ) -> CatalogResult<Vendor> {
        if user.is_admin() {
            return Err(AppError::bad_request("Administrators cannot open a store").into());
        }
        if self.vendors.find_vendor_by_user(&user.id).await?.is_some() {
            return Err(CatalogError::VendorExists);
        }

        let vendor = Vendor::new(user.id, store_name, description, Utc::now());
        self.vendors.create_vendor(&vendor).await?;

        tracing::info!(user_id = %user.id, vendor_id = %vendor.id, "Vendor profile created");
        Ok(vendor)
    }
}

pub struct GetMyVendorUseCase<V>
where
    V: VendorRepository,
{
    vendors: Arc<V>,
}

impl<V> GetMyVendorUseCase<V>
where
    V: VendorRepository,
{
    pub fn new(vendors: Arc<V>) -> Self {
        Self { vendors }
    }

    pub async fn execute(&self, user_id: &UserId) -> CatalogResult<Vendor> {
        self.vendors
            .find_vendor_by_user(user_id)
            .await?
            .ok_or(CatalogError::VendorNotFound)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateVendorInput {
    pub store_name: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub bank: Option<BankDetails>,
}

pub struct UpdateVendorUseCase<V>
where
    V: VendorRepository,
{
    vendors: Arc<V>,
}

impl<V> UpdateVendorUseCase<V>
where
    V: VendorRepository,
{
    pub fn new(vendors: Arc<V>) -> Self {
        Self { vendors }
    }

    /// The slug is kept when the store is renamed so links stay valid.
    pub async fn execute(&self, user_id: &UserId, input: UpdateVendorInput) -> CatalogResult<Vendor> {
        let mut vendor = self
            .vendors
            .find_vendor_by_user(user_id)
            .await?
            .ok_or(CatalogError::VendorNotFound)?;

        if let Some(name) = input.store_name {
            vendor.store_name = name.trim().to_string();
        }
        if let Some(description) = input.description {
            vendor.description = Some(description);
        }
        if let Some(logo_url) = input.logo_url {
            vendor.logo_url = Some(logo_url);
        }
        if let Some(bank) = input.bank {
            vendor.bank = Some(bank);
        }
        vendor.updated_at = Utc::now();

        self.vendors.update_vendor(&vendor).await?;
        Ok(vendor)
    }
}

pub struct GetPublicVendorUseCase<V>
where
    V: VendorRepository,
{
    vendors: Arc<V>,
}

impl<V> GetPublicVendorUseCase<V>
where
    V: VendorRepository,
{
    pub fn new(vendors: Arc<V>) -> Self {
        Self { vendors }
    }

    /// Only approved storefronts are public.
    pub async fn execute(&self, id: &VendorId) -> CatalogResult<Vendor> {
        self.vendors
            .find_vendor(id)
            .await?
            .filter(Vendor::is_approved)
            .ok_or(CatalogError::VendorNotFound)
    }
}

pub struct VendorProductsUseCase<S>
where
    S: VendorRepository + ProductRepository,
{
    store: Arc<S>,
}

impl<S> VendorProductsUseCase<S>
where
    S: VendorRepository + ProductRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, id: &VendorId, page: PageQuery) -> CatalogResult<Page<Product>> {
        let vendor = GetPublicVendorUseCase::new(self.store.clone()).execute(id).await?;
        let filter = ProductFilter {
            vendor_id: Some(vendor.id),
            ..ProductFilter::published()
        };
        let (products, total) = self.store.list_products(&filter, &page).await?;
        Ok(Page::new(products, &page, total))
    }
}

pub struct SetVendorStatusUseCase<V>
where
    V: VendorRepository,
{
    vendors: Arc<V>,
}

impl<V> SetVendorStatusUseCase<V>
where
    V: VendorRepository,
{
    pub fn new(vendors: Arc<V>) -> Self {
        Self { vendors }
    }

    pub async fn execute(
        &self,
        admin_id: &UserId,
        id: &VendorId,
        status: VendorStatus,
    ) -> CatalogResult<Vendor> {
        if !status.is_admin_assignable() {
            return Err(CatalogError::InvalidStatus(status.code().to_string()));
        }
        let mut vendor = self
            .vendors
            .find_vendor(id)
            .await?
            .ok_or(CatalogError::VendorNotFound)?;
        vendor.set_status(status, Utc::now());
        self.vendors.update_vendor(&vendor).await?;

        tracing::info!(
            admin_id = %admin_id,
            vendor_id = %id,
            status = status.code(),
            "Vendor status changed"
        );
        Ok(vendor)
    }
}
