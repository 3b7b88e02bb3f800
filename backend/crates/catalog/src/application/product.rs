//! Product Use Cases

use std::sync::Arc;

use auth::CurrentUser;
use chrono::Utc;
use kernel::id::{CategoryId, ProductId, VendorId};
use kernel::pagination::{Page, PageQuery};
use platform::storage::{ObjectStorage, ResourceKind};

use crate::domain::entity::{NewProduct, Product, ProductStatus, StoredFile, Vendor};
use crate::domain::repository::{
    CategoryRepository, ProductFilter, ProductRepository, VendorRepository,
};
use crate::error::{CatalogError, CatalogResult};

pub struct ListProductsUseCase<P>
where
    P: ProductRepository,
{
    products: Arc<P>,
}

impl<P> ListProductsUseCase<P>
where
    P: ProductRepository,
{
    pub fn new(products: Arc<P>) -> Self {
        Self { products }
    }

    pub async fn execute(&self, filter: ProductFilter, page: PageQuery) -> CatalogResult<Page<Product>> {
        let (products, total) = self.products.list_products(&filter, &page).await?;
        Ok(Page::new(products, &page, total))
    }
}

pub struct GetProductUseCase<P>
where
    P: ProductRepository,
{
    products: Arc<P>,
}

impl<P> GetProductUseCase<P>
where
    P: ProductRepository,
{
    pub fn new(products: Arc<P>) -> Self {
        Self { products }
    }

    /// Hidden products answer 404 rather than 403 so drafts are not discoverable.
    pub async fn execute(&self, id: &ProductId, viewer: Option<&CurrentUser>) -> CatalogResult<Product> {
        let product = self
            .products
            .find_product(id)
            .await?
            .ok_or(CatalogError::ProductNotFound)?;
        if !product.visible_to(viewer.map(|u| (u.id, u.is_admin()))) {
            return Err(CatalogError::ProductNotFound);
        }
        Ok(product)
    }
}

/// Load a product the caller may modify.
pub(crate) async fn owned_product<P>(
    products: &P,
    id: &ProductId,
    user: &CurrentUser,
) -> CatalogResult<Product>
where
    P: ProductRepository,
{
    let product = products
        .find_product(id)
        .await?
        .ok_or(CatalogError::ProductNotFound)?;
    if !user.owns_or_admin(&product.owner_id) {
        return Err(CatalogError::NotOwner);
    }
    Ok(product)
}

#[derive(Debug, Clone)]
pub struct CreateProductInput {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub currency: Option<String>,
    pub category_id: Option<CategoryId>,
    pub status: Option<ProductStatus>,
    /// Admins list on behalf of a vendor
    pub vendor_id: Option<VendorId>,
}

pub struct CreateProductUseCase<S>
where
    S: VendorRepository + CategoryRepository + ProductRepository,
{
    store: Arc<S>,
    default_currency: String,
}

impl<S> CreateProductUseCase<S>
where
    S: VendorRepository + CategoryRepository + ProductRepository,
{
    pub fn new(store: Arc<S>, default_currency: String) -> Self {
        Self {
            store,
            default_currency,
        }
    }

    pub async fn execute(&self, user: &CurrentUser, input: CreateProductInput) -> CatalogResult<Product> {
        let vendor = self.acting_vendor(user, input.vendor_id).await?;
        let status = input.status.unwrap_or_default();
        ensure_can_publish(&vendor, status, user)?;

        if let Some(category_id) = &input.category_id {
            self.store
                .find_category(category_id)
                .await?
                .ok_or(CatalogError::CategoryNotFound)?;
        }

        let product = Product::new(
            vendor.id,
            vendor.user_id,
            NewProduct {
                title: input.title,
                description: input.description,
                price: input.price,
                currency: input.currency.unwrap_or_else(|| self.default_currency.clone()),
                category_id: input.category_id,
                status,
            },
            Utc::now(),
        );
        self.store.create_product(&product).await?;

        tracing::info!(
            product_id = %product.id,
            vendor_id = %vendor.id,
            status = status.code(),
            "Product created"
        );
        Ok(product)
    }

    async fn acting_vendor(&self, user: &CurrentUser, on_behalf: Option<VendorId>) -> CatalogResult<Vendor> {
        match on_behalf {
            Some(vendor_id) if user.is_admin() => self
                .store
                .find_vendor(&vendor_id)
                .await?
                .ok_or(CatalogError::VendorNotFound),
            _ => self
                .store
                .find_vendor_by_user(&user.id)
                .await?
                .ok_or(CatalogError::NotAVendor),
        }
    }
}

fn ensure_can_publish(vendor: &Vendor, status: ProductStatus, user: &CurrentUser) -> CatalogResult<()> {
    if status == ProductStatus::Published && !vendor.is_approved() && !user.is_admin() {
        return Err(CatalogError::VendorNotApproved(vendor.status.code()));
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProductInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub category_id: Option<CategoryId>,
    pub status: Option<ProductStatus>,
}

pub struct UpdateProductUseCase<S>
where
    S: VendorRepository + CategoryRepository + ProductRepository,
{
    store: Arc<S>,
}

impl<S> UpdateProductUseCase<S>
where
    S: VendorRepository + CategoryRepository + ProductRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        user: &CurrentUser,
        id: &ProductId,
        input: UpdateProductInput,
    ) -> CatalogResult<Product> {
        let mut product = owned_product(&*self.store, id, user).await?;

        if let Some(status) = input.status {
            if status != product.status {
                let vendor = self
                    .store
                    .find_vendor(&product.vendor_id)
                    .await?
                    .ok_or(CatalogError::VendorNotFound)?;
                ensure_can_publish(&vendor, status, user)?;
                product.status = status;
            }
        }
        if let Some(category_id) = input.category_id {
            self.store
                .find_category(&category_id)
                .await?
                .ok_or(CatalogError::CategoryNotFound)?;
            product.category_id = Some(category_id);
        }
        if let Some(title) = input.title {
            product.retitle(&title);
        }
        if let Some(description) = input.description {
            product.description = description;
        }
        if let Some(price) = input.price {
            product.price = price;
        }
        product.updated_at = Utc::now();

        self.store.update_product(&product).await?;
        Ok(product)
    }
}

pub struct DeleteProductUseCase<P>
where
    P: ProductRepository,
{
    products: Arc<P>,
    storage: ObjectStorage,
}

impl<P> DeleteProductUseCase<P>
where
    P: ProductRepository,
{
    pub fn new(products: Arc<P>, storage: ObjectStorage) -> Self {
        Self { products, storage }
    }

    /// Products that were sold are archived instead of deleted.
    pub async fn execute(&self, user: &CurrentUser, id: &ProductId) -> CatalogResult<ProductStatus> {
        let mut product = owned_product(&*self.products, id, user).await?;

        if product.sales_count > 0 {
            product.status = ProductStatus::Archived;
            product.updated_at = Utc::now();
            self.products.update_product(&product).await?;
            tracing::info!(product_id = %id, "Sold product archived instead of deleted");
            return Ok(ProductStatus::Archived);
        }

        self.products.delete_product(id).await?;
        if let Some(file) = &product.file {
            remove_stored(&self.storage, file, ResourceKind::Raw).await;
        }
        if let Some(thumbnail) = &product.thumbnail {
            remove_stored(&self.storage, thumbnail, ResourceKind::Image).await;
        }
        tracing::info!(product_id = %id, user_id = %user.id, "Product deleted");
        Ok(product.status)
    }
}

/// Storage cleanup never fails the request.
pub(crate) async fn remove_stored(storage: &ObjectStorage, file: &StoredFile, kind: ResourceKind) {
    if !storage.is_enabled() {
        return;
    }
    if let Err(e) = storage.delete(&file.public_id, kind).await {
        tracing::warn!(error = %e, public_id = %file.public_id, "Stored file cleanup failed");
    }
}
