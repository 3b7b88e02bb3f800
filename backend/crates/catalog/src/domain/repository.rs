//! Repository Traits
//!
//! Method names are unique across traits so one store can implement all of them.

use kernel::id::{CategoryId, ProductId, ReviewId, UserId, VendorId};
use kernel::pagination::PageQuery;

use crate::domain::entity::{Category, Product, ProductStatus, Review, Vendor};
use crate::error::CatalogResult;

/// Filters for product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub vendor_id: Option<VendorId>,
    /// Case-insensitive match on title or description
    pub search: Option<String>,
    /// `None` means any status
    pub status: Option<ProductStatus>,
}

impl ProductFilter {
    pub fn published() -> Self {
        Self {
            status: Some(ProductStatus::Published),
            ..Self::default()
        }
    }
}

#[trait_variant::make(VendorRepository: Send)]
pub trait LocalVendorRepository {
    /// Insert the vendor and an empty wallet, and promote the user's role
    async fn create_vendor(&self, vendor: &Vendor) -> CatalogResult<()>;

    async fn find_vendor(&self, id: &VendorId) -> CatalogResult<Option<Vendor>>;

    async fn find_vendor_by_user(&self, user_id: &UserId) -> CatalogResult<Option<Vendor>>;

    async fn update_vendor(&self, vendor: &Vendor) -> CatalogResult<()>;
}

#[trait_variant::make(CategoryRepository: Send)]
pub trait LocalCategoryRepository {
    async fn create_category(&self, category: &Category) -> CatalogResult<()>;

    async fn find_category(&self, id: &CategoryId) -> CatalogResult<Option<Category>>;

    async fn list_categories(&self) -> CatalogResult<Vec<Category>>;

    async fn update_category(&self, category: &Category) -> CatalogResult<()>;

    /// Returns true when a row was removed
    async fn delete_category(&self, id: &CategoryId) -> CatalogResult<bool>;
}

#[trait_variant::make(ProductRepository: Send)]
pub trait LocalProductRepository {
    async fn create_product(&self, product: &Product) -> CatalogResult<()>;

    async fn find_product(&self, id: &ProductId) -> CatalogResult<Option<Product>>;

    async fn update_product(&self, product: &Product) -> CatalogResult<()>;

    async fn delete_product(&self, id: &ProductId) -> CatalogResult<bool>;

    /// Page of products, newest first, with the total count
    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: &PageQuery,
    ) -> CatalogResult<(Vec<Product>, i64)>;
}

#[trait_variant::make(ReviewRepository: Send)]
pub trait LocalReviewRepository {
    /// True when the user has a paid order containing the product
    async fn has_purchased(&self, user_id: &UserId, product_id: &ProductId) -> CatalogResult<bool>;

    async fn find_review(&self, id: &ReviewId) -> CatalogResult<Option<Review>>;

    async fn review_exists(&self, user_id: &UserId, product_id: &ProductId) -> CatalogResult<bool>;

    /// Insert and refresh the product's rating summary atomically
    async fn create_review(&self, review: &Review) -> CatalogResult<()>;

    /// Delete and refresh the product's rating summary atomically
    async fn delete_review(&self, review: &Review) -> CatalogResult<()>;

    async fn list_reviews(
        &self,
        product_id: &ProductId,
        page: &PageQuery,
    ) -> CatalogResult<(Vec<Review>, i64)>;
}

/// Everything the catalog use cases need from one store.
pub trait CatalogStore:
    VendorRepository
    + CategoryRepository
    + ProductRepository
    + ReviewRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> CatalogStore for T where
    T: VendorRepository
        + CategoryRepository
        + ProductRepository
        + ReviewRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
