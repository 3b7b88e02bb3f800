//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{CategoryId, ProductId, ReviewId, UserId, VendorId};
use kernel::pagination::{PageQuery, search_pattern};
use sqlx::{PgConnection, PgPool, QueryBuilder};
use uuid::Uuid;

use crate::domain::entity::{
    BankDetails, Category, Product, ProductStatus, RatingSummary, Review, StoredFile, Vendor,
    VendorStatus,
};
use crate::domain::repository::{
    CategoryRepository, ProductFilter, ProductRepository, ReviewRepository, VendorRepository,
};
use crate::error::{CatalogError, CatalogResult};

const VENDOR_COLUMNS: &str = "id, user_id, store_name, slug, description, logo_url, status, \
     bank_name, account_number, account_name, created_at, updated_at";

const CATEGORY_COLUMNS: &str = "id, name, slug, description, created_at, updated_at";

const PRODUCT_SELECT: &str = "SELECT p.id, p.vendor_id, v.user_id AS owner_id, p.category_id, \
     p.title, p.slug, p.description, p.price, p.currency, p.status, \
     p.file_url, p.file_public_id, p.file_name, p.file_size, p.file_type, \
     p.thumbnail_url, p.thumbnail_public_id, p.rating_avg, p.rating_count, p.sales_count, \
     p.created_at, p.updated_at \
     FROM products p JOIN vendors v ON v.id = p.vendor_id";

const REVIEW_SELECT: &str = "SELECT r.id, r.product_id, r.user_id, r.rating, r.comment, \
     u.name AS author_name, r.created_at \
     FROM reviews r LEFT JOIN users u ON u.id = r.user_id";

/// PostgreSQL-backed catalog repository
#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

// ============================================================================
// Vendor Repository Implementation
// ============================================================================

impl VendorRepository for PgCatalogRepository {
    async fn create_vendor(&self, vendor: &Vendor) -> CatalogResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO vendors (
                id, user_id, store_name, slug, description, logo_url, status,
                bank_name, account_number, account_name, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(vendor.id.as_uuid())
        .bind(vendor.user_id.as_uuid())
        .bind(&vendor.store_name)
        .bind(&vendor.slug)
        .bind(&vendor.description)
        .bind(&vendor.logo_url)
        .bind(vendor.status.code())
        .bind(vendor.bank.as_ref().map(|b| b.bank_name.as_str()))
        .bind(vendor.bank.as_ref().map(|b| b.account_number.as_str()))
        .bind(vendor.bank.as_ref().map(|b| b.account_name.as_str()))
        .bind(vendor.created_at)
        .bind(vendor.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CatalogError::VendorExists
            } else {
                CatalogError::Database(e)
            }
        })?;

        sqlx::query("INSERT INTO wallets (id, vendor_id, updated_at) VALUES ($1, $2, $3)")
            .bind(Uuid::new_v4())
            .bind(vendor.id.as_uuid())
            .bind(vendor.created_at)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE users SET role = 'vendor', updated_at = $2 WHERE id = $1 AND role = 'customer'",
        )
        .bind(vendor.user_id.as_uuid())
        .bind(vendor.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_vendor(&self, id: &VendorId) -> CatalogResult<Option<Vendor>> {
        let row = sqlx::query_as::<_, VendorRow>(&format!(
            "SELECT {VENDOR_COLUMNS} FROM vendors WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(VendorRow::into_vendor).transpose()
    }

    async fn find_vendor_by_user(&self, user_id: &UserId) -> CatalogResult<Option<Vendor>> {
        let row = sqlx::query_as::<_, VendorRow>(&format!(
            "SELECT {VENDOR_COLUMNS} FROM vendors WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(VendorRow::into_vendor).transpose()
    }

    async fn update_vendor(&self, vendor: &Vendor) -> CatalogResult<()> {
        sqlx::query(
            r#"
            UPDATE vendors SET
                store_name = $2, description = $3, logo_url = $4, status = $5,
                bank_name = $6, account_number = $7, account_name = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(vendor.id.as_uuid())
        .bind(&vendor.store_name)
        .bind(&vendor.description)
        .bind(&vendor.logo_url)
        .bind(vendor.status.code())
        .bind(vendor.bank.as_ref().map(|b| b.bank_name.as_str()))
        .bind(vendor.bank.as_ref().map(|b| b.account_number.as_str()))
        .bind(vendor.bank.as_ref().map(|b| b.account_name.as_str()))
        .bind(vendor.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// ============================================================================
// Category Repository Implementation
// ============================================================================

impl CategoryRepository for PgCatalogRepository {
    async fn create_category(&self, category: &Category) -> CatalogResult<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(category_error)?;
        Ok(())
    }

    async fn find_category(&self, id: &CategoryId) -> CatalogResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(CategoryRow::into_category))
    }

    async fn list_categories(&self) -> CatalogResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CategoryRow::into_category).collect())
    }

    async fn update_category(&self, category: &Category) -> CatalogResult<()> {
        sqlx::query(
            "UPDATE categories SET name = $2, slug = $3, description = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(category_error)?;
        Ok(())
    }

    async fn delete_category(&self, id: &CategoryId) -> CatalogResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn category_error(err: sqlx::Error) -> CatalogError {
    if is_unique_violation(&err) {
        CatalogError::CategoryExists
    } else {
        CatalogError::Database(err)
    }
}

// ============================================================================
// Product Repository Implementation
// ============================================================================

impl ProductRepository for PgCatalogRepository {
    async fn create_product(&self, product: &Product) -> CatalogResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, vendor_id, category_id, title, slug, description, price, currency, status,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.vendor_id.as_uuid())
        .bind(product.category_id.map(CategoryId::into_uuid))
        .bind(&product.title)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.currency)
        .bind(product.status.code())
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_product(&self, id: &ProductId) -> CatalogResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(ProductRow::into_product).transpose()
    }

    async fn update_product(&self, product: &Product) -> CatalogResult<()> {
        sqlx::query(
            r#"
            UPDATE products SET
                category_id = $2, title = $3, slug = $4, description = $5, price = $6,
                status = $7, file_url = $8, file_public_id = $9, file_name = $10,
                file_size = $11, file_type = $12, thumbnail_url = $13,
                thumbnail_public_id = $14, updated_at = $15
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.category_id.map(CategoryId::into_uuid))
        .bind(&product.title)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.status.code())
        .bind(product.file.as_ref().map(|f| f.url.as_str()))
        .bind(product.file.as_ref().map(|f| f.public_id.as_str()))
        .bind(&product.file_name)
        .bind(product.file_size)
        .bind(&product.file_type)
        .bind(product.thumbnail.as_ref().map(|f| f.url.as_str()))
        .bind(product.thumbnail.as_ref().map(|f| f.public_id.as_str()))
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_product(&self, id: &ProductId) -> CatalogResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: &PageQuery,
    ) -> CatalogResult<(Vec<Product>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM products p WHERE TRUE");
        push_product_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::new(format!("{PRODUCT_SELECT} WHERE TRUE"));
        push_product_filter(&mut query, filter);
        query
            .push(" ORDER BY p.created_at DESC LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await?;
        let products = rows
            .into_iter()
            .map(ProductRow::into_product)
            .collect::<CatalogResult<Vec<_>>>()?;
        Ok((products, total))
    }
}

fn push_product_filter(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &ProductFilter) {
    if let Some(status) = filter.status {
        query.push(" AND p.status = ").push_bind(status.code());
    }
    if let Some(category_id) = filter.category_id {
        query.push(" AND p.category_id = ").push_bind(category_id.into_uuid());
    }
    if let Some(vendor_id) = filter.vendor_id {
        query.push(" AND p.vendor_id = ").push_bind(vendor_id.into_uuid());
    }
    if let Some(pattern) = filter.search.as_deref().and_then(search_pattern) {
        query
            .push(" AND (p.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

// ============================================================================
// Review Repository Implementation
// ============================================================================

impl ReviewRepository for PgCatalogRepository {
    async fn has_purchased(&self, user_id: &UserId, product_id: &ProductId) -> CatalogResult<bool> {
        let purchased: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM order_items oi
                JOIN orders o ON o.id = oi.order_id
                WHERE o.user_id = $1 AND oi.product_id = $2 AND o.status = 'paid'
            )
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(product_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(purchased)
    }

    async fn find_review(&self, id: &ReviewId) -> CatalogResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!("{REVIEW_SELECT} WHERE r.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ReviewRow::into_review))
    }

    async fn review_exists(&self, user_id: &UserId, product_id: &ProductId) -> CatalogResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM reviews WHERE user_id = $1 AND product_id = $2)",
        )
        .bind(user_id.as_uuid())
        .bind(product_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_review(&self, review: &Review) -> CatalogResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO reviews (id, product_id, user_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(review.id.as_uuid())
        .bind(review.product_id.as_uuid())
        .bind(review.user_id.as_uuid())
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CatalogError::AlreadyReviewed
            } else {
                CatalogError::Database(e)
            }
        })?;

        refresh_rating(&mut *tx, &review.product_id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_review(&self, review: &Review) -> CatalogResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review.id.as_uuid())
            .execute(&mut *tx)
            .await?;
        refresh_rating(&mut *tx, &review.product_id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_reviews(
        &self,
        product_id: &ProductId,
        page: &PageQuery,
    ) -> CatalogResult<(Vec<Review>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE product_id = $1")
            .bind(product_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "{REVIEW_SELECT} WHERE r.product_id = $1 ORDER BY r.created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(product_id.as_uuid())
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok((rows.into_iter().map(ReviewRow::into_review).collect(), total))
    }
}

/// Recompute the product's rating summary from its reviews.
async fn refresh_rating(conn: &mut PgConnection, product_id: &ProductId) -> CatalogResult<()> {
    let ratings: Vec<i16> = sqlx::query_scalar("SELECT rating FROM reviews WHERE product_id = $1")
        .bind(product_id.as_uuid())
        .fetch_all(&mut *conn)
        .await?;
    let summary = RatingSummary::from_ratings(&ratings);

    sqlx::query("UPDATE products SET rating_avg = $2, rating_count = $3 WHERE id = $1")
        .bind(product_id.as_uuid())
        .bind(summary.average)
        .bind(summary.count)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// ============================================================================
// Database Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct VendorRow {
    id: Uuid,
    user_id: Uuid,
    store_name: String,
    slug: String,
    description: Option<String>,
    logo_url: Option<String>,
    status: String,
    bank_name: Option<String>,
    account_number: Option<String>,
    account_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VendorRow {
    fn into_vendor(self) -> CatalogResult<Vendor> {
        let status = VendorStatus::from_code(&self.status)
            .ok_or_else(|| CatalogError::Internal(format!("Invalid vendor status: {}", self.status)))?;
        let bank = match (self.bank_name, self.account_number, self.account_name) {
            (Some(bank_name), Some(account_number), Some(account_name)) => Some(BankDetails {
                bank_name,
                account_number,
                account_name,
            }),
            _ => None,
        };

        Ok(Vendor {
            id: VendorId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            store_name: self.store_name,
            slug: self.slug,
            description: self.description,
            logo_url: self.logo_url,
            status,
            bank,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CategoryRow {
    fn into_category(self) -> Category {
        Category {
            id: CategoryId::from_uuid(self.id),
            name: self.name,
            slug: self.slug,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    vendor_id: Uuid,
    owner_id: Uuid,
    category_id: Option<Uuid>,
    title: String,
    slug: String,
    description: String,
    price: i64,
    currency: String,
    status: String,
    file_url: Option<String>,
    file_public_id: Option<String>,
    file_name: Option<String>,
    file_size: Option<i64>,
    file_type: Option<String>,
    thumbnail_url: Option<String>,
    thumbnail_public_id: Option<String>,
    rating_avg: f64,
    rating_count: i32,
    sales_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn stored(url: Option<String>, public_id: Option<String>) -> Option<StoredFile> {
    url.map(|url| StoredFile {
        url,
        public_id: public_id.unwrap_or_default(),
    })
}

impl ProductRow {
    fn into_product(self) -> CatalogResult<Product> {
        let status = ProductStatus::from_code(&self.status).ok_or_else(|| {
            CatalogError::Internal(format!("Invalid product status: {}", self.status))
        })?;

        Ok(Product {
            id: ProductId::from_uuid(self.id),
            vendor_id: VendorId::from_uuid(self.vendor_id),
            owner_id: UserId::from_uuid(self.owner_id),
            category_id: self.category_id.map(CategoryId::from_uuid),
            title: self.title,
            slug: self.slug,
            description: self.description,
            price: self.price,
            currency: self.currency,
            status,
            file: stored(self.file_url, self.file_public_id),
            file_name: self.file_name,
            file_size: self.file_size,
            file_type: self.file_type,
            thumbnail: stored(self.thumbnail_url, self.thumbnail_public_id),
            rating_avg: self.rating_avg,
            rating_count: self.rating_count,
            sales_count: self.sales_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    product_id: Uuid,
    user_id: Uuid,
    rating: i16,
    comment: Option<String>,
    author_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl ReviewRow {
    fn into_review(self) -> Review {
        Review {
            id: ReviewId::from_uuid(self.id),
            product_id: ProductId::from_uuid(self.product_id),
            user_id: UserId::from_uuid(self.user_id),
            rating: self.rating,
            comment: self.comment,
            author_name: self.author_name,
            created_at: self.created_at,
        }
    }
}
