//! Data Transfer Objects

use chrono::{DateTime, Utc};
use kernel::AppError;
use kernel::id::{CategoryId, ProductId, ReviewId, UserId, VendorId};
use kernel::pagination::PageQuery;
use kernel::validate::{Validate, Validator};
use serde::{Deserialize, Serialize};

use crate::domain::entity::{
    BankDetails, Category, Product, ProductStatus, Review, Vendor, VendorStatus,
};

// ============================================================================
// Vendors
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVendorRequest {
    pub store_name: String,
    pub description: Option<String>,
}

impl Validate for CreateVendorRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::new()
            .length("storeName", self.store_name.trim(), 2, 100)
            .check(
                self.description.as_ref().is_none_or(|d| d.len() <= 2000),
                "description must be at most 2000 characters",
            )
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVendorRequest {
    pub store_name: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_name: Option<String>,
}

impl UpdateVendorRequest {
    /// Bank details are only taken as a complete set.
    pub fn bank(&self) -> Option<BankDetails> {
        match (&self.bank_name, &self.account_number, &self.account_name) {
            (Some(bank_name), Some(account_number), Some(account_name)) => Some(BankDetails {
                bank_name: bank_name.trim().to_string(),
                account_number: account_number.trim().to_string(),
                account_name: account_name.trim().to_string(),
            }),
            _ => None,
        }
    }
}

impl Validate for UpdateVendorRequest {
    fn validate(&self) -> Result<(), AppError> {
        let bank_fields = [&self.bank_name, &self.account_number, &self.account_name]
            .iter()
            .filter(|f| f.is_some())
            .count();

        let mut v = Validator::new();
        if let Some(name) = &self.store_name {
            v.length("storeName", name.trim(), 2, 100);
        }
        if let Some(url) = &self.logo_url {
            v.check(url.starts_with("https://"), "logoUrl must be an https URL");
        }
        v.check(
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

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorStatusRequest {
    pub status: VendorStatus,
}

impl Validate for VendorStatusRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::new()
            .check(
                self.status.is_admin_assignable(),
                "status must be approved, rejected or suspended",
            )
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorResponse {
    pub id: VendorId,
    pub user_id: UserId,
    pub store_name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub status: VendorStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<BankDetails>,
    pub created_at: DateTime<Utc>,
}

impl VendorResponse {
    /// Storefront view without payout details.
    pub fn public(vendor: Vendor) -> Self {
        Self {
            bank: None,
            ..Self::from(vendor)
        }
    }
}

impl From<Vendor> for VendorResponse {
    fn from(v: Vendor) -> Self {
        Self {
            id: v.id,
            user_id: v.user_id,
            store_name: v.store_name,
            slug: v.slug,
            description: v.description,
            logo_url: v.logo_url,
            status: v.status,
            bank: v.bank,
            created_at: v.created_at,
        }
    }
}

// ============================================================================
// Categories
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

impl Validate for CreateCategoryRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::new()
            .length("name", self.name.trim(), 2, 60)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Validate for UpdateCategoryRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.length("name", name.trim(), 2, 60);
        }
        v.finish()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            created_at: c.created_at,
        }
    }
}

// ============================================================================
// Products
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<CategoryId>,
    pub vendor: Option<VendorId>,
    pub search: Option<String>,
}

impl ProductListQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Minor units
    pub price: i64,
    pub currency: Option<String>,
    pub category_id: Option<CategoryId>,
    pub status: Option<ProductStatus>,
    pub vendor_id: Option<VendorId>,
}

fn is_currency(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())
}

impl Validate for CreateProductRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::new()
            .length("title", self.title.trim(), 3, 200)
            .check(self.description.len() <= 10_000, "description is too long")
            .check(self.price >= 0, "price must not be negative")
            .check(
                self.currency.as_deref().is_none_or(is_currency),
                "currency must be a 3-letter code",
            )
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub category_id: Option<CategoryId>,
    pub status: Option<ProductStatus>,
}

impl Validate for UpdateProductRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(title) = &self.title {
            v.length("title", title.trim(), 3, 200);
        }
        if let Some(description) = &self.description {
            v.check(description.len() <= 10_000, "description is too long");
        }
        if let Some(price) = self.price {
            v.check(price >= 0, "price must not be negative");
        }
        v.finish()
    }
}

/// Listing view. The file location is never exposed; buyers get download links.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: ProductId,
    pub vendor_id: VendorId,
    pub category_id: Option<CategoryId>,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub price: i64,
    pub currency: String,
    pub status: ProductStatus,
    pub has_file: bool,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub file_type: Option<String>,
    pub thumbnail_url: Option<String>,
    pub rating_avg: f64,
    pub rating_count: i32,
    pub sales_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            vendor_id: p.vendor_id,
            category_id: p.category_id,
            title: p.title,
            slug: p.slug,
            description: p.description,
            price: p.price,
            currency: p.currency,
            status: p.status,
            has_file: p.file.is_some(),
            file_name: p.file_name,
            file_size: p.file_size,
            file_type: p.file_type,
            thumbnail_url: p.thumbnail.map(|t| t.url),
            rating_avg: p.rating_avg,
            rating_count: p.rating_count,
            sales_count: p.sales_count,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

// ============================================================================
// Reviews
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub product_id: ProductId,
    pub rating: i16,
    pub comment: Option<String>,
}

impl Validate for CreateReviewRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::new()
            .range("rating", self.rating, 1, 5)
            .check(
                self.comment.as_ref().is_none_or(|c| c.len() <= 2000),
                "comment must be at most 2000 characters",
            )
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub author_name: Option<String>,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            product_id: r.product_id,
            user_id: r.user_id,
            author_name: r.author_name,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_details_all_or_nothing() {
        let partial = UpdateVendorRequest {
            bank_name: Some("GTBank".into()),
            ..Default::default()
        };
        assert!(partial.validate().is_err());
        assert!(partial.bank().is_none());

        let full = UpdateVendorRequest {
            bank_name: Some("GTBank".into()),
            account_number: Some("0123456789".into()),
            account_name: Some("Pixel Forge Ltd".into()),
            ..Default::default()
        };
        assert!(full.validate().is_ok());
        assert_eq!(full.bank().unwrap().account_number, "0123456789");

        let short = UpdateVendorRequest {
            account_number: Some("12345".into()),
            ..full
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_product_request_rules() {
        let req: CreateProductRequest = serde_json::from_str(
            r#"{"title":"Icon Pack","price":250000,"currency":"NGN","status":"published"}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.status, Some(ProductStatus::Published));

        let bad: CreateProductRequest =
            serde_json::from_str(r#"{"title":"x","price":-1,"currency":"naira"}"#).unwrap();
        let err = bad.validate().unwrap_err();
        assert!(err.message().contains("title"));
        assert!(err.message().contains("price"));
        assert!(err.message().contains("currency"));
    }

    #[test]
    fn test_review_rating_bounds() {
        for (rating, ok) in [(0, false), (1, true), (5, true), (6, false)] {
            let req = CreateReviewRequest {
                product_id: ProductId::new(),
                rating,
                comment: None,
            };
            assert_eq!(req.validate().is_ok(), ok, "rating {rating}");
        }
    }

    #[test]
    fn test_public_vendor_hides_bank() {
        let mut vendor = Vendor::new(UserId::new(), "Pixel Forge", None, Utc::now());
        vendor.bank = Some(BankDetails {
            bank_name: "GTBank".into(),
            account_number: "0123456789".into(),
            account_name: "Pixel".into(),
        });
        let json = serde_json::to_value(VendorResponse::public(vendor.clone())).unwrap();
        assert!(json.get("bank").is_none());
        let json = serde_json::to_value(VendorResponse::from(vendor)).unwrap();
        assert_eq!(json["bank"]["accountNumber"], "0123456789");
    }
}
