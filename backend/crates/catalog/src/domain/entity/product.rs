//! Product Entity

use chrono::{DateTime, Utc};
use kernel::id::{CategoryId, ProductId, UserId, VendorId};
use serde::{Deserialize, Serialize};

use crate::domain::slug::unique_slug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl ProductStatus {
    pub const fn code(&self) -> &'static str {
        match self {
            ProductStatus::Draft => "draft",
            ProductStatus::Published => "published",
            ProductStatus::Archived => "archived",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "draft" => Some(ProductStatus::Draft),
            "published" => Some(ProductStatus::Published),
            "archived" => Some(ProductStatus::Archived),
            _ => None,
        }
    }
}

/// A file held in object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub vendor_id: VendorId,
    /// The vendor's user account, resolved on reads
    pub owner_id: UserId,
    pub category_id: Option<CategoryId>,
    pub title: String,
    pub slug: String,
    pub description: String,
    /// Minor units
    pub price: i64,
    pub currency: String,
    pub status: ProductStatus,
    pub file: Option<StoredFile>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub file_type: Option<String>,
    pub thumbnail: Option<StoredFile>,
    pub rating_avg: f64,
    pub rating_count: i32,
    pub sales_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a vendor supplies when listing a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub currency: String,
    pub category_id: Option<CategoryId>,
    pub status: ProductStatus,
}

impl Product {
    pub fn new(vendor_id: VendorId, owner_id: UserId, input: NewProduct, now: DateTime<Utc>) -> Self {
        let title = input.title.trim().to_string();
        Self {
            id: ProductId::new(),
            vendor_id,
            owner_id,
            category_id: input.category_id,
            slug: unique_slug(&title),
            title,
            description: input.description,
            price: input.price,
            currency: input.currency,
            status: input.status,
            file: None,
            file_name: None,
            file_size: None,
            file_type: None,
            thumbnail: None,
            rating_avg: 0.0,
            rating_count: 0,
            sales_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == ProductStatus::Published
    }

    /// Published products are public. Others only show to the owner and admins.
    pub fn visible_to(&self, viewer: Option<(UserId, bool)>) -> bool {
        match self.status {
            ProductStatus::Published => true,
            ProductStatus::Draft | ProductStatus::Archived => {
                matches!(viewer, Some((id, is_admin)) if is_admin || id == self.owner_id)
            }
        }
    }

    pub fn retitle(&mut self, title: &str) {
        self.title = title.trim().to_string();
        self.slug = unique_slug(&self.title);
    }

    pub fn attach_file(
        &mut self,
        file: StoredFile,
        name: String,
        size: i64,
        file_type: String,
        now: DateTime<Utc>,
    ) -> Option<StoredFile> {
        self.file_name = Some(name);
        self.file_size = Some(size);
        self.file_type = Some(file_type);
        self.updated_at = now;
        self.file.replace(file)
    }

    pub fn attach_thumbnail(&mut self, thumbnail: StoredFile, now: DateTime<Utc>) -> Option<StoredFile> {
        self.updated_at = now;
        self.thumbnail.replace(thumbnail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(status: ProductStatus) -> Product {
        Product::new(
            VendorId::new(),
            UserId::new(),
            NewProduct {
                title: " Icon Pack ".into(),
                description: "200 icons".into(),
                price: 250000,
                currency: "NGN".into(),
                category_id: None,
                status,
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_visibility() {
        let draft = product(ProductStatus::Draft);
        assert!(!draft.visible_to(None));
        assert!(!draft.visible_to(Some((UserId::new(), false))));
        assert!(draft.visible_to(Some((draft.owner_id, false))));
        assert!(draft.visible_to(Some((UserId::new(), true))));
        assert!(product(ProductStatus::Published).visible_to(None));
    }

    #[test]
    fn test_replacing_file_returns_previous() {
        let mut p = product(ProductStatus::Draft);
        assert_eq!(p.title, "Icon Pack");
        let first = StoredFile { url: "https://f/1".into(), public_id: "a".into() };
        let second = StoredFile { url: "https://f/2".into(), public_id: "b".into() };
        let now = Utc::now();
        assert!(p.attach_file(first.clone(), "a.zip".into(), 10, "zip".into(), now).is_none());
        assert_eq!(p.attach_file(second, "b.zip".into(), 20, "zip".into(), now), Some(first));
        assert_eq!(p.file_size, Some(20));
    }
}
