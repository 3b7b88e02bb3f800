//! Application Layer
//!
//! Use cases for storefronts, the category tree, listings and reviews.

pub mod category;
pub mod config;
pub mod product;
pub mod review;
pub mod upload;
pub mod vendor;

pub use category::{
    CategoryInput, CreateCategoryUseCase, DeleteCategoryUseCase, GetCategoryUseCase,
    ListCategoriesUseCase, UpdateCategoryUseCase,
};
pub use config::CatalogConfig;
pub use product::{
    CreateProductInput, CreateProductUseCase, DeleteProductUseCase, GetProductUseCase,
    ListProductsUseCase, UpdateProductInput, UpdateProductUseCase,
};
pub use review::{CreateReviewUseCase, DeleteReviewUseCase, ListReviewsUseCase};
pub use upload::{FileSlot, UploadProductFilesUseCase, UploadedFile};
pub use vendor::{
    BecomeVendorUseCase, GetMyVendorUseCase, GetPublicVendorUseCase, SetVendorStatusUseCase,
    UpdateVendorInput, UpdateVendorUseCase, VendorProductsUseCase,
};
