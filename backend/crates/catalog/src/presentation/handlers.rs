//! HTTP Handlers

use std::sync::Arc;

use auth::{CurrentUser, MaybeUser};
use axum::extract::{Multipart, State};
use axum::extract::multipart::MultipartError;
use kernel::AppError;
use kernel::extract::{AppPath, AppQuery, ValidJson};
use kernel::id::{CategoryId, ProductId, ReviewId, VendorId};
use kernel::pagination::{Page, PageQuery};
use kernel::response::ApiResponse;
use platform::storage::ObjectStorage;

use crate::application::{
    BecomeVendorUseCase, CatalogConfig, CategoryInput, CreateCategoryUseCase, CreateProductInput,
    CreateProductUseCase, CreateReviewUseCase, DeleteCategoryUseCase, DeleteProductUseCase,
    DeleteReviewUseCase, FileSlot, GetCategoryUseCase, GetMyVendorUseCase, GetProductUseCase,
    GetPublicVendorUseCase, ListCategoriesUseCase, ListProductsUseCase, ListReviewsUseCase,
    SetVendorStatusUseCase, UpdateCategoryUseCase, UpdateProductInput, UpdateProductUseCase,
    UpdateVendorInput, UpdateVendorUseCase, UploadProductFilesUseCase, UploadedFile,
    VendorProductsUseCase,
};
use crate::domain::entity::ProductStatus;
use crate::domain::repository::{CatalogStore, ProductFilter};
use crate::error::{CatalogError, CatalogResult};
use crate::presentation::dto::{
    CategoryResponse, CreateCategoryRequest, CreateProductRequest, CreateReviewRequest,
    CreateVendorRequest, ProductListQuery, ProductResponse, ReviewResponse, UpdateCategoryRequest,
    UpdateProductRequest, UpdateVendorRequest, VendorResponse, VendorStatusRequest,
};

/// Shared state for catalog handlers
#[derive(Clone)]
pub struct CatalogAppState<S>
where
    S: CatalogStore,
{
    pub store: Arc<S>,
    pub storage: ObjectStorage,
    pub config: Arc<CatalogConfig>,
}

impl<S> CatalogAppState<S>
where
    S: CatalogStore,
{
    pub fn new(store: S, storage: ObjectStorage, config: CatalogConfig) -> Self {
        Self {
            store: Arc::new(store),
            storage,
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Vendors
// ============================================================================

/// POST /api/vendors
pub async fn become_vendor<S>(
    State(state): State<CatalogAppState<S>>,
    user: CurrentUser,
    ValidJson(req): ValidJson<CreateVendorRequest>,
) -> CatalogResult<ApiResponse<VendorResponse>>
where
    S: CatalogStore,
{
    let vendor = BecomeVendorUseCase::new(state.store.clone())
        .execute(&user, req.store_name, req.description)
        .await?;
    Ok(ApiResponse::created(VendorResponse::from(vendor))
        .with_message("Vendor profile created and awaiting approval"))
}

/// GET /api/vendors/me
pub async fn my_vendor<S>(
    State(state): State<CatalogAppState<S>>,
    user: CurrentUser,
) -> CatalogResult<ApiResponse<VendorResponse>>
where
    S: CatalogStore,
{
    let vendor = GetMyVendorUseCase::new(state.store.clone())
        .execute(&user.id)
        .await?;
    Ok(ApiResponse::ok(VendorResponse::from(vendor)))
}

/// PUT /api/vendors/me
pub async fn update_my_vendor<S>(
    State(state): State<CatalogAppState<S>>,
    user: CurrentUser,
    ValidJson(req): ValidJson<UpdateVendorRequest>,
) -> CatalogResult<ApiResponse<VendorResponse>>
where
    S: CatalogStore,
{
    let bank = req.bank();
    let vendor = UpdateVendorUseCase::new(state.store.clone())
        .execute(
            &user.id,
            UpdateVendorInput {
                store_name: req.store_name,
                description: req.description,
                logo_url: req.logo_url,
                bank,
            },
        )
        .await?;
    Ok(ApiResponse::ok(VendorResponse::from(vendor)).with_message("Vendor profile updated"))
}

/// GET /api/vendors/{id}
pub async fn get_vendor<S>(
    State(state): State<CatalogAppState<S>>,
    AppPath(id): AppPath<VendorId>,
) -> CatalogResult<ApiResponse<VendorResponse>>
where
    S: CatalogStore,
{
    let vendor = GetPublicVendorUseCase::new(state.store.clone())
        .execute(&id)
        .await?;
    Ok(ApiResponse::ok(VendorResponse::public(vendor)))
}

/// GET /api/vendors/{id}/products
pub async fn vendor_products<S>(
    State(state): State<CatalogAppState<S>>,
    AppPath(id): AppPath<VendorId>,
    AppQuery(page): AppQuery<PageQuery>,
) -> CatalogResult<ApiResponse<Page<ProductResponse>>>
where
    S: CatalogStore,
{
    let page = VendorProductsUseCase::new(state.store.clone())
        .execute(&id, page)
        .await?;
    Ok(ApiResponse::ok(page.map(ProductResponse::from)))
}

/// PATCH /api/admin/vendors/{id}/status
pub async fn set_vendor_status<S>(
    State(state): State<CatalogAppState<S>>,
    admin: CurrentUser,
    AppPath(id): AppPath<VendorId>,
    ValidJson(req): ValidJson<VendorStatusRequest>,
) -> CatalogResult<ApiResponse<VendorResponse>>
where
    S: CatalogStore,
{
    let vendor = SetVendorStatusUseCase::new(state.store.clone())
        .execute(&admin.id, &id, req.status)
        .await?;
    Ok(ApiResponse::ok(VendorResponse::from(vendor)).with_message("Vendor status updated"))
}

// ============================================================================
// Categories
// ============================================================================

/// GET /api/categories
pub async fn list_categories<S>(
    State(state): State<CatalogAppState<S>>,
) -> CatalogResult<ApiResponse<Vec<CategoryResponse>>>
where
    S: CatalogStore,
{
    let categories = ListCategoriesUseCase::new(state.store.clone())
        .execute()
        .await?;
    Ok(ApiResponse::ok(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

/// GET /api/categories/{id}
pub async fn get_category<S>(
    State(state): State<CatalogAppState<S>>,
    AppPath(id): AppPath<CategoryId>,
) -> CatalogResult<ApiResponse<CategoryResponse>>
where
    S: CatalogStore,
{
    let category = GetCategoryUseCase::new(state.store.clone())
        .execute(&id)
        .await?;
    Ok(ApiResponse::ok(CategoryResponse::from(category)))
}

/// POST /api/categories
pub async fn create_category<S>(
    State(state): State<CatalogAppState<S>>,
    ValidJson(req): ValidJson<CreateCategoryRequest>,
) -> CatalogResult<ApiResponse<CategoryResponse>>
where
    S: CatalogStore,
{
    let category = CreateCategoryUseCase::new(state.store.clone())
        .execute(CategoryInput {
            name: req.name,
            description: req.description,
        })
        .await?;
    Ok(ApiResponse::created(CategoryResponse::from(category)))
}

/// PUT /api/categories/{id}
pub async fn update_category<S>(
    State(state): State<CatalogAppState<S>>,
    AppPath(id): AppPath<CategoryId>,
    ValidJson(req): ValidJson<UpdateCategoryRequest>,
) -> CatalogResult<ApiResponse<CategoryResponse>>
where
    S: CatalogStore,
{
    let category = UpdateCategoryUseCase::new(state.store.clone())
        .execute(&id, req.name, req.description)
        .await?;
    Ok(ApiResponse::ok(CategoryResponse::from(category)))
}

/// DELETE /api/categories/{id}
pub async fn delete_category<S>(
    State(state): State<CatalogAppState<S>>,
    AppPath(id): AppPath<CategoryId>,
) -> CatalogResult<ApiResponse<()>>
where
    S: CatalogStore,
{
    DeleteCategoryUseCase::new(state.store.clone())
        .execute(&id)
        .await?;
    Ok(ApiResponse::message("Category deleted"))
}

// ============================================================================
// Products
// ============================================================================

/// GET /api/products
pub async fn list_products<S>(
    State(state): State<CatalogAppState<S>>,
    AppQuery(query): AppQuery<ProductListQuery>,
) -> CatalogResult<ApiResponse<Page<ProductResponse>>>
where
    S: CatalogStore,
{
    let filter = ProductFilter {
        category_id: query.category,
        vendor_id: query.vendor,
        search: query.search.clone(),
        ..ProductFilter::published()
    };
    let page = ListProductsUseCase::new(state.store.clone())
        .execute(filter, query.page())
        .await?;
    Ok(ApiResponse::ok(page.map(ProductResponse::from)))
}

/// GET /api/products/{id}
pub async fn get_product<S>(
    State(state): State<CatalogAppState<S>>,
    MaybeUser(viewer): MaybeUser,
    AppPath(id): AppPath<ProductId>,
) -> CatalogResult<ApiResponse<ProductResponse>>
where
    S: CatalogStore,
{
    let product = GetProductUseCase::new(state.store.clone())
        .execute(&id, viewer.as_ref())
        .await?;
    Ok(ApiResponse::ok(ProductResponse::from(product)))
}

/// POST /api/products
pub async fn create_product<S>(
    State(state): State<CatalogAppState<S>>,
    user: CurrentUser,
    ValidJson(req): ValidJson<CreateProductRequest>,
) -> CatalogResult<ApiResponse<ProductResponse>>
where
    S: CatalogStore,
{
    let use_case =
        CreateProductUseCase::new(state.store.clone(), state.config.default_currency.clone());
    let product = use_case
        .execute(
            &user,
            CreateProductInput {
                title: req.title,
                description: req.description,
                price: req.price,
                currency: req.currency,
                category_id: req.category_id,
                status: req.status,
                vendor_id: req.vendor_id,
            },
        )
        .await?;
    Ok(ApiResponse::created(ProductResponse::from(product)))
}

/// PUT /api/products/{id}
pub async fn update_product<S>(
    State(state): State<CatalogAppState<S>>,
    user: CurrentUser,
    AppPath(id): AppPath<ProductId>,
    ValidJson(req): ValidJson<UpdateProductRequest>,
) -> CatalogResult<ApiResponse<ProductResponse>>
where
    S: CatalogStore,
{
    let product = UpdateProductUseCase::new(state.store.clone())
        .execute(
            &user,
            &id,
            UpdateProductInput {
                title: req.title,
                description: req.description,
                price: req.price,
                category_id: req.category_id,
                status: req.status,
            },
        )
        .await?;
    Ok(ApiResponse::ok(ProductResponse::from(product)))
}

/// DELETE /api/products/{id}
pub async fn delete_product<S>(
    State(state): State<CatalogAppState<S>>,
    user: CurrentUser,
    AppPath(id): AppPath<ProductId>,
) -> CatalogResult<ApiResponse<()>>
where
    S: CatalogStore,
{
    let outcome = DeleteProductUseCase::new(state.store.clone(), state.storage.clone())
        .execute(&user, &id)
        .await?;
    let message = match outcome {
        ProductStatus::Archived => "Product has sales and was archived",
        ProductStatus::Draft | ProductStatus::Published => "Product deleted",
    };
    Ok(ApiResponse::message(message))
}

/// POST /api/products/{id}/files
///
/// Multipart with a `file` part, a `thumbnail` part, or both. Other parts are ignored.
pub async fn upload_product_files<S>(
    State(state): State<CatalogAppState<S>>,
    user: CurrentUser,
    AppPath(id): AppPath<ProductId>,
    mut multipart: Multipart,
) -> CatalogResult<ApiResponse<ProductResponse>>
where
    S: CatalogStore,
{
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(slot) = field.name().and_then(FileSlot::from_field) else {
            continue;
        };
        let file_name = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| CatalogError::InvalidUpload("file part without a file name".into()))?;
        let bytes = field.bytes().await.map_err(multipart_error)?;
        files.push(UploadedFile {
            slot,
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    let product = UploadProductFilesUseCase::new(
        state.store.clone(),
        state.storage.clone(),
        state.config.clone(),
    )
    .execute(&user, &id, files)
    .await?;
    Ok(ApiResponse::ok(ProductResponse::from(product)).with_message("Files uploaded"))
}

fn multipart_error(err: MultipartError) -> CatalogError {
    if err.status().as_u16() == 413 {
        CatalogError::App(AppError::payload_too_large("Upload exceeds the size limit"))
    } else {
        CatalogError::InvalidUpload(err.body_text())
    }
}

// ============================================================================
// Reviews
// ============================================================================

/// GET /api/reviews/product/{productId}
pub async fn list_reviews<S>(
    State(state): State<CatalogAppState<S>>,
    AppPath(product_id): AppPath<ProductId>,
    AppQuery(page): AppQuery<PageQuery>,
) -> CatalogResult<ApiResponse<Page<ReviewResponse>>>
where
    S: CatalogStore,
{
    let page = ListReviewsUseCase::new(state.store.clone())
        .execute(&product_id, page)
        .await?;
    Ok(ApiResponse::ok(page.map(ReviewResponse::from)))
}

/// POST /api/reviews
pub async fn create_review<S>(
    State(state): State<CatalogAppState<S>>,
    user: CurrentUser,
    ValidJson(req): ValidJson<CreateReviewRequest>,
) -> CatalogResult<ApiResponse<ReviewResponse>>
where
    S: CatalogStore,
{
    let review = CreateReviewUseCase::new(state.store.clone())
        .execute(&user, &req.product_id, req.rating, req.comment)
        .await?;
    Ok(ApiResponse::created(ReviewResponse::from(review)))
}

/// DELETE /api/reviews/{id}
pub async fn delete_review<S>(
    State(state): State<CatalogAppState<S>>,
    user: CurrentUser,
    AppPath(id): AppPath<ReviewId>,
) -> CatalogResult<ApiResponse<()>>
where
    S: CatalogStore,
{
    DeleteReviewUseCase::new(state.store.clone())
        .execute(&user, &id)
        .await?;
    Ok(ApiResponse::message("Review deleted"))
}
