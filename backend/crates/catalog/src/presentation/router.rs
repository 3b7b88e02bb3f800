//! Catalog Routers
//!
//! Browsing is public. Writes go through the auth guard from the auth crate.

use auth::domain::repository::UserRepository;
use auth::{AllowedRoles, AuthGuard, authenticate, authorize, optional_authenticate};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post, put},
};

use crate::domain::repository::CatalogStore;
use crate::presentation::handlers::{self, CatalogAppState};

/// Multipart framing on top of the largest accepted file.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// `/api/vendors`
pub fn vendors_router<S, U>(state: CatalogAppState<S>, guard: AuthGuard<U>) -> Router
where
    S: CatalogStore,
    U: UserRepository + Send + Sync + 'static,
{
    let public = Router::new()
        .route("/{id}", get(handlers::get_vendor::<S>))
        .route("/{id}/products", get(handlers::vendor_products::<S>));

    let owner = Router::new()
        .route("/me", put(handlers::update_my_vendor::<S>))
        .route_layer(from_fn_with_state(AllowedRoles::VENDOR_ONLY, authorize))
        .route_layer(from_fn_with_state(guard.clone(), authenticate::<U>));

    let signed_in = Router::new()
        .route("/", post(handlers::become_vendor::<S>))
        .route("/me", get(handlers::my_vendor::<S>))
        .route_layer(from_fn_with_state(guard, authenticate::<U>));

    public.merge(signed_in).merge(owner).with_state(state)
}

/// `/api/categories`
pub fn categories_router<S, U>(state: CatalogAppState<S>, guard: AuthGuard<U>) -> Router
where
    S: CatalogStore,
    U: UserRepository + Send + Sync + 'static,
{
    let public = Router::new()
        .route("/", get(handlers::list_categories::<S>))
        .route("/{id}", get(handlers::get_category::<S>));

    let admin = Router::new()
        .route("/", post(handlers::create_category::<S>))
        .route(
            "/{id}",
            put(handlers::update_category::<S>)
                .delete(handlers::delete_category::<S>),
        )
        .route_layer(from_fn_with_state(AllowedRoles::ADMIN_ONLY, authorize))
        .route_layer(from_fn_with_state(guard, authenticate::<U>));

    public.merge(admin).with_state(state)
}

/// `/api/products`
pub fn products_router<S, U>(state: CatalogAppState<S>, guard: AuthGuard<U>) -> Router
where
    S: CatalogStore,
    U: UserRepository + Send + Sync + 'static,
{
    let upload_limit = state.config.max_file_size.saturating_mul(2) + MULTIPART_OVERHEAD;

    let public = Router::new().route("/", get(handlers::list_products::<S>));

    let detail = Router::new()
        .route("/{id}", get(handlers::get_product::<S>))
        .route_layer(from_fn_with_state(guard.clone(), optional_authenticate::<U>));

    let sellers = Router::new()
        .route("/", post(handlers::create_product::<S>))
        .route_layer(from_fn_with_state(AllowedRoles::VENDOR_OR_ADMIN, authorize))
        .route_layer(from_fn_with_state(guard.clone(), authenticate::<U>));

    let owners = Router::new()
        .route(
            "/{id}",
            put(handlers::update_product::<S>)
                .delete(handlers::delete_product::<S>),
        )
        .route(
            "/{id}/files",
            post(handlers::upload_product_files::<S>).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route_layer(from_fn_with_state(guard, authenticate::<U>));

    public
        .merge(detail)
        .merge(sellers)
        .merge(owners)
        .with_state(state)
}

/// `/api/reviews`
pub fn reviews_router<S, U>(state: CatalogAppState<S>, guard: AuthGuard<U>) -> Router
where
    S: CatalogStore,
    U: UserRepository + Send + Sync + 'static,
{
    let public = Router::new().route(
        "/product/{productId}",
        get(handlers::list_reviews::<S>),
    );

    let signed_in = Router::new()
        .route("/", post(handlers::create_review::<S>))
        .route("/{id}", delete(handlers::delete_review::<S>))
        .route_layer(from_fn_with_state(guard, authenticate::<U>));

    public.merge(signed_in).with_state(state)
}

/// Vendor moderation, merged into `/api/admin`.
pub fn admin_router<S, U>(state: CatalogAppState<S>, guard: AuthGuard<U>) -> Router
where
    S: CatalogStore,
    U: UserRepository + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/vendors/{id}/status",
            patch(handlers::set_vendor_status::<S>),
        )
        .route_layer(from_fn_with_state(AllowedRoles::ADMIN_ONLY, authorize))
        .route_layer(from_fn_with_state(guard, authenticate::<U>))
        .with_state(state)
}
