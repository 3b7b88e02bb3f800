//! Commerce Routers
//!
//! The payment webhook is the only unauthenticated write; it is gated by the
//! gateway signature instead.

use auth::domain::repository::UserRepository;
use auth::{AllowedRoles, AuthGuard, authenticate, authorize};
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};
use platform::rate_limit::{RateLimitStore, RateLimiter};

use crate::domain::repository::{CommerceStore, DownloadRepository, DownloadTokenStore};
use crate::presentation::handlers::{self, CommerceAppState, DownloadAppState};
use crate::presentation::middleware::per_user_rate_limit;

/// `/api/orders`
pub fn orders_router<S, U>(state: CommerceAppState<S>, guard: AuthGuard<U>) -> Router
where
    S: CommerceStore,
    U: UserRepository + Send + Sync + 'static,
{
    let buyers = Router::new()
        .route(
            "/",
            post(handlers::create_order::<S>).get(handlers::list_orders::<S>),
        )
        .route("/{id}", get(handlers::get_order::<S>))
        .route_layer(from_fn_with_state(guard.clone(), authenticate::<U>));

    let sellers = Router::new()
        .route("/vendor", get(handlers::vendor_sales::<S>))
        .route_layer(from_fn_with_state(AllowedRoles::VENDOR_ONLY, authorize))
        .route_layer(from_fn_with_state(guard, authenticate::<U>));

    buyers.merge(sellers).with_state(state)
}

/// `/api/payments`
pub fn payments_router<S, U>(state: CommerceAppState<S>, guard: AuthGuard<U>) -> Router
where
    S: CommerceStore,
    U: UserRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/initialize", post(handlers::initialize_payment::<S>))
        .route("/verify/{reference}", get(handlers::verify_payment::<S>))
        .route_layer(from_fn_with_state(guard, authenticate::<U>))
        .with_state(state)
}

/// `/api/webhooks`
pub fn webhooks_router<S>(state: CommerceAppState<S>) -> Router
where
    S: CommerceStore,
{
    Router::new()
        .route("/paystack", post(handlers::paystack_webhook::<S>))
        .with_state(state)
}

/// `/api/wallet`
pub fn wallet_router<S, U>(state: CommerceAppState<S>, guard: AuthGuard<U>) -> Router
where
    S: CommerceStore,
    U: UserRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(handlers::get_wallet::<S>))
        .route(
            "/withdrawals",
            post(handlers::request_withdrawal::<S>).get(handlers::list_my_withdrawals::<S>),
        )
        .route_layer(from_fn_with_state(AllowedRoles::VENDOR_ONLY, authorize))
        .route_layer(from_fn_with_state(guard, authenticate::<U>))
        .with_state(state)
}

/// Stats and payouts, merged into `/api/admin`.
pub fn admin_router<S, U>(state: CommerceAppState<S>, guard: AuthGuard<U>) -> Router
where
    S: CommerceStore,
    U: UserRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/stats", get(handlers::platform_stats::<S>))
        .route("/withdrawals", get(handlers::list_withdrawals::<S>))
        .route("/withdrawals/{id}", patch(handlers::process_withdrawal::<S>))
        .route_layer(from_fn_with_state(AllowedRoles::ADMIN_ONLY, authorize))
        .route_layer(from_fn_with_state(guard, authenticate::<U>))
        .with_state(state)
}

/// Download links, merged into `/api/products`.
///
/// Issuing is authenticated and throttled per user. Redeeming needs only the
/// token, so links work from a plain browser navigation.
pub fn downloads_router<D, T, U, R>(
    state: DownloadAppState<D, T>,
    guard: AuthGuard<U>,
    limiter: RateLimiter<R>,
) -> Router
where
    D: DownloadRepository + Send + Sync + 'static,
    T: DownloadTokenStore + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    R: RateLimitStore + Send + Sync + 'static,
{
    let issue = Router::new()
        .route("/{id}/download", post(handlers::issue_download::<D, T>))
        .route_layer(from_fn_with_state(limiter, per_user_rate_limit::<R>))
        .route_layer(from_fn_with_state(guard, authenticate::<U>));

    let redeem = Router::new().route("/download/{token}", get(handlers::redeem_download::<D, T>));

    issue.merge(redeem).with_state(state)
}
