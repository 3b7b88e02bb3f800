//! Marketplace API
//!
//! Wires every crate's routers into one application and wraps it in the
//! process-wide middleware. `main` owns the process lifecycle; this crate
//! only builds things so the whole stack can be exercised in tests.

pub mod config;
pub mod health;
pub mod middleware;
pub mod realtime;
pub mod sweeper;

use std::any::Any;
use std::sync::Arc;

use auth::{AuthAppState, PgAuthRepository};
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Router};
use catalog::{CatalogAppState, PgCatalogRepository};
use commerce::{
    CommerceAppState, DOWNLOAD_LIMIT_MESSAGE, DownloadAppState, DownloadService,
    InMemoryDownloadTokenStore, PgCommerceRepository,
};
use kernel::AppError;
use notification::{NotificationAppState, PgNotificationRepository};
use platform::mailer::Mailer;
use platform::paystack::PaystackClient;
use platform::rate_limit::{InMemoryRateLimitStore, RateLimiter};
use platform::storage::ObjectStorage;
use sqlx::PgPool;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::health::HealthState;
use crate::middleware::{error_funnel, per_ip_rate_limit};
use crate::realtime::Presence;
use crate::sweeper::Sweeper;

/// Multipart framing on top of a file plus its thumbnail.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "no-referrer"),
    ("x-xss-protection", "0"),
    ("cross-origin-resource-policy", "same-origin"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
];

/// Router plus the background work that belongs to it.
pub struct App {
    pub router: Router,
    pub sweeper: Sweeper,
    pub presence: Presence,
}

pub fn build_app(config: &AppConfig, pool: PgPool) -> App {
    let mailer = Mailer::new(config.mailer.clone());

    let auth = AuthAppState::new(
        PgAuthRepository::new(pool.clone()),
        config.auth.clone(),
        mailer.clone(),
    );
    let guard = auth.guard();

    let catalog = CatalogAppState::new(
        PgCatalogRepository::new(pool.clone()),
        ObjectStorage::new(config.storage.clone()),
        config.catalog.clone(),
    );

    let commerce_store = PgCommerceRepository::new(pool.clone());
    let commerce = CommerceAppState::new(
        commerce_store.clone(),
        PaystackClient::new(config.paystack.clone()),
        mailer,
        config.commerce.clone(),
    );

    let downloads = DownloadService::new(
        Arc::new(InMemoryDownloadTokenStore::new()),
        &config.downloads,
    );
    let download_state = DownloadAppState::new(Arc::new(commerce_store), downloads.clone());
    let download_limiter =
        RateLimiter::in_memory(config.downloads.rate_limit()).with_message(DOWNLOAD_LIMIT_MESSAGE);

    let notifications = NotificationAppState::new(PgNotificationRepository::new(pool));

    let ip_limiter = RateLimiter::in_memory(config.rate_limit);
    let sweeper = Sweeper::new(downloads, vec![ip_limiter.clone(), download_limiter.clone()]);

    let admin = auth::admin_router(auth.clone())
        .merge(catalog::admin_router(catalog.clone(), guard.clone()))
        .merge(commerce::admin_router(commerce.clone(), guard.clone()));

    let products = catalog::products_router(catalog.clone(), guard.clone()).merge(
        commerce::downloads_router(download_state, guard.clone(), download_limiter),
    );

    let api = Router::new()
        .nest("/auth", auth::auth_router(auth.clone()))
        .nest("/users", auth::users_router(auth))
        .nest("/admin", admin)
        .nest("/vendors", catalog::vendors_router(catalog.clone(), guard.clone()))
        .nest("/categories", catalog::categories_router(catalog.clone(), guard.clone()))
        .nest("/products", products)
        .nest("/reviews", catalog::reviews_router(catalog, guard.clone()))
        .nest("/orders", commerce::orders_router(commerce.clone(), guard.clone()))
        .nest("/payments", commerce::payments_router(commerce.clone(), guard.clone()))
        .nest("/webhooks", commerce::webhooks_router(commerce.clone()))
        .nest(
            "/notifications",
            notification::notifications_router(notifications, guard.clone()),
        )
        .nest("/wallet", commerce::wallet_router(commerce, guard))
        .layer(from_fn_with_state(
            ip_limiter,
            per_ip_rate_limit::<InMemoryRateLimitStore>,
        ));

    let presence = Presence::new();
    let router = Router::new()
        .route("/health", get(health::health))
        .with_state(HealthState::new(config.env))
        .merge(
            Router::new()
                .route("/socket", get(realtime::socket))
                .with_state(presence.clone()),
        )
        .nest("/api", api)
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn_with_state(config.env, error_funnel))
        .layer(Extension(config.trusted_proxies.clone()))
        .layer(RequestBodyLimitLayer::new(
            config.catalog.max_file_size.saturating_mul(2) + BODY_LIMIT_SLACK,
        ))
        .layer(CompressionLayer::new());

    let router = with_security_headers(router)
        .layer(cors(&config.cors_origins))
        .layer(TraceLayer::new_for_http());

    App {
        router,
        sweeper,
        presence,
    }
}

async fn not_found() -> AppError {
    AppError::not_found("Route not found")
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    AppError::internal("Handler panicked")
        .with_detail(detail)
        .into_response()
}

fn with_security_headers(router: Router) -> Router {
    SECURITY_HEADERS.iter().fold(router, |router, &(name, value)| {
        router.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ))
    })
}

fn cors(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true)
}
