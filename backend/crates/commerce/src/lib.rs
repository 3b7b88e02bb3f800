//! Commerce Backend Module
//!
//! Orders, payments, vendor wallets and paid downloads.
//!
//! - `domain/` - Entities, earnings split and repository traits
//! - `application/` - Use cases, download token service
//! - `infra/` - PostgreSQL store and in-memory token store
//! - `presentation/` - HTTP handlers, DTOs, throttling middleware, routers
//!
//! ## Money flow
//! A paid order credits each vendor's wallet with its lines minus the
//! platform fee. Withdrawals move funds from available to pending until an
//! admin approves (funds leave) or rejects (funds return).
//!
//! ## Downloads
//! Buyers trade a paid order for a short-lived opaque token, then redeem the
//! token for a redirect to the stored file. Tokens live in process memory and
//! are swept periodically.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

pub use application::{CommerceConfig, DownloadConfig, DownloadService};
pub use domain::repository::{CommerceStore, DownloadRepository, DownloadTokenStore};
pub use error::{CommerceError, CommerceResult};
pub use infra::memory::InMemoryDownloadTokenStore;
pub use infra::postgres::PgCommerceRepository;
pub use presentation::handlers::{CommerceAppState, DOWNLOAD_LINK_PREFIX, DownloadAppState};
pub use presentation::middleware::{DOWNLOAD_LIMIT_MESSAGE, per_user_rate_limit};
pub use presentation::router::{
    admin_router, downloads_router, orders_router, payments_router, wallet_router,
    webhooks_router,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::presentation::dto::*;
}

#[cfg(test)]
mod tests;
