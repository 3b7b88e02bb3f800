//! Catalog Backend Module
//!
//! Vendors, categories, products and reviews.
//!
//! - `domain/` - Entities and repository traits
//! - `application/` - Use cases and upload rules
//! - `infra/` - PostgreSQL store
//! - `presentation/` - HTTP handlers, DTOs, routers
//!
//! Prices are integer minor units. Product files live in object storage and
//! are never linked directly; buyers reach them through download tokens.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

pub use application::CatalogConfig;
pub use domain::repository::CatalogStore;
pub use error::{CatalogError, CatalogResult};
pub use infra::postgres::PgCatalogRepository;
pub use presentation::handlers::CatalogAppState;
pub use presentation::router::{
    admin_router, categories_router, products_router, reviews_router, vendors_router,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::presentation::dto::*;
}

#[cfg(test)]
mod tests;
