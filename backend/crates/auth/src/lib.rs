//! Auth (Authentication and Authorization) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Use cases, token service
//! - `infra/` - PostgreSQL and in-memory stores
//! - `presentation/` - HTTP handlers, DTOs, middleware, routers
//!
//! ## Features
//! - Email + password registration with a 6-digit email verification code
//! - HS256 bearer access tokens with rotating refresh tokens
//! - Password reset by emailed link, password change
//! - Closed role set (Customer, Vendor, Admin) enforced by middleware
//! - Account deletion requests reviewed by admins
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - One-time secrets and refresh tokens stored as SHA-256 digests
//! - Lockout after repeated failed logins
//! - Role and status re-read from the store on every request

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::{CurrentUser, TokenService};
pub use domain::repository::AuthStore;
pub use domain::value_object::{Role, UserStatus};
pub use error::{AuthError, AuthResult};
pub use infra::memory::InMemoryAuthRepository;
pub use infra::postgres::PgAuthRepository;
pub use presentation::handlers::AuthAppState;
pub use presentation::middleware::{
    AllowedRoles, AuthGuard, MaybeUser, authenticate, authorize, optional_authenticate,
};
pub use presentation::router::{admin_router, auth_router, users_router};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

#[cfg(test)]
mod tests;
