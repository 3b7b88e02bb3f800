//! Domain Layer
//!
//! Orders, payments, wallets and download grants, plus the repository
//! traits the application layer depends on.

pub mod entity;
pub mod repository;
