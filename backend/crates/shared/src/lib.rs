//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate holds the vocabulary every marketplace crate agrees on:
//! - The unified error type and its JSON envelope
//! - Typed entity identifiers
//! - Runtime environment classification
//! - Success envelopes, pagination and request extractors
//!
//! Only things that carry the same meaning in every bounded context live here.

pub mod env;
pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
    pub mod report;
}
#[cfg(feature = "axum")]
pub mod extract;
pub mod id;
pub mod pagination;
pub mod response;
pub mod validate;

pub use env::AppEnv;
pub use error::{
    app_error::{AppError, AppResult, OptionExt, ResultExt},
    kind::ErrorKind,
    report::ErrorReport,
};
