//! Domain Layer
//!
//! Vendors, categories, products and reviews. No I/O.

pub mod entity;
pub mod repository;
pub mod slug;
