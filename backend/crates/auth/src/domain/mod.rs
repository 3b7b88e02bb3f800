//! Domain Layer
//!
//! Entities, value objects and repository traits. No I/O.

pub mod entity;
pub mod repository;
pub mod value_object;
