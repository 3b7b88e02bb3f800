//! Infrastructure Layer
//!
//! Store implementations for the repository traits.

pub mod memory;
pub mod postgres;
