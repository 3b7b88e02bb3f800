//! Entities

pub mod credentials;
pub mod deletion_request;
pub mod refresh_token;
pub mod user;

pub use credentials::Credentials;
pub use deletion_request::{DeletionRequest, DeletionStatus};
pub use refresh_token::RefreshToken;
pub use user::User;
