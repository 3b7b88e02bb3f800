//! Value Objects

pub mod email;
pub mod role;
pub mod user_status;

pub use email::Email;
pub use role::Role;
pub use user_status::UserStatus;
