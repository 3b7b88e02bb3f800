//! In-app Notifications
//!
//! Per-user inbox rows written by other crates (payments, withdrawals) and
//! read through `/api/notifications`. Errors are plain [`kernel::AppError`]s;
//! there is nothing here that needs its own taxonomy.

pub mod application;
pub mod domain;
pub mod infra;
pub mod presentation;

pub use domain::entity::{Notification, NotificationKind};
pub use domain::repository::NotificationRepository;
pub use infra::memory::InMemoryNotificationRepository;
pub use infra::postgres::{PgNotificationRepository, insert_notification};
pub use presentation::handlers::NotificationAppState;
pub use presentation::router::notifications_router;

#[cfg(test)]
mod tests;
