//! Repository Trait

use kernel::AppResult;
use kernel::id::{NotificationId, UserId};
use kernel::pagination::PageQuery;

use crate::domain::entity::Notification;

/// One page of a user's inbox.
#[derive(Debug, Clone)]
pub struct Inbox {
    pub items: Vec<Notification>,
    pub total: i64,
    pub unread: i64,
}

/// Every read and write is scoped to the owning user.
#[trait_variant::make(NotificationRepository: Send)]
pub trait LocalNotificationRepository {
    async fn create(&self, notification: &Notification) -> AppResult<()>;

    async fn list(&self, user_id: &UserId, unread_only: bool, page: &PageQuery) -> AppResult<Inbox>;

    /// `false` when the notification does not exist for this user.
    async fn mark_read(&self, user_id: &UserId, id: &NotificationId) -> AppResult<bool>;

    /// Number of notifications changed.
    async fn mark_all_read(&self, user_id: &UserId) -> AppResult<u64>;

    async fn delete(&self, user_id: &UserId, id: &NotificationId) -> AppResult<bool>;
}
