//! Notification Use Cases

use std::sync::Arc;

use kernel::id::{NotificationId, UserId};
use kernel::pagination::PageQuery;
use kernel::{AppError, AppResult};

use crate::domain::repository::{Inbox, NotificationRepository};

pub struct ListNotificationsUseCase<N>
where
    N: NotificationRepository,
{
    notifications: Arc<N>,
}

impl<N> ListNotificationsUseCase<N>
where
    N: NotificationRepository,
{
    pub fn new(notifications: Arc<N>) -> Self {
        Self { notifications }
    }

    pub async fn execute(&self, user_id: &UserId, unread_only: bool, page: PageQuery) -> AppResult<Inbox> {
        self.notifications.list(user_id, unread_only, &page).await
    }
}

pub struct MarkReadUseCase<N>
where
    N: NotificationRepository,
{
    notifications: Arc<N>,
}

impl<N> MarkReadUseCase<N>
where
    N: NotificationRepository,
{
    pub fn new(notifications: Arc<N>) -> Self {
        Self { notifications }
    }

    pub async fn execute(&self, user_id: &UserId, id: &NotificationId) -> AppResult<()> {
        if self.notifications.mark_read(user_id, id).await? {
            Ok(())
        } else {
            Err(AppError::not_found("Notification not found"))
        }
    }

    pub async fn execute_all(&self, user_id: &UserId) -> AppResult<u64> {
        let changed = self.notifications.mark_all_read(user_id).await?;
        tracing::debug!(user_id = %user_id, changed, "Notifications marked read");
        Ok(changed)
    }
}

pub struct DeleteNotificationUseCase<N>
where
    N: NotificationRepository,
{
    notifications: Arc<N>,
}

impl<N> DeleteNotificationUseCase<N>
where
    N: NotificationRepository,
{
    pub fn new(notifications: Arc<N>) -> Self {
        Self { notifications }
    }

    pub async fn execute(&self, user_id: &UserId, id: &NotificationId) -> AppResult<()> {
        if self.notifications.delete(user_id, id).await? {
            Ok(())
        } else {
            Err(AppError::not_found("Notification not found"))
        }
    }
}
