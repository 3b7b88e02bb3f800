//! In-Memory Repository

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use kernel::AppResult;
use kernel::id::{NotificationId, UserId};
use kernel::pagination::PageQuery;

use crate::domain::entity::Notification;
use crate::domain::repository::{Inbox, NotificationRepository};

/// Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryNotificationRepository {
    rows: Arc<DashMap<NotificationId, Notification>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl NotificationRepository for InMemoryNotificationRepository {
    async fn create(&self, notification: &Notification) -> AppResult<()> {
        self.rows.insert(notification.id, notification.clone());
        Ok(())
    }

    async fn list(&self, user_id: &UserId, unread_only: bool, page: &PageQuery) -> AppResult<Inbox> {
        let mut mine: Vec<Notification> = self
            .rows
            .iter()
            .filter(|n| &n.user_id == user_id)
            .map(|n| n.clone())
            .collect();
        let unread = mine.iter().filter(|n| !n.is_read()).count() as i64;
        if unread_only {
            mine.retain(|n| !n.is_read());
        }
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = mine.len() as i64;
        let items = mine
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(Inbox {
            items,
            total,
            unread,
        })
    }

    async fn mark_read(&self, user_id: &UserId, id: &NotificationId) -> AppResult<bool> {
        match self.rows.get_mut(id) {
            Some(mut n) if &n.user_id == user_id => {
                n.mark_read(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: &UserId) -> AppResult<u64> {
        let now = Utc::now();
        let mut changed = 0;
        for mut n in self.rows.iter_mut() {
            if &n.user_id == user_id && !n.is_read() {
                n.mark_read(now);
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete(&self, user_id: &UserId, id: &NotificationId) -> AppResult<bool> {
        Ok(self
            .rows
            .remove_if(id, |_, n| &n.user_id == user_id)
            .is_some())
    }
}
