//! Data Transfer Objects

use chrono::{DateTime, Utc};
use kernel::id::NotificationId;
use kernel::pagination::{Page, PageQuery};
use serde::{Deserialize, Serialize};

use crate::domain::entity::{Notification, NotificationKind};
use crate::domain::repository::Inbox;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub unread_only: bool,
}

impl NotificationListQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            kind: n.kind,
            read: n.is_read(),
            title: n.title,
            message: n.message,
            data: n.data,
            read_at: n.read_at,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxResponse {
    #[serde(flatten)]
    pub page: Page<NotificationResponse>,
    pub unread_count: i64,
}

impl InboxResponse {
    pub fn new(inbox: Inbox, query: &PageQuery) -> Self {
        let items = inbox.items.into_iter().map(NotificationResponse::from).collect();
        Self {
            page: Page::new(items, query, inbox.total),
            unread_count: inbox.unread,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllReadResponse {
    pub updated: u64,
}
