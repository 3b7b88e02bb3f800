//! Download grant

use chrono::{DateTime, Utc};
use kernel::id::{OrderId, ProductId, UserId};

/// Grant to fetch one purchased product's file. Lives only in process memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadToken {
    pub product_id: ProductId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub download_count: u32,
}

impl DownloadToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
