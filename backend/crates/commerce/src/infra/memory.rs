//! In-memory download token store

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::domain::entity::DownloadToken;
use crate::domain::repository::DownloadTokenStore;

/// Tokens are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryDownloadTokenStore {
    tokens: DashMap<String, DownloadToken>,
}

impl InMemoryDownloadTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DownloadTokenStore for InMemoryDownloadTokenStore {
    async fn get(&self, key: &str) -> Option<DownloadToken> {
        self.tokens.get(key).map(|entry| entry.value().clone())
    }

    async fn set(&self, key: String, token: DownloadToken) {
        self.tokens.insert(key, token);
    }

    async fn delete(&self, key: &str) {
        self.tokens.remove(key);
    }

    async fn increment(&self, key: &str) -> Option<u32> {
        let mut token = self.tokens.get_mut(key)?;
        token.download_count += 1;
        Some(token.download_count)
    }

    async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let before = self.tokens.len();
        self.tokens.retain(|_, token| !token.is_expired(now));
        before.saturating_sub(self.tokens.len())
    }

    async fn len(&self) -> usize {
        self.tokens.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use kernel::id::{OrderId, ProductId, UserId};

    fn token(expires_at: DateTime<Utc>) -> DownloadToken {
        DownloadToken {
            product_id: ProductId::new(),
            order_id: OrderId::new(),
            user_id: UserId::new(),
            issued_at: expires_at - Duration::minutes(15),
            expires_at,
            download_count: 0,
        }
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = InMemoryDownloadTokenStore::new();
        let grant = token(Utc::now() + Duration::minutes(15));
        store.set("abc".into(), grant.clone()).await;

        assert_eq!(store.get("abc").await, Some(grant));
        store.delete("abc").await;
        assert_eq!(store.get("abc").await, None);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_increment_in_place() {
        let store = std::sync::Arc::new(InMemoryDownloadTokenStore::new());
        store.set("abc".into(), token(Utc::now() + Duration::minutes(15))).await;

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.increment("abc").await })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().is_some());
        }
        assert_eq!(store.get("abc").await.unwrap().download_count, 16);

        // A swept token stays gone.
        store.delete("abc").await;
        assert_eq!(store.increment("abc").await, None);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_tokens() {
        let store = InMemoryDownloadTokenStore::new();
        let now = Utc::now();
        store.set("old".into(), token(now - Duration::seconds(1))).await;
        store.set("edge".into(), token(now)).await;
        store.set("live".into(), token(now + Duration::minutes(5))).await;

        assert_eq!(store.sweep(now).await, 2);
        assert!(store.get("live").await.is_some());
        assert_eq!(store.len().await, 1);
    }
}
