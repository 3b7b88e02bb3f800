//! Download Tokens
//!
//! Buyers never see the stored file URL. They ask for a short-lived token,
//! then redeem it for a redirect to the file. Tokens stay valid for repeated
//! use until they expire; expired tokens are dropped on first touch and by
//! the periodic sweep.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::{OrderId, ProductId, UserId};
use platform::crypto::random_hex;

use crate::application::config::DownloadConfig;
use crate::domain::entity::DownloadToken;
use crate::domain::repository::{DownloadRepository, DownloadTokenStore};
use crate::error::{CommerceError, CommerceResult};

/// Bytes of randomness per token (64 hex characters).
const TOKEN_BYTES: usize = 32;

/// A token just handed out.
#[derive(Debug, Clone)]
pub struct IssuedDownload {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct DownloadService<T> {
    store: Arc<T>,
    ttl: chrono::Duration,
}

impl<T> Clone for DownloadService<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            ttl: self.ttl,
        }
    }
}

impl<T> DownloadService<T>
where
    T: DownloadTokenStore + Sync,
{
    pub fn new(store: Arc<T>, config: &DownloadConfig) -> Self {
        Self {
            store,
            ttl: config.token_ttl_chrono(),
        }
    }

    pub async fn issue(
        &self,
        product_id: ProductId,
        order_id: OrderId,
        user_id: UserId,
        download_count: u32,
        now: DateTime<Utc>,
    ) -> IssuedDownload {
        let token = random_hex(TOKEN_BYTES);
        let expires_at = now + self.ttl;
        self.store
            .set(
                token.clone(),
                DownloadToken {
                    product_id,
                    order_id,
                    user_id,
                    issued_at: now,
                    expires_at,
                    download_count,
                },
            )
            .await;
        IssuedDownload { token, expires_at }
    }

    /// `None` for unknown or expired tokens. Expired ones are removed.
    pub async fn validate(&self, token: &str, now: DateTime<Utc>) -> Option<DownloadToken> {
        match self.store.get(token).await {
            Some(grant) if !grant.is_expired(now) => Some(grant),
            Some(_) => {
                self.store.delete(token).await;
                None
            }
            None => None,
        }
    }

    /// Count a successful redemption on the stored token.
    async fn touch(&self, token: &str) -> Option<u32> {
        self.store.increment(token).await
    }

    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        self.store.sweep(now).await
    }

    pub async fn outstanding(&self) -> usize {
        self.store.len().await
    }
}

pub struct IssueDownloadUseCase<D, T>
where
    D: DownloadRepository,
{
    repo: Arc<D>,
    service: DownloadService<T>,
}

impl<D, T> IssueDownloadUseCase<D, T>
where
    D: DownloadRepository + Sync,
    T: DownloadTokenStore + Sync,
{
    pub fn new(repo: Arc<D>, service: DownloadService<T>) -> Self {
        Self { repo, service }
    }

    /// The caller must hold a paid order containing the product, and the
    /// product must still have a file.
    pub async fn execute(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        now: DateTime<Utc>,
    ) -> CommerceResult<IssuedDownload> {
        let order_id = self
            .repo
            .paid_order_for(user_id, product_id)
            .await?
            .ok_or(CommerceError::NotPurchased)?;
        self.repo
            .download_location(product_id)
            .await?
            .ok_or(CommerceError::FileUnavailable)?;

        let issued = self
            .service
            .issue(*product_id, order_id, *user_id, 0, now)
            .await;
        tracing::info!(
            user_id = %user_id,
            product_id = %product_id,
            expires_at = %issued.expires_at,
            "Download token issued"
        );
        Ok(issued)
    }
}

pub struct RedeemDownloadUseCase<D, T>
where
    D: DownloadRepository,
{
    repo: Arc<D>,
    service: DownloadService<T>,
}

impl<D, T> RedeemDownloadUseCase<D, T>
where
    D: DownloadRepository + Sync,
    T: DownloadTokenStore + Sync,
{
    pub fn new(repo: Arc<D>, service: DownloadService<T>) -> Self {
        Self { repo, service }
    }

    /// Returns the file URL to redirect to. The token is left in place.
    pub async fn execute(&self, token: &str, now: DateTime<Utc>) -> CommerceResult<String> {
        let grant = self
            .service
            .validate(token, now)
            .await
            .ok_or(CommerceError::InvalidDownloadToken)?;
        let location = self
            .repo
            .download_location(&grant.product_id)
            .await?
            .ok_or(CommerceError::FileUnavailable)?;

        self.repo.record_download(&grant, now).await?;
        let count = self.service.touch(token).await;
        tracing::info!(
            user_id = %grant.user_id,
            product_id = %grant.product_id,
            order_id = %grant.order_id,
            download_count = ?count,
            "Download completed"
        );
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::InMemoryDownloadTokenStore;
    use chrono::Duration;

    fn service() -> DownloadService<InMemoryDownloadTokenStore> {
        DownloadService::new(
            Arc::new(InMemoryDownloadTokenStore::new()),
            &DownloadConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_issue_shape() {
        let svc = service();
        let now = Utc::now();
        let issued = svc
            .issue(ProductId::new(), OrderId::new(), UserId::new(), 0, now)
            .await;
        assert_eq!(issued.token.len(), 64);
        assert!(issued.token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(issued.expires_at, now + Duration::minutes(15));
    }

    #[tokio::test]
    async fn test_valid_until_expiry() {
        let svc = service();
        let t0 = Utc::now();
        let product = ProductId::new();
        let issued = svc.issue(product, OrderId::new(), UserId::new(), 0, t0).await;

        let grant = svc.validate(&issued.token, t0 + Duration::minutes(14)).await;
        assert_eq!(grant.map(|g| g.product_id), Some(product));

        // Still there: validation does not consume.
        assert!(svc.validate(&issued.token, t0 + Duration::minutes(14)).await.is_some());
        assert_eq!(svc.outstanding().await, 1);

        assert!(svc.validate(&issued.token, t0 + Duration::minutes(15)).await.is_none());
        assert_eq!(svc.outstanding().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let svc = service();
        assert!(svc.validate("nope", Utc::now()).await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_clears_expired() {
        let svc = service();
        let t0 = Utc::now();
        for _ in 0..10 {
            svc.issue(ProductId::new(), OrderId::new(), UserId::new(), 0, t0)
                .await;
        }
        svc.issue(ProductId::new(), OrderId::new(), UserId::new(), 0, t0 + Duration::minutes(10))
            .await;

        assert_eq!(svc.sweep(t0 + Duration::minutes(5)).await, 0);
        assert_eq!(svc.sweep(t0 + Duration::minutes(15)).await, 10);
        assert_eq!(svc.outstanding().await, 1);
        assert_eq!(svc.sweep(t0 + Duration::minutes(26)).await, 1);
        assert_eq!(svc.outstanding().await, 0);
    }

    #[tokio::test]
    async fn test_redeem_repeatedly_until_expiry() {
        use crate::tests::FakeDownloads;
        use std::sync::atomic::Ordering;

        let repo = Arc::new(FakeDownloads::default());
        let (user, product) = (UserId::new(), ProductId::new());
        let order = repo.purchase(user, product, Some("https://files.example.com/f.pdf"));
        let svc = service();
        let redeem = RedeemDownloadUseCase::new(repo.clone(), svc.clone());

        let t0 = Utc::now();
        let issued = svc.issue(product, order, user, 0, t0).await;
        for offset in [10, 50] {
            let location = redeem
                .execute(&issued.token, t0 + Duration::seconds(offset))
                .await
                .unwrap();
            assert_eq!(location, "https://files.example.com/f.pdf");
        }
        assert_eq!(repo.recorded.load(Ordering::SeqCst), 2);
        let grant = svc.validate(&issued.token, t0).await.unwrap();
        assert_eq!(grant.download_count, 2);

        let err = redeem
            .execute(&issued.token, t0 + Duration::minutes(16))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::InvalidDownloadToken));
        assert_eq!(repo.recorded.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_count_after_sweep_does_not_restore_token() {
        let svc = service();
        let t0 = Utc::now();
        let issued = svc.issue(ProductId::new(), OrderId::new(), UserId::new(), 0, t0).await;

        assert!(svc.validate(&issued.token, t0 + Duration::minutes(14)).await.is_some());
        assert_eq!(svc.sweep(t0 + Duration::minutes(15)).await, 1);
        assert_eq!(svc.touch(&issued.token).await, None);
        assert_eq!(svc.outstanding().await, 0);
    }

    #[tokio::test]
    async fn test_issue_requires_purchase() {
        use crate::tests::FakeDownloads;

        let repo = Arc::new(FakeDownloads::default());
        let issue = IssueDownloadUseCase::new(repo.clone(), service());
        let (user, product) = (UserId::new(), ProductId::new());
        let err = issue.execute(&user, &product, Utc::now()).await.unwrap_err();
        assert!(matches!(err, CommerceError::NotPurchased));

        repo.purchase(user, product, None);
        let err = issue.execute(&user, &product, Utc::now()).await.unwrap_err();
        assert!(matches!(err, CommerceError::FileUnavailable));
    }
}
