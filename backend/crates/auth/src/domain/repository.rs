//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in `infra`.
//! Method names are unique across traits so one store can implement all of them.

use kernel::id::{DeletionRequestId, UserId};
use kernel::pagination::PageQuery;

use crate::domain::entity::{Credentials, DeletionRequest, DeletionStatus, RefreshToken, User};
use crate::domain::value_object::{Email, Role, UserStatus};
use crate::error::AuthResult;

/// Filters for the admin user listing.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    /// Case-insensitive match on name or email
    pub search: Option<String>,
}

#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert user and credentials atomically
    async fn create_user(&self, user: &User, credentials: &Credentials) -> AuthResult<()>;

    async fn find_user(&self, id: &UserId) -> AuthResult<Option<User>>;

    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn email_exists(&self, email: &Email) -> AuthResult<bool>;

    async fn update_user(&self, user: &User) -> AuthResult<()>;

    /// Page of users matching `filter`, newest first, with the total count
    async fn list_users(&self, filter: &UserFilter, page: &PageQuery)
    -> AuthResult<(Vec<User>, i64)>;
}

#[trait_variant::make(CredentialRepository: Send)]
pub trait LocalCredentialRepository {
    async fn find_credentials(&self, user_id: &UserId) -> AuthResult<Option<Credentials>>;

    /// Lookup by the SHA-256 digest of an outstanding reset token
    async fn find_credentials_by_reset_token(
        &self,
        token_hash: &str,
    ) -> AuthResult<Option<Credentials>>;

    async fn update_credentials(&self, credentials: &Credentials) -> AuthResult<()>;
}

#[trait_variant::make(RefreshTokenRepository: Send)]
pub trait LocalRefreshTokenRepository {
    async fn store_refresh_token(&self, token: &RefreshToken) -> AuthResult<()>;

    async fn find_refresh_token(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>>;

    /// Returns true when a row was removed
    async fn delete_refresh_token(&self, token_hash: &str) -> AuthResult<bool>;

    async fn delete_user_refresh_tokens(&self, user_id: &UserId) -> AuthResult<u64>;

    async fn cleanup_expired_refresh_tokens(&self) -> AuthResult<u64>;
}

#[trait_variant::make(DeletionRequestRepository: Send)]
pub trait LocalDeletionRequestRepository {
    async fn create_deletion_request(&self, request: &DeletionRequest) -> AuthResult<()>;

    async fn find_deletion_request(
        &self,
        id: &DeletionRequestId,
    ) -> AuthResult<Option<DeletionRequest>>;

    async fn find_pending_deletion_request(
        &self,
        user_id: &UserId,
    ) -> AuthResult<Option<DeletionRequest>>;

    async fn update_deletion_request(&self, request: &DeletionRequest) -> AuthResult<()>;

    async fn list_deletion_requests(
        &self,
        status: Option<DeletionStatus>,
        page: &PageQuery,
    ) -> AuthResult<(Vec<DeletionRequest>, i64)>;
}

/// Everything the auth use cases need from one store.
pub trait AuthStore:
    UserRepository
    + CredentialRepository
    + RefreshTokenRepository
    + DeletionRequestRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthStore for T where
    T: UserRepository
        + CredentialRepository
        + RefreshTokenRepository
        + DeletionRequestRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
