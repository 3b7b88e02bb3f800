//! In-Memory Repository
//!
//! Process-local store implementing every auth repository trait. Clones
//! share state. Used by tests here and in the crates that mount the auth
//! middleware.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use kernel::id::{DeletionRequestId, UserId};
use kernel::AppError;
use kernel::pagination::PageQuery;

use crate::domain::entity::{Credentials, DeletionRequest, DeletionStatus, RefreshToken, User};
use crate::domain::repository::{
    CredentialRepository, DeletionRequestRepository, RefreshTokenRepository, UserFilter,
    UserRepository,
};
use crate::domain::value_object::Email;
use crate::error::AuthResult;

#[derive(Default)]
struct Tables {
    users: DashMap<UserId, User>,
    credentials: DashMap<UserId, Credentials>,
    refresh_tokens: DashMap<String, RefreshToken>,
    deletion_requests: DashMap<DeletionRequestId, DeletionRequest>,
}

#[derive(Clone, Default)]
pub struct InMemoryAuthRepository {
    tables: Arc<Tables>,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user directly, bypassing registration.
    pub fn insert(&self, user: User, credentials: Credentials) {
        self.tables.credentials.insert(user.id, credentials);
        self.tables.users.insert(user.id, user);
    }

    pub fn refresh_token_count(&self) -> usize {
        self.tables.refresh_tokens.len()
    }
}

fn paginate<T>(mut items: Vec<T>, page: &PageQuery) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let start = (page.offset() as usize).min(items.len());
    let end = (start + page.limit() as usize).min(items.len());
    (items.drain(start..end).collect(), total)
}

impl UserRepository for InMemoryAuthRepository {
    async fn create_user(&self, user: &User, credentials: &Credentials) -> AuthResult<()> {
        if self.tables.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::conflict("Duplicate field value entered").into());
        }
        self.insert(user.clone(), credentials.clone());
        Ok(())
    }

    async fn find_user(&self, id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.tables.users.get(id).map(|u| u.clone()))
    }

    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self
            .tables
            .users
            .iter()
            .find(|u| &u.email == email)
            .map(|u| u.clone()))
    }

    async fn email_exists(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.tables.users.iter().any(|u| &u.email == email))
    }

    async fn update_user(&self, user: &User) -> AuthResult<()> {
        self.tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page: &PageQuery,
    ) -> AuthResult<(Vec<User>, i64)> {
        let search = filter.search.as_deref().map(str::to_lowercase);
        let mut users: Vec<User> = self
            .tables
            .users
            .iter()
            .filter(|u| filter.role.is_none_or(|r| u.role == r))
            .filter(|u| filter.status.is_none_or(|s| u.status == s))
            .filter(|u| {
                search.as_deref().is_none_or(|q| {
                    u.name.to_lowercase().contains(q) || u.email.as_str().contains(q)
                })
            })
            .map(|u| u.clone())
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(users, page))
    }
}

impl CredentialRepository for InMemoryAuthRepository {
    async fn find_credentials(&self, user_id: &UserId) -> AuthResult<Option<Credentials>> {
        Ok(self.tables.credentials.get(user_id).map(|c| c.clone()))
    }

    async fn find_credentials_by_reset_token(
        &self,
        token_hash: &str,
    ) -> AuthResult<Option<Credentials>> {
        Ok(self
            .tables
            .credentials
            .iter()
            .find(|c| c.reset_token_hash.as_deref() == Some(token_hash))
            .map(|c| c.clone()))
    }

    async fn update_credentials(&self, credentials: &Credentials) -> AuthResult<()> {
        self.tables
            .credentials
            .insert(credentials.user_id, credentials.clone());
        Ok(())
    }
}

impl RefreshTokenRepository for InMemoryAuthRepository {
    async fn store_refresh_token(&self, token: &RefreshToken) -> AuthResult<()> {
        self.tables
            .refresh_tokens
            .insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn find_refresh_token(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>> {
        Ok(self.tables.refresh_tokens.get(token_hash).map(|t| t.clone()))
    }

    async fn delete_refresh_token(&self, token_hash: &str) -> AuthResult<bool> {
        Ok(self.tables.refresh_tokens.remove(token_hash).is_some())
    }

    async fn delete_user_refresh_tokens(&self, user_id: &UserId) -> AuthResult<u64> {
        let before = self.tables.refresh_tokens.len();
        self.tables
            .refresh_tokens
            .retain(|_, t| &t.user_id != user_id);
        Ok((before - self.tables.refresh_tokens.len()) as u64)
    }

    async fn cleanup_expired_refresh_tokens(&self) -> AuthResult<u64> {
        let now = Utc::now();
        let before = self.tables.refresh_tokens.len();
        self.tables.refresh_tokens.retain(|_, t| !t.is_expired(now));
        Ok((before - self.tables.refresh_tokens.len()) as u64)
    }
}

impl DeletionRequestRepository for InMemoryAuthRepository {
    async fn create_deletion_request(&self, request: &DeletionRequest) -> AuthResult<()> {
        self.tables
            .deletion_requests
            .insert(request.id, request.clone());
        Ok(())
    }

    async fn find_deletion_request(
        &self,
        id: &DeletionRequestId,
    ) -> AuthResult<Option<DeletionRequest>> {
        Ok(self.tables.deletion_requests.get(id).map(|r| r.clone()))
    }

    async fn find_pending_deletion_request(
        &self,
        user_id: &UserId,
    ) -> AuthResult<Option<DeletionRequest>> {
        Ok(self
            .tables
            .deletion_requests
            .iter()
            .find(|r| &r.user_id == user_id && r.is_pending())
            .map(|r| r.clone()))
    }

    async fn update_deletion_request(&self, request: &DeletionRequest) -> AuthResult<()> {
        self.tables
            .deletion_requests
            .insert(request.id, request.clone());
        Ok(())
    }

    async fn list_deletion_requests(
        &self,
        status: Option<DeletionStatus>,
        page: &PageQuery,
    ) -> AuthResult<(Vec<DeletionRequest>, i64)> {
        let mut requests: Vec<DeletionRequest> = self
            .tables
            .deletion_requests
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .map(|r| r.clone())
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(requests, page))
    }
}
