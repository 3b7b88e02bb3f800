//! Admin Use Cases
//!
//! User moderation and review of account deletion requests.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::{DeletionRequestId, UserId};
use kernel::pagination::{Page, PageQuery};

use crate::domain::entity::{DeletionRequest, DeletionStatus, User};
use crate::domain::repository::{
    DeletionRequestRepository, RefreshTokenRepository, UserFilter, UserRepository,
};
use crate::domain::value_object::UserStatus;
use crate::error::{AuthError, AuthResult};

pub struct ListUsersUseCase<U>
where
    U: UserRepository,
{
    users: Arc<U>,
}

impl<U> ListUsersUseCase<U>
where
    U: UserRepository,
{
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }

    pub async fn execute(&self, filter: UserFilter, page: PageQuery) -> AuthResult<Page<User>> {
        let (users, total) = self.users.list_users(&filter, &page).await?;
        Ok(Page::new(users, &page, total))
    }
}

pub struct SetUserStatusUseCase<S>
where
    S: UserRepository + RefreshTokenRepository,
{
    store: Arc<S>,
}

impl<S> SetUserStatusUseCase<S>
where
    S: UserRepository + RefreshTokenRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        admin_id: &UserId,
        target: &UserId,
        status: UserStatus,
    ) -> AuthResult<User> {
        if !status.is_admin_assignable() {
            return Err(AuthError::InvalidStatus(status.code().to_string()));
        }
        if admin_id == target {
            return Err(AuthError::InvalidStatus(
                "administrators cannot change their own status".to_string(),
            ));
        }

        let mut user = self
            .store
            .find_user(target)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        user.status = status;
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;

        if !status.can_authenticate() {
            self.store.delete_user_refresh_tokens(target).await?;
        }
        tracing::info!(
            admin_id = %admin_id,
            user_id = %target,
            status = status.code(),
            "User status changed"
        );
        Ok(user)
    }
}

pub struct ListDeletionRequestsUseCase<R>
where
    R: DeletionRequestRepository,
{
    repo: Arc<R>,
}

impl<R> ListDeletionRequestsUseCase<R>
where
    R: DeletionRequestRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        status: Option<DeletionStatus>,
        page: PageQuery,
    ) -> AuthResult<Page<DeletionRequest>> {
        let (requests, total) = self.repo.list_deletion_requests(status, &page).await?;
        Ok(Page::new(requests, &page, total))
    }
}

pub struct ReviewDeletionUseCase<S>
where
    S: UserRepository + DeletionRequestRepository + RefreshTokenRepository,
{
    store: Arc<S>,
}

impl<S> ReviewDeletionUseCase<S>
where
    S: UserRepository + DeletionRequestRepository + RefreshTokenRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Approval deactivates the account and ends its sessions.
    pub async fn execute(
        &self,
        admin_id: &UserId,
        id: &DeletionRequestId,
        approve: bool,
        note: Option<String>,
    ) -> AuthResult<DeletionRequest> {
        let now = Utc::now();
        let mut request = self
            .store
            .find_deletion_request(id)
            .await?
            .ok_or(AuthError::DeletionRequestNotFound)?;
        if !request.is_pending() {
            return Err(AuthError::DeletionAlreadyReviewed);
        }

        if approve {
            if let Some(mut user) = self.store.find_user(&request.user_id).await? {
                user.status = UserStatus::Deactivated;
                user.updated_at = now;
                self.store.update_user(&user).await?;
            }
            self.store.delete_user_refresh_tokens(&request.user_id).await?;
        }

        request.review(approve, *admin_id, note, now);
        self.store.update_deletion_request(&request).await?;
        tracing::info!(
            admin_id = %admin_id,
            request_id = %request.id,
            status = request.status.code(),
            "Deletion request reviewed"
        );
        Ok(request)
    }
}
