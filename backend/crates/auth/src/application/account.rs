//! Account Self-Service Use Cases

use std::sync::Arc;

use chrono::Utc;
use kernel::id::UserId;

use crate::domain::entity::{DeletionRequest, User};
use crate::domain::repository::{DeletionRequestRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

/// Absent fields are left unchanged; an empty phone or avatar clears it.
#[derive(Debug, Default)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

pub struct UpdateProfileUseCase<U>
where
    U: UserRepository,
{
    users: Arc<U>,
}

impl<U> UpdateProfileUseCase<U>
where
    U: UserRepository,
{
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }

    pub async fn execute(&self, user_id: &UserId, input: UpdateProfileInput) -> AuthResult<User> {
        let mut user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if let Some(name) = input.name {
            user.name = name.trim().to_string();
        }
        if let Some(phone) = input.phone {
            user.phone = Some(phone.trim().to_string()).filter(|p| !p.is_empty());
        }
        if let Some(avatar_url) = input.avatar_url {
            user.avatar_url = Some(avatar_url.trim().to_string()).filter(|u| !u.is_empty());
        }
        user.updated_at = Utc::now();

        self.users.update_user(&user).await?;
        Ok(user)
    }
}

pub struct RequestDeletionUseCase<R>
where
    R: DeletionRequestRepository,
{
    repo: Arc<R>,
}

impl<R> RequestDeletionUseCase<R>
where
    R: DeletionRequestRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user_id: &UserId, reason: String) -> AuthResult<DeletionRequest> {
        if self.repo.find_pending_deletion_request(user_id).await?.is_some() {
            return Err(AuthError::DeletionAlreadyRequested);
        }

        let request = DeletionRequest::new(*user_id, reason.trim(), Utc::now());
        self.repo.create_deletion_request(&request).await?;
        tracing::info!(user_id = %user_id, request_id = %request.id, "Account deletion requested");
        Ok(request)
    }
}
