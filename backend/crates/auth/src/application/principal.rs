//! Request Principal
//!
//! Resolves a bearer token to the acting user. The role is read from the
//! store, not the token, so promotions and suspensions apply immediately.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::UserId;
use serde::Serialize;

use crate::application::token::TokenService;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{Email, Role};
use crate::error::{AuthError, AuthResult};

/// The authenticated user attached to a request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Owner of a resource, or an admin acting on it.
    pub fn owns_or_admin(&self, owner: &UserId) -> bool {
        self.id == *owner || self.is_admin()
    }
}

pub struct AuthenticateUseCase<U>
where
    U: UserRepository,
{
    users: Arc<U>,
    tokens: TokenService,
}

impl<U> AuthenticateUseCase<U>
where
    U: UserRepository,
{
    pub fn new(users: Arc<U>, tokens: TokenService) -> Self {
        Self { users, tokens }
    }

    pub async fn execute(&self, bearer: &str) -> AuthResult<CurrentUser> {
        let claims = self.tokens.verify(bearer, Utc::now())?;

        let user = self
            .users
            .find_user(&claims.sub)
            .await?
            .ok_or(AuthError::InactivePrincipal)?;

        if !user.is_active() {
            return Err(AuthError::InactivePrincipal);
        }

        Ok(CurrentUser {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        })
    }
}
