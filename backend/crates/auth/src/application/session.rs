//! Session Use Cases
//!
//! Login, refresh-token rotation and logout. A session is a short-lived
//! access token plus an opaque refresh token stored as a digest.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::token::TokenService;
use crate::application::verify_and_upgrade;
use crate::domain::entity::{RefreshToken, User};
use crate::domain::repository::{CredentialRepository, RefreshTokenRepository, UserRepository};
use crate::domain::value_object::{Email, UserStatus};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub user: User,
    pub tokens: SessionTokens,
}

async fn issue_session<R>(
    repo: &R,
    tokens: &TokenService,
    config: &AuthConfig,
    user: &User,
    user_agent: Option<String>,
    now: DateTime<Utc>,
) -> AuthResult<SessionTokens>
where
    R: RefreshTokenRepository,
{
    let access = tokens.issue(user.id, user.role, now)?;
    let (refresh, clear) =
        RefreshToken::issue(user.id, config.refresh_ttl_chrono(), user_agent, now);
    repo.store_refresh_token(&refresh).await?;

    Ok(SessionTokens {
        access_token: access.token,
        expires_at: access.expires_at,
        refresh_token: clear,
    })
}

// ============================================================================
// Login
// ============================================================================

pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub user_agent: Option<String>,
}

pub struct LoginUseCase<S>
where
    S: UserRepository + CredentialRepository + RefreshTokenRepository,
{
    store: Arc<S>,
    tokens: TokenService,
    config: Arc<AuthConfig>,
}

impl<S> LoginUseCase<S>
where
    S: UserRepository + CredentialRepository + RefreshTokenRepository,
{
    pub fn new(store: Arc<S>, tokens: TokenService, config: Arc<AuthConfig>) -> Self {
        Self {
            store,
            tokens,
            config,
        }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<AuthenticatedSession> {
        let now = Utc::now();
        let email = Email::new(&input.email).map_err(|_| AuthError::InvalidCredentials)?;

        let mut user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let mut credentials = self
            .store
            .find_credentials(&user.id)
            .await?
            .ok_or_else(|| AuthError::Internal(format!("No credentials for user {}", user.id)))?;

        if credentials.is_locked(now) {
            return Err(AuthError::AccountLocked);
        }

        let password = ClearTextPassword::for_verification(input.password);
        let (valid, upgraded) = verify_and_upgrade(
            credentials.password_hash.clone(),
            password,
            self.config.password_cost,
        )
        .await?;

        if !valid {
            let locked = credentials.record_failure(
                now,
                self.config.max_login_failures,
                self.config.lockout_chrono(),
            );
            self.store.update_credentials(&credentials).await?;
            if locked {
                tracing::warn!(user_id = %user.id, "Account locked after repeated failures");
            }
            return Err(AuthError::InvalidCredentials);
        }

        match user.status {
            UserStatus::Active => {}
            UserStatus::Pending => return Err(AuthError::EmailNotVerified),
            UserStatus::Suspended => return Err(AuthError::AccountDisabled("suspended")),
            UserStatus::Deactivated => return Err(AuthError::AccountDisabled("deactivated")),
        }

        credentials.reset_failures(now);
        if let Some(hash) = upgraded {
            credentials.password_hash = hash;
        }
        self.store.update_credentials(&credentials).await?;

        user.record_login(now);
        self.store.update_user(&user).await?;

        let tokens = issue_session(
            self.store.as_ref(),
            &self.tokens,
            &self.config,
            &user,
            input.user_agent,
            now,
        )
        .await?;

        tracing::info!(user_id = %user.id, role = user.role.code(), "User logged in");
        Ok(AuthenticatedSession { user, tokens })
    }
}

// ============================================================================
// Refresh
// ============================================================================

pub struct RefreshUseCase<S>
where
    S: UserRepository + RefreshTokenRepository,
{
    store: Arc<S>,
    tokens: TokenService,
    config: Arc<AuthConfig>,
}

impl<S> RefreshUseCase<S>
where
    S: UserRepository + RefreshTokenRepository,
{
    pub fn new(store: Arc<S>, tokens: TokenService, config: Arc<AuthConfig>) -> Self {
        Self {
            store,
            tokens,
            config,
        }
    }

    /// Consume the presented refresh token and hand out a new pair.
    pub async fn execute(
        &self,
        refresh_token: &str,
        user_agent: Option<String>,
    ) -> AuthResult<AuthenticatedSession> {
        let now = Utc::now();
        let digest = RefreshToken::digest(refresh_token.trim());

        let stored = self
            .store
            .find_refresh_token(&digest)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        // Single use: a replayed token finds nothing.
        if !self.store.delete_refresh_token(&digest).await? {
            return Err(AuthError::InvalidRefreshToken);
        }
        if stored.is_expired(now) {
            return Err(AuthError::InvalidRefreshToken);
        }

        let user = self
            .store
            .find_user(&stored.user_id)
            .await?
            .filter(User::is_active)
            .ok_or(AuthError::InactivePrincipal)?;

        let tokens = issue_session(
            self.store.as_ref(),
            &self.tokens,
            &self.config,
            &user,
            user_agent,
            now,
        )
        .await?;
        Ok(AuthenticatedSession { user, tokens })
    }
}

// ============================================================================
// Logout
// ============================================================================

pub struct LogoutUseCase<R>
where
    R: RefreshTokenRepository,
{
    repo: Arc<R>,
}

impl<R> LogoutUseCase<R>
where
    R: RefreshTokenRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Revoke every refresh token of the user. Access tokens lapse on their own.
    pub async fn execute(&self, user_id: &UserId) -> AuthResult<u64> {
        let revoked = self.repo.delete_user_refresh_tokens(user_id).await?;
        tracing::info!(user_id = %user_id, revoked, "User logged out");
        Ok(revoked)
    }
}
