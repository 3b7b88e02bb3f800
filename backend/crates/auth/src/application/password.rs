//! Password Use Cases
//!
//! Forgotten-password flow and authenticated password change. Both revoke
//! every refresh token of the account.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::UserId;
use platform::crypto::{random_hex, sha256_hex};
use platform::mailer::{Mailer, templates};
use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::{hash_password, verify_password};
use crate::domain::entity::credentials::SecretCheck;
use crate::domain::repository::{CredentialRepository, RefreshTokenRepository, UserRepository};
use crate::domain::value_object::Email;
use crate::error::{AuthError, AuthResult};

pub struct ForgotPasswordUseCase<S>
where
    S: UserRepository + CredentialRepository,
{
    store: Arc<S>,
    mailer: Mailer,
    config: Arc<AuthConfig>,
}

impl<S> ForgotPasswordUseCase<S>
where
    S: UserRepository + CredentialRepository,
{
    pub fn new(store: Arc<S>, mailer: Mailer, config: Arc<AuthConfig>) -> Self {
        Self {
            store,
            mailer,
            config,
        }
    }

    /// Succeeds whether or not the address is known.
    pub async fn execute(&self, email: &str) -> AuthResult<()> {
        let now = Utc::now();
        let Ok(email) = Email::new(email) else {
            return Ok(());
        };
        let Some(user) = self.store.find_user_by_email(&email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };
        let Some(mut credentials) = self.store.find_credentials(&user.id).await? else {
            return Ok(());
        };

        let token = random_hex(32);
        credentials.set_reset_token(&token, self.config.reset_ttl_chrono(), now);
        self.store.update_credentials(&credentials).await?;

        let url = format!(
            "{}/reset-password/{}",
            self.config.client_url.trim_end_matches('/'),
            token
        );
        self.mailer
            .send_best_effort(templates::password_reset(
                user.email.as_str(),
                &user.name,
                &url,
                self.config.reset_ttl_minutes(),
            ))
            .await;

        tracing::info!(user_id = %user.id, "Password reset issued");
        Ok(())
    }
}

pub struct ResetPasswordUseCase<S>
where
    S: CredentialRepository + RefreshTokenRepository,
{
    store: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> ResetPasswordUseCase<S>
where
    S: CredentialRepository + RefreshTokenRepository,
{
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    pub async fn execute(&self, token: &str, new_password: String) -> AuthResult<()> {
        let now = Utc::now();
        let digest = sha256_hex(token.trim().as_bytes());

        let mut credentials = self
            .store
            .find_credentials_by_reset_token(&digest)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;
        if credentials.check_reset_token(token, now) != SecretCheck::Valid {
            return Err(AuthError::InvalidResetToken);
        }

        let password = ClearTextPassword::new(new_password)?;
        let hash = hash_password(password, self.config.password_cost).await?;
        credentials.change_password(hash, now);
        self.store.update_credentials(&credentials).await?;

        let revoked = self
            .store
            .delete_user_refresh_tokens(&credentials.user_id)
            .await?;
        tracing::info!(user_id = %credentials.user_id, revoked, "Password reset completed");
        Ok(())
    }
}

pub struct ChangePasswordUseCase<S>
where
    S: CredentialRepository + RefreshTokenRepository,
{
    store: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> ChangePasswordUseCase<S>
where
    S: CredentialRepository + RefreshTokenRepository,
{
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    pub async fn execute(
        &self,
        user_id: &UserId,
        current_password: String,
        new_password: String,
    ) -> AuthResult<()> {
        let now = Utc::now();
        let mut credentials = self
            .store
            .find_credentials(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let current = ClearTextPassword::for_verification(current_password);
        if !verify_password(credentials.password_hash.clone(), current).await? {
            return Err(AuthError::WrongPassword);
        }

        let password = ClearTextPassword::new(new_password)?;
        let hash = hash_password(password, self.config.password_cost).await?;
        credentials.change_password(hash, now);
        self.store.update_credentials(&credentials).await?;
        self.store.delete_user_refresh_tokens(user_id).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}
