//! Email Verification Use Cases

use std::sync::Arc;

use chrono::Utc;
use platform::crypto::random_numeric_code;
use platform::mailer::{Mailer, templates};

use crate::application::config::AuthConfig;
use crate::application::register::OTP_DIGITS;
use crate::domain::entity::User;
use crate::domain::entity::credentials::SecretCheck;
use crate::domain::repository::{CredentialRepository, UserRepository};
use crate::domain::value_object::Email;
use crate::error::{AuthError, AuthResult};

pub struct VerifyEmailUseCase<S>
where
    S: UserRepository + CredentialRepository,
{
    store: Arc<S>,
    mailer: Mailer,
}

impl<S> VerifyEmailUseCase<S>
where
    S: UserRepository + CredentialRepository,
{
    pub fn new(store: Arc<S>, mailer: Mailer) -> Self {
        Self { store, mailer }
    }

    pub async fn execute(&self, email: &str, otp: &str) -> AuthResult<User> {
        let now = Utc::now();
        let email = Email::new(email)?;

        let mut user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidOtp)?;
        if user.email_verified_at.is_some() {
            return Err(AuthError::AlreadyVerified);
        }

        let mut credentials = self
            .store
            .find_credentials(&user.id)
            .await?
            .ok_or(AuthError::InvalidOtp)?;

        match credentials.check_otp(otp, now) {
            SecretCheck::Valid => {}
            SecretCheck::Expired => return Err(AuthError::OtpExpired),
            SecretCheck::Mismatch => return Err(AuthError::InvalidOtp),
        }

        credentials.clear_otp(now);
        user.verify_email(now);
        self.store.update_credentials(&credentials).await?;
        self.store.update_user(&user).await?;
        tracing::info!(user_id = %user.id, "Email verified");

        self.mailer
            .send_best_effort(templates::welcome(user.email.as_str(), &user.name))
            .await;

        Ok(user)
    }
}

pub struct ResendOtpUseCase<S>
where
    S: UserRepository + CredentialRepository,
{
    store: Arc<S>,
    mailer: Mailer,
    config: Arc<AuthConfig>,
}

impl<S> ResendOtpUseCase<S>
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

    pub async fn execute(&self, email: &str) -> AuthResult<()> {
        let now = Utc::now();
        let email = Email::new(email)?;

        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if user.email_verified_at.is_some() {
            return Err(AuthError::AlreadyVerified);
        }

        let mut credentials = self
            .store
            .find_credentials(&user.id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let code = random_numeric_code(OTP_DIGITS);
        credentials.set_otp(&code, self.config.otp_ttl_chrono(), now);
        self.store.update_credentials(&credentials).await?;

        self.mailer
            .send_best_effort(templates::verification_code(
                user.email.as_str(),
                &user.name,
                &code,
                self.config.otp_ttl_minutes(),
            ))
            .await;
        Ok(())
    }
}
