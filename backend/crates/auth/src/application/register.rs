//! Register Use Case
//!
//! Creates a pending customer account and emails a 6-digit verification code.

use std::sync::Arc;

use chrono::Utc;
use platform::crypto::random_numeric_code;
use platform::mailer::{Mailer, templates};
use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::hash_password;
use crate::domain::entity::{Credentials, User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::Email;
use crate::error::{AuthError, AuthResult};

pub const OTP_DIGITS: u32 = 6;

pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

pub struct RegisterUseCase<U>
where
    U: UserRepository,
{
    users: Arc<U>,
    mailer: Mailer,
    config: Arc<AuthConfig>,
}

impl<U> RegisterUseCase<U>
where
    U: UserRepository,
{
    pub fn new(users: Arc<U>, mailer: Mailer, config: Arc<AuthConfig>) -> Self {
        Self {
            users,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<User> {
        let now = Utc::now();
        let email = Email::new(&input.email)?;

        if self.users.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password = ClearTextPassword::new(input.password)?;
        let password_hash = hash_password(password, self.config.password_cost).await?;

        let mut user = User::register(input.name, email, now);
        user.phone = input.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());

        let code = random_numeric_code(OTP_DIGITS);
        let mut credentials = Credentials::new(user.id, password_hash, now);
        credentials.set_otp(&code, self.config.otp_ttl_chrono(), now);

        self.users.create_user(&user, &credentials).await?;
        tracing::info!(user_id = %user.id, "User registered");

        self.mailer
            .send_best_effort(templates::verification_code(
                user.email.as_str(),
                &user.name,
                &code,
                self.config.otp_ttl_minutes(),
            ))
            .await;

        Ok(user)
    }
}
