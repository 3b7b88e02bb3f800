//! Application Layer
//!
//! Use cases and application services.

pub mod account;
pub mod admin;
pub mod config;
pub mod password;
pub mod principal;
pub mod register;
pub mod session;
pub mod token;
pub mod verification;

// Re-exports
pub use account::{RequestDeletionUseCase, UpdateProfileInput, UpdateProfileUseCase};
pub use admin::{
    ListDeletionRequestsUseCase, ListUsersUseCase, ReviewDeletionUseCase, SetUserStatusUseCase,
};
pub use config::AuthConfig;
pub use password::{ChangePasswordUseCase, ForgotPasswordUseCase, ResetPasswordUseCase};
pub use principal::{AuthenticateUseCase, CurrentUser};
pub use register::{RegisterInput, RegisterUseCase};
pub use session::{
    AuthenticatedSession, LoginInput, LoginUseCase, LogoutUseCase, RefreshUseCase, SessionTokens,
};
pub use token::{AccessToken, Claims, TokenService};
pub use verification::{ResendOtpUseCase, VerifyEmailUseCase};

use platform::password::{ClearTextPassword, HashedPassword, PasswordCost};

use crate::error::AuthResult;

/// Argon2 off the async workers.
pub(crate) async fn hash_password(
    password: ClearTextPassword,
    cost: PasswordCost,
) -> AuthResult<HashedPassword> {
    let hashed = tokio::task::spawn_blocking(move || password.hash(cost)).await??;
    Ok(hashed)
}

pub(crate) async fn verify_password(
    hash: HashedPassword,
    password: ClearTextPassword,
) -> AuthResult<bool> {
    Ok(tokio::task::spawn_blocking(move || hash.verify(&password)).await?)
}

/// Verify, and when the stored hash used another cost, produce a replacement.
pub(crate) async fn verify_and_upgrade(
    hash: HashedPassword,
    password: ClearTextPassword,
    cost: PasswordCost,
) -> AuthResult<(bool, Option<HashedPassword>)> {
    let outcome = tokio::task::spawn_blocking(move || {
        if !hash.verify(&password) {
            return (false, None);
        }
        let upgraded = if hash.needs_rehash(cost) {
            password.hash(cost).ok()
        } else {
            None
        };
        (true, upgraded)
    })
    .await?;
    Ok(outcome)
}
