//! Auth Error Types
//!
//! Auth-specific error variants that fold into the unified
//! `kernel::error::AppError` envelope.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::password::{PasswordHashError, PasswordPolicyError};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer credential on a protected route
    #[error("Authentication required")]
    MissingToken,

    /// Signature or structure check failed
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    /// Token subject no longer maps to an active account
    #[error("User no longer exists or is inactive")]
    InactivePrincipal,

    /// Role not in the allowed set
    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is temporarily locked, try again later")]
    AccountLocked,

    #[error("Please verify your email before signing in")]
    EmailNotVerified,

    #[error("Account is {0}")]
    AccountDisabled(&'static str),

    #[error("User not found")]
    UserNotFound,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Email is already verified")]
    AlreadyVerified,

    #[error("Invalid verification code")]
    InvalidOtp,

    #[error("Verification code expired")]
    OtpExpired,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Current password is incorrect")]
    WrongPassword,

    #[error("{0}")]
    PasswordPolicy(#[from] PasswordPolicyError),

    #[error("A deletion request is already pending")]
    DeletionAlreadyRequested,

    #[error("Deletion request not found")]
    DeletionRequestNotFound,

    #[error("Deletion request has already been reviewed")]
    DeletionAlreadyReviewed,

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// Validation or other errors already shaped as `AppError`
    #[error(transparent)]
    App(#[from] AppError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::InactivePrincipal
            | AuthError::InvalidCredentials
            | AuthError::InvalidRefreshToken => ErrorKind::Unauthorized,
            AuthError::Forbidden
            | AuthError::AccountLocked
            | AuthError::EmailNotVerified
            | AuthError::AccountDisabled(_) => ErrorKind::Forbidden,
            AuthError::UserNotFound | AuthError::DeletionRequestNotFound => ErrorKind::NotFound,
            AuthError::EmailTaken
            | AuthError::DeletionAlreadyRequested
            | AuthError::DeletionAlreadyReviewed => ErrorKind::Conflict,
            AuthError::AlreadyVerified
            | AuthError::InvalidOtp
            | AuthError::OtpExpired
            | AuthError::InvalidResetToken
            | AuthError::WrongPassword
            | AuthError::PasswordPolicy(_)
            | AuthError::InvalidStatus(_) => ErrorKind::BadRequest,
            AuthError::App(e) => e.kind(),
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::AccountLocked => {
                tracing::warn!("Login attempt on locked account");
            }
            AuthError::InvalidToken | AuthError::InvalidRefreshToken => {
                tracing::warn!(error = %self, "Rejected credential");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::App(e) => e,
            AuthError::Database(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::internal("Internal server error").with_detail(msg),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }
}

impl From<PasswordHashError> for AuthError {
    fn from(err: PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        AuthError::Internal(format!("Blocking task failed: {err}"))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_errors_are_401() {
        for err in [AuthError::MissingToken, AuthError::InvalidToken, AuthError::TokenExpired] {
            assert_eq!(AppError::from(err).status_code(), 401);
        }
        assert_eq!(AppError::from(AuthError::TokenExpired).message(), "Token expired");
        assert_eq!(AppError::from(AuthError::InvalidToken).message(), "Invalid token");
    }

    #[test]
    fn test_internal_message_is_not_public() {
        let app = AppError::from(AuthError::Internal("pool exhausted".into()));
        assert_eq!(app.status_code(), 500);
        assert_eq!(app.public_message(), "Internal server error");
        assert!(app.source_chain().iter().any(|c| c.contains("pool exhausted")));
    }

    #[test]
    fn test_passthrough_keeps_kind() {
        let app = AppError::from(AuthError::App(AppError::bad_request("Invalid email format")));
        assert_eq!(app.status_code(), 400);
        assert_eq!(app.message(), "Invalid email format");
    }
}
