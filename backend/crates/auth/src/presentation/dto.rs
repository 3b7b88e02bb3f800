//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use kernel::id::{DeletionRequestId, UserId};
use kernel::pagination::PageQuery;
use kernel::validate::{Validate, Validator};
use kernel::AppError;
use serde::{Deserialize, Serialize};

use crate::application::{AuthenticatedSession, CurrentUser};
use crate::domain::entity::{DeletionRequest, DeletionStatus, User};
use crate::domain::value_object::{Role, UserStatus};

const NAME_MAX: usize = 100;

// ============================================================================
// Registration and Verification
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::new()
            .length("name", &self.name, 2, NAME_MAX)
            .email("email", &self.email)
            .required("password", &self.password)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    pub email: String,
    pub otp: String,
}

impl Validate for VerifyEmailRequest {
    fn validate(&self) -> Result<(), AppError> {
        let otp = self.otp.trim();
        Validator::new()
            .email("email", &self.email)
            .check(
                otp.len() == 6 && otp.chars().all(|c| c.is_ascii_digit()),
                "otp must be a 6-digit code",
            )
            .finish()
    }
}

/// Body carrying only an email: resend-otp and forgot-password.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    pub email: String,
}

impl Validate for EmailRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::new().email("email", &self.email).finish()
    }
}

// ============================================================================
// Sessions
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::new()
            .required("email", &self.email)
            .required("password", &self.password)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

impl Validate for RefreshRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::new()
            .required("refreshToken", &self.refresh_token)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<AuthenticatedSession> for AuthResponse {
    fn from(session: AuthenticatedSession) -> Self {
        Self {
            user: UserResponse::from(session.user),
            access_token: session.tokens.access_token,
            refresh_token: session.tokens.refresh_token,
            expires_at: session.tokens.expires_at,
        }
    }
}

// ============================================================================
// Passwords
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

impl Validate for ResetPasswordRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::new()
            .required("token", &self.token)
            .required("password", &self.password)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl Validate for ChangePasswordRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::new()
            .required("currentPassword", &self.current_password)
            .required("newPassword", &self.new_password)
            .check(
                self.current_password != self.new_password,
                "newPassword must differ from currentPassword",
            )
            .finish()
    }
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.length("name", name, 2, NAME_MAX);
        }
        if let Some(phone) = &self.phone {
            v.check(phone.trim().len() <= 20, "phone must be at most 20 characters");
        }
        if let Some(url) = self.avatar_url.as_deref().filter(|u| !u.trim().is_empty()) {
            v.check(
                url.starts_with("https://") || url.starts_with("http://"),
                "avatarUrl must be an http(s) URL",
            );
        }
        v.finish()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    pub email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email.as_str().to_string(),
            phone: user.phone,
            avatar_url: user.avatar_url,
            role: user.role,
            status: user.status,
            email_verified: user.email_verified_at.is_some(),
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: CurrentUser,
}

// ============================================================================
// Deletion Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionRequestBody {
    pub reason: String,
}

impl Validate for DeletionRequestBody {
    fn validate(&self) -> Result<(), AppError> {
        Validator::new()
            .length("reason", &self.reason, 5, 1000)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDeletionRequest {
    pub status: DeletionStatus,
    pub note: Option<String>,
}

impl Validate for ReviewDeletionRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::new()
            .check(
                self.status != DeletionStatus::Pending,
                "status must be approved or rejected",
            )
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionRequestResponse {
    pub id: DeletionRequestId,
    pub user_id: UserId,
    pub reason: String,
    pub status: DeletionStatus,
    pub reviewed_by: Option<UserId>,
    pub review_note: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<DeletionRequest> for DeletionRequestResponse {
    fn from(r: DeletionRequest) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            reason: r.reason,
            status: r.status,
            reviewed_by: r.reviewed_by,
            review_note: r.review_note,
            reviewed_at: r.reviewed_at,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<DeletionStatus>,
}

impl DeletionListQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

// ============================================================================
// Admin: Users
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub search: Option<String>,
}

impl UserListQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserStatusRequest {
    pub status: UserStatus,
}

impl Validate for UpdateUserStatusRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::new()
            .check(
                self.status.is_admin_assignable(),
                "status must be active or suspended",
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation_lists_every_field() {
        let req = RegisterRequest {
            name: "A".into(),
            email: "nope".into(),
            password: "".into(),
            phone: None,
        };
        let err = req.validate().unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.message().contains("name"));
        assert!(err.message().contains("email"));
        assert!(err.message().contains("password"));
    }

    #[test]
    fn test_verify_email_requires_six_digits() {
        let ok = VerifyEmailRequest {
            email: "ada@example.com".into(),
            otp: "123456".into(),
        };
        assert!(ok.validate().is_ok());
        let bad = VerifyEmailRequest {
            email: "ada@example.com".into(),
            otp: "12a456".into(),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_status_body_rejects_unassignable() {
        let req: UpdateUserStatusRequest = serde_json::from_str(r#"{"status":"pending"}"#).unwrap();
        assert!(req.validate().is_err());
        let req: UpdateUserStatusRequest =
            serde_json::from_str(r#"{"status":"suspended"}"#).unwrap();
        assert!(req.validate().is_ok());
    }
}
