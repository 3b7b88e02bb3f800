//! HTTP Handlers

use std::sync::Arc;

use axum::extract::State;

use kernel::extract::{AppPath, AppQuery, ValidJson};
use kernel::id::{DeletionRequestId, UserId};
use kernel::pagination::Page;
use kernel::response::ApiResponse;
use platform::client::ClientInfo;
use platform::mailer::Mailer;

use crate::application::config::AuthConfig;
use crate::application::{
    ChangePasswordUseCase, CurrentUser, ForgotPasswordUseCase, ListDeletionRequestsUseCase,
    ListUsersUseCase, LoginInput, LoginUseCase, LogoutUseCase, RefreshUseCase, RegisterInput,
    RegisterUseCase, RequestDeletionUseCase, ResendOtpUseCase, ResetPasswordUseCase,
    ReviewDeletionUseCase, SetUserStatusUseCase, TokenService, UpdateProfileInput,
    UpdateProfileUseCase, VerifyEmailUseCase,
};
use crate::domain::entity::DeletionStatus;
use crate::domain::repository::{AuthStore, UserFilter};
use crate::error::AuthResult;
use crate::presentation::dto::{
    AuthResponse, ChangePasswordRequest, DeletionListQuery, DeletionRequestBody,
    DeletionRequestResponse, EmailRequest, LoginRequest, MeResponse, RefreshRequest,
    RegisterRequest, ResetPasswordRequest, ReviewDeletionRequest, UpdateProfileRequest,
    UpdateUserStatusRequest, UserListQuery, UserResponse, VerifyEmailRequest,
};

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<S>
where
    S: AuthStore,
{
    pub store: Arc<S>,
    pub config: Arc<AuthConfig>,
    pub tokens: TokenService,
    pub mailer: Mailer,
}

impl<S> AuthAppState<S>
where
    S: AuthStore,
{
    pub fn new(store: S, config: AuthConfig, mailer: Mailer) -> Self {
        let tokens = TokenService::new(&config);
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
            tokens,
            mailer,
        }
    }
}

// ============================================================================
// Registration and Verification
// ============================================================================

/// POST /api/auth/register
pub async fn register<S>(
    State(state): State<AuthAppState<S>>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> AuthResult<ApiResponse<UserResponse>>
where
    S: AuthStore,
{
    let use_case = RegisterUseCase::new(
        state.store.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );
    let user = use_case
        .execute(RegisterInput {
            name: req.name,
            email: req.email,
            password: req.password,
            phone: req.phone,
        })
        .await?;

    Ok(ApiResponse::created(UserResponse::from(user))
        .with_message("Registration successful, check your email for the verification code"))
}

/// POST /api/auth/verify-email
pub async fn verify_email<S>(
    State(state): State<AuthAppState<S>>,
    ValidJson(req): ValidJson<VerifyEmailRequest>,
) -> AuthResult<ApiResponse<UserResponse>>
where
    S: AuthStore,
{
    let use_case = VerifyEmailUseCase::new(state.store.clone(), state.mailer.clone());
    let user = use_case.execute(&req.email, &req.otp).await?;
    Ok(ApiResponse::ok(UserResponse::from(user)).with_message("Email verified"))
}

/// POST /api/auth/resend-otp
pub async fn resend_otp<S>(
    State(state): State<AuthAppState<S>>,
    ValidJson(req): ValidJson<EmailRequest>,
) -> AuthResult<ApiResponse<()>>
where
    S: AuthStore,
{
    let use_case = ResendOtpUseCase::new(
        state.store.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );
    use_case.execute(&req.email).await?;
    Ok(ApiResponse::message("Verification code sent"))
}

// ============================================================================
// Sessions
// ============================================================================

/// POST /api/auth/login
pub async fn login<S>(
    State(state): State<AuthAppState<S>>,
    client: ClientInfo,
    ValidJson(req): ValidJson<LoginRequest>,
) -> AuthResult<ApiResponse<AuthResponse>>
where
    S: AuthStore,
{
    let use_case = LoginUseCase::new(
        state.store.clone(),
        state.tokens.clone(),
        state.config.clone(),
    );
    let session = use_case
        .execute(LoginInput {
            email: req.email,
            password: req.password,
            user_agent: client.user_agent,
        })
        .await?;

    Ok(ApiResponse::ok(AuthResponse::from(session)).with_message("Login successful"))
}

/// POST /api/auth/refresh
pub async fn refresh<S>(
    State(state): State<AuthAppState<S>>,
    client: ClientInfo,
    ValidJson(req): ValidJson<RefreshRequest>,
) -> AuthResult<ApiResponse<AuthResponse>>
where
    S: AuthStore,
{
    let use_case = RefreshUseCase::new(
        state.store.clone(),
        state.tokens.clone(),
        state.config.clone(),
    );
    let session = use_case
        .execute(&req.refresh_token, client.user_agent)
        .await?;
    Ok(ApiResponse::ok(AuthResponse::from(session)))
}

/// POST /api/auth/logout
pub async fn logout<S>(
    State(state): State<AuthAppState<S>>,
    user: CurrentUser,
) -> AuthResult<ApiResponse<()>>
where
    S: AuthStore,
{
    LogoutUseCase::new(state.store.clone())
        .execute(&user.id)
        .await?;
    Ok(ApiResponse::message("Logged out"))
}

/// GET /api/auth/me
pub async fn me(user: CurrentUser) -> ApiResponse<MeResponse> {
    ApiResponse::ok(MeResponse { user })
}

// ============================================================================
// Passwords
// ============================================================================

/// POST /api/auth/forgot-password
pub async fn forgot_password<S>(
    State(state): State<AuthAppState<S>>,
    ValidJson(req): ValidJson<EmailRequest>,
) -> AuthResult<ApiResponse<()>>
where
    S: AuthStore,
{
    let use_case = ForgotPasswordUseCase::new(
        state.store.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );
    use_case.execute(&req.email).await?;
    Ok(ApiResponse::message(
        "If that email is registered, a reset link has been sent",
    ))
}

/// POST /api/auth/reset-password
pub async fn reset_password<S>(
    State(state): State<AuthAppState<S>>,
    ValidJson(req): ValidJson<ResetPasswordRequest>,
) -> AuthResult<ApiResponse<()>>
where
    S: AuthStore,
{
    ResetPasswordUseCase::new(state.store.clone(), state.config.clone())
        .execute(&req.token, req.password)
        .await?;
    Ok(ApiResponse::message("Password has been reset, please log in"))
}

/// PUT /api/users/me/password
pub async fn change_password<S>(
    State(state): State<AuthAppState<S>>,
    user: CurrentUser,
    ValidJson(req): ValidJson<ChangePasswordRequest>,
) -> AuthResult<ApiResponse<()>>
where
    S: AuthStore,
{
    ChangePasswordUseCase::new(state.store.clone(), state.config.clone())
        .execute(&user.id, req.current_password, req.new_password)
        .await?;
    Ok(ApiResponse::message("Password changed, please log in again"))
}

// ============================================================================
// Profile
// ============================================================================

/// PUT /api/users/me
pub async fn update_profile<S>(
    State(state): State<AuthAppState<S>>,
    user: CurrentUser,
    ValidJson(req): ValidJson<UpdateProfileRequest>,
) -> AuthResult<ApiResponse<UserResponse>>
where
    S: AuthStore,
{
    let updated = UpdateProfileUseCase::new(state.store.clone())
        .execute(
            &user.id,
            UpdateProfileInput {
                name: req.name,
                phone: req.phone,
                avatar_url: req.avatar_url,
            },
        )
        .await?;
    Ok(ApiResponse::ok(UserResponse::from(updated)).with_message("Profile updated"))
}

/// POST /api/users/me/deletion-request
pub async fn request_deletion<S>(
    State(state): State<AuthAppState<S>>,
    user: CurrentUser,
    ValidJson(req): ValidJson<DeletionRequestBody>,
) -> AuthResult<ApiResponse<DeletionRequestResponse>>
where
    S: AuthStore,
{
    let request = RequestDeletionUseCase::new(state.store.clone())
        .execute(&user.id, req.reason)
        .await?;
    Ok(ApiResponse::created(DeletionRequestResponse::from(request))
        .with_message("Deletion request submitted"))
}

// ============================================================================
// Admin
// ============================================================================

/// GET /api/admin/users
pub async fn list_users<S>(
    State(state): State<AuthAppState<S>>,
    AppQuery(query): AppQuery<UserListQuery>,
) -> AuthResult<ApiResponse<Page<UserResponse>>>
where
    S: AuthStore,
{
    let page = query.page();
    let filter = UserFilter {
        role: query.role,
        status: query.status,
        search: query.search,
    };
    let users = ListUsersUseCase::new(state.store.clone())
        .execute(filter, page)
        .await?;
    Ok(ApiResponse::ok(users.map(UserResponse::from)))
}

/// PATCH /api/admin/users/{id}/status
pub async fn set_user_status<S>(
    State(state): State<AuthAppState<S>>,
    admin: CurrentUser,
    AppPath(id): AppPath<UserId>,
    ValidJson(req): ValidJson<UpdateUserStatusRequest>,
) -> AuthResult<ApiResponse<UserResponse>>
where
    S: AuthStore,
{
    let user = SetUserStatusUseCase::new(state.store.clone())
        .execute(&admin.id, &id, req.status)
        .await?;
    Ok(ApiResponse::ok(UserResponse::from(user)).with_message("User status updated"))
}

/// GET /api/admin/deletion-requests
pub async fn list_deletion_requests<S>(
    State(state): State<AuthAppState<S>>,
    AppQuery(query): AppQuery<DeletionListQuery>,
) -> AuthResult<ApiResponse<Page<DeletionRequestResponse>>>
where
    S: AuthStore,
{
    let requests = ListDeletionRequestsUseCase::new(state.store.clone())
        .execute(query.status, query.page())
        .await?;
    Ok(ApiResponse::ok(requests.map(DeletionRequestResponse::from)))
}

/// PATCH /api/admin/deletion-requests/{id}
pub async fn review_deletion_request<S>(
    State(state): State<AuthAppState<S>>,
    admin: CurrentUser,
    AppPath(id): AppPath<DeletionRequestId>,
    ValidJson(req): ValidJson<ReviewDeletionRequest>,
) -> AuthResult<ApiResponse<DeletionRequestResponse>>
where
    S: AuthStore,
{
    let approve = match req.status {
        DeletionStatus::Approved => true,
        DeletionStatus::Rejected | DeletionStatus::Pending => false,
    };
    let request = ReviewDeletionUseCase::new(state.store.clone())
        .execute(&admin.id, &id, approve, req.note)
        .await?;
    Ok(ApiResponse::ok(DeletionRequestResponse::from(request)))
}
