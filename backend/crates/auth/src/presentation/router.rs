//! Auth Routers
//!
//! `/api/auth`, `/api/users` and the user-moderation half of `/api/admin`.

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
};

use crate::domain::repository::AuthStore;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{AllowedRoles, AuthGuard, authenticate, authorize};

impl<S> AuthAppState<S>
where
    S: AuthStore,
{
    /// Middleware state for other crates' routers.
    pub fn guard(&self) -> AuthGuard<S> {
        AuthGuard::new(self.store.clone(), self.tokens.clone())
    }
}

/// `/api/auth`
pub fn auth_router<S>(state: AuthAppState<S>) -> Router
where
    S: AuthStore,
{
    let public = Router::new()
        .route("/register", post(handlers::register::<S>))
        .route("/login", post(handlers::login::<S>))
        .route("/refresh", post(handlers::refresh::<S>))
        .route("/forgot-password", post(handlers::forgot_password::<S>))
        .route("/reset-password", post(handlers::reset_password::<S>))
        .route("/verify-email", post(handlers::verify_email::<S>))
        .route("/resend-otp", post(handlers::resend_otp::<S>));

    let protected = Router::new()
        .route("/logout", post(handlers::logout::<S>))
        .route("/me", get(handlers::me))
        .route_layer(from_fn_with_state(state.guard(), authenticate::<S>));

    public.merge(protected).with_state(state)
}

/// `/api/users`
pub fn users_router<S>(state: AuthAppState<S>) -> Router
where
    S: AuthStore,
{
    Router::new()
        .route("/me", put(handlers::update_profile::<S>))
        .route("/me/password", put(handlers::change_password::<S>))
        .route("/me/deletion-request", post(handlers::request_deletion::<S>))
        .route_layer(from_fn_with_state(state.guard(), authenticate::<S>))
        .with_state(state)
}

/// Admin routes owned by this crate, merged into `/api/admin`.
pub fn admin_router<S>(state: AuthAppState<S>) -> Router
where
    S: AuthStore,
{
    Router::new()
        .route("/users", get(handlers::list_users::<S>))
        .route("/users/{id}/status", patch(handlers::set_user_status::<S>))
        .route(
            "/deletion-requests",
            get(handlers::list_deletion_requests::<S>),
        )
        .route(
            "/deletion-requests/{id}",
            patch(handlers::review_deletion_request::<S>),
        )
        .route_layer(from_fn_with_state(AllowedRoles::ADMIN_ONLY, authorize))
        .route_layer(from_fn_with_state(state.guard(), authenticate::<S>))
        .with_state(state)
}
