//! Auth Middleware
//!
//! - [`authenticate`]: bearer token required, attaches [`CurrentUser`]
//! - [`optional_authenticate`]: attaches [`CurrentUser`] when the token checks out
//! - [`authorize`]: gates on a fixed set of roles, after `authenticate`
//!
//! Handlers read the principal through the [`CurrentUser`] and [`MaybeUser`]
//! extractors.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use crate::application::{AuthenticateUseCase, CurrentUser, TokenService};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::Role;
use crate::error::AuthError;

/// Middleware state: where users live and how tokens are checked.
pub struct AuthGuard<U> {
    users: Arc<U>,
    tokens: TokenService,
}

impl<U> Clone for AuthGuard<U> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

impl<U> AuthGuard<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    pub fn new(users: Arc<U>, tokens: TokenService) -> Self {
        Self { users, tokens }
    }

    async fn resolve(&self, bearer: &str) -> Result<CurrentUser, AuthError> {
        AuthenticateUseCase::new(self.users.clone(), self.tokens.clone())
            .execute(bearer)
            .await
    }
}

/// Token from `Authorization: Bearer <token>`. The scheme is case-insensitive.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub async fn authenticate<U>(
    State(guard): State<AuthGuard<U>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    U: UserRepository + Send + Sync + 'static,
{
    let token = bearer_token(req.headers())
        .ok_or(AuthError::MissingToken)?
        .to_owned();
    let user = guard.resolve(&token).await?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Never rejects. A bad or missing token leaves the request anonymous.
pub async fn optional_authenticate<U>(
    State(guard): State<AuthGuard<U>>,
    mut req: Request,
    next: Next,
) -> Response
where
    U: UserRepository + Send + Sync + 'static,
{
    if let Some(token) = bearer_token(req.headers()).map(str::to_owned) {
        match guard.resolve(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Optional authentication skipped");
            }
        }
    }
    next.run(req).await
}

/// The set of roles admitted by [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedRoles {
    customer: bool,
    vendor: bool,
    admin: bool,
}

impl AllowedRoles {
    pub const ADMIN_ONLY: Self = Self {
        customer: false,
        vendor: false,
        admin: true,
    };

    pub const VENDOR_OR_ADMIN: Self = Self {
        customer: false,
        vendor: true,
        admin: true,
    };

    pub const VENDOR_ONLY: Self = Self {
        customer: false,
        vendor: true,
        admin: false,
    };

    pub fn of(roles: &[Role]) -> Self {
        let mut allowed = Self {
            customer: false,
            vendor: false,
            admin: false,
        };
        for role in roles {
            match role {
                Role::Customer => allowed.customer = true,
                Role::Vendor => allowed.vendor = true,
                Role::Admin => allowed.admin = true,
            }
        }
        allowed
    }

    pub const fn permits(&self, role: Role) -> bool {
        match role {
            Role::Customer => self.customer,
            Role::Vendor => self.vendor,
            Role::Admin => self.admin,
        }
    }
}

pub async fn authorize(
    State(allowed): State<AllowedRoles>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AuthError::MissingToken)?;

    if !allowed.permits(user.role) {
        tracing::warn!(user_id = %user.id, role = user.role.code(), "Role not permitted");
        return Err(AuthError::Forbidden);
    }
    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

/// The principal when one was attached by [`optional_authenticate`].
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<CurrentUser>().cloned()))
    }
}
