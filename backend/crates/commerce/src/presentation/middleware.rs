//! Per-user throttling for download link issuance

use auth::{AuthError, CurrentUser};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::rate_limit::{RateLimitStore, RateLimiter};

/// Message for the 429 body.
pub const DOWNLOAD_LIMIT_MESSAGE: &str = "Too many download requests, please try again later";

/// Sliding window keyed by the authenticated user. Must run after
/// `authenticate`. Rejected requests are not counted.
pub async fn per_user_rate_limit<R>(
    State(limiter): State<RateLimiter<R>>,
    req: Request,
    next: Next,
) -> Response
where
    R: RateLimitStore + Send + Sync + 'static,
{
    let Some(user_id) = req.extensions().get::<CurrentUser>().map(|u| u.id) else {
        return AuthError::MissingToken.into_response();
    };

    match limiter.admit(&format!("download:{user_id}")).await {
        Ok(decision) => {
            let mut response = next.run(req).await;
            decision.write_headers(response.headers_mut());
            response
        }
        Err(rejection) => rejection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use auth::Role;
    use auth::models::Email;
    use axum::Router;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::middleware::from_fn_with_state;
    use axum::routing::post;
    use kernel::id::UserId;
    use platform::rate_limit::{InMemoryRateLimitStore, RateLimitConfig};
    use tower::ServiceExt;

    fn as_user(id: UserId) -> CurrentUser {
        CurrentUser {
            id,
            email: Email::new("buyer@example.com").unwrap(),
            name: "Buyer".into(),
            role: Role::Customer,
        }
    }

    fn app(limiter: RateLimiter<InMemoryRateLimitStore>, user: Option<CurrentUser>) -> Router {
        Router::new()
            .route("/", post(|| async { "ok" }))
            .route_layer(from_fn_with_state(limiter, per_user_rate_limit::<InMemoryRateLimitStore>))
            .layer(axum::middleware::from_fn(move |mut req: Request, next: Next| {
                let user = user.clone();
                async move {
                    if let Some(user) = user {
                        req.extensions_mut().insert(user);
                    }
                    next.run(req).await
                }
            }))
    }

    async fn hit(app: &Router) -> Response {
        app.clone()
            .oneshot(Request::post("/").body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_five_per_window_then_429() {
        let limiter = RateLimiter::in_memory(RateLimitConfig::new(5, Duration::from_secs(15 * 60)));
        let user = UserId::new();
        let app = app(limiter.clone(), Some(as_user(user)));

        for remaining in (0..5).rev() {
            let response = hit(&app).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()["x-ratelimit-remaining"], remaining.to_string().as_str());
        }
        let denied = hit(&app).await;
        assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(denied.headers().contains_key("retry-after"));

        // Another user has an independent window.
        let other = self::app(limiter, Some(as_user(UserId::new())));
        assert_eq!(hit(&other).await.status(), StatusCode::OK);

        tokio::time::advance(Duration::from_secs(15 * 60)).await;
        assert_eq!(hit(&app).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_anonymous_request_is_401() {
        let limiter = RateLimiter::in_memory(RateLimitConfig::new(5, Duration::from_secs(60)));
        let app = app(limiter, None);
        assert_eq!(hit(&app).await.status(), StatusCode::UNAUTHORIZED);
    }
}
