//! Router-level tests for the auth crate

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use http_body_util::BodyExt;
use platform::mailer::Mailer;
use platform::password::{ClearTextPassword, PasswordCost};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::domain::entity::{Credentials, User};
use crate::domain::value_object::Email;
use crate::{
    AuthAppState, AuthConfig, InMemoryAuthRepository, Role, UserStatus, admin_router,
    auth_router, users_router,
};

const PASSWORD: &str = "Vendor#Shop2026";

fn state(repo: &InMemoryAuthRepository) -> AuthAppState<InMemoryAuthRepository> {
    AuthAppState::new(repo.clone(), AuthConfig::development(), Mailer::disabled())
}

fn app(state: AuthAppState<InMemoryAuthRepository>) -> Router {
    Router::new()
        .nest("/api/auth", auth_router(state.clone()))
        .nest("/api/users", users_router(state.clone()))
        .nest("/api/admin", admin_router(state))
}

fn seed(repo: &InMemoryAuthRepository, email: &str, role: Role, status: UserStatus) -> User {
    let now = Utc::now();
    let mut user = User::register("Test User", Email::new(email).unwrap(), now);
    user.role = role;
    user.status = status;
    if status != UserStatus::Pending {
        user.email_verified_at = Some(now);
    }
    let hash = ClearTextPassword::new(PASSWORD.into())
        .unwrap()
        .hash(PasswordCost::new(1).unwrap())
        .unwrap();
    let mut credentials = Credentials::new(user.id, hash, now);
    credentials.set_otp("123456", chrono::Duration::minutes(10), now);
    repo.insert(user.clone(), credentials);
    user
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn login(app: &Router, email: &str) -> Value {
    let (status, body) = send(
        app,
        post_json("/api/auth/login", json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"].clone()
}

mod registration_tests {
    use super::*;

    #[tokio::test]
    async fn test_register_then_duplicate() {
        let repo = InMemoryAuthRepository::new();
        let app = app(state(&repo));
        let body = json!({ "name": "Ada", "email": "Ada@Example.com", "password": PASSWORD });

        let (status, created) = send(&app, post_json("/api/auth/register", body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["success"], true);
        assert_eq!(created["data"]["email"], "ada@example.com");
        assert_eq!(created["data"]["status"], "pending");
        assert_eq!(created["data"]["role"], "customer");

        let (status, dup) = send(&app, post_json("/api/auth/register", body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(dup["success"], false);
    }

    #[tokio::test]
    async fn test_register_validation_and_weak_password() {
        let repo = InMemoryAuthRepository::new();
        let app = app(state(&repo));

        let (status, body) = send(
            &app,
            post_json("/api/auth/register", json!({ "name": "A", "email": "x", "password": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().starts_with("Validation failed"));

        let (status, _) = send(
            &app,
            post_json(
                "/api/auth/register",
                json!({ "name": "Ada", "email": "ada@example.com", "password": "password123" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_400_envelope() {
        let repo = InMemoryAuthRepository::new();
        let app = app(state(&repo));
        let req = Request::post("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_verify_email_activates_and_allows_login() {
        let repo = InMemoryAuthRepository::new();
        let app = app(state(&repo));
        seed(&repo, "pending@example.com", Role::Customer, UserStatus::Pending);

        let (status, body) = send(
            &app,
            post_json("/api/auth/login", json!({ "email": "pending@example.com", "password": PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Please verify your email before signing in");

        let (status, _) = send(
            &app,
            post_json("/api/auth/verify-email", json!({ "email": "pending@example.com", "otp": "000000" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            post_json("/api/auth/verify-email", json!({ "email": "pending@example.com", "otp": "123456" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "active");
        assert_eq!(body["data"]["emailVerified"], true);

        login(&app, "pending@example.com").await;
    }
}

mod session_tests {
    use super::*;

    #[tokio::test]
    async fn test_login_and_me() {
        let repo = InMemoryAuthRepository::new();
        let app = app(state(&repo));
        let user = seed(&repo, "ada@example.com", Role::Customer, UserStatus::Active);

        let session = login(&app, "ada@example.com").await;
        let token = session["accessToken"].as_str().unwrap();
        assert!(session["refreshToken"].as_str().unwrap().len() == 64);

        let (status, body) = send(&app, get_with("/api/auth/me", Some(token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["user"]["id"], user.id.to_string());
        assert_eq!(body["data"]["user"]["role"], "customer");
    }

    #[tokio::test]
    async fn test_protected_route_without_or_with_bad_token() {
        let repo = InMemoryAuthRepository::new();
        let app = app(state(&repo));

        let (status, body) = send(&app, get_with("/api/auth/me", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Authentication required");

        let (status, body) = send(&app, get_with("/api/auth/me", Some("not.a.token"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid token");
    }

    #[tokio::test]
    async fn test_suspended_user_token_stops_working() {
        let repo = InMemoryAuthRepository::new();
        let app = app(state(&repo));
        let mut user = seed(&repo, "ada@example.com", Role::Customer, UserStatus::Active);
        let session = login(&app, "ada@example.com").await;
        let token = session["accessToken"].as_str().unwrap().to_string();

        user.status = UserStatus::Suspended;
        crate::domain::repository::UserRepository::update_user(&repo, &user)
            .await
            .unwrap();

        let (status, _) = send(&app, get_with("/api/auth/me", Some(&token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_lockout_after_five_failures() {
        let repo = InMemoryAuthRepository::new();
        let app = app(state(&repo));
        seed(&repo, "ada@example.com", Role::Customer, UserStatus::Active);

        for _ in 0..5 {
            let (status, body) = send(
                &app,
                post_json("/api/auth/login", json!({ "email": "ada@example.com", "password": "wrong-Pass-1" })),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["message"], "Invalid email or password");
        }

        let (status, _) = send(
            &app,
            post_json("/api/auth/login", json!({ "email": "ada@example.com", "password": PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_rejects_replay() {
        let repo = InMemoryAuthRepository::new();
        let app = app(state(&repo));
        seed(&repo, "ada@example.com", Role::Customer, UserStatus::Active);
        let session = login(&app, "ada@example.com").await;
        let refresh = session["refreshToken"].as_str().unwrap().to_string();

        let (status, rotated) = send(
            &app,
            post_json("/api/auth/refresh", json!({ "refreshToken": refresh })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(rotated["data"]["refreshToken"], refresh.as_str());

        let (status, _) = send(
            &app,
            post_json("/api/auth/refresh", json!({ "refreshToken": refresh })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_tokens() {
        let repo = InMemoryAuthRepository::new();
        let app = app(state(&repo));
        seed(&repo, "ada@example.com", Role::Customer, UserStatus::Active);
        let first = login(&app, "ada@example.com").await;
        login(&app, "ada@example.com").await;
        assert_eq!(repo.refresh_token_count(), 2);

        let token = first["accessToken"].as_str().unwrap();
        let req = Request::post("/api/auth/logout")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(repo.refresh_token_count(), 0);
    }
}

mod password_tests {
    use super::*;
    use crate::domain::repository::CredentialRepository;

    #[tokio::test]
    async fn test_forgot_password_never_reveals_accounts() {
        let repo = InMemoryAuthRepository::new();
        let app = app(state(&repo));
        let (status, _) = send(
            &app,
            post_json("/api/auth/forgot-password", json!({ "email": "ghost@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_reset_password_with_token() {
        let repo = InMemoryAuthRepository::new();
        let app = app(state(&repo));
        let user = seed(&repo, "ada@example.com", Role::Customer, UserStatus::Active);

        let mut creds = repo.find_credentials(&user.id).await.unwrap().unwrap();
        creds.set_reset_token("known-reset-token", chrono::Duration::hours(1), Utc::now());
        repo.update_credentials(&creds).await.unwrap();

        let (status, _) = send(
            &app,
            post_json(
                "/api/auth/reset-password",
                json!({ "token": "known-reset-token", "password": "Brand-New-Pass9" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Token is single use.
        let (status, _) = send(
            &app,
            post_json(
                "/api/auth/reset-password",
                json!({ "token": "known-reset-token", "password": "Another-Pass9" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            post_json("/api/auth/login", json!({ "email": "ada@example.com", "password": "Brand-New-Pass9" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

mod admin_tests {
    use super::*;

    fn patch_json(uri: &str, token: &str, body: Value) -> Request<Body> {
        Request::patch(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_role_gate() {
        let repo = InMemoryAuthRepository::new();
        let app = app(state(&repo));
        seed(&repo, "customer@example.com", Role::Customer, UserStatus::Active);
        seed(&repo, "admin@example.com", Role::Admin, UserStatus::Active);

        let customer = login(&app, "customer@example.com").await;
        let (status, body) = send(
            &app,
            get_with("/api/admin/users", customer["accessToken"].as_str()),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);

        let admin = login(&app, "admin@example.com").await;
        let (status, body) = send(&app, get_with("/api/admin/users", admin["accessToken"].as_str())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["pagination"]["total"], 2);
    }

    #[tokio::test]
    async fn test_suspend_user() {
        let repo = InMemoryAuthRepository::new();
        let app = app(state(&repo));
        let target = seed(&repo, "customer@example.com", Role::Customer, UserStatus::Active);
        seed(&repo, "admin@example.com", Role::Admin, UserStatus::Active);
        let admin = login(&app, "admin@example.com").await;
        let token = admin["accessToken"].as_str().unwrap();

        let (status, body) = send(
            &app,
            patch_json(
                &format!("/api/admin/users/{}/status", target.id),
                token,
                json!({ "status": "suspended" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "suspended");

        let (status, body) = send(
            &app,
            patch_json("/api/admin/users/not-a-uuid/status", token, json!({ "status": "active" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid identifier");
    }

    #[tokio::test]
    async fn test_deletion_request_review_deactivates() {
        let repo = InMemoryAuthRepository::new();
        let app = app(state(&repo));
        seed(&repo, "customer@example.com", Role::Customer, UserStatus::Active);
        seed(&repo, "admin@example.com", Role::Admin, UserStatus::Active);
        let customer = login(&app, "customer@example.com").await;
        let customer_token = customer["accessToken"].as_str().unwrap().to_string();

        let req = Request::post("/api/users/me/deletion-request")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {customer_token}"))
            .body(Body::from(json!({ "reason": "No longer needed" }).to_string()))
            .unwrap();
        let (status, created) = send(&app, req).await;
        assert_eq!(status, StatusCode::CREATED);
        let request_id = created["data"]["id"].as_str().unwrap().to_string();

        let admin = login(&app, "admin@example.com").await;
        let (status, body) = send(
            &app,
            patch_json(
                &format!("/api/admin/deletion-requests/{request_id}"),
                admin["accessToken"].as_str().unwrap(),
                json!({ "status": "approved" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "approved");

        let (status, _) = send(&app, get_with("/api/auth/me", Some(&customer_token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

mod optional_auth_tests {
    use super::*;
    use crate::{MaybeUser, optional_authenticate};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;

    async fn whoami(MaybeUser(user): MaybeUser) -> String {
        user.map(|u| u.email.as_str().to_string())
            .unwrap_or_else(|| "anonymous".to_string())
    }

    #[tokio::test]
    async fn test_optional_auth_proceeds_without_user() {
        let repo = InMemoryAuthRepository::new();
        let state = state(&repo);
        seed(&repo, "ada@example.com", Role::Customer, UserStatus::Active);
        let token = state
            .tokens
            .issue(
                crate::domain::repository::UserRepository::find_user_by_email(
                    &repo,
                    &Email::new("ada@example.com").unwrap(),
                )
                .await
                .unwrap()
                .unwrap()
                .id,
                Role::Customer,
                Utc::now(),
            )
            .unwrap()
            .token;

        let app: Router = Router::new()
            .route("/whoami", get(whoami))
            .route_layer(from_fn_with_state(
                state.guard(),
                optional_authenticate::<InMemoryAuthRepository>,
            ));

        for (bearer, expected) in [
            (None, "anonymous"),
            (Some("garbage"), "anonymous"),
            (Some(token.as_str()), "ada@example.com"),
        ] {
            let res = app.clone().oneshot(get_with("/whoami", bearer)).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            let bytes = res.into_body().collect().await.unwrap().to_bytes();
            assert_eq!(&bytes[..], expected.as_bytes());
        }
    }
}
