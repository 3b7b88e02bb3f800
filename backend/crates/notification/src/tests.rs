//! Router-level tests for the notification inbox

use auth::models::{Credentials, Email, User};
use auth::{AuthAppState, AuthConfig, InMemoryAuthRepository, Role, UserStatus};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use kernel::id::UserId;
use platform::mailer::Mailer;
use platform::password::{ClearTextPassword, PasswordCost};
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    InMemoryNotificationRepository, Notification, NotificationAppState, NotificationKind,
    NotificationRepository, notifications_router,
};

struct Harness {
    app: Router,
    auth: AuthAppState<InMemoryAuthRepository>,
    users: InMemoryAuthRepository,
    inbox: InMemoryNotificationRepository,
}

impl Harness {
    fn new() -> Self {
        let users = InMemoryAuthRepository::new();
        let auth = AuthAppState::new(users.clone(), AuthConfig::development(), Mailer::disabled());
        let inbox = InMemoryNotificationRepository::new();
        let app = Router::new().nest(
            "/api/notifications",
            notifications_router(NotificationAppState::new(inbox.clone()), auth.guard()),
        );
        Self {
            app,
            auth,
            users,
            inbox,
        }
    }

    fn user(&self, email: &str) -> (UserId, String) {
        let now = Utc::now();
        let mut user = User::register("Inbox Owner", Email::new(email).unwrap(), now);
        user.role = Role::Customer;
        user.status = UserStatus::Active;
        user.email_verified_at = Some(now);
        let hash = ClearTextPassword::new("Vendor#Shop2026".into())
            .unwrap()
            .hash(PasswordCost::new(1).unwrap())
            .unwrap();
        self.users
            .insert(user.clone(), Credentials::new(user.id, hash, now));
        let token = self.auth.tokens.issue(user.id, user.role, now).unwrap().token;
        (user.id, token)
    }

    async fn notify(&self, user_id: UserId, title: &str, minutes_ago: i64) -> Notification {
        let n = Notification::new(
            user_id,
            NotificationKind::OrderPaid,
            title,
            "Your payment was received",
            Utc::now() - Duration::minutes(minutes_ago),
        );
        self.inbox.create(&n).await.unwrap();
        n
    }

    async fn send(&self, method: &str, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let res = self
            .app
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

mod inbox_tests {
    use super::*;

    #[tokio::test]
    async fn test_requires_authentication() {
        let h = Harness::new();
        let (status, body) = h.send("GET", "/api/notifications", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_list_is_scoped_and_newest_first() {
        let h = Harness::new();
        let (ada, token) = h.user("ada@example.com");
        let (bob, _) = h.user("bob@example.com");
        h.notify(ada, "Older", 10).await;
        h.notify(ada, "Newer", 1).await;
        h.notify(bob, "Not yours", 0).await;

        let (status, body) = h.send("GET", "/api/notifications", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        let items = body["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], "Newer");
        assert_eq!(items[0]["kind"], "order_paid");
        assert_eq!(body["data"]["pagination"]["total"], 2);
        assert_eq!(body["data"]["unreadCount"], 2);
    }

    #[tokio::test]
    async fn test_mark_read_and_unread_filter() {
        let h = Harness::new();
        let (ada, token) = h.user("ada@example.com");
        let first = h.notify(ada, "First", 5).await;
        h.notify(ada, "Second", 1).await;

        let (status, _) = h
            .send("PATCH", &format!("/api/notifications/{}/read", first.id), Some(&token))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = h
            .send("GET", "/api/notifications?unreadOnly=true", Some(&token))
            .await;
        let items = body["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "Second");
        assert_eq!(body["data"]["unreadCount"], 1);

        let (status, body) = h
            .send("PATCH", "/api/notifications/read-all", Some(&token))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["updated"], 1);
    }

    #[tokio::test]
    async fn test_other_users_rows_are_not_found() {
        let h = Harness::new();
        let (_, ada_token) = h.user("ada@example.com");
        let (bob, _) = h.user("bob@example.com");
        let theirs = h.notify(bob, "Bob's sale", 0).await;

        for (method, uri) in [
            ("PATCH", format!("/api/notifications/{}/read", theirs.id)),
            ("DELETE", format!("/api/notifications/{}", theirs.id)),
        ] {
            let (status, body) = h.send(method, &uri, Some(&ada_token)).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["message"], "Notification not found");
        }
        assert_eq!(h.inbox.len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let h = Harness::new();
        let (ada, token) = h.user("ada@example.com");
        let n = h.notify(ada, "Bye", 0).await;

        let (status, _) = h
            .send("DELETE", &format!("/api/notifications/{}", n.id), Some(&token))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(h.inbox.is_empty());

        let (status, body) = h
            .send("DELETE", "/api/notifications/nope", Some(&token))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid identifier");
    }
}
