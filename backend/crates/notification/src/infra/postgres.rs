//! PostgreSQL Repository Implementation

use chrono::{DateTime, Utc};
use kernel::AppResult;
use kernel::id::{NotificationId, UserId};
use kernel::pagination::PageQuery;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::entity::{Notification, NotificationKind};
use crate::domain::repository::{Inbox, NotificationRepository};

const COLUMNS: &str = "id, user_id, kind, title, message, data, read_at, created_at";

#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Insert on a caller-owned connection, so the row commits or rolls back
/// with the caller's transaction.
pub async fn insert_notification(
    conn: &mut PgConnection,
    notification: &Notification,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO notifications (id, user_id, kind, title, message, data, read_at, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(notification.id.as_uuid())
    .bind(notification.user_id.as_uuid())
    .bind(notification.kind.code())
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(&notification.data)
    .bind(notification.read_at)
    .bind(notification.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, notification: &Notification) -> AppResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_notification(&mut conn, notification).await?;
        Ok(())
    }

    async fn list(&self, user_id: &UserId, unread_only: bool, page: &PageQuery) -> AppResult<Inbox> {
        let (total, unread): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE $2 = FALSE OR read_at IS NULL),
                   COUNT(*) FILTER (WHERE read_at IS NULL)
            FROM notifications WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(unread_only)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 AND ($2 = FALSE OR read_at IS NULL) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        ))
        .bind(user_id.as_uuid())
        .bind(unread_only)
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Inbox {
            items: rows.into_iter().map(NotificationRow::into_notification).collect(),
            total,
            unread,
        })
    }

    async fn mark_read(&self, user_id: &UserId, id: &NotificationId) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = COALESCE(read_at, now()) WHERE id = $1 AND user_id = $2",
        )
        .bind(id.as_uuid())
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: &UserId) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = now() WHERE user_id = $1 AND read_at IS NULL",
        )
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, user_id: &UserId, id: &NotificationId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    title: String,
    message: String,
    data: serde_json::Value,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_notification(self) -> Notification {
        Notification {
            id: NotificationId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            kind: NotificationKind::from_code(&self.kind),
            title: self.title,
            message: self.message,
            data: self.data,
            read_at: self.read_at,
            created_at: self.created_at,
        }
    }
}
