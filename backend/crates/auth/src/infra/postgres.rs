//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{DeletionRequestId, UserId};
use kernel::pagination::{PageQuery, search_pattern};
use platform::password::HashedPassword;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::domain::entity::{Credentials, DeletionRequest, DeletionStatus, RefreshToken, User};
use crate::domain::repository::{
    CredentialRepository, DeletionRequestRepository, RefreshTokenRepository, UserFilter,
    UserRepository,
};
use crate::domain::value_object::{Email, Role, UserStatus};
use crate::error::{AuthError, AuthResult};

const USER_COLUMNS: &str = "id, name, email, phone, avatar_url, role, status, \
     email_verified_at, last_login_at, created_at, updated_at";

const CREDENTIAL_COLUMNS: &str = "user_id, password_hash, failed_login_count, locked_until, \
     otp_hash, otp_expires_at, reset_token_hash, reset_token_expires_at, \
     password_changed_at, updated_at";

const DELETION_COLUMNS: &str =
    "id, user_id, reason, status, reviewed_by, review_note, reviewed_at, created_at";

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create_user(&self, user: &User, credentials: &Credentials) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (
                id, name, email, phone, avatar_url, role, status,
                email_verified_at, last_login_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(&user.phone)
        .bind(&user.avatar_url)
        .bind(user.role.code())
        .bind(user.status.code())
        .bind(user.email_verified_at)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_credentials (
                user_id, password_hash, failed_login_count, locked_until,
                otp_hash, otp_expires_at, reset_token_hash, reset_token_expires_at,
                password_changed_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(credentials.user_id.as_uuid())
        .bind(credentials.password_hash.as_phc_string())
        .bind(credentials.failed_login_count)
        .bind(credentials.locked_until)
        .bind(&credentials.otp_hash)
        .bind(credentials.otp_expires_at)
        .bind(&credentials.reset_token_hash)
        .bind(credentials.reset_token_expires_at)
        .bind(credentials.password_changed_at)
        .bind(credentials.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_user(&self, id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn email_exists(&self, email: &Email) -> AuthResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn update_user(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                name = $2,
                phone = $3,
                avatar_url = $4,
                role = $5,
                status = $6,
                email_verified_at = $7,
                last_login_at = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.avatar_url)
        .bind(user.role.code())
        .bind(user.status.code())
        .bind(user.email_verified_at)
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page: &PageQuery,
    ) -> AuthResult<(Vec<User>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE TRUE");
        push_user_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));
        push_user_filter(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await?;
        let users = rows
            .into_iter()
            .map(UserRow::into_user)
            .collect::<AuthResult<Vec<_>>>()?;

        Ok((users, total))
    }
}

fn push_user_filter(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &UserFilter) {
    if let Some(role) = filter.role {
        query.push(" AND role = ").push_bind(role.code());
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.code());
    }
    if let Some(pattern) = filter.search.as_deref().and_then(search_pattern) {
        query
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

// ============================================================================
// Credential Repository Implementation
// ============================================================================

impl CredentialRepository for PgAuthRepository {
    async fn find_credentials(&self, user_id: &UserId) -> AuthResult<Option<Credentials>> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM user_credentials WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CredentialRow::into_credentials).transpose()
    }

    async fn find_credentials_by_reset_token(
        &self,
        token_hash: &str,
    ) -> AuthResult<Option<Credentials>> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM user_credentials WHERE reset_token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CredentialRow::into_credentials).transpose()
    }

    async fn update_credentials(&self, credentials: &Credentials) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE user_credentials SET
                password_hash = $2,
                failed_login_count = $3,
                locked_until = $4,
                otp_hash = $5,
                otp_expires_at = $6,
                reset_token_hash = $7,
                reset_token_expires_at = $8,
                password_changed_at = $9,
                updated_at = $10
            WHERE user_id = $1
            "#,
        )
        .bind(credentials.user_id.as_uuid())
        .bind(credentials.password_hash.as_phc_string())
        .bind(credentials.failed_login_count)
        .bind(credentials.locked_until)
        .bind(&credentials.otp_hash)
        .bind(credentials.otp_expires_at)
        .bind(&credentials.reset_token_hash)
        .bind(credentials.reset_token_expires_at)
        .bind(credentials.password_changed_at)
        .bind(credentials.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Refresh Token Repository Implementation
// ============================================================================

impl RefreshTokenRepository for PgAuthRepository {
    async fn store_refresh_token(&self, token: &RefreshToken) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token_hash, user_agent, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(token.id)
        .bind(token.user_id.as_uuid())
        .bind(&token.token_hash)
        .bind(&token.user_agent)
        .bind(token.expires_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_refresh_token(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT id, user_id, token_hash, user_agent, expires_at, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RefreshTokenRow::into_refresh_token))
    }

    async fn delete_refresh_token(&self, token_hash: &str) -> AuthResult<bool> {
        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn delete_user_refresh_tokens(&self, user_id: &UserId) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted)
    }

    async fn cleanup_expired_refresh_tokens(&self) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(tokens_deleted = deleted, "Cleaned up expired refresh tokens");

        Ok(deleted)
    }
}

// ============================================================================
// Deletion Request Repository Implementation
// ============================================================================

impl DeletionRequestRepository for PgAuthRepository {
    async fn create_deletion_request(&self, request: &DeletionRequest) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO deletion_requests (
                id, user_id, reason, status, reviewed_by, review_note, reviewed_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(request.id.as_uuid())
        .bind(request.user_id.as_uuid())
        .bind(&request.reason)
        .bind(request.status.code())
        .bind(request.reviewed_by.map(UserId::into_uuid))
        .bind(&request.review_note)
        .bind(request.reviewed_at)
        .bind(request.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_deletion_request(
        &self,
        id: &DeletionRequestId,
    ) -> AuthResult<Option<DeletionRequest>> {
        let row = sqlx::query_as::<_, DeletionRequestRow>(&format!(
            "SELECT {DELETION_COLUMNS} FROM deletion_requests WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(DeletionRequestRow::into_request).transpose()
    }

    async fn find_pending_deletion_request(
        &self,
        user_id: &UserId,
    ) -> AuthResult<Option<DeletionRequest>> {
        let row = sqlx::query_as::<_, DeletionRequestRow>(&format!(
            "SELECT {DELETION_COLUMNS} FROM deletion_requests \
             WHERE user_id = $1 AND status = 'pending'"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(DeletionRequestRow::into_request).transpose()
    }

    async fn update_deletion_request(&self, request: &DeletionRequest) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE deletion_requests SET
                status = $2,
                reviewed_by = $3,
                review_note = $4,
                reviewed_at = $5
            WHERE id = $1
            "#,
        )
        .bind(request.id.as_uuid())
        .bind(request.status.code())
        .bind(request.reviewed_by.map(UserId::into_uuid))
        .bind(&request.review_note)
        .bind(request.reviewed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_deletion_requests(
        &self,
        status: Option<DeletionStatus>,
        page: &PageQuery,
    ) -> AuthResult<(Vec<DeletionRequest>, i64)> {
        let status = status.map(|s| s.code());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM deletion_requests WHERE ($1::TEXT IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, DeletionRequestRow>(&format!(
            "SELECT {DELETION_COLUMNS} FROM deletion_requests \
             WHERE ($1::TEXT IS NULL OR status = $1) \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(status)
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let requests = rows
            .into_iter()
            .map(DeletionRequestRow::into_request)
            .collect::<AuthResult<Vec<_>>>()?;
        Ok((requests, total))
    }
}

// ============================================================================
// Database Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    avatar_url: Option<String>,
    role: String,
    status: String,
    email_verified_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let role = Role::from_code(&self.role)
            .ok_or_else(|| AuthError::Internal(format!("Invalid role: {}", self.role)))?;
        let status = UserStatus::from_code(&self.status)
            .ok_or_else(|| AuthError::Internal(format!("Invalid user status: {}", self.status)))?;

        Ok(User {
            id: UserId::from_uuid(self.id),
            name: self.name,
            email: Email::from_trusted(self.email),
            phone: self.phone,
            avatar_url: self.avatar_url,
            role,
            status,
            email_verified_at: self.email_verified_at,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    user_id: Uuid,
    password_hash: String,
    failed_login_count: i32,
    locked_until: Option<DateTime<Utc>>,
    otp_hash: Option<String>,
    otp_expires_at: Option<DateTime<Utc>>,
    reset_token_hash: Option<String>,
    reset_token_expires_at: Option<DateTime<Utc>>,
    password_changed_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CredentialRow {
    fn into_credentials(self) -> AuthResult<Credentials> {
        let password_hash = HashedPassword::from_phc_string(self.password_hash)?;

        Ok(Credentials {
            user_id: UserId::from_uuid(self.user_id),
            password_hash,
            failed_login_count: self.failed_login_count,
            locked_until: self.locked_until,
            otp_hash: self.otp_hash,
            otp_expires_at: self.otp_expires_at,
            reset_token_hash: self.reset_token_hash,
            reset_token_expires_at: self.reset_token_expires_at,
            password_changed_at: self.password_changed_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    id: Uuid,
    user_id: Uuid,
    token_hash: String,
    user_agent: Option<String>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl RefreshTokenRow {
    fn into_refresh_token(self) -> RefreshToken {
        RefreshToken {
            id: self.id,
            user_id: UserId::from_uuid(self.user_id),
            token_hash: self.token_hash,
            user_agent: self.user_agent,
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DeletionRequestRow {
    id: Uuid,
    user_id: Uuid,
    reason: String,
    status: String,
    reviewed_by: Option<Uuid>,
    review_note: Option<String>,
    reviewed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl DeletionRequestRow {
    fn into_request(self) -> AuthResult<DeletionRequest> {
        let status = DeletionStatus::from_code(&self.status).ok_or_else(|| {
            AuthError::Internal(format!("Invalid deletion status: {}", self.status))
        })?;

        Ok(DeletionRequest {
            id: DeletionRequestId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            reason: self.reason,
            status,
            reviewed_by: self.reviewed_by.map(UserId::from_uuid),
            review_note: self.review_note,
            reviewed_at: self.reviewed_at,
            created_at: self.created_at,
        })
    }
}
