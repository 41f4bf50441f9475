//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{AuthSessionId, UserId, UserTokenId};
use platform::password::HashedPassword;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    auth_session::AuthSession, external_login::ExternalLogin, user::User, user_token::UserToken,
};
use crate::domain::repository::{
    AuthSessionRepository, ExternalLoginRepository, UserRepository, UserTokenRepository,
};
use crate::domain::value_object::{email::Email, token_purpose::TokenPurpose};
use crate::error::{IdentityError, IdentityResult};

/// PostgreSQL-backed identity store
#[derive(Clone)]
pub struct PgIdentityRepository {
    pool: PgPool,
}

impl PgIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete expired sessions and spent or expired tokens
    pub async fn cleanup_expired(&self) -> IdentityResult<u64> {
        let now = Utc::now();

        let sessions = sqlx::query("DELETE FROM auth_sessions WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        let tokens = sqlx::query(
            "DELETE FROM user_tokens WHERE expires_at < $1 OR consumed_at IS NOT NULL",
        )
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        tracing::info!(
            sessions_deleted = sessions,
            tokens_deleted = tokens,
            "Cleaned up expired identity records"
        );

        Ok(sessions + tokens)
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgIdentityRepository {
    async fn create(&self, user: &User) -> IdentityResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                email,
                normalized_email,
                email_confirmed,
                password_hash,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.normalized_email())
        .bind(user.email_confirmed)
        .bind(user.password_hash.as_ref().map(|h| h.as_phc_string()))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                IdentityError::DuplicateEmail(user.email.to_string())
            }
            _ => IdentityError::Database(e),
        })?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> IdentityResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                email,
                email_confirmed,
                password_hash,
                created_at,
                updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> IdentityResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                email,
                email_confirmed,
                password_hash,
                created_at,
                updated_at
            FROM users
            WHERE normalized_email = $1
            "#,
        )
        .bind(email.normalized())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn update(&self, user: &User) -> IdentityResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                email_confirmed = $2,
                password_hash = $3,
                updated_at = $4
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email_confirmed)
        .bind(user.password_hash.as_ref().map(|h| h.as_phc_string()))
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// User Token Repository Implementation
// ============================================================================

impl UserTokenRepository for PgIdentityRepository {
    async fn create(&self, token: &UserToken) -> IdentityResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_tokens (
                token_id,
                user_id,
                purpose,
                token_hash,
                expires_at,
                consumed_at,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(token.token_id.as_uuid())
        .bind(token.user_id.as_uuid())
        .bind(token.purpose.id())
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .bind(token.consumed_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_hash(
        &self,
        purpose: TokenPurpose,
        token_hash: &[u8],
    ) -> IdentityResult<Option<UserToken>> {
        let row = sqlx::query_as::<_, UserTokenRow>(
            r#"
            SELECT
                token_id,
                user_id,
                purpose,
                token_hash,
                expires_at,
                consumed_at,
                created_at
            FROM user_tokens
            WHERE purpose = $1 AND token_hash = $2
            "#,
        )
        .bind(purpose.id())
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_token()).transpose()
    }

    async fn update(&self, token: &UserToken) -> IdentityResult<()> {
        sqlx::query("UPDATE user_tokens SET consumed_at = $2 WHERE token_id = $1")
            .bind(token.token_id.as_uuid())
            .bind(token.consumed_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_for_user(&self, user_id: &UserId, purpose: TokenPurpose) -> IdentityResult<u64> {
        let deleted = sqlx::query("DELETE FROM user_tokens WHERE user_id = $1 AND purpose = $2")
            .bind(user_id.as_uuid())
            .bind(purpose.id())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Auth Session Repository Implementation
// ============================================================================

impl AuthSessionRepository for PgIdentityRepository {
    async fn create(&self, session: &AuthSession) -> IdentityResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (
                session_id,
                user_id,
                remember_me,
                expires_at,
                created_at,
                last_activity_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(session.session_id.as_uuid())
        .bind(session.user_id.as_uuid())
        .bind(session.remember_me)
        .bind(session.expires_at)
        .bind(session.created_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, session_id: &AuthSessionId) -> IdentityResult<Option<AuthSession>> {
        let row = sqlx::query_as::<_, AuthSessionRow>(
            r#"
            SELECT
                session_id,
                user_id,
                remember_me,
                expires_at,
                created_at,
                last_activity_at
            FROM auth_sessions
            WHERE session_id = $1 AND expires_at > $2
            "#,
        )
        .bind(session_id.as_uuid())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_session()))
    }

    async fn update(&self, session: &AuthSession) -> IdentityResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_sessions SET
                expires_at = $2,
                last_activity_at = $3
            WHERE session_id = $1
            "#,
        )
        .bind(session.session_id.as_uuid())
        .bind(session.expires_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, session_id: &AuthSessionId) -> IdentityResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE session_id = $1")
            .bind(session_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: &UserId) -> IdentityResult<u64> {
        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// External Login Repository Implementation
// ============================================================================

impl ExternalLoginRepository for PgIdentityRepository {
    async fn create(&self, login: &ExternalLogin) -> IdentityResult<()> {
        sqlx::query(
            r#"
            INSERT INTO external_logins (
                provider,
                provider_key,
                user_id,
                created_at
            ) VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&login.provider)
        .bind(&login.provider_key)
        .bind(login.user_id.as_uuid())
        .bind(login.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, provider: &str, provider_key: &str) -> IdentityResult<Option<ExternalLogin>> {
        let row = sqlx::query_as::<_, ExternalLoginRow>(
            r#"
            SELECT
                provider,
                provider_key,
                user_id,
                created_at
            FROM external_logins
            WHERE provider = $1 AND provider_key = $2
            "#,
        )
        .bind(provider)
        .bind(provider_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_login()))
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    email_confirmed: bool,
    password_hash: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> IdentityResult<User> {
        let password_hash = self
            .password_hash
            .map(HashedPassword::from_phc_string)
            .transpose()
            .map_err(|e| IdentityError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            email_confirmed: self.email_confirmed,
            password_hash,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserTokenRow {
    token_id: Uuid,
    user_id: Uuid,
    purpose: i16,
    token_hash: Vec<u8>,
    expires_at: DateTime<Utc>,
    consumed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl UserTokenRow {
    fn into_token(self) -> IdentityResult<UserToken> {
        let purpose = TokenPurpose::from_id(self.purpose).ok_or_else(|| {
            IdentityError::Internal(format!("Unknown token purpose: {}", self.purpose))
        })?;

        Ok(UserToken {
            token_id: UserTokenId::from_uuid(self.token_id),
            user_id: UserId::from_uuid(self.user_id),
            purpose,
            token_hash: self.token_hash,
            expires_at: self.expires_at,
            consumed_at: self.consumed_at,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AuthSessionRow {
    session_id: Uuid,
    user_id: Uuid,
    remember_me: bool,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl AuthSessionRow {
    fn into_session(self) -> AuthSession {
        AuthSession {
            session_id: AuthSessionId::from_uuid(self.session_id),
            user_id: UserId::from_uuid(self.user_id),
            remember_me: self.remember_me,
            expires_at: self.expires_at,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ExternalLoginRow {
    provider: String,
    provider_key: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

impl ExternalLoginRow {
    fn into_login(self) -> ExternalLogin {
        ExternalLogin {
            provider: self.provider,
            provider_key: self.provider_key,
            user_id: UserId::from_uuid(self.user_id),
            created_at: self.created_at,
        }
    }
}
