//! Authentication session management for CareData.
//!
//! Sessions are opaque UUID v4 tokens persisted in the `sessions` table.
//! A session lives for a fixed time from login; activity does not extend it.

use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::User;
use crate::Result;

/// Default session lifetime in days.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

/// Session-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Session has expired.
    #[error("session expired")]
    SessionExpired,

    /// Session not found.
    #[error("session not found")]
    SessionNotFound,
}

/// Shorten a token for log output.
pub(crate) fn token_prefix(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}

fn from_unix(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

/// Authentication session representing a logged-in user.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Unique session token (UUID v4).
    pub token: String,
    /// User ID associated with this session.
    pub user_id: i64,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session expires (absolute timeout).
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Create a new session for a user that expires after `ttl`.
    pub fn new(user_id: i64, ttl: Duration) -> Self {
        // Whole seconds, matching the stored precision.
        let now = from_unix(Utc::now().timestamp());
        Self {
            token: Uuid::new_v4().to_string(),
            user_id,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Check if the session has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Get the remaining time until expiration.
    pub fn remaining_time(&self) -> Option<Duration> {
        let remaining = self.expires_at - Utc::now();
        if remaining.num_seconds() > 0 {
            Some(remaining)
        } else {
            None
        }
    }
}

impl<'r> FromRow<'r, SqliteRow> for AuthSession {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Self {
            token: row.try_get("token")?,
            user_id: row.try_get("user_id")?,
            created_at: from_unix(row.try_get("created_at")?),
            expires_at: from_unix(row.try_get("expires_at")?),
        })
    }
}

/// Issues, resolves and revokes server-side sessions.
#[derive(Clone)]
pub struct SessionManager {
    pool: SqlitePool,
    ttl: Duration,
}

impl SessionManager {
    /// Create a session manager with the default 7-day lifetime.
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_ttl(pool, Duration::days(DEFAULT_SESSION_TTL_DAYS))
    }

    /// Create a session manager with a custom lifetime.
    pub fn with_ttl(pool: SqlitePool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    /// Session lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session for an authenticated user.
    pub async fn login(&self, user: &User) -> Result<AuthSession> {
        let session = AuthSession::new(user.id, self.ttl);

        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.created_at.timestamp())
        .bind(session.expires_at.timestamp())
        .execute(&self.pool)
        .await?;

        info!(
            username = %user.username,
            user_id = user.id,
            token = %token_prefix(&session.token),
            "Login successful"
        );

        Ok(session)
    }

    /// Look up a session by token.
    ///
    /// Unknown and expired tokens resolve to `None`; an expired row is
    /// deleted on sight.
    pub async fn resolve(&self, token: &str) -> Result<Option<AuthSession>> {
        match self.get_session(token).await? {
            Ok(session) => Ok(Some(session)),
            Err(_) => Ok(None),
        }
    }

    /// Like [`resolve`](Self::resolve) but reports why a token was rejected.
    pub async fn get_session(
        &self,
        token: &str,
    ) -> Result<std::result::Result<AuthSession, SessionError>> {
        let session = sqlx::query_as::<_, AuthSession>(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        let Some(session) = session else {
            return Ok(Err(SessionError::SessionNotFound));
        };

        if session.is_expired() {
            sqlx::query("DELETE FROM sessions WHERE token = ?")
                .bind(token)
                .execute(&self.pool)
                .await?;
            debug!(token = %token_prefix(token), "Expired session removed");
            return Ok(Err(SessionError::SessionExpired));
        }

        Ok(Ok(session))
    }

    /// End a session. Returns whether a session was removed.
    pub async fn logout(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            info!(token = %token_prefix(token), "Session logged out");
        } else {
            debug!(token = %token_prefix(token), "Logout: session not found");
        }
        Ok(removed)
    }

    /// End every session of a user.
    pub async fn logout_user(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let count = result.rows_affected();
        if count > 0 {
            info!(user_id, count, "All user sessions logged out");
        }
        Ok(count)
    }

    /// Delete all expired sessions.
    pub async fn cleanup_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            debug!(removed, "Cleaned up expired sessions");
        }
        Ok(removed)
    }

    /// Number of stored sessions, expired ones included.
    pub async fn session_count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    /// Number of stored sessions of one user.
    pub async fn user_session_count(&self, user_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}
