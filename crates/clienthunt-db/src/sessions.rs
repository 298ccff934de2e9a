//! Database operations for `scraping_sessions`.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::DbError;

/// Lifecycle states stored in `scraping_sessions.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Completed,
    /// Finished with at least one per-source error but some usable output.
    CompletedWithErrors,
    Failed,
}

impl SessionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row from the `scraping_sessions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapingSessionRow {
    pub id: i64,
    pub public_id: Uuid,
    pub location: String,
    pub category: String,
    /// Comma-separated canonical source keys.
    pub sources: String,
    pub status: String,
    pub total_scraped: i64,
    pub error_count: i64,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

const SESSION_COLUMNS: &str = "id, public_id, location, category, sources, status, \
     total_scraped, error_count, error_message, started_at, completed_at";

/// Creates a new session in `running` status with `started_at = now`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_scraping_session(
    pool: &SqlitePool,
    location: &str,
    category: &str,
    sources: &[&str],
) -> Result<ScrapingSessionRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, ScrapingSessionRow>(&format!(
        "INSERT INTO scraping_sessions (public_id, location, category, sources, status, started_at) \
         VALUES (?1, ?2, ?3, ?4, 'running', ?5) \
         RETURNING {SESSION_COLUMNS}"
    ))
    .bind(public_id)
    .bind(location)
    .bind(category)
    .bind(sources.join(","))
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a running session as `completed` (or `completed_with_errors` when
/// `error_count > 0`) and records the totals.
///
/// # Errors
///
/// Returns [`DbError::InvalidSessionTransition`] if the session is not
/// running, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_scraping_session(
    pool: &SqlitePool,
    id: i64,
    total_scraped: i64,
    error_count: i64,
) -> Result<SessionStatus, DbError> {
    let status = if error_count > 0 {
        SessionStatus::CompletedWithErrors
    } else {
        SessionStatus::Completed
    };

    let result = sqlx::query(
        "UPDATE scraping_sessions \
         SET status = ?1, completed_at = ?2, total_scraped = ?3, error_count = ?4 \
         WHERE id = ?5 AND status = 'running'",
    )
    .bind(status.as_str())
    .bind(Utc::now())
    .bind(total_scraped)
    .bind(error_count)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSessionTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(status)
}

/// Marks a running session as `failed` with an error summary.
///
/// # Errors
///
/// Returns [`DbError::InvalidSessionTransition`] if the session is not
/// running, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_scraping_session(
    pool: &SqlitePool,
    id: i64,
    error_count: i64,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scraping_sessions \
         SET status = 'failed', completed_at = ?1, error_count = ?2, error_message = ?3 \
         WHERE id = ?4 AND status = 'running'",
    )
    .bind(Utc::now())
    .bind(error_count)
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSessionTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_scraping_session(pool: &SqlitePool, id: i64) -> Result<ScrapingSessionRow, DbError> {
    let row = sqlx::query_as::<_, ScrapingSessionRow>(&format!(
        "SELECT {SESSION_COLUMNS} FROM scraping_sessions WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` sessions, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scraping_sessions(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<ScrapingSessionRow>, DbError> {
    let rows = sqlx::query_as::<_, ScrapingSessionRow>(&format!(
        "SELECT {SESSION_COLUMNS} FROM scraping_sessions \
         ORDER BY started_at DESC, id DESC \
         LIMIT ?1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
