//! Listening sessions: one row per session, accumulating seconds listened

use reprise_core::error::Result;
use sqlx::{Row, SqlitePool};

/// Summary of a stored session
#[derive(Debug, Clone, PartialEq)]
pub struct ListeningSession {
    pub id: String,
    pub started_at: i64,
    pub ended_at: Option<i64>,
    pub listened_seconds: f64,
}

/// Open a new session and return its id
pub async fn start(pool: &SqlitePool) -> Result<String> {
    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO listening_sessions (id, started_at) VALUES (?, ?)")
        .bind(&id)
        .bind(crate::now_millis())
        .execute(pool)
        .await?;
    Ok(id)
}

pub async fn add_time(pool: &SqlitePool, id: &str, seconds: f64) -> Result<()> {
    sqlx::query(
        "UPDATE listening_sessions SET listened_seconds = listened_seconds + ? WHERE id = ?",
    )
    .bind(seconds)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn end(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("UPDATE listening_sessions SET ended_at = ? WHERE id = ? AND ended_at IS NULL")
        .bind(crate::now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// All sessions, most recent first
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<ListeningSession>> {
    let rows = sqlx::query(
        "SELECT id, started_at, ended_at, listened_seconds FROM listening_sessions \
         ORDER BY started_at DESC",
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<ListeningSession> {
            Ok(ListeningSession {
                id: row.try_get("id")?,
                started_at: row.try_get("started_at")?,
                ended_at: row.try_get("ended_at")?,
                listened_seconds: row.try_get("listened_seconds")?,
            })
        })
        .collect()
}

/// Total seconds listened across all sessions
pub async fn total_listened(pool: &SqlitePool) -> Result<f64> {
    let row = sqlx::query(
        "SELECT COALESCE(SUM(listened_seconds), 0.0) AS total FROM listening_sessions",
    )
    .fetch_one(pool)
    .await?;
    Ok(row.try_get("total")?)
}
