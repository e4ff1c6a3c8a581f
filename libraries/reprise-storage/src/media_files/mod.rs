//! Media file records: location, folder, resume position and statistics

use chrono::{DateTime, Utc};
use reprise_core::{error::Result, FileId, FolderId, MediaFile, MediaLocation, PlaybackRecord};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const COLUMNS: &str = "id, path, title, folder_id, cached_duration, playback_position, \
                       last_played_at, completion_count, load_error";

fn from_row(row: &SqliteRow) -> Result<MediaFile> {
    let path: String = row.try_get("path")?;
    let last_played_at: Option<i64> = row.try_get("last_played_at")?;
    let completion_count: i64 = row.try_get("completion_count")?;

    Ok(MediaFile {
        id: row.try_get("id")?,
        location: MediaLocation::new(path),
        title: row.try_get("title")?,
        folder: row.try_get("folder_id")?,
        cached_duration: row.try_get("cached_duration")?,
        playback_position: row.try_get("playback_position")?,
        record: PlaybackRecord {
            last_played_at: last_played_at.and_then(DateTime::<Utc>::from_timestamp_millis),
            completion_count: u32::try_from(completion_count).unwrap_or(u32::MAX),
        },
        load_error: row.try_get("load_error")?,
    })
}

/// Get a file by ID
pub async fn get_by_id(pool: &SqlitePool, id: &FileId) -> Result<Option<MediaFile>> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM media_files WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// Get a file by its path
pub async fn get_by_path(pool: &SqlitePool, path: &str) -> Result<Option<MediaFile>> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM media_files WHERE path = ?"))
        .bind(path)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// Files in a folder, in play order (title, then path)
pub async fn get_by_folder(pool: &SqlitePool, folder: &FolderId) -> Result<Vec<MediaFile>> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM media_files WHERE folder_id = ? \
         ORDER BY title COLLATE NOCASE, path"
    ))
    .bind(folder)
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

/// IDs of the files in a folder, in play order
pub async fn ordered_ids(pool: &SqlitePool, folder: &FolderId) -> Result<Vec<FileId>> {
    let rows = sqlx::query(
        "SELECT id FROM media_files WHERE folder_id = ? ORDER BY title COLLATE NOCASE, path",
    )
    .bind(folder)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| row.try_get("id").map_err(Into::into))
        .collect()
}

/// Insert a file, or return the existing record for the same path
pub async fn register(pool: &SqlitePool, file: &MediaFile) -> Result<MediaFile> {
    let path = file.location.path().to_string_lossy().into_owned();
    if let Some(existing) = get_by_path(pool, &path).await? {
        return Ok(existing);
    }

    sqlx::query(
        r#"
        INSERT INTO media_files
            (id, path, title, folder_id, cached_duration, playback_position,
             completion_count, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&file.id)
    .bind(&path)
    .bind(&file.title)
    .bind(&file.folder)
    .bind(file.cached_duration)
    .bind(file.playback_position)
    .bind(i64::from(file.record.completion_count))
    .bind(crate::now_millis())
    .execute(pool)
    .await?;

    Ok(file.clone())
}

pub async fn update_playback_position(pool: &SqlitePool, id: &FileId, position: f64) -> Result<()> {
    sqlx::query("UPDATE media_files SET playback_position = ? WHERE id = ?")
        .bind(position)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_cached_duration(pool: &SqlitePool, id: &FileId, duration: f64) -> Result<()> {
    sqlx::query("UPDATE media_files SET cached_duration = ? WHERE id = ?")
        .bind(duration)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_load_error(pool: &SqlitePool, id: &FileId, error: Option<&str>) -> Result<()> {
    sqlx::query("UPDATE media_files SET load_error = ? WHERE id = ?")
        .bind(error)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Increment the completion count and stamp the last-played time
pub async fn record_completion(pool: &SqlitePool, id: &FileId, at: DateTime<Utc>) -> Result<()> {
    sqlx::query(
        "UPDATE media_files SET completion_count = completion_count + 1, last_played_at = ? \
         WHERE id = ?",
    )
    .bind(at.timestamp_millis())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}
