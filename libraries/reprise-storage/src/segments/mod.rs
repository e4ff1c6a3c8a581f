//! Saved segments, stored with a per-file `sort_index`

use reprise_core::{error::Result, FileId, Segment, SegmentId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

fn from_row(row: &SqliteRow) -> Result<Segment> {
    let index: i64 = row.try_get("sort_index")?;
    Ok(Segment {
        id: row.try_get("id")?,
        file_id: row.try_get("file_id")?,
        label: row.try_get("label")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        index: u32::try_from(index).unwrap_or(u32::MAX),
    })
}

/// Segments of a file ordered by index
pub async fn get_by_file(pool: &SqlitePool, file_id: &FileId) -> Result<Vec<Segment>> {
    let rows = sqlx::query(
        r#"
        SELECT id, file_id, label, start_time, end_time, sort_index
        FROM segments
        WHERE file_id = ?
        ORDER BY sort_index
        "#,
    )
    .bind(file_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

pub async fn create(pool: &SqlitePool, segment: &Segment) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO segments (id, file_id, label, start_time, end_time, sort_index, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&segment.id)
    .bind(&segment.file_id)
    .bind(&segment.label)
    .bind(segment.start_time)
    .bind(segment.end_time)
    .bind(i64::from(segment.index))
    .bind(crate::now_millis())
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete a segment and renumber the rest in one transaction
pub async fn delete(pool: &SqlitePool, id: &SegmentId, reindex: &[(SegmentId, u32)]) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM segments WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    for (id, index) in reindex {
        sqlx::query("UPDATE segments SET sort_index = ? WHERE id = ?")
            .bind(i64::from(*index))
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn rename(pool: &SqlitePool, id: &SegmentId, label: &str) -> Result<()> {
    sqlx::query("UPDATE segments SET label = ? WHERE id = ?")
        .bind(label)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
