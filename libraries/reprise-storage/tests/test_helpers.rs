//! Test helpers and fixtures for storage integration tests
//!
//! Databases are real SQLite files in a temp dir so migrations, foreign
//! keys and constraints behave as in production.

#![allow(dead_code)]

use reprise_core::{FileId, FolderId, MediaFile, MediaLocation};
use reprise_storage::SqliteLibrary;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Test database wrapper that cleans up on drop
pub struct TestDb {
    pub pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestDb {
    /// Create a new test database with migrations applied
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let db_url = format!("sqlite://{}", db_path.display());

        let pool = reprise_storage::open_database(&db_url)
            .await
            .expect("Failed to open database");

        Self {
            pool,
            _temp_dir: temp_dir,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn library(&self) -> SqliteLibrary {
        SqliteLibrary::new(self.pool.clone())
    }
}

/// Test fixture: register a file under `folder`
pub async fn create_test_file(pool: &SqlitePool, folder: &str, name: &str) -> FileId {
    let file = MediaFile::new(
        MediaLocation::new(format!("/media/{folder}/{name}.mp3")),
        FolderId::new(folder),
    );
    reprise_storage::media_files::register(pool, &file)
        .await
        .expect("Failed to register test file")
        .id
}
