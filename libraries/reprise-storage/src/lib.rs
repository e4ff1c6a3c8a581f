//! Reprise Storage
//!
//! `SQLite` persistence for the playback core's collaborators.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: each table owns its queries (`media_files`,
//!   `segments`, `sessions`)
//! - **Contexts**: [`SqliteLibrary`] and [`SqliteSessionTracker`] implement the
//!   `reprise_core` collaborator traits on top of the slices
//!
//! # Example
//!
//! ```rust,no_run
//! use reprise_storage::{open_database, SqliteLibrary, SqliteSessionTracker};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = open_database("sqlite://reprise.db").await?;
//!
//! let library = SqliteLibrary::new(pool.clone());
//! let sessions = SqliteSessionTracker::new(pool);
//! # Ok(())
//! # }
//! ```

mod context;
mod error;

// Vertical slices
pub mod media_files;
pub mod segments;
pub mod sessions;

pub use context::{SqliteLibrary, SqliteSessionTracker};
pub use error::{Result, StorageError};

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;
use tracing::{debug, info};

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `sqlite://reprise.db`)
///
/// # Errors
///
/// Returns an error if the URL is malformed or the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    debug!(url = database_url, "Creating pool");

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    info!(url = database_url, "Database pool ready");
    Ok(pool)
}

/// Create a pool and bring its schema up to date
///
/// # Errors
///
/// Returns an error if the connection or a migration fails
pub async fn open_database(database_url: &str) -> Result<SqlitePool> {
    let pool = create_pool(database_url).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Current time as Unix milliseconds, the storage format for timestamps
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
