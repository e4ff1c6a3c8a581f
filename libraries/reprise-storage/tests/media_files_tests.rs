//! Integration tests for the media files slice and the library context

mod test_helpers;

use chrono::{TimeZone, Utc};
use reprise_core::{FolderId, FolderListing, MediaLibrary};
use std::path::Path;
use test_helpers::*;

#[tokio::test]
async fn test_register_and_get_file() {
    let test_db = TestDb::new().await;
    let library = test_db.library();

    let file = library
        .register_path(Path::new("/media/week1/Lecture 01.mp3"))
        .await
        .unwrap();
    assert_eq!(file.title, "Lecture 01");
    assert_eq!(file.folder, FolderId::new("/media/week1"));

    let loaded = library.file(&file.id).await.unwrap().unwrap();
    assert_eq!(loaded, file);
}

#[tokio::test]
async fn test_register_is_idempotent_per_path() {
    let test_db = TestDb::new().await;
    let library = test_db.library();

    let first = library.register_path(Path::new("/media/a.mp3")).await.unwrap();
    let second = library.register_path(Path::new("/media/a.mp3")).await.unwrap();
    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn test_missing_file_is_none() {
    let test_db = TestDb::new().await;
    let library = test_db.library();
    assert!(library.file(&"nope".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_position_duration_and_error_updates() {
    let test_db = TestDb::new().await;
    let library = test_db.library();
    let id = create_test_file(test_db.pool(), "week1", "a").await;

    library.update_playback_position(&id, 42.5).await.unwrap();
    library.update_cached_duration(&id, 120.0).await.unwrap();
    library
        .set_load_error(&id, Some("file not found".into()))
        .await
        .unwrap();

    let file = library.file(&id).await.unwrap().unwrap();
    assert_eq!(file.playback_position, 42.5);
    assert_eq!(file.cached_duration, Some(120.0));
    assert_eq!(file.load_error.as_deref(), Some("file not found"));

    library.set_load_error(&id, None).await.unwrap();
    assert!(library.file(&id).await.unwrap().unwrap().load_error.is_none());
}

#[tokio::test]
async fn test_record_completion_counts_and_stamps() {
    let test_db = TestDb::new().await;
    let library = test_db.library();
    let id = create_test_file(test_db.pool(), "week1", "a").await;

    let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap();
    library.record_completion(&id, at).await.unwrap();
    library.record_completion(&id, at).await.unwrap();

    let file = library.file(&id).await.unwrap().unwrap();
    assert_eq!(file.record.completion_count, 2);
    assert_eq!(file.record.last_played_at, Some(at));
}

#[tokio::test]
async fn test_folder_listing_is_ordered_and_scoped() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let b = create_test_file(pool, "week1", "b").await;
    let a = create_test_file(pool, "week1", "A").await;
    create_test_file(pool, "week2", "c").await;

    let library = test_db.library();
    let ids = library.ordered_files(&FolderId::new("week1")).await.unwrap();
    assert_eq!(ids, vec![a, b]);

    let empty = library.ordered_files(&FolderId::new("nowhere")).await.unwrap();
    assert!(empty.is_empty());
}
