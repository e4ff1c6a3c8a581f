//! Integration tests for the buffered session tracker

mod test_helpers;

use reprise_core::SessionTracker;
use reprise_storage::{sessions, SqliteSessionTracker};
use test_helpers::*;

#[tokio::test]
async fn test_time_is_buffered_until_persist() {
    let test_db = TestDb::new().await;
    let tracker = SqliteSessionTracker::new(test_db.pool.clone());

    tracker.start_session_if_needed().await;
    tracker.add_listening_time(0.5).await;
    tracker.add_listening_time(0.25).await;

    assert_eq!(sessions::total_listened(test_db.pool()).await.unwrap(), 0.0);
    assert_eq!(tracker.pending().await, 0.75);

    tracker.persist_progress().await;
    assert_eq!(sessions::total_listened(test_db.pool()).await.unwrap(), 0.75);
    assert_eq!(tracker.pending().await, 0.0);
}

#[tokio::test]
async fn test_start_is_idempotent() {
    let test_db = TestDb::new().await;
    let tracker = SqliteSessionTracker::new(test_db.pool.clone());

    tracker.start_session_if_needed().await;
    tracker.start_session_if_needed().await;

    assert_eq!(sessions::get_all(test_db.pool()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_end_flushes_and_closes() {
    let test_db = TestDb::new().await;
    let tracker = SqliteSessionTracker::new(test_db.pool.clone());

    tracker.start_session_if_needed().await;
    tracker.add_listening_time(1.0).await;
    tracker.end_session_if_idle().await;

    let all = sessions::get_all(test_db.pool()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].listened_seconds, 1.0);
    assert!(all[0].ended_at.is_some());

    // A later play opens a fresh session
    tracker.start_session_if_needed().await;
    assert_eq!(sessions::get_all(test_db.pool()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_non_positive_deltas_are_ignored() {
    let test_db = TestDb::new().await;
    let tracker = SqliteSessionTracker::new(test_db.pool.clone());
    tracker.add_listening_time(0.0).await;
    tracker.add_listening_time(-3.0).await;
    assert_eq!(tracker.pending().await, 0.0);
}
