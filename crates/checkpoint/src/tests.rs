//! Unit tests for the checkpoint crate.

use std::time::Duration;

use relay_core::{Position, RelayError};
use relay_topic::{TopicMessage, TopicRegistry};
use tempfile::TempDir;

use crate::{FilePositionStore, PositionStore};

fn pos_file(tmp: &TempDir) -> std::path::PathBuf {
    tmp.path().join("binlog.pos")
}

fn send_position(registry: &TopicRegistry, position: Position) {
    registry
        .position_topic()
        .publish(&TopicMessage::Position(position));
}

// ============================================================================
// Load behavior
// ============================================================================

#[tokio::test]
async fn test_absent_file_means_no_prior_position() {
    let tmp = TempDir::new().unwrap();
    let registry = TopicRegistry::new();
    let mut store = FilePositionStore::new(pos_file(&tmp), Duration::from_secs(60));

    store.start(&registry).await.unwrap();
    assert_eq!(store.position(), None);
    store.stop().await.unwrap();

    // Nothing was ever advanced, so stop() must not invent a file.
    assert!(!pos_file(&tmp).exists());
}

#[tokio::test]
async fn test_empty_file_means_no_prior_position() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(pos_file(&tmp), "").unwrap();
    let registry = TopicRegistry::new();
    let mut store = FilePositionStore::new(pos_file(&tmp), Duration::from_secs(60));

    store.start(&registry).await.unwrap();
    assert_eq!(store.position(), None);
    store.stop().await.unwrap();
}

#[tokio::test]
async fn test_resume_reports_persisted_position_before_any_event() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(pos_file(&tmp), "bin.1:500").unwrap();
    let registry = TopicRegistry::new();
    let mut store = FilePositionStore::new(pos_file(&tmp), Duration::from_secs(60));

    store.start(&registry).await.unwrap();
    assert_eq!(store.position(), Some(Position::new("bin.1", 500)));
    store.stop().await.unwrap();
}

#[tokio::test]
async fn test_malformed_file_is_fatal_at_start() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(pos_file(&tmp), "garbage").unwrap();
    let registry = TopicRegistry::new();
    let mut store = FilePositionStore::new(pos_file(&tmp), Duration::from_secs(60));

    let err = store.start(&registry).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RelayError>(),
        Some(RelayError::CheckpointCorruption { .. })
    ));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_start_twice_is_a_usage_error() {
    let tmp = TempDir::new().unwrap();
    let registry = TopicRegistry::new();
    let mut store = FilePositionStore::new(pos_file(&tmp), Duration::from_secs(60));

    store.start(&registry).await.unwrap();
    let err = store.start(&registry).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RelayError>(),
        Some(RelayError::StoreAlreadyStarted)
    ));
    store.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_without_start_is_a_usage_error() {
    let tmp = TempDir::new().unwrap();
    let mut store = FilePositionStore::new(pos_file(&tmp), Duration::from_secs(60));

    let err = store.stop().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RelayError>(),
        Some(RelayError::StoreNotStarted)
    ));
}

#[tokio::test]
async fn test_restart_after_stop_is_allowed() {
    let tmp = TempDir::new().unwrap();
    let registry = TopicRegistry::new();
    let mut store = FilePositionStore::new(pos_file(&tmp), Duration::from_secs(60));

    store.start(&registry).await.unwrap();
    send_position(&registry, Position::new("bin.1", 100));
    store.stop().await.unwrap();

    store.start(&registry).await.unwrap();
    assert_eq!(store.position(), Some(Position::new("bin.1", 100)));
    store.stop().await.unwrap();
}

// ============================================================================
// Position tracking and flushing
// ============================================================================

#[tokio::test]
async fn test_stop_flushes_last_seen_position() {
    let tmp = TempDir::new().unwrap();
    let registry = TopicRegistry::new();
    // Interval far in the future: only the final flush can write.
    let mut store = FilePositionStore::new(pos_file(&tmp), Duration::from_secs(3600));

    store.start(&registry).await.unwrap();
    send_position(&registry, Position::new("bin.1", 100));
    send_position(&registry, Position::new("bin.1", 250));
    store.stop().await.unwrap();

    let persisted = std::fs::read_to_string(pos_file(&tmp)).unwrap();
    assert_eq!(persisted, "bin.1:250");
}

#[tokio::test]
async fn test_background_flush_writes_changed_position() {
    let tmp = TempDir::new().unwrap();
    let registry = TopicRegistry::new();
    let mut store = FilePositionStore::new(pos_file(&tmp), Duration::from_millis(20));

    store.start(&registry).await.unwrap();
    send_position(&registry, Position::new("bin.2", 42));

    // Give the flusher a couple of ticks.
    tokio::time::sleep(Duration::from_millis(120)).await;
    let persisted = std::fs::read_to_string(pos_file(&tmp)).unwrap();
    assert_eq!(persisted, "bin.2:42");

    store.stop().await.unwrap();
}

#[tokio::test]
async fn test_idle_store_does_not_rewrite_the_file() {
    let tmp = TempDir::new().unwrap();
    let registry = TopicRegistry::new();
    let mut store = FilePositionStore::new(pos_file(&tmp), Duration::from_millis(20));

    store.start(&registry).await.unwrap();
    send_position(&registry, Position::new("bin.1", 100));
    tokio::time::sleep(Duration::from_millis(120)).await;

    let modified_after_flush = std::fs::metadata(pos_file(&tmp)).unwrap().modified().unwrap();

    // No further position changes: the file must stay untouched.
    tokio::time::sleep(Duration::from_millis(120)).await;
    let modified_later = std::fs::metadata(pos_file(&tmp)).unwrap().modified().unwrap();
    assert_eq!(modified_after_flush, modified_later);

    store.stop().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_position_does_not_mark_dirty() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(pos_file(&tmp), "bin.1:100").unwrap();
    let registry = TopicRegistry::new();
    let mut store = FilePositionStore::new(pos_file(&tmp), Duration::from_millis(20));

    store.start(&registry).await.unwrap();
    // Same value as loaded: no dirty flag, no rewrite.
    send_position(&registry, Position::new("bin.1", 100));
    let modified_before = std::fs::metadata(pos_file(&tmp)).unwrap().modified().unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;
    let modified_after = std::fs::metadata(pos_file(&tmp)).unwrap().modified().unwrap();
    assert_eq!(modified_before, modified_after);

    store.stop().await.unwrap();
}

#[tokio::test]
async fn test_flushed_positions_are_monotonic() {
    let tmp = TempDir::new().unwrap();
    let registry = TopicRegistry::new();
    let mut store = FilePositionStore::new(pos_file(&tmp), Duration::from_millis(10));

    store.start(&registry).await.unwrap();
    let mut last_flushed: Option<Position> = None;
    for offset in [100u64, 200, 300, 400] {
        send_position(&registry, Position::new("bin.1", offset));
        tokio::time::sleep(Duration::from_millis(40)).await;
        let persisted: Position = std::fs::read_to_string(pos_file(&tmp))
            .unwrap()
            .parse()
            .unwrap();
        if let Some(last) = &last_flushed {
            assert!(persisted >= *last);
        }
        last_flushed = Some(persisted);
    }
    store.stop().await.unwrap();

    let final_pos: Position = std::fs::read_to_string(pos_file(&tmp))
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(final_pos, Position::new("bin.1", 400));
}

#[tokio::test]
async fn test_disconnects_from_topic_on_stop() {
    let tmp = TempDir::new().unwrap();
    let registry = TopicRegistry::new();
    let mut store = FilePositionStore::new(pos_file(&tmp), Duration::from_secs(3600));

    store.start(&registry).await.unwrap();
    assert_eq!(registry.position_topic().subscriber_count(), 1);
    send_position(&registry, Position::new("bin.1", 100));
    store.stop().await.unwrap();
    assert_eq!(registry.position_topic().subscriber_count(), 0);

    // Notifications after stop are not recorded.
    send_position(&registry, Position::new("bin.1", 999));
    assert_eq!(store.position(), Some(Position::new("bin.1", 100)));
}
