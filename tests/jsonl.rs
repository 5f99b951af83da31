//! Tests for the JSONL replay source.

use std::sync::Arc;

use binlog_relay::testing::{columns, insert_event, Recorder};
use binlog_relay::{
    replicate, Action, FilePositionStore, JsonlSource, Position, RecordedEvent, RelayOpts,
    TopicMessage, TopicRegistry,
};
use serde_json::json;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn opts(tmp: &TempDir) -> RelayOpts {
    RelayOpts {
        position_file: tmp.path().join("relay.pos"),
        flush_interval_secs: 0.05,
        connect_timeout_secs: 5,
        blocking: false,
        only_tables: None,
    }
}

fn record_line(id: u64, offset: u64) -> String {
    let record = RecordedEvent {
        event: insert_event(
            "testdb",
            "tbl0",
            &["id"],
            vec![columns(&[("id", json!(id))])],
        ),
        position: Position::new("bin.1", offset),
    };
    serde_json::to_string(&record).unwrap()
}

async fn replay(path: &std::path::Path, registry: &Arc<TopicRegistry>, opts: &RelayOpts) {
    let mut source = JsonlSource::new(path);
    let mut store = FilePositionStore::new(&opts.position_file, opts.flush_interval());
    replicate(
        &mut source,
        Arc::clone(registry),
        &mut store,
        opts,
        CancellationToken::new(),
    )
    .await
    .unwrap();
}

fn delivered_ids(recorder: &Recorder) -> Vec<serde_json::Value> {
    recorder
        .entries()
        .iter()
        .filter_map(|(_, message)| match message {
            TopicMessage::Row { row, .. } => Some(row.keys["id"].clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_replay_delivers_events_and_persists_position() {
    let tmp = TempDir::new().unwrap();
    let opts = opts(&tmp);
    let events_path = tmp.path().join("events.jsonl");
    std::fs::write(
        &events_path,
        format!("{}\n{}\n", record_line(1, 100), record_line(2, 200)),
    )
    .unwrap();

    let registry = Arc::new(TopicRegistry::new());
    let recorder = Recorder::new();
    recorder.subscribe(&registry.row_topic(Action::Insert, "testdb", "tbl0"));

    replay(&events_path, &registry, &opts).await;

    assert_eq!(delivered_ids(&recorder), vec![json!(1), json!(2)]);
    assert_eq!(
        std::fs::read_to_string(&opts.position_file).unwrap(),
        "bin.1:200"
    );
}

#[tokio::test]
async fn test_undecodable_line_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let opts = opts(&tmp);
    let events_path = tmp.path().join("events.jsonl");
    std::fs::write(
        &events_path,
        format!(
            "{}\nthis is not json\n{}\n",
            record_line(1, 100),
            record_line(3, 300)
        ),
    )
    .unwrap();

    let registry = Arc::new(TopicRegistry::new());
    let recorder = Recorder::new();
    recorder.subscribe(&registry.row_topic(Action::Insert, "testdb", "tbl0"));

    replay(&events_path, &registry, &opts).await;

    assert_eq!(delivered_ids(&recorder), vec![json!(1), json!(3)]);
    assert_eq!(
        std::fs::read_to_string(&opts.position_file).unwrap(),
        "bin.1:300"
    );
}

#[tokio::test]
async fn test_second_replay_picks_up_where_the_first_stopped() {
    let tmp = TempDir::new().unwrap();
    let opts = opts(&tmp);
    let events_path = tmp.path().join("events.jsonl");
    std::fs::write(
        &events_path,
        format!("{}\n{}\n", record_line(1, 100), record_line(2, 200)),
    )
    .unwrap();

    let registry = Arc::new(TopicRegistry::new());
    replay(&events_path, &registry, &opts).await;

    // More events arrive in the file; a fresh replay resumes past offset
    // 200 and only delivers the new ones.
    std::fs::write(
        &events_path,
        format!(
            "{}\n{}\n{}\n",
            record_line(1, 100),
            record_line(2, 200),
            record_line(3, 300)
        ),
    )
    .unwrap();

    let registry = Arc::new(TopicRegistry::new());
    let recorder = Recorder::new();
    recorder.subscribe(&registry.row_topic(Action::Insert, "testdb", "tbl0"));

    replay(&events_path, &registry, &opts).await;

    assert_eq!(delivered_ids(&recorder), vec![json!(3)]);
    assert_eq!(
        std::fs::read_to_string(&opts.position_file).unwrap(),
        "bin.1:300"
    );
}

#[tokio::test]
async fn test_empty_lines_are_ignored() {
    let tmp = TempDir::new().unwrap();
    let opts = opts(&tmp);
    let events_path = tmp.path().join("events.jsonl");
    std::fs::write(
        &events_path,
        format!("\n{}\n\n{}\n\n", record_line(1, 100), record_line(2, 200)),
    )
    .unwrap();

    let registry = Arc::new(TopicRegistry::new());
    let recorder = Recorder::new();
    recorder.subscribe(&registry.row_topic(Action::Insert, "testdb", "tbl0"));

    replay(&events_path, &registry, &opts).await;

    assert_eq!(delivered_ids(&recorder), vec![json!(1), json!(2)]);
}

#[tokio::test]
async fn test_missing_event_file_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let opts = opts(&tmp);
    let registry = Arc::new(TopicRegistry::new());

    let mut source = JsonlSource::new(tmp.path().join("does-not-exist.jsonl"));
    let mut store = FilePositionStore::new(&opts.position_file, opts.flush_interval());
    let err = replicate(
        &mut source,
        Arc::clone(&registry),
        &mut store,
        &opts,
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("opening event file"));
}
