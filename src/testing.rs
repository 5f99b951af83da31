//! Shared test and demo scaffolding.
//!
//! Lives in the library (not `#[cfg(test)]`) so the integration tests and
//! downstream consumers can reuse it: a scripted in-memory source, raw
//! event builders, and a subscriber that records everything it receives.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use relay_core::{Action, ColumnValues, Position, RawRow, RowsEvent};
use relay_topic::{TopicHandle, TopicMessage};

use crate::jsonl::RecordedEvent;
use crate::source::{BinlogSource, BinlogStream, SourceError};

/// Build a column map from `(name, value)` pairs, preserving order.
pub fn columns(cols: &[(&str, serde_json::Value)]) -> ColumnValues {
    cols.iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// An insert event carrying one value map per row.
pub fn insert_event(
    schema: &str,
    table: &str,
    primary_key: &[&str],
    rows: Vec<ColumnValues>,
) -> RowsEvent {
    RowsEvent {
        action: Action::Insert,
        schema: schema.to_string(),
        table: table.to_string(),
        primary_key: primary_key.iter().map(|c| c.to_string()).collect(),
        rows: rows.into_iter().map(RawRow::values).collect(),
        timestamp: Utc::now(),
    }
}

/// An update event carrying `(before, after)` image pairs per row.
pub fn update_event(
    schema: &str,
    table: &str,
    primary_key: &[&str],
    rows: Vec<(ColumnValues, ColumnValues)>,
) -> RowsEvent {
    RowsEvent {
        action: Action::Update,
        schema: schema.to_string(),
        table: table.to_string(),
        primary_key: primary_key.iter().map(|c| c.to_string()).collect(),
        rows: rows
            .into_iter()
            .map(|(before, after)| RawRow::update(before, after))
            .collect(),
        timestamp: Utc::now(),
    }
}

/// A delete event carrying one value map per row.
pub fn delete_event(
    schema: &str,
    table: &str,
    primary_key: &[&str],
    rows: Vec<ColumnValues>,
) -> RowsEvent {
    RowsEvent {
        action: Action::Delete,
        schema: schema.to_string(),
        table: table.to_string(),
        primary_key: primary_key.iter().map(|c| c.to_string()).collect(),
        rows: rows.into_iter().map(RawRow::values).collect(),
        timestamp: Utc::now(),
    }
}

/// A scripted in-memory binlog source.
///
/// Yields its items in order, honoring a resume position the way a real
/// source would (events at or before it are skipped). Optionally blocks
/// after the script runs out, for cancellation tests.
pub struct StaticSource {
    items: Vec<Result<RecordedEvent, SourceError>>,
    blocking: bool,
}

impl StaticSource {
    pub fn new(items: Vec<Result<RecordedEvent, SourceError>>) -> Self {
        Self {
            items,
            blocking: false,
        }
    }

    /// Convenience constructor for an all-good script.
    pub fn from_events(events: Vec<(RowsEvent, Position)>) -> Self {
        Self::new(
            events
                .into_iter()
                .map(|(event, position)| Ok(RecordedEvent { event, position }))
                .collect(),
        )
    }

    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }
}

#[async_trait]
impl BinlogSource for StaticSource {
    fn source_type(&self) -> &'static str {
        "static"
    }

    async fn events(&mut self, resume: Option<Position>) -> Result<Box<dyn BinlogStream>> {
        let items = std::mem::take(&mut self.items)
            .into_iter()
            .filter(|item| match (item, &resume) {
                (Ok(record), Some(resume)) => record.position > *resume,
                _ => true,
            })
            .collect();
        Ok(Box::new(StaticStream {
            items,
            position: None,
            blocking: self.blocking,
        }))
    }
}

struct StaticStream {
    items: VecDeque<Result<RecordedEvent, SourceError>>,
    position: Option<Position>,
    blocking: bool,
}

#[async_trait]
impl BinlogStream for StaticStream {
    async fn next(&mut self) -> Option<Result<RowsEvent, SourceError>> {
        match self.items.pop_front() {
            Some(Ok(RecordedEvent { event, position })) => {
                self.position = Some(position);
                Some(Ok(event))
            }
            Some(Err(err)) => Some(Err(err)),
            None => {
                if self.blocking {
                    std::future::pending::<()>().await;
                }
                None
            }
        }
    }

    fn position(&self) -> Option<Position> {
        self.position.clone()
    }
}

/// A subscriber that records every message it receives, tagged with the
/// topic key it was connected to.
#[derive(Clone, Default)]
pub struct Recorder {
    log: Arc<Mutex<Vec<(String, TopicMessage)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect this recorder to a topic. Each topic gets its own identity
    /// key, so one recorder can observe many topics at once.
    pub fn subscribe(&self, topic: &TopicHandle) {
        let key = topic.key().to_string();
        let log = Arc::clone(&self.log);
        topic.connect(format!("recorder:{key}"), move |message| {
            log.lock().unwrap().push((key.clone(), message.clone()));
            Ok(())
        });
    }

    /// Everything received so far, in delivery order.
    pub fn entries(&self) -> Vec<(String, TopicMessage)> {
        self.log.lock().unwrap().clone()
    }

    /// All positions seen on position topics, in delivery order.
    pub fn positions(&self) -> Vec<Position> {
        self.entries()
            .into_iter()
            .filter_map(|(_, message)| match message {
                TopicMessage::Position(position) => Some(position),
                _ => None,
            })
            .collect()
    }
}
