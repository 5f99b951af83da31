//! JSONL-backed binlog source.
//!
//! Reads one JSON-encoded [`RecordedEvent`] per line. Useful for replaying a
//! captured event sequence through the dispatcher without a database, and as
//! the source behind the `replay` CLI command.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use relay_core::{Position, RowsEvent};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::source::{BinlogSource, BinlogStream, SourceError};

/// One line of a JSONL event file: a raw event plus the stream position
/// after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub event: RowsEvent,
    pub position: Position,
}

/// Binlog source reading a JSONL event file.
pub struct JsonlSource {
    path: PathBuf,
    blocking: bool,
}

impl JsonlSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            blocking: false,
        }
    }

    /// In blocking mode the stream pends after the last line instead of
    /// ending, so the replication loop keeps running until cancelled. This
    /// is the file-based stand-in for a source that waits for new events.
    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }
}

#[async_trait]
impl BinlogSource for JsonlSource {
    fn source_type(&self) -> &'static str {
        "jsonl"
    }

    async fn events(&mut self, resume: Option<Position>) -> Result<Box<dyn BinlogStream>> {
        let file = std::fs::File::open(&self.path)
            .with_context(|| format!("opening event file {}", self.path.display()))?;
        let lines = BufReader::new(file)
            .lines()
            .collect::<io::Result<Vec<String>>>()
            .with_context(|| format!("reading event file {}", self.path.display()))?;

        Ok(Box::new(JsonlStream {
            lines: lines.into_iter().enumerate().collect(),
            resume,
            position: None,
            blocking: self.blocking,
        }))
    }
}

struct JsonlStream {
    lines: VecDeque<(usize, String)>,
    resume: Option<Position>,
    position: Option<Position>,
    blocking: bool,
}

#[async_trait]
impl BinlogStream for JsonlStream {
    async fn next(&mut self) -> Option<Result<RowsEvent, SourceError>> {
        while let Some((index, line)) = self.lines.pop_front() {
            if line.trim().is_empty() {
                continue;
            }
            let record: RecordedEvent = match serde_json::from_str(&line) {
                Ok(record) => record,
                Err(err) => {
                    return Some(Err(SourceError::Decode {
                        context: format!("line {}", index + 1),
                        reason: err.to_string(),
                    }));
                }
            };
            if let Some(resume) = &self.resume {
                if record.position <= *resume {
                    debug!(position = %record.position, "skipping event at or before resume position");
                    continue;
                }
            }
            let RecordedEvent { event, position } = record;
            self.position = Some(position);
            return Some(Ok(event));
        }

        if self.blocking {
            // A file never grows new events; pend until the replication
            // loop is cancelled.
            std::future::pending::<()>().await;
        }
        None
    }

    fn position(&self) -> Option<Position> {
        self.position.clone()
    }
}
