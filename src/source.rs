//! The binlog source boundary.
//!
//! Decoding a real replication stream lives outside this crate; everything
//! here only assumes a lazy, strictly position-ordered sequence of decoded
//! row-change events that can be resumed from a `(log_file, log_offset)`
//! pair. [`crate::jsonl::JsonlSource`] and the scripted source in
//! [`crate::testing`] implement the boundary in-repo.

use anyhow::Result;
use async_trait::async_trait;
use relay_core::{Position, RowsEvent};

/// Errors reported by a binlog source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// One event's payload could not be decoded. The replication loop logs
    /// the failure and skips that single event; the rest of the stream is
    /// unaffected.
    #[error("could not decode row-change event ({context}): {reason}")]
    Decode { context: String, reason: String },

    /// Anything else. Stops the replication loop.
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

/// A source of decoded row-change events.
#[async_trait]
pub trait BinlogSource: Send {
    /// Identifier used in logs (e.g. `"jsonl"`).
    fn source_type(&self) -> &'static str;

    /// Open the event stream.
    ///
    /// With `resume` set, the stream yields only events strictly after that
    /// position; without it, the source starts at its own default point.
    async fn events(&mut self, resume: Option<Position>) -> Result<Box<dyn BinlogStream>>;
}

/// An open stream of row-change events, strictly ordered by position.
#[async_trait]
pub trait BinlogStream: Send {
    /// The next event.
    ///
    /// `None` means the source is exhausted; blocking sources instead wait
    /// for new events and only complete through cancellation of the caller.
    async fn next(&mut self) -> Option<Result<RowsEvent, SourceError>>;

    /// The stream position after the most recently yielded event, `None`
    /// before the first one.
    fn position(&self) -> Option<Position>;
}
