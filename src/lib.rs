//! binlog-relay
//!
//! Publishes decoded MySQL row-change events to hierarchical in-process
//! topics and durably tracks the binlog position, so a restarted consumer
//! resumes exactly where it stopped.
//!
//! # Features
//!
//! - Hierarchical fan-out: one event reaches action-, schema-, table- and
//!   row-level subscribers, broadest first
//! - Durable resumption: a file-backed position checkpoint, flushed in the
//!   background and on shutdown
//! - Isolated subscribers: a failing callback is logged and never blocks
//!   delivery to the rest
//! - Pluggable sources: any ordered, position-resumable event feed behind
//!   the [`BinlogSource`] trait
//!
//! # Workspace Crates
//!
//! - `relay-core` - event/position data model, normalizer, error taxonomy
//! - `relay-topic` - topic registry, subscription sets, dispatcher
//! - `checkpoint` - binlog position checkpoint store
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use binlog_relay::{replicate, FilePositionStore, JsonlSource, RelayOpts, TopicRegistry};
//! use binlog_relay::{Action, TopicMessage};
//! use clap::Parser;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let registry = Arc::new(TopicRegistry::new());
//! registry
//!     .table_topic(Action::Insert, "testdb", "tbl0")
//!     .connect("my-consumer", |message| {
//!         if let TopicMessage::Rows { rows, .. } = message {
//!             println!("{} rows inserted", rows.len());
//!         }
//!         Ok(())
//!     });
//!
//! let opts = RelayOpts::parse();
//! let mut source = JsonlSource::new("events.jsonl");
//! let mut store = FilePositionStore::new(&opts.position_file, opts.flush_interval());
//! replicate(&mut source, registry, &mut store, &opts, CancellationToken::new()).await
//! # }
//! ```

pub mod jsonl;
pub mod replication;
pub mod source;
pub mod testing;

pub use jsonl::{JsonlSource, RecordedEvent};
pub use replication::{replicate, RelayOpts};
pub use source::{BinlogSource, BinlogStream, SourceError};

// Re-export the member crates' surface for convenience.
pub use checkpoint::{FilePositionStore, PositionStore};
pub use relay_core::{
    normalize, Action, ChangeEvent, ColumnDiff, ColumnValues, EventMeta, Position, RawRow,
    RelayError, RowChange, RowsEvent,
};
pub use relay_topic::{
    Dispatcher, SubscriptionId, Topic, TopicHandle, TopicMessage, TopicPath, TopicRegistry,
};
