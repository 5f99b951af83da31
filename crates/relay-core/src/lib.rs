//! Core types for binlog-relay.
//!
//! This crate provides the foundational types shared by the rest of the
//! workspace:
//!
//! - [`Action`] - The three row-change kinds a binlog source produces
//! - [`Position`] - Totally ordered `(log_file, log_offset)` stream marker
//! - [`RowsEvent`] / [`RawRow`] - Decoded row-change events at the source boundary
//! - [`ChangeEvent`] / [`RowChange`] / [`EventMeta`] - Normalized dispatch payloads
//! - [`normalize`] - Raw event + position → normalized event
//! - [`RelayError`] - Error taxonomy for the whole workspace
//!
//! # Architecture
//!
//! relay-core sits at the foundation of the workspace:
//!
//! ```text
//! relay-core (this crate)
//!    │
//!    ├─── relay-topic   (topic registry, subscriptions, dispatcher)
//!    ├─── checkpoint    (position checkpoint store)
//!    └─── binlog-relay  (source boundary, replication loop, CLI)
//! ```

pub mod error;
pub mod event;
pub mod normalize;
pub mod position;

pub use error::RelayError;
pub use event::{Action, ChangeEvent, ColumnDiff, ColumnValues, EventMeta, RawRow, RowChange, RowsEvent};
pub use normalize::normalize;
pub use position::Position;
