//! Row-change event types.
//!
//! [`RowsEvent`] and [`RawRow`] model what the binlog source hands over: one
//! decoded event per table touched, carrying the flat column values (or
//! before/after images for updates). [`ChangeEvent`], [`RowChange`] and
//! [`EventMeta`] are the normalized shapes the dispatcher fans out.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Flat column-name → value map.
///
/// `serde_json::Map` preserves insertion order (the `preserve_order`
/// feature), which keeps composite primary-key projections in declared
/// column order.
pub type ColumnValues = serde_json::Map<String, serde_json::Value>;

/// The three row-change kinds a binlog source produces.
///
/// Anything else coming off the wire is a source bug; the enum makes such
/// events unrepresentable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Insert,
    Update,
    Delete,
}

impl Action {
    /// Action name as recorded in event metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Insert => "insert",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    /// Topic path segment for this action.
    ///
    /// Inserts dispatch on `write` topics, matching the binlog wire naming
    /// (WriteRows / UpdateRows / DeleteRows).
    pub fn topic_segment(&self) -> &'static str {
        match self {
            Action::Insert => "write",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row within a raw event.
///
/// Insert and delete rows carry a single flat value map; update rows carry
/// the full before and after images with identical column sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRow {
    Update {
        before: ColumnValues,
        after: ColumnValues,
    },
    Values {
        values: ColumnValues,
    },
}

impl RawRow {
    pub fn values(values: ColumnValues) -> Self {
        RawRow::Values { values }
    }

    pub fn update(before: ColumnValues, after: ColumnValues) -> Self {
        RawRow::Update { before, after }
    }
}

/// A decoded row-change event as produced by the binlog source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowsEvent {
    pub action: Action,
    pub schema: String,
    pub table: String,
    /// Primary-key column names in declared order. Single-column keys are a
    /// one-element list.
    pub primary_key: Vec<String>,
    pub rows: Vec<RawRow>,
    pub timestamp: DateTime<Utc>,
}

/// Metadata attached to every normalized event.
///
/// All fields are copied through from the raw event and the stream position;
/// nothing is recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMeta {
    pub time: DateTime<Utc>,
    pub log_file: String,
    pub log_pos: u64,
    pub schema: String,
    pub table: String,
    pub action: Action,
}

/// Before/after pair for one changed column of an update row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDiff {
    pub before: serde_json::Value,
    pub after: serde_json::Value,
}

/// A normalized row.
///
/// `keys` is always the primary-key projection of `values`. For updates,
/// `values` is the post-image and `updated_values` holds only the columns
/// whose value actually changed; for inserts and deletes it is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowChange {
    pub keys: ColumnValues,
    pub values: ColumnValues,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_values: Option<HashMap<String, ColumnDiff>>,
}

/// A normalized row-change event, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub action: Action,
    pub schema: String,
    pub table: String,
    pub rows: Vec<RowChange>,
    pub meta: EventMeta,
}
