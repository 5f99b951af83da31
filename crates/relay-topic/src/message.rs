//! Payloads delivered to subscribers.

use std::sync::Arc;

use relay_core::{ChangeEvent, Position, RowChange};

/// What a subscriber receives, shaped per topic level.
///
/// Action- and schema-level subscribers see the whole normalized event;
/// table-level subscribers see the event's row batch in one delivery (so
/// batch-aware consumers don't pay per-row overhead); row-level subscribers
/// see one row per delivery; the position topic carries bare positions.
#[derive(Debug, Clone)]
pub enum TopicMessage {
    /// Action- and schema-level payload: `(event, schema, table)`.
    Event {
        event: Arc<ChangeEvent>,
        schema: String,
        table: String,
    },
    /// Table-level payload: `(rows, schema, table)`.
    Rows {
        rows: Arc<Vec<RowChange>>,
        schema: String,
        table: String,
    },
    /// Row-level payload: `(row, schema, table)`.
    Row {
        row: RowChange,
        schema: String,
        table: String,
    },
    /// Position-advanced notification.
    Position(Position),
}

impl TopicMessage {
    /// Schema name, when the payload carries one.
    pub fn schema(&self) -> Option<&str> {
        match self {
            TopicMessage::Event { schema, .. }
            | TopicMessage::Rows { schema, .. }
            | TopicMessage::Row { schema, .. } => Some(schema),
            TopicMessage::Position(_) => None,
        }
    }

    /// Table name, when the payload carries one.
    pub fn table(&self) -> Option<&str> {
        match self {
            TopicMessage::Event { table, .. }
            | TopicMessage::Rows { table, .. }
            | TopicMessage::Row { table, .. } => Some(table),
            TopicMessage::Position(_) => None,
        }
    }
}
