//! Event dispatch across the four topic levels.

use std::sync::Arc;

use relay_core::{ChangeEvent, Position};
use tracing::debug;

use crate::message::TopicMessage;
use crate::registry::TopicRegistry;

/// Fans one normalized event out to its four topic levels, then notifies
/// the position topic.
///
/// Publish order is fixed, broadest first: action → schema → table → row.
/// A subscriber at a coarse level reacts before fine-grained ones without
/// having to know which table triggered it. The table level receives the
/// whole row batch as one payload; the row level gets one publish per row,
/// in row order.
pub struct Dispatcher {
    registry: Arc<TopicRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<TopicRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<TopicRegistry> {
        &self.registry
    }

    /// Dispatch one event and advance the position topic.
    ///
    /// The position notification fires exactly once per source event, after
    /// all topic-level publishes, including for events with an empty row
    /// list, otherwise checkpoint progress would silently stall.
    pub fn dispatch(&self, event: ChangeEvent) {
        let position = Position::new(event.meta.log_file.clone(), event.meta.log_pos);
        let action = event.action;
        let schema = event.schema.clone();
        let table = event.table.clone();
        let event = Arc::new(event);

        debug!(
            action = %action,
            schema = %schema,
            table = %table,
            rows = event.rows.len(),
            "dispatching event"
        );

        let whole_event = TopicMessage::Event {
            event: Arc::clone(&event),
            schema: schema.clone(),
            table: table.clone(),
        };
        self.registry.action_topic(action).publish(&whole_event);
        self.registry
            .schema_topic(action, schema.clone())
            .publish(&whole_event);

        self.registry
            .table_topic(action, schema.clone(), table.clone())
            .publish(&TopicMessage::Rows {
                rows: Arc::new(event.rows.clone()),
                schema: schema.clone(),
                table: table.clone(),
            });

        let row_topic = self.registry.row_topic(action, schema.clone(), table.clone());
        for row in &event.rows {
            row_topic.publish(&TopicMessage::Row {
                row: row.clone(),
                schema: schema.clone(),
                table: table.clone(),
            });
        }

        self.advance_position(&position);
    }

    /// Publish a bare position-advanced notification.
    ///
    /// Also used directly by the replication loop for events that produce no
    /// topic activity (filtered tables, undecodable events), so the
    /// checkpoint still makes progress.
    pub fn advance_position(&self, position: &Position) {
        self.registry
            .position_topic()
            .publish(&TopicMessage::Position(position.clone()));
    }
}
