//! Event normalization.
//!
//! Turns a raw [`RowsEvent`] plus the stream position after it into a
//! [`ChangeEvent`]: update rows get a before/after diff, every row gets its
//! primary-key projection, and the metadata record carries the position for
//! downstream checkpointing.

use std::collections::HashMap;

use crate::error::RelayError;
use crate::event::{
    Action, ChangeEvent, ColumnDiff, ColumnValues, EventMeta, RawRow, RowChange, RowsEvent,
};
use crate::position::Position;

/// Normalize one raw event.
///
/// # Errors
///
/// Returns [`RelayError::NormalizationInconsistency`] when the event
/// violates the source contract: an update row whose before/after images
/// have different column sets, a non-update row carrying before/after
/// images (or the reverse), or a primary-key column missing from the row
/// values. These are fatal, since the source cannot be trusted past this
/// point.
pub fn normalize(event: &RowsEvent, position: &Position) -> Result<ChangeEvent, RelayError> {
    let mut rows = Vec::with_capacity(event.rows.len());
    for raw in &event.rows {
        rows.push(normalize_row(raw, event)?);
    }

    let meta = EventMeta {
        time: event.timestamp,
        log_file: position.log_file.clone(),
        log_pos: position.log_pos,
        schema: event.schema.clone(),
        table: event.table.clone(),
        action: event.action,
    };

    Ok(ChangeEvent {
        action: event.action,
        schema: event.schema.clone(),
        table: event.table.clone(),
        rows,
        meta,
    })
}

fn normalize_row(raw: &RawRow, event: &RowsEvent) -> Result<RowChange, RelayError> {
    let (values, updated_values) = match (event.action, raw) {
        (Action::Update, RawRow::Update { before, after }) => {
            let diff = updated_values(before, after, event)?;
            (after.clone(), Some(diff))
        }
        (Action::Insert | Action::Delete, RawRow::Values { values }) => (values.clone(), None),
        (action, _) => {
            return Err(inconsistency(
                event,
                format!("row shape does not match {action} action"),
            ));
        }
    };

    let keys = project_keys(&values, event)?;
    Ok(RowChange {
        keys,
        values,
        updated_values,
    })
}

/// Columns whose value changed, as `(before, after)` pairs.
///
/// The before and after images always share one column set; a mismatch means
/// the source handed over a broken event.
fn updated_values(
    before: &ColumnValues,
    after: &ColumnValues,
    event: &RowsEvent,
) -> Result<HashMap<String, ColumnDiff>, RelayError> {
    if before.len() != after.len() || before.keys().any(|col| !after.contains_key(col)) {
        return Err(inconsistency(
            event,
            "before/after images have different column sets".to_string(),
        ));
    }

    Ok(before
        .iter()
        .filter(|(col, value)| after[*col] != **value)
        .map(|(col, value)| {
            (
                col.clone(),
                ColumnDiff {
                    before: value.clone(),
                    after: after[col].clone(),
                },
            )
        })
        .collect())
}

/// Project the primary-key columns out of `values`, in declared order.
fn project_keys(values: &ColumnValues, event: &RowsEvent) -> Result<ColumnValues, RelayError> {
    let mut keys = ColumnValues::new();
    for col in &event.primary_key {
        let value = values.get(col).ok_or_else(|| {
            inconsistency(event, format!("primary-key column {col:?} missing from row"))
        })?;
        keys.insert(col.clone(), value.clone());
    }
    Ok(keys)
}

fn inconsistency(event: &RowsEvent, reason: String) -> RelayError {
    RelayError::NormalizationInconsistency {
        schema: event.schema.clone(),
        table: event.table.clone(),
        reason,
    }
}
