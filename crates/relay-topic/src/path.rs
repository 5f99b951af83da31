//! Topic path tuples.

use std::fmt;

use relay_core::{Action, RelayError};

/// A validated hierarchical topic path: `(action, schema?, table?, row?)`.
///
/// The canonical rendering doubles as the registry key:
///
/// ```text
/// write                 action level
/// write@db              schema level
/// write@db.tbl          table level
/// write@db.tbl#row      row level
/// ```
///
/// Two equal tuples always resolve to the identical topic handle, so callers
/// can connect and disconnect knowing only the tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicPath {
    action: Action,
    schema: Option<String>,
    table: Option<String>,
    row_level: bool,
}

impl TopicPath {
    /// Build a path from raw parts, enforcing the hierarchy rules.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidTopicPath`] when `table` is given
    /// without `schema`, or `row_level` without `table`. This fails at
    /// construction so a bad tuple never reaches the registry.
    pub fn new(
        action: Action,
        schema: Option<String>,
        table: Option<String>,
        row_level: bool,
    ) -> Result<Self, RelayError> {
        if table.is_some() && schema.is_none() {
            return Err(RelayError::InvalidTopicPath(
                "table level requires a schema".to_string(),
            ));
        }
        if row_level && table.is_none() {
            return Err(RelayError::InvalidTopicPath(
                "row level requires a table".to_string(),
            ));
        }
        Ok(Self {
            action,
            schema,
            table,
            row_level,
        })
    }

    /// Action-level path: all schemas and tables for `action`.
    pub fn action(action: Action) -> Self {
        Self {
            action,
            schema: None,
            table: None,
            row_level: false,
        }
    }

    /// Schema-level path.
    pub fn schema(action: Action, schema: impl Into<String>) -> Self {
        Self {
            action,
            schema: Some(schema.into()),
            table: None,
            row_level: false,
        }
    }

    /// Table-level path. Subscribers receive the whole row batch per event.
    pub fn table(action: Action, schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            action,
            schema: Some(schema.into()),
            table: Some(table.into()),
            row_level: false,
        }
    }

    /// Row-level path. Subscribers receive one publish per row.
    pub fn row(action: Action, schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            action,
            schema: Some(schema.into()),
            table: Some(table.into()),
            row_level: true,
        }
    }
}

impl fmt::Display for TopicPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action.topic_segment())?;
        if let Some(schema) = &self.schema {
            write!(f, "@{schema}")?;
            if let Some(table) = &self.table {
                write!(f, ".{table}")?;
                if self.row_level {
                    f.write_str("#row")?;
                }
            }
        }
        Ok(())
    }
}
