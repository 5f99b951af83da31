//! Binlog stream positions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// A point in the binlog stream: `(log_file, log_offset)`.
///
/// Positions are totally ordered, first by `log_file` (assigned sequentially
/// by the server, so lexical order is stream order) and then by `log_pos`.
/// A position means "all events up to and including this point have been
/// delivered".
///
/// The canonical text form is `"<log_file>:<log_offset>"`, which is also the
/// persisted checkpoint format.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Binlog file name, e.g. `mysql-bin.000001`.
    pub log_file: String,
    /// Byte offset within the file.
    pub log_pos: u64,
}

impl Position {
    pub fn new(log_file: impl Into<String>, log_pos: u64) -> Self {
        Self {
            log_file: log_file.into(),
            log_pos,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.log_file, self.log_pos)
    }
}

impl FromStr for Position {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || RelayError::MalformedPosition {
            value: s.to_string(),
        };
        // The file name may itself contain ':', so split on the last one.
        let (log_file, offset) = s.rsplit_once(':').ok_or_else(malformed)?;
        if log_file.is_empty() {
            return Err(malformed());
        }
        let log_pos = offset.parse::<u64>().map_err(|_| malformed())?;
        Ok(Self {
            log_file: log_file.to_string(),
            log_pos,
        })
    }
}
