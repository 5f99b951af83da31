//! Error taxonomy for binlog-relay.

/// Errors raised by the relay core, topic registry, and checkpoint store.
///
/// The fatal kinds (`NormalizationInconsistency`, `CheckpointCorruption`,
/// `CheckpointIo`) stop the replication loop; the rest are programmer or
/// usage errors that fail fast at the call site.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A topic path tuple violated the hierarchy rules (`table` requires
    /// `schema`, `row` requires `table`).
    #[error("invalid topic path: {0}")]
    InvalidTopicPath(String),

    /// A position string did not have the `"<log_file>:<log_offset>"` shape.
    #[error("malformed position {value:?}: expected \"<log_file>:<log_offset>\"")]
    MalformedPosition {
        /// The offending input.
        value: String,
    },

    /// A row-change event violated the source contract (before/after column
    /// sets differ, or a primary-key column is missing from the row values).
    #[error("inconsistent row-change event for {schema}.{table}: {reason}")]
    NormalizationInconsistency {
        schema: String,
        table: String,
        reason: String,
    },

    /// The persisted checkpoint could not be parsed. The store cannot guess
    /// a resume point, so this is fatal at load time.
    #[error("corrupt checkpoint file {path}: {reason}")]
    CheckpointCorruption { path: String, reason: String },

    /// Reading or writing the checkpoint file failed.
    #[error("checkpoint i/o error at {path}")]
    CheckpointIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// `start()` called on a store that is already running.
    #[error("position store already started")]
    StoreAlreadyStarted,

    /// `stop()` called on a store that was never started.
    #[error("position store not started")]
    StoreNotStarted,
}
