//! Binlog position checkpointing for binlog-relay.
//!
//! A replication consumer must remember how far it got, or a restart either
//! replays events (duplicate delivery) or skips them (data loss). This crate
//! owns that memory:
//!
//! - The [`PositionStore`] trait defines the lifecycle: load persisted state
//!   at `start`, track position-advanced notifications while running, flush
//!   and release at `stop`.
//! - [`FilePositionStore`] persists the position as a single
//!   `"<log_file>:<log_offset>"` line, flushed by a background task on a
//!   fixed interval, and only when the position actually changed since the
//!   last flush, so an idle stream causes no writes.
//!
//! The store is the sole writer of its checkpoint file. An absent (or
//! empty) file is a valid "no prior state" condition; malformed content is
//! fatal at load time, since resuming from a guessed position corrupts the
//! downstream either way.

mod file;

#[cfg(test)]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use relay_core::Position;
use relay_topic::TopicRegistry;

pub use file::FilePositionStore;

/// Lifecycle of a position checkpoint store.
///
/// Non-reentrant: `Stopped → Started → Stopped`. Starting a started store
/// (or stopping a stopped one) is a usage error.
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Load the persisted position and begin listening to the registry's
    /// position topic.
    ///
    /// # Errors
    ///
    /// Fails with [`relay_core::RelayError::CheckpointCorruption`] when the
    /// persisted value cannot be parsed; the caller must stop rather than
    /// silently resume from scratch.
    async fn start(&mut self, registry: &TopicRegistry) -> Result<()>;

    /// Stop listening, stop the background flusher, and perform one final
    /// flush regardless of the dirty flag, so nothing between the last
    /// timer tick and shutdown is lost.
    async fn stop(&mut self) -> Result<()>;

    /// Current position: the last one seen via a notification, or the
    /// loaded one before any event, or `None` on a fresh start.
    fn position(&self) -> Option<Position>;
}
