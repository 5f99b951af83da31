//! File-backed position store.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use relay_core::{Position, RelayError};
use relay_topic::{SubscriptionId, TopicHandle, TopicMessage, TopicRegistry};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::PositionStore;

/// Shared between the store, the position-topic callback, and the flusher
/// task. Every access takes the lock for the full read-modify-write, so a
/// position advance can never race a flush into a lost update.
struct Cell {
    position: Option<Position>,
    dirty: bool,
}

/// Stores the binlog position in a single-line text file.
///
/// While started, a background task wakes every `interval` and writes the
/// current position iff it changed since the last write. `stop()` performs
/// a final unconditional flush.
pub struct FilePositionStore {
    path: PathBuf,
    interval: Duration,
    cell: Arc<Mutex<Cell>>,
    topic: Option<TopicHandle>,
    subscription: Option<SubscriptionId>,
    flusher: Option<JoinHandle<()>>,
    cancel: CancellationToken,
    started: bool,
}

impl FilePositionStore {
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            path: path.into(),
            interval,
            cell: Arc::new(Mutex::new(Cell {
                position: None,
                dirty: false,
            })),
            topic: None,
            subscription: None,
            flusher: None,
            cancel: CancellationToken::new(),
            started: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a new position. No-op when it equals the current value, so
    /// repeated notifications for one position never mark the cell dirty.
    pub fn advance(&self, position: Position) {
        Self::advance_cell(&self.cell, position);
    }

    fn advance_cell(cell: &Mutex<Cell>, position: Position) {
        let mut cell = cell.lock().unwrap();
        if cell.position.as_ref() != Some(&position) {
            cell.position = Some(position);
            cell.dirty = true;
        }
    }

    fn load(path: &Path) -> Result<Option<Position>, RelayError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(RelayError::CheckpointIo {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        text.parse::<Position>()
            .map(Some)
            .map_err(|err| RelayError::CheckpointCorruption {
                path: path.display().to_string(),
                reason: err.to_string(),
            })
    }

    /// Write the current position and clear the dirty flag. Caller holds
    /// the cell lock, making the read-write-clear a critical section.
    fn flush_locked(path: &Path, cell: &mut Cell) -> io::Result<()> {
        let Some(position) = &cell.position else {
            // Nothing seen yet; leave the file untouched.
            cell.dirty = false;
            return Ok(());
        };
        debug!(path = %path.display(), position = %position, "saving position");
        std::fs::write(path, position.to_string())?;
        cell.dirty = false;
        Ok(())
    }
}

#[async_trait]
impl PositionStore for FilePositionStore {
    async fn start(&mut self, registry: &TopicRegistry) -> Result<()> {
        if self.started {
            return Err(RelayError::StoreAlreadyStarted.into());
        }

        let loaded = Self::load(&self.path)?;
        match &loaded {
            Some(position) => {
                info!(path = %self.path.display(), position = %position, "position store started")
            }
            None => {
                info!(path = %self.path.display(), "position store started, no prior position")
            }
        }
        {
            let mut cell = self.cell.lock().unwrap();
            cell.position = loaded;
            cell.dirty = false;
        }

        let topic = registry.position_topic();
        let cell = Arc::clone(&self.cell);
        let subscription = topic.connect("position-store", move |message| {
            if let TopicMessage::Position(position) = message {
                Self::advance_cell(&cell, position.clone());
            }
            Ok(())
        });
        self.topic = Some(topic);
        self.subscription = Some(subscription);

        self.cancel = CancellationToken::new();
        let cancel = self.cancel.clone();
        let cell = Arc::clone(&self.cell);
        let path = self.path.clone();
        let interval = self.interval;
        self.flusher = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; harmless, nothing is
            // dirty right after start.
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let mut cell = cell.lock().unwrap();
                        if cell.dirty {
                            if let Err(err) = Self::flush_locked(&path, &mut cell) {
                                error!(path = %path.display(), error = %err, "failed to save position, will retry");
                            }
                        }
                    }
                }
            }
            debug!(path = %path.display(), "position flusher stopped");
        }));

        self.started = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if !self.started {
            return Err(RelayError::StoreNotStarted.into());
        }

        if let (Some(topic), Some(subscription)) = (self.topic.take(), self.subscription.take()) {
            topic.disconnect(subscription);
        }

        self.cancel.cancel();
        if let Some(flusher) = self.flusher.take() {
            let _ = flusher.await;
        }

        // Final flush regardless of the dirty flag: the last timer tick may
        // have raced a position advance.
        {
            let mut cell = self.cell.lock().unwrap();
            Self::flush_locked(&self.path, &mut cell).map_err(|source| {
                RelayError::CheckpointIo {
                    path: self.path.display().to_string(),
                    source,
                }
            })?;
        }

        self.started = false;
        info!(path = %self.path.display(), "position store stopped");
        Ok(())
    }

    fn position(&self) -> Option<Position> {
        self.cell.lock().unwrap().position.clone()
    }
}

impl Drop for FilePositionStore {
    fn drop(&mut self) {
        // Stop the flusher if the owner never called stop(); the final
        // flush still requires an explicit stop().
        self.cancel.cancel();
    }
}
