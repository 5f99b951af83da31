//! The replication loop.
//!
//! Thin orchestration over a [`BinlogSource`]: acquire the position store,
//! resume from its position, then pull → normalize → dispatch one event at a
//! time. The store is released (with its final flush) on every exit path,
//! so the persisted position always reflects the last fully dispatched
//! event.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use checkpoint::PositionStore;
use clap::Parser;
use relay_core::{normalize, Position};
use relay_topic::{Dispatcher, TopicRegistry};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::source::{BinlogSource, SourceError};

/// Replication options.
#[derive(Parser, Debug, Clone)]
pub struct RelayOpts {
    /// Binlog position file used to resume after a restart
    #[arg(
        long,
        default_value = "binlog-relay.pos",
        env = "BINLOG_RELAY_POS_FILE"
    )]
    pub position_file: std::path::PathBuf,

    /// Seconds between background position flushes
    #[arg(long, default_value = "2.0")]
    pub flush_interval_secs: f64,

    /// Seconds to wait when connecting to the upstream source
    ///
    /// Forwarded to sources that dial a server; file-backed sources ignore
    /// it.
    #[arg(long, default_value = "5", env = "BINLOG_RELAY_CONNECT_TIMEOUT")]
    pub connect_timeout_secs: u64,

    /// Keep waiting for new events instead of stopping when the source is
    /// exhausted
    #[arg(long)]
    pub blocking: bool,

    /// Restrict dispatch to these tables (comma-separated schema.table
    /// entries); other tables still advance the position
    #[arg(long, value_delimiter = ',')]
    pub only_tables: Option<Vec<String>>,
}

impl RelayOpts {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs_f64(self.flush_interval_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Whether events for `schema.table` produce dispatch activity.
    pub fn table_allowed(&self, schema: &str, table: &str) -> bool {
        match &self.only_tables {
            Some(tables) => tables.iter().any(|t| {
                t.split_once('.')
                    .is_some_and(|(s, t)| s == schema && t == table)
            }),
            None => true,
        }
    }
}

/// Run replication until the source is exhausted, `shutdown` is cancelled,
/// or a fatal error occurs.
///
/// The position store is started before the first event and stopped on
/// every exit path, error exits included, which forces a final flush.
/// Cancellation is cooperative: an in-flight event's dispatch completes
/// before the store is released, so no position is saved for a partially
/// dispatched event.
pub async fn replicate(
    source: &mut dyn BinlogSource,
    registry: Arc<TopicRegistry>,
    store: &mut dyn PositionStore,
    opts: &RelayOpts,
    shutdown: CancellationToken,
) -> Result<()> {
    store.start(&registry).await?;
    let resume = store.position();

    let result = pump(source, registry, resume, opts, shutdown).await;

    let stopped = store.stop().await;
    result.and(stopped)
}

async fn pump(
    source: &mut dyn BinlogSource,
    registry: Arc<TopicRegistry>,
    resume: Option<Position>,
    opts: &RelayOpts,
    shutdown: CancellationToken,
) -> Result<()> {
    match &resume {
        Some(position) => {
            info!(source = source.source_type(), position = %position, "resuming replication")
        }
        None => {
            info!(
                source = source.source_type(),
                "starting replication from the source default position"
            )
        }
    }

    let mut stream = source.events(resume).await?;
    let dispatcher = Dispatcher::new(registry);

    let mut event_count = 0u64;
    loop {
        let item = tokio::select! {
            _ = shutdown.cancelled() => {
                info!(events = event_count, "shutdown requested, stopping replication");
                break;
            }
            item = stream.next() => item,
        };

        let Some(item) = item else {
            info!(events = event_count, "source exhausted");
            break;
        };

        match item {
            Ok(event) => {
                let position = stream.position().ok_or_else(|| {
                    anyhow::anyhow!("source yielded an event without a position")
                })?;
                if !opts.table_allowed(&event.schema, &event.table) {
                    debug!(
                        schema = %event.schema,
                        table = %event.table,
                        "table not in allow-list, advancing position only"
                    );
                    dispatcher.advance_position(&position);
                    continue;
                }
                let change = normalize(&event, &position)?;
                dispatcher.dispatch(change);
                event_count += 1;
                if event_count % 100 == 0 {
                    info!("processed {event_count} events");
                }
            }
            Err(err @ SourceError::Decode { .. }) => {
                warn!(error = %err, "skipping undecodable event");
                // The position signal still fires so the checkpoint does
                // not stall on a stream of broken events.
                if let Some(position) = stream.position() {
                    dispatcher.advance_position(&position);
                }
            }
            Err(SourceError::Fatal(err)) => return Err(err),
        }
    }

    Ok(())
}
