//! Command-line interface for binlog-relay
//!
//! # Usage Examples
//!
//! ```bash
//! # Replay a captured JSONL event file through the dispatcher
//! binlog-relay replay --events events.jsonl --position-file relay.pos
//!
//! # Resume-aware replay restricted to one table, waiting for ctrl-c
//! binlog-relay replay --events events.jsonl \
//!   --position-file relay.pos \
//!   --only-tables testdb.tbl0 \
//!   --blocking
//! ```
//!
//! The position file holds a single `"<log_file>:<log_offset>"` line; delete
//! it to replay from the beginning.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use binlog_relay::{
    replicate, Action, FilePositionStore, JsonlSource, RelayOpts, TopicMessage, TopicRegistry,
};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "binlog-relay")]
#[command(about = "Publish row-change events to in-process topics with resumable position tracking")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSONL event file through the dispatcher
    Replay {
        /// File with one JSON-encoded row-change event per line
        #[arg(long)]
        events: PathBuf,

        /// Replication options
        #[command(flatten)]
        opts: RelayOpts,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Replay { events, opts } => replay(events, opts).await,
    }
}

async fn replay(events: PathBuf, opts: RelayOpts) -> Result<()> {
    let registry = Arc::new(TopicRegistry::new());
    connect_log_subscribers(&registry);

    let mut source = JsonlSource::new(&events).blocking(opts.blocking);
    let mut store = FilePositionStore::new(&opts.position_file, opts.flush_interval());

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received ctrl-c");
            signal_token.cancel();
        }
    });

    replicate(&mut source, registry, &mut store, &opts, shutdown).await
}

/// Log every event at the action level and every position advance, so a
/// replay is visible without writing a consumer first.
fn connect_log_subscribers(registry: &TopicRegistry) {
    for action in [Action::Insert, Action::Update, Action::Delete] {
        registry
            .action_topic(action)
            .connect("cli-event-log", |message| {
                if let TopicMessage::Event {
                    event,
                    schema,
                    table,
                } = message
                {
                    info!(
                        action = %event.action,
                        schema = %schema,
                        table = %table,
                        rows = event.rows.len(),
                        "event"
                    );
                }
                Ok(())
            });
    }

    registry
        .position_topic()
        .connect("cli-position-log", |message| {
            if let TopicMessage::Position(position) = message {
                debug!(position = %position, "position advanced");
            }
            Ok(())
        });
}
