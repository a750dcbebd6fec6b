//! Event tracker store CLI (`tracker`)
//!
//! Inspects and edits the log store an event tracker writes to.

mod commands;

use clap::Parser;
use commands::Command;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracker_logstore::NamespaceResolver;
use tracker_storage::{StorageBackend, StorageConfig};

#[derive(Parser, Debug)]
#[command(name = "tracker", version, about = "Event tracker log store")]
struct Args {
    /// Store file. Without it an in-memory store is used.
    #[arg(long, env = "TRACKER_STORAGE", global = true)]
    storage: Option<PathBuf>,

    /// Stream id selecting the namespace within the store
    #[arg(long, env = "TRACKER_STREAM", default_value = "", global = true)]
    stream: String,

    /// Verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = StorageConfig::from_path(args.storage);
    if !config.is_persistent() {
        tracing::warn!("No --storage given, using an in-memory store");
    }

    let backend = StorageBackend::open(&config)
        .map_err(|e| anyhow::anyhow!("failed to open store {:?}: {}", config, e))?;
    let resolver = NamespaceResolver::new(&backend);

    let mut out = std::io::stdout().lock();
    commands::run(&resolver, &args.stream, args.command, &mut out)
}

fn init_tracing(verbosity: u8) {
    let mut filter = EnvFilter::from_default_env();

    // Only apply defaults if RUST_LOG is not set
    if std::env::var("RUST_LOG").is_err() {
        let level = match verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        if let Ok(directive) = level.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
