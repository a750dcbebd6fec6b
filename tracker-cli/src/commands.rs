//! CLI command handlers and dispatch

use anyhow::Context;
use clap::Subcommand;
use std::io::Write;
use tracker_logstore::{LogBatch, LogEntryStore, NamespaceResolver};
use tracker_model::{Block, Log};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List stream ids present in the store
    Streams,
    /// Show the next free index and the last processed block
    Head,
    /// Print the log at an index
    Get { index: u64 },
    /// Print logs in [from, to)
    Cat {
        #[arg(long, default_value_t = 0)]
        from: u64,
        #[arg(long)]
        to: Option<u64>,
    },
    /// Truncate, append and checkpoint in one transaction
    Apply {
        /// Drop every log at or above this index first
        #[arg(long)]
        truncate_from: Option<u64>,
        /// Log to append, as JSON (repeatable)
        #[arg(long = "record")]
        records: Vec<String>,
        /// Last processed block, as JSON
        #[arg(long)]
        checkpoint: Option<String>,
    },
}

pub fn run(
    resolver: &NamespaceResolver,
    stream: &str,
    command: Command,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    if let Command::Streams = command {
        for stream in resolver.streams()? {
            writeln!(out, "{:?}", stream)?;
        }
        return Ok(());
    }

    let store = resolver
        .resolve(stream)
        .with_context(|| format!("failed to open stream {:?}", stream))?;

    match command {
        Command::Streams => Ok(()),
        Command::Head => cmd_head(&store, out),
        Command::Get { index } => cmd_get(&store, index, out),
        Command::Cat { from, to } => cmd_cat(&store, from, to, out),
        Command::Apply { truncate_from, records, checkpoint } => {
            cmd_apply(&store, truncate_from, &records, checkpoint.as_deref(), out)
        }
    }
}

fn cmd_head(store: &LogEntryStore, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "next index: {}", store.next_free_index()?)?;
    match store.checkpoint::<Block>()? {
        Some(block) => writeln!(out, "last block: {} ({})", block.number, block.hash)?,
        None => writeln!(out, "last block: none")?,
    }
    Ok(())
}

fn cmd_get(store: &LogEntryStore, index: u64, out: &mut impl Write) -> anyhow::Result<()> {
    let log = store.record::<Log>(index)?;
    writeln!(out, "{}", serde_json::to_string_pretty(&log)?)?;
    Ok(())
}

fn cmd_cat(
    store: &LogEntryStore,
    from: u64,
    to: Option<u64>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let logs = match to {
        Some(to) => store.records::<Log>(from..to)?,
        None => store.records::<Log>(from..)?,
    };
    for (index, log) in (from..).zip(logs) {
        writeln!(out, "{index}\t{}", serde_json::to_string(&log)?)?;
    }
    Ok(())
}

fn cmd_apply(
    store: &LogEntryStore,
    truncate_from: Option<u64>,
    records: &[String],
    checkpoint: Option<&str>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let logs = records
        .iter()
        .enumerate()
        .map(|(i, raw)| serde_json::from_str::<Log>(raw).with_context(|| format!("invalid --record #{i}")))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let block = checkpoint
        .map(|raw| serde_json::from_str::<Block>(raw).context("invalid --checkpoint"))
        .transpose()?;

    let mut batch = LogBatch::new().extend(logs);
    batch.truncate_from = truncate_from;
    batch.checkpoint = block;

    let summary = store.apply_batch(&batch)?;
    tracing::info!(
        removed = summary.removed,
        appended = summary.appended,
        "batch applied"
    );
    writeln!(
        out,
        "removed {}, appended {} at {}, next index {}",
        summary.removed,
        summary.appended,
        summary.first_index,
        summary.next_free_index()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_storage::{StorageBackend, StorageConfig};

    fn resolver() -> NamespaceResolver {
        let backend = StorageBackend::open(&StorageConfig::InMemory).unwrap();
        NamespaceResolver::new(&backend)
    }

    fn run_to_string(resolver: &NamespaceResolver, command: Command) -> String {
        let mut out = Vec::new();
        run(resolver, "", command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn log_json(index: u64) -> String {
        format!(
            r#"{{"address":"0x01","topics":[],"data":"0x","blockNumber":{index},"blockHash":"0x02","transactionHash":"0x03","transactionIndex":0,"logIndex":{index}}}"#
        )
    }

    #[test]
    fn test_apply_then_head() {
        let resolver = resolver();
        let output = run_to_string(
            &resolver,
            Command::Apply {
                truncate_from: None,
                records: vec![log_json(0), log_json(1)],
                checkpoint: Some(r#"{"number":7,"hash":"0xb7","parentHash":"0xb6","timestamp":0}"#.into()),
            },
        );
        assert_eq!(output, "removed 0, appended 2 at 0, next index 2\n");

        let output = run_to_string(&resolver, Command::Head);
        assert_eq!(output, "next index: 2\nlast block: 7 (0xb7)\n");
    }

    #[test]
    fn test_cat_numbers_lines_from_start() {
        let resolver = resolver();
        run_to_string(
            &resolver,
            Command::Apply {
                truncate_from: None,
                records: (0..3).map(log_json).collect(),
                checkpoint: None,
            },
        );

        let output = run_to_string(&resolver, Command::Cat { from: 1, to: None });
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("1\t"));
        assert!(lines[1].starts_with("2\t"));
    }

    #[test]
    fn test_invalid_record_is_rejected_before_writing() {
        let resolver = resolver();
        let mut out = Vec::new();
        let result = run(
            &resolver,
            "",
            Command::Apply {
                truncate_from: None,
                records: vec![log_json(0), "{".into()],
                checkpoint: None,
            },
            &mut out,
        );
        assert!(result.is_err());
        assert_eq!(run_to_string(&resolver, Command::Head), "next index: 0\nlast block: none\n");
    }

    #[test]
    fn test_get_missing_index_fails() {
        let resolver = resolver();
        let mut out = Vec::new();
        let err = run(&resolver, "", Command::Get { index: 3 }, &mut out).unwrap_err();
        assert!(err.to_string().contains("No record at index 3"));
    }
}
