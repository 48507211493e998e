//! Logs command - print a deployment transcript from the durable store

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use shipyard_sinks::StoredLogEvent;

use super::{load_config, open_store};

/// Logs command arguments
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Deployment to print
    pub deployment_id: String,

    /// One JSON object per stored event instead of raw lines
    #[arg(long)]
    pub json: bool,
}

/// Run the logs command
pub async fn run(args: LogsArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let store = open_store(&config.sink, false).await?;

    let events = store
        .transcripts
        .transcript(&args.deployment_id)
        .await
        .with_context(|| format!("failed to read transcript for {}", args.deployment_id))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_transcript(&mut out, &events, args.json)?;
    out.flush()?;
    Ok(())
}

/// Write events, oldest first
fn write_transcript(out: &mut impl Write, events: &[StoredLogEvent], json: bool) -> Result<()> {
    for event in events {
        if json {
            serde_json::to_writer(&mut *out, event)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", event.log)?;
        }
    }
    Ok(())
}
