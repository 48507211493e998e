//! Shipyard - deployment log ingestion and live fan-out
//!
//! # Usage
//!
//! ```bash
//! # Run the service (default)
//! shipyard
//! shipyard --config configs/config.toml
//!
//! # Print the stored transcript of a deployment
//! shipyard logs 3f1c9a2e-...
//! shipyard logs 3f1c9a2e-... --json
//! ```

mod cmd;
mod routes;

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shipyard_config::{Config, LogConfig, LogOutput};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Shipyard - deployment log ingestion and live fan-out
#[derive(Parser, Debug)]
#[command(name = "shipyard")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the ingestion service
    Serve(cmd::serve::ServeArgs),

    /// Print the stored log transcript of a deployment
    Logs(cmd::logs::LogsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Serve(mut args)) => {
            // CLI global --config overrides subcommand config if both specified
            if args.config.is_none() && cli.config.is_some() {
                args.config = cli.config;
            }
            let log_config = load_log_config(args.config.as_deref());
            let level = resolve_log_level(cli.log_level.as_deref(), &log_config);
            init_logging(&level, &log_config)?;
            cmd::serve::run(args).await
        }
        Some(Command::Logs(args)) => {
            // Logs prints to stdout; diagnostics only when asked for
            if let Some(level) = cli.log_level.as_deref() {
                init_logging(level, &LogConfig::default())?;
            }
            cmd::logs::run(args, cli.config).await
        }
        // No subcommand = run the service
        None => {
            let log_config = load_log_config(cli.config.as_deref());
            let level = resolve_log_level(cli.log_level.as_deref(), &log_config);
            init_logging(&level, &log_config)?;
            let args = cmd::serve::ServeArgs { config: cli.config };
            cmd::serve::run(args).await
        }
    }
}

/// Read the `[log]` section, falling back to defaults on any problem
///
/// Config errors are reported properly once the command loads the file.
fn load_log_config(config_path: Option<&Path>) -> LogConfig {
    config_path
        .filter(|path| path.exists())
        .and_then(|path| Config::from_file(path).ok())
        .map(|config| config.log)
        .unwrap_or_default()
}

/// Resolve log level: CLI flag > config file > default "info"
fn resolve_log_level(cli_level: Option<&str>, log_config: &LogConfig) -> String {
    let level = cli_level.unwrap_or(log_config.level.as_str());
    log_config.directive(level)
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, log_config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);

    match (&log_config.output, log_config.is_json()) {
        (LogOutput::Stdout, false) => registry.with(fmt::layer().with_target(true)).init(),
        (LogOutput::Stdout, true) => registry.with(fmt::layer().json()).init(),
        (LogOutput::Stderr, false) => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
        (LogOutput::Stderr, true) => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        (LogOutput::File(path), json) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {path}"))?;
            let layer = fmt::layer().with_ansi(false).with_writer(std::sync::Mutex::new(file));
            if json {
                registry.with(layer.json()).init();
            } else {
                registry.with(layer).init();
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipyard_config::LogLevel;

    #[test]
    fn test_cli_flag_overrides_config() {
        let config = LogConfig {
            level: LogLevel::Warn,
            quiet_dependencies: false,
            ..Default::default()
        };
        assert_eq!(resolve_log_level(Some("debug"), &config), "debug");
        assert_eq!(resolve_log_level(None, &config), "warn");
    }

    #[test]
    fn test_quiet_dependencies_directive() {
        let level = resolve_log_level(None, &LogConfig::default());
        assert!(level.starts_with("info"));
        assert!(level.contains("rdkafka=warn"));
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let config = load_log_config(Some(Path::new("/nonexistent/shipyard.toml")));
        assert_eq!(config.level, LogLevel::Info);
    }

    #[test]
    fn test_parse_logs_subcommand() {
        let cli = Cli::parse_from(["shipyard", "logs", "d1", "--json", "--config", "c.toml"]);
        let Some(Command::Logs(args)) = cli.command else {
            panic!("expected logs subcommand");
        };
        assert_eq!(args.deployment_id, "d1");
        assert!(args.json);
        assert_eq!(cli.config.as_deref(), Some(Path::new("c.toml")));
    }

    #[test]
    fn test_no_subcommand_runs_serve() {
        let cli = Cli::parse_from(["shipyard", "-l", "debug"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }
}
