//! Command implementations for the Shipyard CLI

pub mod logs;
pub mod serve;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use shipyard_config::{ClickHouseSinkConfig, Config, SinkConfig};
use shipyard_sinks::clickhouse::{ClickHouseConfig, ClickHouseLogSink};
use shipyard_sinks::memory::MemoryLogStore;
use shipyard_sinks::{LogSink, TranscriptReader};

/// Config files tried when `--config` is not given
const DEFAULT_CONFIG_PATHS: &[&str] = &["configs/config.toml", "config.toml"];

/// Load configuration
///
/// An explicit path must exist. Without one the default locations are tried,
/// then built-in defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        return Config::from_file(path).context("failed to load configuration");
    }

    for candidate in DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from) {
        if candidate.exists() {
            info!(config = %candidate.display(), "using config file");
            return Config::from_file(&candidate).context("failed to load configuration");
        }
    }

    info!("no config file found, using defaults");
    Ok(Config::default())
}

/// Both sides of the configured durable store
#[derive(Clone)]
pub struct Store {
    pub sink: Arc<dyn LogSink>,
    pub transcripts: Arc<dyn TranscriptReader>,
}

/// Open the configured durable store
///
/// `bootstrap` creates the ClickHouse table when the config asks for it.
pub async fn open_store(config: &SinkConfig, bootstrap: bool) -> Result<Store> {
    match config {
        SinkConfig::Clickhouse(ch) => {
            let sink = Arc::new(ClickHouseLogSink::new(clickhouse_config(ch)));
            if bootstrap {
                sink.ensure_schema()
                    .await
                    .context("failed to prepare clickhouse table")?;
            }
            Ok(Store {
                sink: sink.clone(),
                transcripts: sink,
            })
        }
        SinkConfig::Memory(memory) => {
            let store = Arc::new(if memory.max_events > 0 {
                MemoryLogStore::with_capacity_limit(memory.max_events)
            } else {
                MemoryLogStore::new()
            });
            Ok(Store {
                sink: store.clone(),
                transcripts: store,
            })
        }
    }
}

fn clickhouse_config(config: &ClickHouseSinkConfig) -> ClickHouseConfig {
    ClickHouseConfig {
        url: config.url.clone(),
        database: config.database.clone(),
        username: config.username.clone(),
        password: config.password.clone(),
        table: config.table.clone(),
        create_table: config.create_table,
        async_insert: config.async_insert,
        retry_attempts: config.retry_attempts,
        retry_base_delay: config.retry_base_delay,
        retry_max_delay: config.retry_max_delay,
    }
}
