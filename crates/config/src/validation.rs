//! Configuration validation
//!
//! Validates config consistency:
//! - Transport has brokers, a group and a topic
//! - Heartbeats fit inside the session timeout, which fits inside the poll interval
//! - Timer intervals are non-zero
//! - Queue and batch sizes are non-zero
//! - The durable sink has a reachable URL and a safe table name

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::sink::SinkConfig;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_transport(config)?;
    validate_sink(config)?;
    validate_pipeline(config)?;
    validate_gateway(config)?;
    validate_metrics(config)?;
    Ok(())
}

fn validate_transport(config: &Config) -> Result<()> {
    let transport = &config.transport;

    if transport.brokers.iter().all(|b| b.trim().is_empty()) {
        return Err(ConfigError::missing_field("transport", "brokers"));
    }
    if transport.group_id.is_empty() {
        return Err(ConfigError::missing_field("transport", "group_id"));
    }
    if transport.topic.is_empty() {
        return Err(ConfigError::missing_field("transport", "topic"));
    }
    if transport.heartbeat_interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "transport",
            "heartbeat_interval",
            "must be greater than zero",
        ));
    }
    if transport.heartbeat_interval >= transport.session_timeout {
        return Err(ConfigError::invalid_value(
            "transport",
            "heartbeat_interval",
            format!(
                "{:?} must be shorter than session_timeout ({:?})",
                transport.heartbeat_interval, transport.session_timeout
            ),
        ));
    }
    if transport.max_poll_interval < transport.session_timeout {
        return Err(ConfigError::invalid_value(
            "transport",
            "max_poll_interval",
            format!(
                "{:?} must not be shorter than session_timeout ({:?})",
                transport.max_poll_interval, transport.session_timeout
            ),
        ));
    }
    if transport.max_batch_size == 0 {
        return Err(ConfigError::invalid_value(
            "transport",
            "max_batch_size",
            "must be at least 1",
        ));
    }
    if transport.partition_queue_size == 0 {
        return Err(ConfigError::invalid_value(
            "transport",
            "partition_queue_size",
            "must be at least 1",
        ));
    }
    if transport.sasl_username.is_some() != transport.sasl_password.is_some() {
        return Err(ConfigError::invalid_value(
            "transport",
            "sasl_password",
            "sasl_username and sasl_password must be set together",
        ));
    }

    Ok(())
}

fn validate_sink(config: &Config) -> Result<()> {
    match &config.sink {
        SinkConfig::Clickhouse(ch) => {
            if ch.url.is_empty() {
                return Err(ConfigError::missing_field("sink", "url"));
            }
            if !ch.url.starts_with("http://") && !ch.url.starts_with("https://") {
                return Err(ConfigError::invalid_value(
                    "sink",
                    "url",
                    "must start with http:// or https://",
                ));
            }
            if !is_identifier(&ch.table) {
                return Err(ConfigError::invalid_value(
                    "sink",
                    "table",
                    "must contain only letters, digits and underscores",
                ));
            }
            if !is_identifier(&ch.database) {
                return Err(ConfigError::invalid_value(
                    "sink",
                    "database",
                    "must contain only letters, digits and underscores",
                ));
            }
        }
        SinkConfig::Memory(_) => {}
    }

    Ok(())
}

fn validate_pipeline(config: &Config) -> Result<()> {
    if config.pipeline.commit_every == 0 {
        return Err(ConfigError::invalid_value(
            "pipeline",
            "commit_every",
            "must be at least 1",
        ));
    }
    if config.fanout.enabled && config.fanout.queue_size == 0 {
        return Err(ConfigError::invalid_value(
            "fanout",
            "queue_size",
            "must be at least 1",
        ));
    }
    Ok(())
}

fn validate_gateway(config: &Config) -> Result<()> {
    let gateway = &config.gateway;
    if !gateway.enabled {
        return Ok(());
    }
    if gateway.max_connections == 0 {
        return Err(ConfigError::invalid_value(
            "gateway",
            "max_connections",
            "must be at least 1",
        ));
    }
    if gateway.connection_buffer == 0 {
        return Err(ConfigError::invalid_value(
            "gateway",
            "connection_buffer",
            "must be at least 1",
        ));
    }
    if gateway.ping_interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "gateway",
            "ping_interval",
            "must be greater than zero",
        ));
    }
    Ok(())
}

fn validate_metrics(config: &Config) -> Result<()> {
    if config.metrics.enabled && config.metrics.interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "metrics",
            "interval",
            "must be greater than zero",
        ));
    }
    Ok(())
}

/// Table and database names are interpolated into DDL and queries
fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
