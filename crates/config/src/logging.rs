//! Logging configuration
//!
//! Controls how the service writes its own diagnostic logs (not the build
//! logs it ingests).

use serde::Deserialize;

/// Log level
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing level filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console output (default)
    #[default]
    Console,
    /// One JSON object per line
    Json,
}

/// Log output destination
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Append to a file at this path
    #[serde(untagged)]
    File(String),
}

/// Logging configuration
///
/// # Example
///
/// ```toml
/// [log]
/// level = "info"
/// format = "json"
/// output = "stderr"
/// quiet_dependencies = true
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default: info
    pub level: LogLevel,

    /// Default: console
    pub format: LogFormat,

    /// Default: stdout
    pub output: LogOutput,

    /// Cap chatty client libraries (librdkafka, hyper) at `warn`
    /// Default: true
    pub quiet_dependencies: bool,
}

/// Targets capped at `warn` when `quiet_dependencies` is set
const NOISY_TARGETS: &[&str] = &["rdkafka", "hyper", "h2", "tower_http"];

impl LogConfig {
    /// Whether log lines should be emitted as JSON objects
    pub fn is_json(&self) -> bool {
        self.format == LogFormat::Json
    }

    /// Build an `EnvFilter` directive string for the given base level
    pub fn directive(&self, level: &str) -> String {
        if !self.quiet_dependencies {
            return level.to_string();
        }

        let mut directive = level.to_string();
        for target in NOISY_TARGETS {
            directive.push_str(&format!(",{target}=warn"));
        }
        directive
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Console,
            output: LogOutput::Stdout,
            quiet_dependencies: true,
        }
    }
}
