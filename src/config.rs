//! Configuration for the counting server.
//!
//! Supports both command-line arguments and a TOML configuration file.
//! CLI arguments take precedence over config file values.

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Command-line arguments for the server
#[derive(Parser, Debug)]
#[command(name = "pcc-server")]
#[command(version)]
#[command(about = "Counts printable ASCII characters sent by clients", long_about = None)]
pub struct CliArgs {
    /// TCP port to listen on
    pub port: Option<u16>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 0.0.0.0)
    #[arg(long)]
    pub host: Option<String>,

    /// Listen backlog for pending connections
    #[arg(short, long)]
    pub backlog: Option<i32>,

    /// Maximum bytes read per payload chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: Option<u16>,
    #[serde(default = "default_backlog")]
    pub backlog: i32,
    /// Upper bound on how long an idle server sleeps before re-checking
    /// for a shutdown request.
    #[serde(default = "default_idle_poll_interval_ms")]
    pub idle_poll_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
            backlog: default_backlog(),
            idle_poll_interval_ms: default_idle_poll_interval_ms(),
        }
    }
}

/// Per-connection configuration
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_backlog() -> i32 {
    10
}

fn default_idle_poll_interval_ms() -> u64 {
    200
}

/// 1 MiB
pub fn default_chunk_size() -> usize {
    1 << 20
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backlog: i32,
    pub idle_poll_interval_ms: u64,
    pub chunk_size: usize,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(CliArgs::parse())
    }

    /// Merge parsed CLI args with the TOML file they point at, if any.
    pub fn from_args(cli: CliArgs) -> Result<Self, ConfigError> {
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|source| ConfigError::FileRead {
                    path: config_path.clone(),
                    source,
                })?;
            toml::from_str(&contents)
                .map_err(|source| ConfigError::TomlParse {
                    path: config_path.clone(),
                    source,
                })?
        } else {
            TomlConfig::default()
        };

        Self::merge(cli, toml_config)
    }

    fn merge(cli: CliArgs, toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let config = Config {
            host: cli.host.unwrap_or(toml_config.server.host),
            port: cli
                .port
                .or(toml_config.server.port)
                .ok_or(ConfigError::MissingPort)?,
            backlog: cli.backlog.unwrap_or(toml_config.server.backlog),
            idle_poll_interval_ms: toml_config.server.idle_poll_interval_ms,
            chunk_size: cli.chunk_size.unwrap_or(toml_config.session.chunk_size),
            log_level: cli.log_level.unwrap_or(toml_config.logging.level),
        };

        if config.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be greater than 0"));
        }
        if config.idle_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "idle_poll_interval_ms must be greater than 0",
            ));
        }

        Ok(config)
    }

    /// `host:port` string for binding and logging.
    pub fn listen_addr(&self) -> String {
        join_host_port(&self.host, self.port)
    }
}

/// Join a host and port, bracketing IPv6 literals.
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("No port given on the command line or in the config file")]
    MissingPort,

    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}
