//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::CacheConfig;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "rostra";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PUBLIC_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_CACHE_TTL_SECONDS: u64 = 20;
const DEFAULT_CACHE_MAX_ENTRIES: usize = 64;

/// Command-line arguments for the rostra binary.
#[derive(Debug, Parser)]
#[command(name = "rostra", version, about = "Rostra blog server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "ROSTRA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the public listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the public listener port.
    #[arg(long = "server-public-port", value_name = "PORT")]
    pub public_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", env = "ROSTRA_DATABASE_URL", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Toggle the index response cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the index response cache window in seconds.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Read(#[from] config::ConfigError),
    #[error("invalid listen address `{value}`")]
    InvalidAddress { value: String },
    #[error("invalid log level `{value}`")]
    InvalidLogLevel { value: String },
    #[error("invalid log format `{value}` (expected `compact` or `json`)")]
    InvalidLogFormat { value: String },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub public_addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub max_entries: usize,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl: Duration::from_secs(settings.ttl_seconds),
            max_entries: settings.max_entries,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    server: RawServer,
    database: RawDatabase,
    logging: RawLogging,
    cache: RawCache,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawServer {
    host: String,
    public_port: u16,
}

impl Default for RawServer {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            public_port: DEFAULT_PUBLIC_PORT,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawDatabase {
    url: Option<String>,
    max_connections: u32,
}

impl Default for RawDatabase {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawLogging {
    level: String,
    format: String,
}

impl Default for RawLogging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawCache {
    enabled: bool,
    ttl_seconds: u64,
    max_entries: usize,
}

impl Default for RawCache {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
        }
    }
}

/// Parse the CLI and produce the effective settings.
pub fn load_with_cli() -> Result<(CliArgs, Settings), ConfigError> {
    let cli = CliArgs::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
}

fn load(cli: &CliArgs) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = &cli.config_file {
        builder = builder.add_source(File::from(path.clone()).required(true));
    }

    let raw: RawSettings = builder
        .add_source(Environment::with_prefix("ROSTRA").separator("__"))
        .build()?
        .try_deserialize()?;

    let overrides = match &cli.command {
        Some(Command::Serve(args)) => args.overrides.clone(),
        None => ServeOverrides::default(),
    };

    resolve(raw, overrides)
}

fn resolve(raw: RawSettings, overrides: ServeOverrides) -> Result<Settings, ConfigError> {
    let host = overrides.server_host.unwrap_or(raw.server.host);
    let port = overrides.public_port.unwrap_or(raw.server.public_port);
    let address = format!("{host}:{port}");
    let public_addr = address
        .parse()
        .map_err(|_| ConfigError::InvalidAddress { value: address })?;

    let level_raw = overrides.log_level.unwrap_or(raw.logging.level);
    let level = LevelFilter::from_str(&level_raw)
        .map_err(|_| ConfigError::InvalidLogLevel { value: level_raw })?;

    let format = match overrides.log_json {
        Some(true) => LogFormat::Json,
        Some(false) => LogFormat::Compact,
        None => match raw.logging.format.as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            other => {
                return Err(ConfigError::InvalidLogFormat {
                    value: other.to_string(),
                });
            }
        },
    };

    let max_connections = overrides
        .database_max_connections
        .unwrap_or(raw.database.max_connections);
    let max_connections = NonZeroU32::new(max_connections).ok_or(ConfigError::Zero {
        field: "database.max_connections",
    })?;

    let ttl_seconds = overrides.cache_ttl_seconds.unwrap_or(raw.cache.ttl_seconds);
    if ttl_seconds == 0 {
        return Err(ConfigError::Zero {
            field: "cache.ttl_seconds",
        });
    }

    Ok(Settings {
        server: ServerSettings { public_addr },
        database: DatabaseSettings {
            url: overrides.database_url.or(raw.database.url),
            max_connections,
        },
        logging: LoggingSettings { level, format },
        cache: CacheSettings {
            enabled: overrides.cache_enabled.unwrap_or(raw.cache.enabled),
            ttl_seconds,
            max_entries: raw.cache.max_entries,
        },
    })
}
