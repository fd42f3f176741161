use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};

const DEFAULT_EXPORT_DATE_FORMAT: &str = "%d/%m/%Y";
const DEFAULT_EXPORT_UTC_OFFSET_MINUTES: i32 = 330;
const MAX_UTC_OFFSET_MINUTES: u32 = 24 * 60;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the registry.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub storage: StorageConfig,
    pub export: ExportConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = var_or("APP_LOG_LEVEL", "info");
        let log_format = LogFormat::parse(&var_or("APP_LOG_FORMAT", "compact"))?;

        let data_path = PathBuf::from(var_or("APP_DATA_PATH", ".elife/registry.json"));
        let session_path = PathBuf::from(var_or("APP_SESSION_PATH", ".elife/admin_auth.json"));

        let directory = PathBuf::from(var_or("APP_EXPORT_DIR", "."));
        let date_format = var_or("APP_EXPORT_DATE_FORMAT", DEFAULT_EXPORT_DATE_FORMAT);
        let offset_minutes = match env::var("APP_EXPORT_UTC_OFFSET_MINUTES") {
            Ok(raw) => raw
                .trim()
                .parse::<i32>()
                .map_err(|_| ConfigError::InvalidUtcOffset { minutes: None })?,
            Err(_) => DEFAULT_EXPORT_UTC_OFFSET_MINUTES,
        };
        let utc_offset = offset_from_minutes(offset_minutes)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            storage: StorageConfig {
                data_path,
                session_path,
            },
            export: ExportConfig {
                directory,
                date_format,
                utc_offset,
            },
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn offset_from_minutes(minutes: i32) -> Result<FixedOffset, ConfigError> {
    if minutes.unsigned_abs() >= MAX_UTC_OFFSET_MINUTES {
        return Err(ConfigError::InvalidUtcOffset {
            minutes: Some(minutes),
        });
    }
    FixedOffset::east_opt(minutes * 60).ok_or(ConfigError::InvalidUtcOffset {
        minutes: Some(minutes),
    })
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Output shape of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Where the store snapshot and the admin session record live on disk.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_path: PathBuf,
    pub session_path: PathBuf,
}

/// Rendering rules for spreadsheet exports.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub directory: PathBuf,
    pub date_format: String,
    pub utc_offset: FixedOffset,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            date_format: DEFAULT_EXPORT_DATE_FORMAT.to_string(),
            utc_offset: FixedOffset::east_opt(DEFAULT_EXPORT_UTC_OFFSET_MINUTES * 60)
                .unwrap_or_else(|| Utc.fix()),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat(String),
    InvalidUtcOffset { minutes: Option<i32> },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'json', got '{value}'")
            }
            ConfigError::InvalidUtcOffset { minutes: Some(minutes) } => write!(
                f,
                "APP_EXPORT_UTC_OFFSET_MINUTES must be within one day, got {minutes}"
            ),
            ConfigError::InvalidUtcOffset { minutes: None } => {
                write!(f, "APP_EXPORT_UTC_OFFSET_MINUTES must be an integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidLogFormat(_)
            | ConfigError::InvalidUtcOffset { .. } => None,
        }
    }
}
