use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::assessment::persistence::{DEFAULT_AUTOSAVE_MS, DEFAULT_HISTORY_CAP};

/// Deployment stage, read from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub persistence: PersistenceConfig,
}

impl AppConfig {
    /// Read `.env` (when present) and then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            environment: AppEnvironment::parse(&var_or("APP_ENV", "development")),
            server: ServerConfig::from_env()?,
            telemetry: TelemetryConfig {
                log_level: var_or("APP_LOG_LEVEL", "info"),
            },
            persistence: PersistenceConfig::from_env()?,
        })
    }
}

fn var_or(key: &str, fallback: &str) -> String {
    env::var(key).unwrap_or_else(|_| fallback.to_string())
}

/// Parse an optional positive integer override, keeping `fallback` when unset.
fn positive_var<T>(key: &str, fallback: T, err: ConfigError) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .ok()
            .filter(|value| *value > T::default())
            .ok_or(err),
        Err(_) => Ok(fallback),
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let port = var_or("APP_PORT", "3000")
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;
        Ok(Self {
            host: var_or("APP_HOST", "127.0.0.1"),
            port,
        })
    }

    /// `localhost` maps to the IPv4 loopback; anything else must be a literal address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::from([127, 0, 0, 1])
        } else {
            self.host
                .parse()
                .map_err(|source| ConfigError::InvalidHost { source })?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where drafts and history live and how eagerly drafts are written.
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    pub store_dir: PathBuf,
    pub autosave_ms: u64,
    pub history_cap: usize,
}

impl PersistenceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            store_dir: env::var_os("ASSESSMENT_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_dir),
            autosave_ms: positive_var(
                "ASSESSMENT_AUTOSAVE_MS",
                defaults.autosave_ms,
                ConfigError::InvalidAutosaveDelay,
            )?,
            history_cap: positive_var(
                "ASSESSMENT_HISTORY_CAP",
                defaults.history_cap,
                ConfigError::InvalidHistoryCap,
            )?,
        })
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(".assessment-store"),
            autosave_ms: DEFAULT_AUTOSAVE_MS,
            history_cap: DEFAULT_HISTORY_CAP,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidAutosaveDelay,
    InvalidHistoryCap,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidAutosaveDelay => {
                write!(f, "ASSESSMENT_AUTOSAVE_MS must be a positive number of milliseconds")
            }
            ConfigError::InvalidHistoryCap => {
                write!(f, "ASSESSMENT_HISTORY_CAP must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidAutosaveDelay
            | ConfigError::InvalidHistoryCap => None,
        }
    }
}
