// Runtime configuration
// Read from the environment (and an optional .env file) with logged defaults

use std::time::Duration;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::Credential;
use crate::domain::errors::{EnrollmentError, EnrollmentResult};
use crate::infrastructure::remote::http_remote::DEFAULT_REQUEST_TIMEOUT;

pub const REMOTE_URL_VAR: &str = "ENROLLMENT_REMOTE_URL";
pub const CACHE_URL_VAR: &str = "ENROLLMENT_CACHE_URL";
pub const REMOTE_TIMEOUT_VAR: &str = "ENROLLMENT_REMOTE_TIMEOUT_SECS";
pub const AUTH_TOKEN_VAR: &str = "ENROLLMENT_AUTH_TOKEN";
pub const LOG_LEVEL_VAR: &str = "ENROLLMENT_LOG";
pub const LOG_FORMAT_VAR: &str = "ENROLLMENT_LOG_FORMAT";

const DEFAULT_REMOTE_URL: &str = "http://localhost:8000/api";
const DEFAULT_CACHE_URL: &str = "sqlite://enrollment-cache.db";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "plain" | "pretty" | "text" => Some(LogFormat::Plain),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::Plain,
        }
    }
}

/// Settings for the engine's adapters and the sync binary
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub remote_url: String,
    pub cache_url: String,
    pub remote_timeout: Duration,
    /// Bearer token the sync binary replays with
    pub auth_token: Option<Credential>,
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Loads `.env` if present, then reads the process environment
    pub fn from_env() -> EnrollmentResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> EnrollmentResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let remote_url = lookup(REMOTE_URL_VAR).unwrap_or_else(|| {
            tracing::warn!("{} not set, using default", REMOTE_URL_VAR);
            DEFAULT_REMOTE_URL.to_string()
        });

        let cache_url = lookup(CACHE_URL_VAR).unwrap_or_else(|| {
            tracing::warn!("{} not set, using default", CACHE_URL_VAR);
            DEFAULT_CACHE_URL.to_string()
        });

        let remote_timeout = match lookup(REMOTE_TIMEOUT_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    EnrollmentError::Configuration(format!(
                        "{} must be a positive number of seconds, got {:?}",
                        REMOTE_TIMEOUT_VAR, raw
                    ))
                })?,
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let auth_token = lookup(AUTH_TOKEN_VAR)
            .filter(|token| !token.trim().is_empty())
            .map(Credential::bearer);

        let format = match lookup(LOG_FORMAT_VAR) {
            Some(raw) => LogFormat::parse(&raw).ok_or_else(|| {
                EnrollmentError::Configuration(format!(
                    "{} must be plain or json, got {:?}",
                    LOG_FORMAT_VAR, raw
                ))
            })?,
            None => LogFormat::Plain,
        };

        Ok(Self {
            remote_url,
            cache_url,
            remote_timeout,
            auth_token,
            logging: LoggingConfig {
                level: lookup(LOG_LEVEL_VAR).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
                format,
            },
        })
    }
}

/// Installs the global tracing subscriber
///
/// `RUST_LOG` overrides the configured level when set.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Plain => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true))
                .init();
        }
    }

    tracing::info!("Logging initialized with level: {}", config.level);
}
