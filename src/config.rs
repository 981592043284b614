use std::time::Duration;
use thiserror::Error;
use tracing::Level;
use url::Url;

const DEFAULT_FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime settings, read from the environment (and `.env`) at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub finnhub_api_key: String,
    pub finnhub_base_url: Url,
    pub quote_cache_ttl: Duration,
    pub database_path: String,
    pub session_db_path: String,
    pub session_inactivity_days: i64,
    pub bind_addr: String,
    pub log_level: Level,
}

impl Config {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let finnhub_api_key = lookup("FINNHUB_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::Missing("FINNHUB_API_KEY"))?;

        let mut base = lookup("FINNHUB_BASE_URL")
            .unwrap_or_else(|| DEFAULT_FINNHUB_BASE_URL.to_string());
        // Url::join drops the last path segment unless the base ends in a slash
        if !base.ends_with('/') {
            base.push('/');
        }
        let finnhub_base_url = Url::parse(&base).map_err(|_| ConfigError::Invalid {
            key: "FINNHUB_BASE_URL",
            value: base.clone(),
        })?;

        let quote_cache_secs: u64 = parse_or(&lookup, "QUOTE_CACHE_SECS", 300)?;
        let session_inactivity_days: i64 = parse_or(&lookup, "SESSION_INACTIVITY_DAYS", 7)?;
        let log_level: Level = parse_or(&lookup, "LOG_LEVEL", Level::INFO)?;

        Ok(Self {
            finnhub_api_key,
            finnhub_base_url,
            quote_cache_ttl: Duration::from_secs(quote_cache_secs),
            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "finance.db".to_string()),
            session_db_path: lookup("SESSION_DB_PATH")
                .unwrap_or_else(|| "sessions.db".to_string()),
            session_inactivity_days,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            log_level,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

/// Map a command line argument to a log level, as `debug`, `warn`, `error` or anything else for info.
pub fn level_from_arg(arg: &str) -> Level {
    match arg {
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
