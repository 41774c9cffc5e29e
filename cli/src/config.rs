//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the book API
    pub api_url: String,
    /// Where the session token is persisted
    pub token_file: PathBuf,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from `BOOKS_API_URL`, `BOOKS_TOKEN_FILE` and
    /// `BOOKS_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = var("BOOKS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        validate_url(&api_url)?;

        let token_file = match var("BOOKS_TOKEN_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_token_file()?,
        };

        let timeout = match var("BOOKS_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidTimeout(raw))?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url,
            token_file,
            timeout,
        })
    }

    pub fn with_api_url(mut self, api_url: Option<String>) -> Result<Self, ConfigError> {
        if let Some(url) = api_url {
            validate_url(&url)?;
            self.api_url = url;
        }
        Ok(self)
    }

    pub fn with_token_file(mut self, token_file: Option<PathBuf>) -> Self {
        if let Some(path) = token_file {
            self.token_file = path;
        }
        self
    }
}

fn validate_url(url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidApiUrl(url.to_string()))
    }
}

fn default_token_file() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|dir| dir.join("book-cli").join("session.json"))
        .ok_or(ConfigError::NoDataDir)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BOOKS_API_URL must start with http:// or https://, got {0:?}")]
    InvalidApiUrl(String),

    #[error("BOOKS_TIMEOUT_SECS must be a whole number of seconds, got {0:?}")]
    InvalidTimeout(String),

    #[error("no data directory on this platform; set BOOKS_TOKEN_FILE")]
    NoDataDir,
}
