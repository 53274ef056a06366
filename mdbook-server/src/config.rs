//! Server configuration from environment variables

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_ADDR: &str = "127.0.0.1:5001";

/// Errors in the environment configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    Missing(&'static str),

    #[error("MDBOOK_DIR must be an absolute path, got '{0}'")]
    NotAbsolute(String),

    #[error("Invalid listen address '{0}'")]
    InvalidAddr(String),
}

/// Settings of a running server
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding the books
    pub dir: PathBuf,

    /// Administrator credentials for Basic auth
    pub user: String,
    pub password: String,

    pub development: bool,

    /// Value of the `mdbook_apikey` header granting access
    pub apikey: Option<String>,

    pub addr: SocketAddr,

    /// Comma-separated allowed origins, or `*`
    pub cors_origins: Option<String>,
}

impl Settings {
    /// Read the settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the settings through a variable lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let dir = required("MDBOOK_DIR")?;
        let dir = PathBuf::from(dir.trim());
        if !dir.is_absolute() {
            return Err(ConfigError::NotAbsolute(dir.display().to_string()));
        }

        let addr = get("MDBOOK_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidAddr(addr.clone()))?;

        Ok(Self {
            dir,
            user: required("MDBOOK_USER")?,
            password: required("MDBOOK_PASSWORD")?,
            development: lookup("MDBOOK_DEVELOPMENT").is_some(),
            apikey: get("MDBOOK_APIKEY"),
            addr,
            cors_origins: get("MDBOOK_CORS_ORIGINS"),
        })
    }

    /// Default tracing filter when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        if self.development {
            "mdbook_server=debug,mdbook_core=debug,tower_http=debug"
        } else {
            "mdbook_server=info,tower_http=info"
        }
    }
}
