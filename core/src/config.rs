//! Client configuration and credentials.

use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

/// Production host of the Soloway DSP.
pub const DEFAULT_BASE_URL: &str = "https://dsp.soloway.ru";

pub const ENV_BASE_URL: &str = "SOLOWAY_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "SOLOWAY_TIMEOUT_SECS";
pub const ENV_USERNAME: &str = "SOLOWAY_USERNAME";
pub const ENV_PASSWORD: &str = "SOLOWAY_PASSWORD";

pub(crate) const PATH_LOGIN: &str = "/api/login";
pub(crate) const PATH_WHOAMI: &str = "/api/whoami";
pub(crate) const PATH_CLIENTS: &str = "/api/clients";
pub(crate) const PATH_PLACEMENTS_STAT: &str = "/api/placements_stat";
pub(crate) const PATH_PLACEMENTS: &str = "/api/placements";

/// Where the client sends requests and how long it waits for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Applied to every request; a shorter `Context` deadline takes precedence.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Reads `SOLOWAY_BASE_URL` and `SOLOWAY_TIMEOUT_SECS`, falling back to
    /// the defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup(ENV_BASE_URL) {
            Some(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        };
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidVar {
                name: ENV_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Login credentials for one platform user.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Reads `SOLOWAY_USERNAME` and `SOLOWAY_PASSWORD`; both are required.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let username = lookup(ENV_USERNAME).ok_or(ConfigError::MissingVar(ENV_USERNAME))?;
        let password = lookup(ENV_PASSWORD).ok_or(ConfigError::MissingVar(ENV_PASSWORD))?;
        Ok(Self { username, password })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
