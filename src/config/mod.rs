// ABOUTME: Configuration types and parsing for ~/.rokka/config.yml.
// ABOUTME: Handles YAML parsing, file discovery, and env/flag overrides.

mod login;

pub use login::write_login;

use crate::client::{ClientConfig, DEFAULT_API_ADDRESS, DEFAULT_API_VERSION, DEFAULT_TIMEOUT};
use crate::error::{Error, Result};
use crate::transport::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_DIR: &str = ".rokka";
pub const CONFIG_FILENAME: &str = "config.yml";
pub const API_KEY_ENV: &str = "ROKKA_API_KEY";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_api_address")]
    pub api_address: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default)]
    pub retry: RetryConfig,

    /// Timeout of a single HTTP request.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_address", &self.api_address)
            .field("api_version", &self.api_version)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_max_delay", with = "humantime_serde")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            max_delay: default_max_delay(),
        }
    }
}

fn default_api_address() -> String {
    DEFAULT_API_ADDRESS.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_max_retries() -> u32 {
    10
}

fn default_max_delay() -> Duration {
    Duration::from_secs(10)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_address: default_api_address(),
            api_version: default_api_version(),
            retry: RetryConfig::default(),
            timeout: default_timeout(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file is a valid, all-defaults config.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!("loaded configuration from {}", path.display());
        Self::from_yaml(&content)
    }

    /// `$HOME/.rokka/config.yml`, when a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .filter(|home| !home.is_empty())
            .map(|home| PathBuf::from(home).join(CONFIG_DIR).join(CONFIG_FILENAME))
    }

    /// Load the config from an explicit path, or from the default location.
    ///
    /// An explicit path must exist. A missing default file yields the
    /// defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::ConfigNotFound(path.to_path_buf()));
            }
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Apply `ROKKA_API_KEY` when set and non-empty.
    pub fn with_env_overrides(mut self) -> Self {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.is_empty() => self.api_key = Some(key),
            _ => {}
        }
        self
    }

    /// Apply command-line overrides. They take precedence over everything else.
    pub fn with_overrides(mut self, api_key: Option<String>, api_address: Option<String>) -> Self {
        if let Some(key) = api_key {
            self.api_key = Some(key);
        }
        if let Some(address) = api_address {
            self.api_address = address;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.api_address.starts_with("https://") || self.api_address.starts_with("http://"))
        {
            return Err(Error::InvalidConfig(format!(
                "api_address must be an http(s) URL, got '{}'",
                self.api_address
            )));
        }
        if self.api_version.is_empty() {
            return Err(Error::InvalidConfig("api_version cannot be empty".into()));
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_address: self.api_address.clone(),
            api_version: self.api_version.clone(),
            api_key: self.api_key.clone(),
            retry: RetryPolicy::new(self.retry.max_retries, self.retry.max_delay),
            timeout: self.timeout,
        }
    }
}
