use std::{env, fs, path::Path};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Top-level configuration for Postman.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub aws: AwsConfig,

    #[serde(default)]
    pub send: SendConfig,
}

/// Connection settings for the Amazon SES endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AwsConfig {
    #[serde(default = "default_region")]
    pub region: String,

    pub access_key_id: Option<String>,

    pub secret_access_key: Option<String>,

    pub session_token: Option<String>,

    /// Custom endpoint URL override (for LocalStack and similar).
    pub endpoint: Option<String>,

    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            endpoint: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Retry policy for throttled or failed service calls.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Defaults for the `send` command.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendConfig {
    /// Sender address used when `-f` is not given.
    pub from: Option<String>,

    /// Always sanitize headers, as if `--sanitize` was passed.
    #[serde(default)]
    pub sanitize: bool,
}

impl Config {
    /// Overrides file settings with the standard AWS environment variables.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| env::var(key).ok());
    }

    /// Same as [`apply_env`](Self::apply_env) reading variables through `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());
        if let Some(region) = var("AWS_REGION").or_else(|| var("AWS_DEFAULT_REGION")) {
            self.aws.region = region;
        }
        if let Some(key_id) = var("AWS_ACCESS_KEY_ID") {
            self.aws.access_key_id = Some(key_id);
        }
        if let Some(secret) = var("AWS_SECRET_ACCESS_KEY") {
            self.aws.secret_access_key = Some(secret);
        }
        if let Some(token) = var("AWS_SESSION_TOKEN") {
            self.aws.session_token = Some(token);
        }
    }
}

/// Loads configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Loads the configuration file when one is given, falling back to the
/// defaults otherwise, and applies the environment on top.
pub fn resolve_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => {
            debug!(path = %path.display(), "Loading configuration file");
            load_config(path)?
        }
        None => Config::default(),
    };
    config.apply_env();
    Ok(config)
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An I/O error occurred reading the file.
    #[error("Config I/O error ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// A parse error occurred deserializing TOML.
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    5000
}
