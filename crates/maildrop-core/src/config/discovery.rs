//! Configuration discovery and resolution

use super::types::Config;
use crate::mailbox::ReceiveOrder;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Repo-local configuration file name
pub const CONFIG_FILE_NAME: &str = ".maildrop.toml";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("TOML parsing error in {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A value parsed but is out of range
    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Command-line overrides for configuration
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    /// Override polling interval (milliseconds)
    pub interval_ms: Option<u64>,
    /// Override wait deadline (seconds)
    pub timeout_secs: Option<u64>,
    /// Override receive order
    pub order: Option<ReceiveOrder>,
    /// Override fsync on delivery
    pub sync: Option<bool>,
    /// Path to config file override (errors are not swallowed)
    pub config_path: Option<PathBuf>,
}

/// Resolve configuration from all sources
///
/// Priority (highest to lowest):
/// 1. Command-line overrides
/// 2. Environment variables
/// 3. Explicit config path, or `.maildrop.toml` in `current_dir` or an ancestor
/// 4. Defaults
pub fn resolve_config(overrides: &ConfigOverrides, current_dir: &Path) -> Result<Config, ConfigError> {
    let mut config = Config::default();

    // 3. Config file
    if let Some(ref path) = overrides.config_path {
        config = load_config_file(path)?;
    } else if let Some(repo_config) = find_repo_local_config(current_dir) {
        match load_config_file(&repo_config) {
            Ok(file_config) => config = file_config,
            Err(e) => warn!("Ignoring config at {repo_config:?}: {e}"),
        }
    }

    // 2. Apply environment variables
    apply_env_overrides(&mut config);

    // 1. Apply command-line overrides
    apply_cli_overrides(&mut config, overrides);

    Ok(config)
}

/// Find repo-local config file
///
/// Searches current directory and parent directories up to git root
fn find_repo_local_config(current_dir: &Path) -> Option<PathBuf> {
    let mut dir = current_dir;

    loop {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            return Some(config_path);
        }

        // Stop at git root
        if dir.join(".git").exists() {
            break;
        }

        dir = dir.parent()?;
    }

    None
}

/// Load and validate config from a TOML file
fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: Config = toml::from_str(&contents).map_err(|e| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.polling.interval_ms == 0 {
        return Err(ConfigError::Invalid {
            key: "polling.interval_ms",
            message: "0 (must be at least 1)".to_string(),
        });
    }
    let backoff = config.polling.backoff;
    if !backoff.is_finite() || backoff < 1.0 {
        return Err(ConfigError::Invalid {
            key: "polling.backoff",
            message: format!("{backoff} (must be a finite number >= 1.0)"),
        });
    }
    if let Some(max) = config.polling.max_interval_ms {
        if max < config.polling.interval_ms {
            return Err(ConfigError::Invalid {
                key: "polling.max_interval_ms",
                message: format!("{max} is below interval_ms {}", config.polling.interval_ms),
            });
        }
    }
    Ok(())
}

/// Apply environment variable overrides
///
/// Unparsable values are warned about and ignored.
fn apply_env_overrides(config: &mut Config) {
    if let Some(ms) = env_parse::<u64>("MAILDROP_POLL_INTERVAL_MS") {
        if ms > 0 {
            config.polling.interval_ms = ms;
        } else {
            warn!("Ignoring MAILDROP_POLL_INTERVAL_MS=0: must be at least 1");
        }
    }

    if let Some(ms) = env_parse::<u64>("MAILDROP_POLL_MAX_INTERVAL_MS") {
        config.polling.max_interval_ms = Some(ms);
    }

    if let Some(factor) = env_parse::<f64>("MAILDROP_POLL_BACKOFF") {
        if factor.is_finite() && factor >= 1.0 {
            config.polling.backoff = factor;
        } else {
            warn!("Ignoring MAILDROP_POLL_BACKOFF={factor}: must be >= 1.0");
        }
    }

    if let Some(secs) = env_parse::<u64>("MAILDROP_TIMEOUT_SECS") {
        config.polling.timeout_secs = Some(secs);
    }

    if let Some(order) = env_parse::<ReceiveOrder>("MAILDROP_ORDER") {
        config.receive.order = order;
    }

    if let Some(sync) = env_parse::<bool>("MAILDROP_SYNC") {
        config.delivery.sync = sync;
    }
}

fn env_parse<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {key}={raw:?}: {e}");
            None
        }
    }
}

/// Apply command-line overrides
fn apply_cli_overrides(config: &mut Config, overrides: &ConfigOverrides) {
    if let Some(ms) = overrides.interval_ms.filter(|&ms| {
        if ms == 0 {
            warn!("Ignoring interval override of 0 ms: must be at least 1");
        }
        ms > 0
    }) {
        config.polling.interval_ms = ms;
        // Keep the backoff cap at or above the interval
        if config.polling.max_interval_ms.is_some_and(|max| max < ms) {
            config.polling.max_interval_ms = Some(ms);
        }
    }

    if let Some(secs) = overrides.timeout_secs {
        config.polling.timeout_secs = Some(secs);
    }

    if let Some(order) = overrides.order {
        config.receive.order = order;
    }

    if let Some(sync) = overrides.sync {
        config.delivery.sync = sync;
    }
}
