//! Configuration resolution
//!
//! Resolves configuration from multiple sources with priority:
//! 1. Command-line flags (passed as parameters)
//! 2. Environment variables (`MAILDROP_*`)
//! 3. Repo-local config (.maildrop.toml in the current dir or an ancestor)
//! 4. Defaults

mod discovery;
mod types;

pub use discovery::{resolve_config, ConfigError, ConfigOverrides, CONFIG_FILE_NAME};
pub use types::{Config, DeliveryConfig, PollingConfig, ReceiveConfig};
