//! Configuration types

use crate::mailbox::ReceiveOrder;
use crate::poll::PollPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Blocking receive behavior
    #[serde(default)]
    pub polling: PollingConfig,
    /// Send behavior
    #[serde(default)]
    pub delivery: DeliveryConfig,
    /// Message selection
    #[serde(default)]
    pub receive: ReceiveConfig,
}

/// Polling configuration for `wait_and_recv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Sleep between checks of an empty mailbox, in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Cap for the sleep when `backoff` > 1.0 (defaults to `interval_ms`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_interval_ms: Option<u64>,
    /// Growth factor for the sleep after each empty check
    #[serde(default = "default_backoff")]
    pub backoff: f64,
    /// Give up after this many seconds (unset = wait forever)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_interval_ms: None,
            backoff: default_backoff(),
            timeout_secs: None,
        }
    }
}

impl PollingConfig {
    /// Build the runtime polling policy
    pub fn policy(&self) -> PollPolicy {
        let interval = Duration::from_millis(self.interval_ms);
        let max_interval = Duration::from_millis(self.max_interval_ms.unwrap_or(self.interval_ms));
        let policy = PollPolicy::fixed(interval).with_backoff(self.backoff, max_interval);
        match self.timeout_secs {
            Some(secs) => policy.with_timeout(Duration::from_secs(secs)),
            None => policy,
        }
    }
}

/// Delivery configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// fsync the staged file before the rename and the mailbox after it
    #[serde(default)]
    pub sync: bool,
}

/// Receive configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiveConfig {
    /// Which visible message to take first
    #[serde(default)]
    pub order: ReceiveOrder,
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_backoff() -> f64 {
    1.0
}
