//! Configuration types for vault-tui
//!
//! Defines `Settings` and its sections, as read from `config.toml`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::discovery::DiscoveryOptions;

/// Application settings (`<config dir>/vault-tui/config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub discovery: DiscoverySettings,

    #[serde(default)]
    pub ui: UiSettings,

    #[serde(default)]
    pub debounce: DebounceSettings,

    #[serde(default)]
    pub backend: BackendSettings,
}

/// Recursive discovery settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DiscoverySettings {
    /// Listing requests allowed per discovery run, across all mounts
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,

    /// Resolve capabilities for every discovered path
    #[serde(default = "default_true")]
    pub annotate_capabilities: bool,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            annotate_capabilities: true,
        }
    }
}

impl DiscoverySettings {
    pub fn options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            max_requests: self.max_requests,
            annotate_capabilities: self.annotate_capabilities,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UiSettings {
    /// Automatic refresh period of the browser; 0 disables it
    #[serde(default)]
    pub refresh_interval_secs: u64,

    #[serde(default = "default_filter_debounce_ms")]
    pub filter_debounce_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 0,
            filter_debounce_ms: default_filter_debounce_ms(),
        }
    }
}

impl UiSettings {
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }

    pub fn filter_debounce(&self) -> Duration {
        Duration::from_millis(self.filter_debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DebounceSettings {
    /// Delay used when a caller passes zero
    #[serde(default = "default_delay_ms")]
    pub default_delay_ms: u64,

    #[serde(default = "default_janitor_interval_secs")]
    pub janitor_interval_secs: u64,

    /// Entries older than this are pruned whether or not they fired
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
}

impl Default for DebounceSettings {
    fn default() -> Self {
        Self {
            default_delay_ms: default_delay_ms(),
            janitor_interval_secs: default_janitor_interval_secs(),
            retention_secs: default_retention_secs(),
        }
    }
}

impl DebounceSettings {
    pub fn default_delay(&self) -> Duration {
        Duration::from_millis(self.default_delay_ms)
    }

    pub fn janitor_interval(&self) -> Duration {
        Duration::from_secs(self.janitor_interval_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendSettings {
    /// Per-call timeout applied by the backend client
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_max_requests() -> usize {
    100
}

fn default_filter_debounce_ms() -> u64 {
    150
}

fn default_delay_ms() -> u64 {
    200
}

fn default_janitor_interval_secs() -> u64 {
    30
}

fn default_retention_secs() -> u64 {
    300
}

fn default_timeout_secs() -> u64 {
    10
}
