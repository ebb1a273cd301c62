//! Settings file loading and validation

use std::path::{Path, PathBuf};

use vtui_core::prelude::*;

use super::types::Settings;

const APP_DIR: &str = "vault-tui";
const CONFIG_FILENAME: &str = "config.toml";

/// Default settings location: `<config dir>/vault-tui/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILENAME))
}

/// Load settings from `path`, or from the default location.
///
/// A missing or unreadable file yields defaults; problems are logged, never
/// returned.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => {
                debug!("No config directory on this platform, using defaults");
                return Settings::default();
            }
        },
    };

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str::<Settings>(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Reject settings the engine cannot run with
pub fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.discovery.max_requests == 0 {
        return Err(Error::config_invalid(
            "discovery.max_requests must be at least 1",
        ));
    }
    if settings.debounce.default_delay_ms == 0 {
        return Err(Error::config_invalid(
            "debounce.default_delay_ms must be positive",
        ));
    }
    if settings.debounce.janitor_interval_secs == 0 {
        return Err(Error::config_invalid(
            "debounce.janitor_interval_secs must be positive",
        ));
    }
    if settings.debounce.retention_secs < settings.debounce.janitor_interval_secs {
        return Err(Error::config_invalid(
            "debounce.retention_secs must not be shorter than the janitor interval",
        ));
    }
    if settings.ui.refresh_interval_secs > 0
        && settings.ui.refresh_interval_secs >= settings.debounce.retention_secs
    {
        return Err(Error::config_invalid(
            "ui.refresh_interval_secs must be shorter than debounce.retention_secs",
        ));
    }
    if settings.backend.timeout_secs == 0 {
        return Err(Error::config_invalid("backend.timeout_secs must be positive"));
    }
    Ok(())
}
