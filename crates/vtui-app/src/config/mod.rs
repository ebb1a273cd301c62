//! Configuration file parsing for vault-tui
//!
//! Supports `<config dir>/vault-tui/config.toml` (or an explicit path).

pub mod settings;
pub mod types;

pub use settings::{default_config_path, load_settings, validate_settings};
pub use types::*;
