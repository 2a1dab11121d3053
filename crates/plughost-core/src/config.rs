//! Discovery configuration and shared defaults.
//!
//! The configuration surface is one boolean, `verbose-logging`, read once
//! before a discovery pass. It only changes diagnostic detail.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

/// Default directory scanned for bundles, relative to the host's data dir.
pub const DEFAULT_EXTENSION_DIR: &str = "extensions";
/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "plughost.toml";
/// File extension recognized as a module bundle.
pub const BUNDLE_EXTENSION: &str = "bundle";

/// Environment variable names
pub mod env_vars {
    /// Overrides `verbose-logging` (`true`/`false`/`1`/`0`).
    pub const VERBOSE_LOGGING: &str = "PLUGHOST_VERBOSE_LOGGING";
    /// Selects JSON log output in the CLI.
    pub const LOG_JSON: &str = "PLUGHOST_LOG_JSON";
}

/// Discovery configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DiscoveryConfig {
    /// Promote per-descriptor diagnostics to `info`.
    pub verbose_logging: bool,
}

impl DiscoveryConfig {
    /// Parse TOML configuration.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load the configuration file, writing the defaults first if it is absent.
    pub fn load_or_init(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            std::fs::write(path, config.to_toml()?).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            info!(path = %path.display(), "Wrote default discovery configuration");
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Apply environment overrides.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Some(verbose) = std::env::var(env_vars::VERBOSE_LOGGING)
            .ok()
            .and_then(|v| parse_flag(&v))
        {
            self.verbose_logging = verbose;
        }
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
