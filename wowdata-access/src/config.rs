//! Access configuration, read from the `[logging]` and `[defaults]` tables
//! of a TOML file.

use crate::error::{AccessError, AccessResult};
use crate::params::{LOCALES, REGIONS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Access log settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Emit each entry through `tracing` at once instead of buffering it.
    #[serde(default = "default_direct")]
    pub direct: bool,
}

fn default_direct() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            direct: default_direct(),
        }
    }
}

/// Parameter values used when a lookup does not supply them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_realm")]
    pub realm: String,
}

fn default_locale() -> String {
    "de_DE".to_string()
}

fn default_region() -> String {
    "eu".to_string()
}

fn default_realm() -> String {
    "Gilneas".to_string()
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            region: default_region(),
            realm: default_realm(),
        }
    }
}

/// Configuration of a [`crate::DataAccess`] context.
///
/// Unknown tables (such as `[[channels]]`) are ignored so the same file can
/// also describe the tiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub defaults: Defaults,
}

impl AccessConfig {
    pub fn from_toml_str(contents: &str) -> AccessResult<Self> {
        let config: AccessConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> AccessResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded access config from {:?}", path);
        Ok(config)
    }

    /// Rejects default locales and regions outside the known sets.
    pub fn validate(&self) -> AccessResult<()> {
        if !LOCALES.contains(&self.defaults.locale.as_str()) {
            return Err(AccessError::InvalidConfig(format!(
                "unknown default locale \"{}\"",
                self.defaults.locale
            )));
        }
        if !REGIONS.contains(&self.defaults.region.as_str()) {
            return Err(AccessError::InvalidConfig(format!(
                "unknown default region \"{}\"",
                self.defaults.region
            )));
        }
        Ok(())
    }
}
