//! Bootstrap of a [`DataAccess`] context from one TOML file.
//!
//! The file carries the access settings (`[logging]`, `[defaults]`) next to
//! an ordered `[[channels]]` list; each entry's `kind` selects the tier.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use wowdata_access::{AccessConfig, DataAccess, LookupResult};
use wowdata_channel::Tier;
use wowdata_model::Record;
use wowdata_remote::{ApiChannel, RemoteOptions};
use wowdata_storage::{FilesystemChannel, FilesystemOptions, SqliteChannel, SqliteOptions};
use wowdata_types::Value;

/// One `[[channels]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChannelConfig {
    Filesystem(FilesystemOptions),
    Sqlite(SqliteOptions),
    Remote(RemoteOptions),
}

impl ChannelConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            ChannelConfig::Filesystem(_) => "filesystem",
            ChannelConfig::Sqlite(_) => "sqlite",
            ChannelConfig::Remote(_) => "remote",
        }
    }

    /// Opens the tier described by this entry.
    pub fn open(&self) -> Result<Box<dyn Tier>> {
        let tier: Box<dyn Tier> = match self {
            ChannelConfig::Filesystem(options) => Box::new(
                FilesystemChannel::new(options.clone())
                    .with_context(|| format!("filesystem tier at {:?}", options.base_path))?,
            ),
            ChannelConfig::Sqlite(options) => Box::new(
                SqliteChannel::open(options.clone())
                    .with_context(|| format!("sqlite tier at {:?}", options.path))?,
            ),
            ChannelConfig::Remote(options) => {
                Box::new(ApiChannel::new(options.clone()).context("remote tier")?)
            }
        };
        Ok(tier)
    }
}

/// Contents of the configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CliConfig {
    #[serde(flatten)]
    pub access: AccessConfig,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

impl CliConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: CliConfig = toml::from_str(contents).context("invalid configuration")?;
        config.access.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("failed to load {}", path.display()))?;
        info!("Loaded {} channel(s) from {:?}", config.channels.len(), path);
        Ok(config)
    }

    /// Opens every tier in file order.
    pub fn tiers(&self) -> Result<Vec<Box<dyn Tier>>> {
        self.channels.iter().map(ChannelConfig::open).collect()
    }

    /// Builds the lookup context.
    pub fn access(&self) -> Result<DataAccess> {
        let tiers = self.tiers()?;
        DataAccess::new(self.access.clone(), tiers).context("failed to build the lookup context")
    }

    /// Creates the tables of every SQLite tier; returns how many were set up.
    pub fn initialize_sqlite(&self) -> Result<usize> {
        let mut count = 0;
        for channel in &self.channels {
            if let ChannelConfig::Sqlite(options) = channel {
                SqliteChannel::initialize(options.clone())
                    .with_context(|| format!("failed to initialize {:?}", options.path))?;
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Parses `key=value`. Integers stay integers, comma-separated text
/// becomes a list.
pub fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing parameter name in {raw:?}"));
    }
    let value = if let Ok(number) = value.trim().parse::<i64>() {
        Value::Int(number)
    } else if value.contains(',') {
        Value::List(value.split(',').map(|part| Value::from(part.trim())).collect())
    } else {
        Value::from(value)
    };
    Ok((key.to_string(), value))
}

/// Record data as plain JSON.
pub fn record_json(record: &Record) -> serde_json::Value {
    Value::Map(record.data().clone()).to_json()
}

/// Lookup result as plain JSON; misses become `null`.
pub fn result_json(result: &LookupResult) -> serde_json::Value {
    match result {
        LookupResult::Single(found) => found.as_ref().map_or(serde_json::Value::Null, record_json),
        LookupResult::Batch(slots) => serde_json::Value::Array(
            slots
                .iter()
                .map(|slot| slot.as_ref().map_or(serde_json::Value::Null, record_json))
                .collect(),
        ),
    }
}
