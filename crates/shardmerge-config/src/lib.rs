//! Configuration for the shardmerge engine.
//!
//! Loaded from TOML, validated once, then handed to the engine by value.
//! Dialect names stay as text here; the engine owns their interpretation.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error as ThisError;


///
/// CONSTANTS
///

/// Default upper bound on distinct groups held by one in-memory group merge.
pub const DEFAULT_MAX_MEMORY_GROUPS: u64 = 1_000_000;

/// Default session protocol dialect.
pub const DEFAULT_PROTOCOL: &str = "MySQL";

/// Default logical database name used for default-schema resolution.
pub const DEFAULT_DATABASE: &str = "logic_db";

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

///
/// MergeConfig
///
/// Root configuration document.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    pub merge: MergeSection,
    pub dialect: DialectSection,
}

impl MergeConfig {
    /// Parse and validate one TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse and validate one TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    /// Reject values the engine cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.merge.max_memory_groups == 0 {
            return Err(ConfigError::invalid(
                "merge.max_memory_groups",
                "must be greater than zero",
            ));
        }
        if self.dialect.protocol.trim().is_empty() {
            return Err(ConfigError::invalid("dialect.protocol", "must not be empty"));
        }
        if self.dialect.database.trim().is_empty() {
            return Err(ConfigError::invalid("dialect.database", "must not be empty"));
        }

        Ok(())
    }
}

///
/// MergeSection
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeSection {
    /// Hard cap on distinct groups materialized by the in-memory group merge.
    pub max_memory_groups: u64,

    /// Text comparison mode used when the schema catalog has no answer.
    pub text_case_sensitive: bool,

    /// Check every shard's key sequence for monotonicity during stream merges.
    pub verify_shard_order: bool,
}

impl Default for MergeSection {
    fn default() -> Self {
        Self {
            max_memory_groups: DEFAULT_MAX_MEMORY_GROUPS,
            text_case_sensitive: true,
            verify_shard_order: false,
        }
    }
}

///
/// DialectSection
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DialectSection {
    /// Session protocol dialect name, e.g. `MySQL`, `PostgreSQL`, `Oracle`.
    pub protocol: String,

    /// Logical database name; the default schema for most dialects.
    pub database: String,
}

impl Default for DialectSection {
    fn default() -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL.to_string(),
            database: DEFAULT_DATABASE.to_string(),
        }
    }
}
