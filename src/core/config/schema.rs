//! core::config::schema
//!
//! Configuration schema types.
//!
//! The same file shape is used at both scopes; the repo file overrides the
//! global one key by key.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they name a known
//! backend and a known SQLite synchronous mode.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::graph::{BackendKind, Synchronous};

/// One configuration file (global or repository scope).
///
/// # Example
///
/// ```toml
/// [graph]
/// backend = "sqlite"
///
/// [sqlite]
/// synchronous = "normal"
/// busy_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Graph store settings
    pub graph: Option<GraphSection>,

    /// SQLite backend settings
    pub sqlite: Option<SqliteSection>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(graph) = &self.graph {
            graph.validate()?;
        }
        if let Some(sqlite) = &self.sqlite {
            sqlite.validate()?;
        }
        Ok(())
    }
}

/// `[graph]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GraphSection {
    /// Backend to use ("sqlite" or "memory")
    pub backend: Option<String>,
}

impl GraphSection {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(backend) = &self.backend {
            backend
                .parse::<BackendKind>()
                .map_err(|_| invalid_choice("graph.backend", backend, BackendKind::NAMES))?;
        }
        Ok(())
    }
}

/// `[sqlite]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SqliteSection {
    /// `PRAGMA synchronous` mode ("off", "normal" or "full")
    pub synchronous: Option<String>,

    /// How long a connection waits on a locked database, in milliseconds
    pub busy_timeout_ms: Option<u64>,
}

impl SqliteSection {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(mode) = &self.synchronous {
            mode.parse::<Synchronous>()
                .map_err(|_| invalid_choice("sqlite.synchronous", mode, Synchronous::NAMES))?;
        }
        Ok(())
    }
}

fn invalid_choice(key: &str, value: &str, valid: &[&str]) -> ConfigError {
    ConfigError::InvalidValue(format!(
        "invalid {} '{}', must be one of: {}",
        key,
        value,
        valid.join(", ")
    ))
}
