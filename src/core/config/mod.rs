//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! strata has two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Repository-level overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$STRATA_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/strata/config.toml`
//! 3. `~/.strata/config.toml`
//!
//! # Repo Config Location
//!
//! `<repo>/.strata/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use strata::core::config::Config;
//! use strata::core::paths::RepoPaths;
//! use std::path::PathBuf;
//!
//! let paths = RepoPaths::new(PathBuf::from("/data/roads"));
//! let config = Config::load(Some(&paths)).unwrap();
//! println!("backend: {}", config.backend());
//! ```

pub mod schema;

pub use schema::{ConfigFile, GraphSection, SqliteSection};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::paths::RepoPaths;
use crate::graph::{BackendKind, GraphOptions, Synchronous};

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence automatically: repo overrides global,
/// global overrides the built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: ConfigFile,
    /// Repository configuration (if in a repo and present)
    pub repo: Option<ConfigFile>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Default busy timeout for SQLite connections.
    pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

    /// Load configuration from default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or hold
    /// invalid values. Missing config files are not an error.
    pub fn load(repo: Option<&RepoPaths>) -> Result<Config, ConfigError> {
        Self::load_with_global(Self::find_global().as_deref(), repo)
    }

    /// Load configuration with an explicit global config file.
    ///
    /// `global` may name a file that does not exist, in which case defaults
    /// are used for the global scope.
    pub fn load_with_global(
        global: Option<&Path>,
        repo: Option<&RepoPaths>,
    ) -> Result<Config, ConfigError> {
        let (global_file, global_path) = match global {
            Some(path) if path.exists() => (Self::read_file(path)?, Some(path.to_path_buf())),
            _ => (ConfigFile::default(), None),
        };

        let (repo_file, repo_path) = match repo.map(RepoPaths::config_path) {
            Some(path) if path.exists() => (Some(Self::read_file(&path)?), Some(path)),
            _ => (None, None),
        };

        global_file.validate()?;
        if let Some(ref r) = repo_file {
            r.validate()?;
        }

        Ok(Config {
            global: global_file,
            repo: repo_file,
            global_path,
            repo_path,
        })
    }

    /// Locate the global config file, if any.
    fn find_global() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("STRATA_CONFIG") {
            return Some(PathBuf::from(path));
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("strata/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir().map(|home| home.join(".strata/config.toml"))
    }

    /// Read and parse a config file.
    fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write repo config atomically.
    ///
    /// Creates parent directories if needed. Writes to a temp file, then renames.
    pub fn write_repo(paths: &RepoPaths, config: &ConfigFile) -> Result<PathBuf, ConfigError> {
        let path = paths.config_path();
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    fn write_config_atomic(path: &Path, config: &ConfigFile) -> Result<(), ConfigError> {
        let write_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| ConfigError::WriteError { path, source }
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err(path))?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(write_err(&temp_path))?;
        file.write_all(contents.as_bytes())
            .map_err(write_err(&temp_path))?;
        file.sync_all().map_err(write_err(&temp_path))?;

        fs::rename(&temp_path, path).map_err(write_err(path))?;
        Ok(())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    fn pick<T>(&self, get: impl Fn(&ConfigFile) -> Option<T>) -> Option<T> {
        self.repo.as_ref().and_then(&get).or_else(|| get(&self.global))
    }

    /// The configured graph backend.
    ///
    /// Defaults to SQLite. Values were validated at load time.
    pub fn backend(&self) -> BackendKind {
        self.pick(|f| f.graph.as_ref()?.backend.as_deref()?.parse().ok())
            .unwrap_or_default()
    }

    /// The configured SQLite `synchronous` mode.
    ///
    /// Defaults to `normal`.
    pub fn synchronous(&self) -> Synchronous {
        self.pick(|f| f.sqlite.as_ref()?.synchronous.as_deref()?.parse().ok())
            .unwrap_or_default()
    }

    /// The configured SQLite busy timeout.
    pub fn busy_timeout(&self) -> Duration {
        let ms = self
            .pick(|f| f.sqlite.as_ref()?.busy_timeout_ms)
            .unwrap_or(Self::DEFAULT_BUSY_TIMEOUT_MS);
        Duration::from_millis(ms)
    }

    /// Graph store options derived from this configuration.
    pub fn graph_options(&self) -> GraphOptions {
        GraphOptions {
            backend: self.backend(),
            synchronous: self.synchronous(),
            busy_timeout: self.busy_timeout(),
        }
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}
