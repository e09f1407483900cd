//! cli
//!
//! Command-line interface layer for strata.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Resolve the repository and open the graph store
//! - Delegate to command handlers
//! - Map failures to exit codes
//!
//! # Exit Codes
//!
//! - `0`: success
//! - `1`: no result (no merge base, not an ancestor) or a failed operation
//! - `2`: usage, identifier or repository-location error

pub mod args;
pub mod commands;

pub use args::{Cli, Command, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use thiserror::Error;

use crate::core::config::Config;
use crate::core::ops::LockError;
use crate::core::paths::RepoPaths;
use crate::core::types::TypeError;
use crate::graph::{BackendKind, GraphError, GraphOptions, GraphStore};
use crate::ui::output::Verbosity;

/// A command was invoked in a way it refuses to run.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct UsageError(pub String);

/// How a command that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command produced its result
    Done,
    /// The query had no answer (exit status 1)
    NoResult,
}

/// Execution context shared by all command handlers.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug output enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Backend override from `--backend`.
    pub backend: Option<BackendKind>,
}

impl Context {
    /// Output verbosity for this invocation.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }

    /// The directory the command runs in.
    pub fn cwd(&self) -> Result<PathBuf> {
        match &self.cwd {
            Some(cwd) => Ok(cwd.clone()),
            None => std::env::current_dir().context("Failed to read the current directory"),
        }
    }

    /// The repository containing the working directory.
    pub fn repo(&self) -> Result<RepoPaths> {
        let cwd = self.cwd()?;
        RepoPaths::discover(&cwd)
            .ok_or(GraphError::NotARepository { path: cwd })
            .context("Run 'strata init' to create a repository")
    }

    /// Effective graph options: configuration, then `--backend`.
    pub fn graph_options(&self, config: &Config) -> GraphOptions {
        let mut options = config.graph_options();
        if let Some(backend) = self.backend {
            options.backend = backend;
        }
        options
    }

    /// Open the graph store of the current repository.
    pub fn open_store(&self) -> Result<GraphStore> {
        let paths = self.repo()?;
        let config = Config::load(Some(&paths)).context("Failed to load configuration")?;
        let options = self.graph_options(&config);
        let mut store = GraphStore::new(paths, options);
        store.open().context("Failed to open the commit graph")?;
        Ok(store)
    }
}

/// Run the CLI application with already parsed arguments.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<Outcome> {
    let ctx = Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
        backend: cli.backend,
    };
    commands::dispatch(cli.command, &ctx)
}

/// Exit status for a failed command.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if cause.is::<UsageError>() || cause.is::<TypeError>() {
            return 2;
        }
        if let Some(GraphError::NotARepository { .. } | GraphError::Malformed(_)) =
            cause.downcast_ref::<GraphError>()
        {
            return 2;
        }
        if let Some(LockError::NotARepository(_)) = cause.downcast_ref::<LockError>() {
            return 2;
        }
    }
    1
}
