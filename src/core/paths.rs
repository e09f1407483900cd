//! core::paths
//!
//! Centralized path routing for strata storage locations.
//!
//! # Storage Layout
//!
//! A repository is any directory containing a `.strata/` marker directory:
//! - `.strata/config.toml` - Repository configuration
//! - `.strata/lock` - Exclusive lock file for mutating commands
//! - `.strata/graph/` - Commit graph storage
//! - `.strata/graph/graph.db` - SQLite graph database
//!
//! No code outside this module should compute `*.join(".strata")` paths.
//!
//! # Example
//!
//! ```
//! use strata::core::paths::RepoPaths;
//! use std::path::PathBuf;
//!
//! let paths = RepoPaths::new(PathBuf::from("/data/roads"));
//! assert_eq!(
//!     paths.graph_db_path(),
//!     PathBuf::from("/data/roads/.strata/graph/graph.db")
//! );
//! ```

use std::path::{Path, PathBuf};

/// Name of the repository marker directory.
pub const MARKER_DIR: &str = ".strata";

/// Path routing for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
    /// The repository root (the directory holding `.strata/`).
    pub root: PathBuf,
}

impl RepoPaths {
    /// Create paths for a repository rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Find the repository containing `start`, searching upward.
    ///
    /// Returns `None` if no ancestor of `start` (including itself) holds a
    /// `.strata/` directory.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use strata::core::paths::RepoPaths;
    /// use std::path::Path;
    ///
    /// if let Some(paths) = RepoPaths::discover(Path::new(".")) {
    ///     println!("repository at {}", paths.root.display());
    /// }
    /// ```
    pub fn discover(start: &Path) -> Option<Self> {
        let start = start.canonicalize().ok()?;
        start
            .ancestors()
            .find(|dir| dir.join(MARKER_DIR).is_dir())
            .map(|dir| Self::new(dir.to_path_buf()))
    }

    /// Whether the marker directory exists.
    pub fn is_repository(&self) -> bool {
        self.marker_dir().is_dir()
    }

    /// The `.strata/` marker directory.
    pub fn marker_dir(&self) -> PathBuf {
        self.root.join(MARKER_DIR)
    }

    /// Repository configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.marker_dir().join("config.toml")
    }

    /// Lock file held by mutating commands.
    pub fn lock_path(&self) -> PathBuf {
        self.marker_dir().join("lock")
    }

    /// Directory reserved for the commit graph.
    pub fn graph_dir(&self) -> PathBuf {
        self.marker_dir().join("graph")
    }

    /// SQLite database file for the commit graph.
    pub fn graph_db_path(&self) -> PathBuf {
        self.graph_dir().join("graph.db")
    }
}
