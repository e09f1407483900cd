//! graph
//!
//! The commit-ancestry graph: storage, sharing and ancestry queries.
//!
//! # Architecture
//!
//! ```text
//!   Ancestry engine / AncestorWalk / GraphNode      (pure queries)
//!                    |
//!               GraphStore                          (one logical handle)
//!                    |
//!             BackendRegistry                       (one backend per location)
//!                    |
//!     dyn GraphBackend: MemoryBackend | SqliteBackend
//! ```
//!
//! Every store operation runs inside a backend transaction scope
//! ([`ReadTxn`] / [`WriteTxn`]). A write scope that is dropped without
//! `commit` rolls back, so a failed operation leaves the graph as it was.
//!
//! # Data Model
//!
//! - Commit nodes keyed by [`ObjectId`]
//! - PARENT edges from child to parent, in insertion order
//! - A TOROOT edge for commits recorded without parents
//! - At most one MAPPED_TO edge per commit (sparse histories)
//! - String properties per node (the `sparse` flag)
//!
//! # Example
//!
//! ```no_run
//! use strata::core::paths::RepoPaths;
//! use strata::core::types::ObjectId;
//! use strata::graph::{GraphOptions, GraphStore};
//! use std::path::PathBuf;
//!
//! let mut store = GraphStore::new(RepoPaths::new(PathBuf::from("/data/roads")), GraphOptions::default());
//! store.open()?;
//!
//! let root = ObjectId::from_bytes(&[1; 20])?;
//! let tip = ObjectId::from_bytes(&[2; 20])?;
//! store.put(&root, &[])?;
//! store.put(&tip, &[root])?;
//!
//! assert_eq!(store.ancestry().find_common_ancestor(&root, &tip)?, Some(root));
//! store.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod ancestry;
mod backend;
mod memory;
mod node;
mod registry;
mod sqlite;
mod store;
mod verify;
mod walk;

pub use ancestry::Ancestry;
pub use backend::{GraphBackend, ReadTxn, WriteTxn};
pub use memory::MemoryBackend;
pub use node::{Direction, GraphEdge, GraphNode};
pub use registry::BackendRegistry;
pub use sqlite::SqliteBackend;
pub use store::{GraphStore, SPARSE_FLAG};
pub use verify::{GraphStats, VerifyReport};
pub use walk::AncestorWalk;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::core::types::{ObjectId, TypeError};

/// Errors from the graph store and the ancestry engine.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The location handed to `open` is not a strata repository.
    #[error("not a strata repository: {path}")]
    NotARepository {
        /// The location that was checked
        path: PathBuf,
    },

    /// The store handle (or its backend) has been closed.
    #[error("graph store is closed")]
    StoreClosed,

    /// An ancestry query named a commit the graph has never seen.
    #[error("unknown commit: {id}")]
    UnknownCommit {
        /// The missing commit
        id: ObjectId,
    },

    /// A commit was found to be its own ancestor.
    #[error("commit graph is inconsistent: cycle through {id}")]
    Cycle {
        /// A commit on the cycle
        id: ObjectId,
    },

    /// An identifier failed to decode.
    #[error(transparent)]
    Malformed(#[from] TypeError),

    /// A stored record could not be interpreted.
    #[error("corrupt graph record: {0}")]
    Corrupt(String),

    /// The SQLite backend failed.
    #[error("graph database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem failure while preparing the graph directory.
    #[error("graph storage error at '{path}': {source}")]
    Io {
        /// The path being accessed
        path: PathBuf,
        /// The underlying error
        source: std::io::Error,
    },
}

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Which physical engine stores the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// SQLite database under `.strata/graph/graph.db`
    #[default]
    Sqlite,
    /// Process-local graph, discarded when the last handle closes
    Memory,
}

impl BackendKind {
    /// Accepted names, for messages.
    pub const NAMES: &'static [&'static str] = &["sqlite", "memory"];

    /// The configuration name of this backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::Memory => "memory",
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sqlite" => Ok(BackendKind::Sqlite),
            "memory" => Ok(BackendKind::Memory),
            other => Err(format!("unknown graph backend '{other}'")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQLite `PRAGMA synchronous` level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Synchronous {
    /// No fsync
    Off,
    /// fsync at critical moments (safe with WAL)
    #[default]
    Normal,
    /// fsync on every commit
    Full,
}

impl Synchronous {
    /// Accepted names, for messages.
    pub const NAMES: &'static [&'static str] = &["off", "normal", "full"];

    /// Pragma value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Synchronous::Off => "off",
            Synchronous::Normal => "normal",
            Synchronous::Full => "full",
        }
    }
}

impl FromStr for Synchronous {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "off" => Ok(Synchronous::Off),
            "normal" => Ok(Synchronous::Normal),
            "full" => Ok(Synchronous::Full),
            other => Err(format!("unknown synchronous mode '{other}'")),
        }
    }
}

/// Options used when a store opens its backend.
///
/// Only the first handle to open a location constructs the backend, so
/// later handles share whatever options the first one used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphOptions {
    /// Backend engine
    pub backend: BackendKind,
    /// SQLite durability level
    pub synchronous: Synchronous,
    /// SQLite lock wait
    pub busy_timeout: Duration,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            backend: BackendKind::Sqlite,
            synchronous: Synchronous::Normal,
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

impl GraphOptions {
    /// Default options with the in-memory backend.
    pub fn memory() -> Self {
        Self {
            backend: BackendKind::Memory,
            ..Self::default()
        }
    }
}
