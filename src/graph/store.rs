//! graph::store
//!
//! `GraphStore`: one logical handle onto a repository's commit graph.
//!
//! # Lifecycle
//!
//! A handle starts closed. [`GraphStore::open`] resolves the repository's
//! graph location, takes a reference on the shared backend from the
//! [`BackendRegistry`] and makes sure the root anchor exists.
//! [`GraphStore::close`] gives the reference back; the backend is torn down
//! when the last handle for the location closes. Both are idempotent, and a
//! handle closes itself on drop.
//!
//! # Transactions
//!
//! Each operation runs in exactly one backend scope. Mutations commit on
//! success and roll back on any error before it is returned.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::ancestry::Ancestry;
use super::backend::{GraphBackend, ReadTxn, WriteTxn};
use super::memory::MemoryBackend;
use super::node::GraphNode;
use super::registry::BackendRegistry;
use super::sqlite::SqliteBackend;
use super::verify::{self, GraphStats, VerifyReport};
use super::walk::AncestorWalk;
use super::{BackendKind, GraphError, GraphOptions, Result};
use crate::core::paths::RepoPaths;
use crate::core::types::ObjectId;

/// Property key marking a commit whose content was not materialized.
pub const SPARSE_FLAG: &str = "sparse";

/// A handle onto the commit graph of one repository.
pub struct GraphStore {
    paths: RepoPaths,
    options: GraphOptions,
    registry: Arc<BackendRegistry>,
    location: Option<PathBuf>,
    backend: Option<Arc<dyn GraphBackend>>,
}

impl GraphStore {
    /// A closed handle using the process-wide registry.
    pub fn new(paths: RepoPaths, options: GraphOptions) -> Self {
        Self::with_registry(paths, options, BackendRegistry::global())
    }

    /// A closed handle using an explicit registry.
    pub fn with_registry(
        paths: RepoPaths,
        options: GraphOptions,
        registry: Arc<BackendRegistry>,
    ) -> Self {
        Self {
            paths,
            options,
            registry,
            location: None,
            backend: None,
        }
    }

    /// The repository this handle belongs to.
    pub fn paths(&self) -> &RepoPaths {
        &self.paths
    }

    /// The options this handle opens with.
    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    /// The registry key of the open backend.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Whether [`open`](GraphStore::open) has succeeded and no
    /// [`close`](GraphStore::close) has followed.
    pub fn is_open(&self) -> bool {
        self.backend.is_some()
    }

    /// Open the store. Does nothing if already open.
    ///
    /// # Errors
    ///
    /// - [`GraphError::NotARepository`] if the root has no `.strata/` marker
    /// - [`GraphError::Io`] if the graph directory cannot be created
    /// - backend errors while opening or writing the root anchor
    pub fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }
        if !self.paths.is_repository() {
            return Err(GraphError::NotARepository {
                path: self.paths.root.clone(),
            });
        }

        let graph_dir = self.paths.graph_dir();
        std::fs::create_dir_all(&graph_dir).map_err(|source| GraphError::Io {
            path: graph_dir.clone(),
            source,
        })?;
        let canonical = graph_dir.canonicalize().map_err(|source| GraphError::Io {
            path: graph_dir.clone(),
            source,
        })?;
        let location = match self.paths.graph_db_path().file_name() {
            Some(name) => canonical.join(name),
            None => canonical,
        };

        let options = self.options.clone();
        let db_path = location.clone();
        let backend = self
            .registry
            .acquire(&location, options.backend, move || open_backend(&db_path, &options))?;

        let anchored = backend
            .write()
            .and_then(|mut txn| {
                let created = txn.ensure_root()?;
                txn.commit()?;
                Ok(created)
            });
        match anchored {
            Ok(created) => {
                debug!(location = %location.display(), root_created = created, "graph.store.open");
                self.location = Some(location);
                self.backend = Some(backend);
                Ok(())
            }
            Err(err) => {
                if let Err(release) = self.registry.release(&location) {
                    warn!(error = %release, "graph.store.release_failed");
                }
                Err(err)
            }
        }
    }

    /// Close the store. Does nothing if already closed.
    ///
    /// The backend itself is shut down only if this was the last open
    /// handle for the location.
    pub fn close(&mut self) -> Result<()> {
        self.backend = None;
        let Some(location) = self.location.take() else {
            return Ok(());
        };
        let last = self.registry.release(&location)?;
        debug!(location = %location.display(), last, "graph.store.close");
        Ok(())
    }

    fn backend(&self) -> Result<&Arc<dyn GraphBackend>> {
        match &self.backend {
            Some(backend) if !backend.is_shut_down() => Ok(backend),
            _ => Err(GraphError::StoreClosed),
        }
    }

    /// Run `f` inside a read scope.
    pub(crate) fn read<T>(&self, f: impl FnOnce(&dyn ReadTxn) -> Result<T>) -> Result<T> {
        let backend = self.backend()?;
        let txn = backend.read()?;
        f(txn.as_ref())
    }

    /// Run `f` inside a write scope, committing on success.
    pub(crate) fn write<T>(&self, f: impl FnOnce(&mut dyn WriteTxn) -> Result<T>) -> Result<T> {
        let backend = self.backend()?;
        let mut txn = backend.write()?;
        let value = f(txn.as_mut())?;
        txn.commit()?;
        trace!("graph.store.commit");
        Ok(value)
    }

    /// Whether a node exists for `id`.
    pub fn exists(&self, id: &ObjectId) -> Result<bool> {
        self.read(|txn| txn.contains(id))
    }

    /// Record `id` with its ordered parents.
    ///
    /// A commit recorded with no parents is attached to the root anchor.
    /// Parent edges are only written if `id` has none yet, so a repeated
    /// call changes nothing. Parent nodes are created as needed.
    ///
    /// Returns true iff any edge was added.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use strata::core::paths::RepoPaths;
    /// # use strata::core::types::ObjectId;
    /// # use strata::graph::{GraphOptions, GraphStore};
    /// # let mut store = GraphStore::new(RepoPaths::new(".".into()), GraphOptions::default());
    /// # store.open()?;
    /// let c1 = ObjectId::from_bytes(&[1; 20])?;
    /// let c2 = ObjectId::from_bytes(&[2; 20])?;
    /// assert!(store.put(&c2, &[c1])?);
    /// assert!(!store.put(&c2, &[c1])?);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn put(&self, id: &ObjectId, parents: &[ObjectId]) -> Result<bool> {
        self.write(|txn| {
            txn.add_node(id)?;
            let mut updated = false;
            if parents.is_empty() && !txn.is_rooted(id)? {
                updated |= txn.add_root_edge(id)?;
            }
            if txn.parents(id)?.is_empty() {
                for parent in parents {
                    txn.add_node(parent)?;
                    updated |= txn.add_parent(id, parent)?;
                }
            }
            Ok(updated)
        })
    }

    /// Parents of `id` in recorded order. Empty if unknown.
    pub fn get_parents(&self, id: &ObjectId) -> Result<Vec<ObjectId>> {
        self.read(|txn| txn.parents(id))
    }

    /// Commits that name `id` as a parent. Empty if unknown.
    pub fn get_children(&self, id: &ObjectId) -> Result<Vec<ObjectId>> {
        self.read(|txn| txn.children(id))
    }

    /// Fewest parent hops from `id` to a commit with no parents.
    ///
    /// 0 if `id` has no parents or is unknown.
    pub fn get_depth(&self, id: &ObjectId) -> Result<usize> {
        self.read(|txn| depth(txn, id))
    }

    /// Point the mapping of `mapped` at `original`, replacing any previous
    /// mapping. Both nodes are created if absent.
    pub fn map(&self, mapped: &ObjectId, original: &ObjectId) -> Result<()> {
        self.write(|txn| {
            txn.add_node(mapped)?;
            txn.add_node(original)?;
            txn.set_mapping(mapped, original)?;
            Ok(())
        })
    }

    /// The mapping target of `id`, or [`ObjectId::NULL`] if none.
    pub fn get_mapping(&self, id: &ObjectId) -> Result<ObjectId> {
        self.read(|txn| Ok(txn.mapping(id)?.unwrap_or(ObjectId::NULL)))
    }

    /// Best-effort property write on an existing node.
    ///
    /// Returns false if the node is unknown or the write failed; failures
    /// are rolled back and logged. Only [`GraphError::StoreClosed`] is
    /// returned as an error.
    pub fn set_property(&self, id: &ObjectId, key: &str, value: &str) -> Result<bool> {
        let outcome = self.write(|txn| {
            if !txn.contains(id)? {
                return Ok(false);
            }
            txn.set_property(id, key, value)?;
            Ok(true)
        });
        match outcome {
            Ok(written) => Ok(written),
            Err(GraphError::StoreClosed) => Err(GraphError::StoreClosed),
            Err(err) => {
                warn!(id = %id, key, error = %err, "graph.store.set_property_failed");
                Ok(false)
            }
        }
    }

    /// A string property of `id`.
    pub fn property(&self, id: &ObjectId, key: &str) -> Result<Option<String>> {
        self.read(|txn| txn.property(id, key))
    }

    /// Flag `id` as sparse. Returns false if the node is unknown.
    pub fn mark_sparse(&self, id: &ObjectId) -> Result<bool> {
        self.set_property(id, SPARSE_FLAG, "true")
    }

    /// A read-only view of a known node.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownCommit`] if `id` has never been recorded.
    pub fn get_node(&self, id: &ObjectId) -> Result<GraphNode<'_>> {
        if !self.exists(id)? {
            return Err(GraphError::UnknownCommit { id: *id });
        }
        Ok(GraphNode::new(self, *id))
    }

    /// Remove every node and edge. The root anchor is recreated, so the
    /// store stays usable.
    pub fn truncate(&self) -> Result<()> {
        self.write(|txn| {
            txn.clear()?;
            txn.ensure_root()?;
            Ok(())
        })?;
        debug!(location = ?self.location, "graph.store.truncate");
        Ok(())
    }

    /// Commit and edge counts.
    pub fn stats(&self) -> Result<GraphStats> {
        self.read(|txn| {
            Ok(GraphStats {
                commits: txn.commit_ids()?.len(),
                parent_edges: txn.parent_edge_count()?,
            })
        })
    }

    /// Number of commit nodes (the root anchor is not counted).
    pub fn node_count(&self) -> Result<usize> {
        Ok(self.stats()?.commits)
    }

    /// Check the whole graph for cycles.
    pub fn verify(&self) -> Result<VerifyReport> {
        self.read(verify::check)
    }

    /// Ancestry queries over this store.
    pub fn ancestry(&self) -> Ancestry<'_> {
        Ancestry::new(self)
    }

    /// Breadth-first walk over `start` and its ancestors.
    pub fn walk_ancestors(&self, start: &ObjectId, limit: Option<usize>) -> Result<AncestorWalk<'_>> {
        let node = self.get_node(start)?;
        Ok(AncestorWalk::new(node, limit))
    }
}

impl Drop for GraphStore {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "graph.store.close_failed");
        }
    }
}

impl fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphStore")
            .field("root", &self.paths.root)
            .field("backend", &self.options.backend)
            .field("open", &self.is_open())
            .finish()
    }
}

impl fmt::Display for GraphStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self
            .location
            .clone()
            .unwrap_or_else(|| self.paths.graph_db_path());
        write!(
            f,
            "GraphStore[backend: {}, path: {}]",
            self.options.backend,
            path.display()
        )
    }
}

fn open_backend(path: &Path, options: &GraphOptions) -> Result<Arc<dyn GraphBackend>> {
    Ok(match options.backend {
        BackendKind::Sqlite => Arc::new(SqliteBackend::open(path, options)?),
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
    })
}

/// Shortest parent-hop distance from `id` to a parentless commit.
///
/// Level-by-level so the first parentless commit found is the nearest.
/// Reaching `id` again, or running out of unvisited commits, means the
/// parent edges loop.
pub(crate) fn depth(txn: &dyn ReadTxn, id: &ObjectId) -> Result<usize> {
    let mut frontier = txn.parents(id)?;
    if frontier.is_empty() {
        return Ok(0);
    }

    let mut visited = HashSet::from([*id]);
    let mut level = 0;
    while !frontier.is_empty() {
        level += 1;
        let mut next = Vec::new();
        for commit in frontier {
            if commit == *id {
                return Err(GraphError::Cycle { id: *id });
            }
            if !visited.insert(commit) {
                continue;
            }
            let parents = txn.parents(&commit)?;
            if parents.is_empty() {
                return Ok(level);
            }
            next.extend(parents);
        }
        frontier = next;
    }
    Err(GraphError::Cycle { id: *id })
}
