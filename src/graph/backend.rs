//! graph::backend
//!
//! The contract every physical graph engine implements.
//!
//! A backend hands out transaction scopes. Reads see one consistent state of
//! the graph for the lifetime of the scope. Writes are all-or-nothing: a
//! [`WriteTxn`] that is dropped without [`WriteTxn::commit`] rolls back.
//!
//! Backends hold no reference counts; sharing is the registry's job.

use std::fmt;

use super::{BackendKind, Result};
use crate::core::types::ObjectId;

/// A physical store for the commit graph.
pub trait GraphBackend: Send + Sync + fmt::Debug {
    /// Which engine this is.
    fn kind(&self) -> BackendKind;

    /// Begin a read-only scope.
    ///
    /// Fails with `StoreClosed` after [`GraphBackend::shutdown`].
    fn read(&self) -> Result<Box<dyn ReadTxn + '_>>;

    /// Begin a read-write scope.
    ///
    /// Fails with `StoreClosed` after [`GraphBackend::shutdown`].
    fn write(&self) -> Result<Box<dyn WriteTxn + '_>>;

    /// Release the physical resources. Idempotent.
    fn shutdown(&self) -> Result<()>;

    /// Whether [`GraphBackend::shutdown`] has run.
    fn is_shut_down(&self) -> bool;
}

/// Queries available inside any transaction scope.
///
/// Unknown identifiers are not errors here: they have no parents, no
/// children, no mapping and no properties.
pub trait ReadTxn {
    /// Whether a node exists for `id`.
    fn contains(&self, id: &ObjectId) -> Result<bool>;

    /// PARENT edge targets of `id`, in insertion order.
    fn parents(&self, id: &ObjectId) -> Result<Vec<ObjectId>>;

    /// Nodes with a PARENT edge to `id`, in construction order.
    fn children(&self, id: &ObjectId) -> Result<Vec<ObjectId>>;

    /// Whether `id` carries a TOROOT edge.
    fn is_rooted(&self, id: &ObjectId) -> Result<bool>;

    /// The MAPPED_TO target of `id`.
    fn mapping(&self, id: &ObjectId) -> Result<Option<ObjectId>>;

    /// A string property of `id`.
    fn property(&self, id: &ObjectId, key: &str) -> Result<Option<String>>;

    /// Every commit node, in identifier order. Excludes the root anchor.
    fn commit_ids(&self) -> Result<Vec<ObjectId>>;

    /// Number of PARENT edges.
    fn parent_edge_count(&self) -> Result<usize>;
}

/// Primitive mutations, available inside a write scope.
pub trait WriteTxn: ReadTxn {
    /// Create the root anchor if missing. Returns true if it was created.
    fn ensure_root(&mut self) -> Result<bool>;

    /// Create a node for `id` if missing. Returns true if it was created.
    fn add_node(&mut self, id: &ObjectId) -> Result<bool>;

    /// Append a PARENT edge `child -> parent`. Both nodes must exist.
    ///
    /// Returns false (and changes nothing) if the edge already exists.
    fn add_parent(&mut self, child: &ObjectId, parent: &ObjectId) -> Result<bool>;

    /// Attach `id` to the root anchor. Returns false if already attached.
    fn add_root_edge(&mut self, id: &ObjectId) -> Result<bool>;

    /// Point the MAPPED_TO edge of `mapped` at `original`, replacing any
    /// previous one. Both nodes must exist. Returns the previous target.
    fn set_mapping(&mut self, mapped: &ObjectId, original: &ObjectId)
        -> Result<Option<ObjectId>>;

    /// Set a string property on an existing node.
    fn set_property(&mut self, id: &ObjectId, key: &str, value: &str) -> Result<()>;

    /// Remove every node and edge, including the root anchor.
    fn clear(&mut self) -> Result<()>;

    /// Make the scope's changes permanent.
    fn commit(self: Box<Self>) -> Result<()>;
}
