//! graph::node
//!
//! Read-only view of one commit node, for walkers that only need edges.

use super::store::{GraphStore, SPARSE_FLAG};
use super::Result;
use crate::core::types::ObjectId;

/// Which PARENT edges of a node to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Edges to the node's parents
    Out,
    /// Edges from the node's children
    In,
    /// Outgoing edges, then incoming
    Both,
}

/// A PARENT edge: `tail` is the child, `head` the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphEdge {
    /// The child commit
    pub tail: ObjectId,
    /// The parent commit
    pub head: ObjectId,
}

/// A node handed out by [`GraphStore::get_node`].
#[derive(Debug, Clone, Copy)]
pub struct GraphNode<'s> {
    store: &'s GraphStore,
    id: ObjectId,
}

impl<'s> GraphNode<'s> {
    pub(crate) fn new(store: &'s GraphStore, id: ObjectId) -> Self {
        Self { store, id }
    }

    /// The commit this node stands for.
    pub fn identifier(&self) -> ObjectId {
        self.id
    }

    /// Whether the commit was flagged sparse.
    pub fn is_sparse(&self) -> Result<bool> {
        Ok(self.store.property(&self.id, SPARSE_FLAG)?.as_deref() == Some("true"))
    }

    /// PARENT edges touching this node.
    ///
    /// Edges are read when called; the iterator owns its snapshot.
    pub fn edges(&self, direction: Direction) -> Result<impl Iterator<Item = GraphEdge>> {
        let id = self.id;
        let (outgoing, incoming) = self.store.read(|txn| {
            let outgoing = match direction {
                Direction::Out | Direction::Both => txn.parents(&id)?,
                Direction::In => Vec::new(),
            };
            let incoming = match direction {
                Direction::In | Direction::Both => txn.children(&id)?,
                Direction::Out => Vec::new(),
            };
            Ok((outgoing, incoming))
        })?;

        let out = outgoing.into_iter().map(move |head| GraphEdge { tail: id, head });
        let inc = incoming.into_iter().map(move |tail| GraphEdge { tail, head: id });
        Ok(out.chain(inc))
    }

    /// The store this node was read from.
    pub fn store(&self) -> &'s GraphStore {
        self.store
    }
}
