//! graph::memory
//!
//! Process-local graph backend.
//!
//! # Concurrency
//!
//! The whole graph sits behind one `parking_lot::RwLock`. A read scope holds
//! the shared lock, a write scope holds the exclusive lock, so readers never
//! observe a half-applied write.
//!
//! # Rollback
//!
//! A write scope mutates the graph in place and records an undo entry for
//! every primitive change. Dropping the scope without committing replays the
//! undo log in reverse.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

use super::backend::{GraphBackend, ReadTxn, WriteTxn};
use super::{BackendKind, GraphError, Result};
use crate::core::types::ObjectId;

#[derive(Debug, Default, Clone)]
struct NodeRecord {
    parents: Vec<ObjectId>,
    children: Vec<ObjectId>,
    rooted: bool,
    mapped_to: Option<ObjectId>,
    properties: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct GraphState {
    root: bool,
    nodes: HashMap<ObjectId, NodeRecord>,
    parent_edges: usize,
}

impl GraphState {
    fn node(&self, id: &ObjectId) -> Option<&NodeRecord> {
        self.nodes.get(id)
    }

    fn node_mut(&mut self, id: &ObjectId) -> Result<&mut NodeRecord> {
        self.nodes
            .get_mut(id)
            .ok_or(GraphError::UnknownCommit { id: *id })
    }
}

/// One reversible change.
#[derive(Debug)]
enum Undo {
    RemoveRoot,
    RemoveNode(ObjectId),
    PopParent { child: ObjectId, parent: ObjectId },
    Unroot(ObjectId),
    RestoreMapping(ObjectId, Option<ObjectId>),
    RestoreProperty(ObjectId, String, Option<String>),
    RestoreState(GraphState),
}

impl Undo {
    fn apply(self, state: &mut GraphState) {
        match self {
            Undo::RemoveRoot => state.root = false,
            Undo::RemoveNode(id) => {
                state.nodes.remove(&id);
            }
            Undo::PopParent { child, parent } => {
                if let Some(node) = state.nodes.get_mut(&child) {
                    node.parents.pop();
                }
                if let Some(node) = state.nodes.get_mut(&parent) {
                    node.children.pop();
                }
                state.parent_edges = state.parent_edges.saturating_sub(1);
            }
            Undo::Unroot(id) => {
                if let Some(node) = state.nodes.get_mut(&id) {
                    node.rooted = false;
                }
            }
            Undo::RestoreMapping(id, previous) => {
                if let Some(node) = state.nodes.get_mut(&id) {
                    node.mapped_to = previous;
                }
            }
            Undo::RestoreProperty(id, key, previous) => {
                if let Some(node) = state.nodes.get_mut(&id) {
                    match previous {
                        Some(value) => node.properties.insert(key, value),
                        None => node.properties.remove(&key),
                    };
                }
            }
            Undo::RestoreState(previous) => *state = previous,
        }
    }
}

/// In-memory graph backend.
///
/// Shared between handles through the registry like any other backend; its
/// contents are discarded when the last handle closes.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<GraphState>,
    closed: AtomicBool,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(GraphError::StoreClosed);
        }
        Ok(())
    }
}

impl GraphBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn read(&self) -> Result<Box<dyn ReadTxn + '_>> {
        self.check_open()?;
        Ok(Box::new(MemoryTxn {
            guard: Guard::Read(self.state.read()),
            undo: Vec::new(),
        }))
    }

    fn write(&self) -> Result<Box<dyn WriteTxn + '_>> {
        self.check_open()?;
        Ok(Box::new(MemoryTxn {
            guard: Guard::Write(self.state.write()),
            undo: Vec::new(),
        }))
    }

    fn shutdown(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            // Wait for in-flight scopes, then drop the contents.
            *self.state.write() = GraphState::default();
        }
        Ok(())
    }

    fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

enum Guard<'a> {
    Read(RwLockReadGuard<'a, GraphState>),
    Write(RwLockWriteGuard<'a, GraphState>),
}

struct MemoryTxn<'a> {
    guard: Guard<'a>,
    undo: Vec<Undo>,
}

impl MemoryTxn<'_> {
    fn state(&self) -> &GraphState {
        match &self.guard {
            Guard::Read(state) => &**state,
            Guard::Write(state) => &**state,
        }
    }

    fn state_mut(&mut self) -> Result<&mut GraphState> {
        match &mut self.guard {
            Guard::Write(state) => Ok(&mut **state),
            Guard::Read(_) => Err(GraphError::Corrupt(
                "mutation attempted through a read scope".into(),
            )),
        }
    }
}

impl Drop for MemoryTxn<'_> {
    fn drop(&mut self) {
        if self.undo.is_empty() {
            return;
        }
        let undo = std::mem::take(&mut self.undo);
        trace!(changes = undo.len(), "graph.memory.rollback");
        if let Guard::Write(state) = &mut self.guard {
            for entry in undo.into_iter().rev() {
                entry.apply(&mut **state);
            }
        }
    }
}

impl ReadTxn for MemoryTxn<'_> {
    fn contains(&self, id: &ObjectId) -> Result<bool> {
        Ok(self.state().nodes.contains_key(id))
    }

    fn parents(&self, id: &ObjectId) -> Result<Vec<ObjectId>> {
        Ok(self
            .state()
            .node(id)
            .map(|n| n.parents.clone())
            .unwrap_or_default())
    }

    fn children(&self, id: &ObjectId) -> Result<Vec<ObjectId>> {
        Ok(self
            .state()
            .node(id)
            .map(|n| n.children.clone())
            .unwrap_or_default())
    }

    fn is_rooted(&self, id: &ObjectId) -> Result<bool> {
        Ok(self.state().node(id).is_some_and(|n| n.rooted))
    }

    fn mapping(&self, id: &ObjectId) -> Result<Option<ObjectId>> {
        Ok(self.state().node(id).and_then(|n| n.mapped_to))
    }

    fn property(&self, id: &ObjectId, key: &str) -> Result<Option<String>> {
        Ok(self
            .state()
            .node(id)
            .and_then(|n| n.properties.get(key).cloned()))
    }

    fn commit_ids(&self) -> Result<Vec<ObjectId>> {
        let mut ids: Vec<ObjectId> = self.state().nodes.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn parent_edge_count(&self) -> Result<usize> {
        Ok(self.state().parent_edges)
    }
}

impl WriteTxn for MemoryTxn<'_> {
    fn ensure_root(&mut self) -> Result<bool> {
        let state = self.state_mut()?;
        if state.root {
            return Ok(false);
        }
        state.root = true;
        self.undo.push(Undo::RemoveRoot);
        Ok(true)
    }

    fn add_node(&mut self, id: &ObjectId) -> Result<bool> {
        let state = self.state_mut()?;
        if state.nodes.contains_key(id) {
            return Ok(false);
        }
        state.nodes.insert(*id, NodeRecord::default());
        self.undo.push(Undo::RemoveNode(*id));
        Ok(true)
    }

    fn add_parent(&mut self, child: &ObjectId, parent: &ObjectId) -> Result<bool> {
        let state = self.state_mut()?;
        if !state.nodes.contains_key(parent) {
            return Err(GraphError::UnknownCommit { id: *parent });
        }
        let node = state.node_mut(child)?;
        if node.parents.contains(parent) {
            return Ok(false);
        }
        node.parents.push(*parent);
        state.node_mut(parent)?.children.push(*child);
        state.parent_edges += 1;
        self.undo.push(Undo::PopParent {
            child: *child,
            parent: *parent,
        });
        Ok(true)
    }

    fn add_root_edge(&mut self, id: &ObjectId) -> Result<bool> {
        let node = self.state_mut()?.node_mut(id)?;
        if node.rooted {
            return Ok(false);
        }
        node.rooted = true;
        self.undo.push(Undo::Unroot(*id));
        Ok(true)
    }

    fn set_mapping(
        &mut self,
        mapped: &ObjectId,
        original: &ObjectId,
    ) -> Result<Option<ObjectId>> {
        let state = self.state_mut()?;
        if !state.nodes.contains_key(original) {
            return Err(GraphError::UnknownCommit { id: *original });
        }
        let node = state.node_mut(mapped)?;
        let previous = node.mapped_to.replace(*original);
        self.undo.push(Undo::RestoreMapping(*mapped, previous));
        Ok(previous)
    }

    fn set_property(&mut self, id: &ObjectId, key: &str, value: &str) -> Result<()> {
        let node = self.state_mut()?.node_mut(id)?;
        let previous = node.properties.insert(key.to_string(), value.to_string());
        self.undo
            .push(Undo::RestoreProperty(*id, key.to_string(), previous));
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        let previous = std::mem::take(self.state_mut()?);
        self.undo.push(Undo::RestoreState(previous));
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.undo.clear();
        Ok(())
    }
}
