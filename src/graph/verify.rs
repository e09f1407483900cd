//! graph::verify
//!
//! Whole-graph consistency check.
//!
//! # Invariants
//!
//! - Never mutates the graph
//! - Deterministic: commits are visited in identifier order, so the same
//!   graph always reports the same cycle member

use std::collections::HashSet;

use serde::Serialize;

use super::backend::ReadTxn;
use super::Result;
use crate::core::types::ObjectId;

/// Size of the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    /// Commit nodes, excluding the root anchor
    pub commits: usize,
    /// PARENT edges
    pub parent_edges: usize,
}

/// Result of [`GraphStore::verify`](super::GraphStore::verify).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Graph size at the time of the check
    pub stats: GraphStats,
    /// A commit that is its own ancestor, if any
    pub cycle: Option<ObjectId>,
}

impl VerifyReport {
    /// Whether no cycle was found.
    pub fn is_ok(&self) -> bool {
        self.cycle.is_none()
    }
}

/// Depth-first search over PARENT edges with an on-path set.
///
/// Iterative, so deep linear histories do not exhaust the stack.
pub(crate) fn check(txn: &dyn ReadTxn) -> Result<VerifyReport> {
    let commits = txn.commit_ids()?;
    let stats = GraphStats {
        commits: commits.len(),
        parent_edges: txn.parent_edge_count()?,
    };

    let mut done: HashSet<ObjectId> = HashSet::new();
    let mut on_path: HashSet<ObjectId> = HashSet::new();
    for start in &commits {
        if done.contains(start) {
            continue;
        }
        // (commit, its parents, index of the next parent to visit)
        let mut stack = vec![(*start, txn.parents(start)?, 0usize)];
        on_path.insert(*start);
        while let Some((commit, parents, next)) = stack.last_mut() {
            let Some(parent) = parents.get(*next).copied() else {
                on_path.remove(commit);
                done.insert(*commit);
                stack.pop();
                continue;
            };
            *next += 1;
            if on_path.contains(&parent) {
                return Ok(VerifyReport {
                    stats,
                    cycle: Some(parent),
                });
            }
            if !done.contains(&parent) {
                on_path.insert(parent);
                let grand = txn.parents(&parent)?;
                stack.push((parent, grand, 0));
            }
        }
    }

    Ok(VerifyReport { stats, cycle: None })
}
