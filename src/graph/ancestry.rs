//! graph::ancestry
//!
//! Ancestor tests and merge-base computation.
//!
//! # Algorithm
//!
//! [`Ancestry::find_common_ancestor`] expands both commits breadth-first,
//! one parent hop per side per round, recording each commit's hop distance
//! from that side's start. After each round it checks the left side's
//! newly reached commits against the right side's distances, then the
//! right side's against the left, each in identifier order, and keeps the
//! hit with the smallest combined distance. The first hit seen wins a tie.
//!
//! A hit can only be proven nearest once no later round could beat it.
//! Anything first reached in round `r + 1` is at least `r + 1` hops from one
//! start, so the search stops after round `r` once the best combined
//! distance is `r + 1` or less.
//!
//! Each query runs against a single read snapshot of the store.
//!
//! # Example
//!
//! ```no_run
//! # use strata::core::paths::RepoPaths;
//! # use strata::core::types::ObjectId;
//! # use strata::graph::{GraphOptions, GraphStore};
//! # let mut store = GraphStore::new(RepoPaths::new(".".into()), GraphOptions::default());
//! # store.open()?;
//! let c1 = ObjectId::from_bytes(&[1; 20])?;
//! let c2 = ObjectId::from_bytes(&[2; 20])?;
//! let c3 = ObjectId::from_bytes(&[3; 20])?;
//! store.put(&c1, &[])?;
//! store.put(&c2, &[c1])?;
//! store.put(&c3, &[c1])?;
//!
//! let ancestry = store.ancestry();
//! assert_eq!(ancestry.find_common_ancestor(&c2, &c3)?, Some(c1));
//! assert!(ancestry.is_ancestor(&c1, &c3)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use tracing::trace;

use super::backend::ReadTxn;
use super::store::{self, GraphStore};
use super::{GraphError, Result};
use crate::core::types::ObjectId;

/// Ancestry queries over one store. Holds no state of its own.
#[derive(Debug, Clone, Copy)]
pub struct Ancestry<'s> {
    store: &'s GraphStore,
}

impl<'s> Ancestry<'s> {
    pub(crate) fn new(store: &'s GraphStore) -> Self {
        Self { store }
    }

    /// Whether `candidate` can be reached from `commit` by following zero
    /// or more parent edges.
    ///
    /// # Errors
    ///
    /// - [`GraphError::UnknownCommit`] if `commit` was never recorded
    /// - [`GraphError::Cycle`] if the search comes back to `commit`
    pub fn is_ancestor(&self, candidate: &ObjectId, commit: &ObjectId) -> Result<bool> {
        self.store.read(|txn| {
            require(txn, commit)?;
            if candidate == commit {
                return Ok(true);
            }
            if !txn.contains(candidate)? {
                return Ok(false);
            }

            let mut visited = HashSet::from([*commit]);
            let mut queue: VecDeque<ObjectId> = txn.parents(commit)?.into();
            while let Some(next) = queue.pop_front() {
                if next == *candidate {
                    return Ok(true);
                }
                if next == *commit {
                    return Err(GraphError::Cycle { id: *commit });
                }
                if visited.insert(next) {
                    queue.extend(txn.parents(&next)?);
                }
            }
            Ok(false)
        })
    }

    /// A nearest common ancestor of `left` and `right`: no other common
    /// ancestor has a smaller sum of hop distances from the two inputs.
    ///
    /// Returns `None` when the histories share no commit. Equal inputs
    /// return `left` without touching the graph beyond the existence check.
    ///
    /// # Errors
    ///
    /// - [`GraphError::UnknownCommit`] if either side was never recorded
    /// - [`GraphError::Cycle`] if either side's search comes back to its start
    pub fn find_common_ancestor(
        &self,
        left: &ObjectId,
        right: &ObjectId,
    ) -> Result<Option<ObjectId>> {
        self.store.read(|txn| {
            require(txn, left)?;
            require(txn, right)?;
            if left == right {
                return Ok(Some(*left));
            }

            let mut left_side = Side::new(*left);
            let mut right_side = Side::new(*right);
            let mut best: Option<(usize, ObjectId)> = None;
            let mut round = 0usize;
            while !left_side.frontier.is_empty() || !right_side.frontier.is_empty() {
                round += 1;
                let left_new = left_side.advance(txn)?;
                let right_new = right_side.advance(txn)?;
                trace!(
                    round,
                    left = left_new.len(),
                    right = right_new.len(),
                    "graph.ancestry.round"
                );

                let left_hits = left_new
                    .iter()
                    .filter_map(|id| Some((round + right_side.distance(id)?, *id)));
                let right_hits = right_new
                    .iter()
                    .filter_map(|id| Some((left_side.distance(id)? + round, *id)));
                for (combined, id) in left_hits.chain(right_hits) {
                    if best.map_or(true, |(shortest, _)| combined < shortest) {
                        best = Some((combined, id));
                    }
                }

                if let Some((shortest, _)) = best {
                    if shortest <= round + 1 {
                        break;
                    }
                }
            }
            Ok(best.map(|(_, id)| id))
        })
    }

    /// Fewest parent hops from `id` to a parentless commit.
    pub fn depth(&self, id: &ObjectId) -> Result<usize> {
        self.store.read(|txn| store::depth(txn, id))
    }
}

fn require(txn: &dyn ReadTxn, id: &ObjectId) -> Result<()> {
    if txn.contains(id)? {
        Ok(())
    } else {
        Err(GraphError::UnknownCommit { id: *id })
    }
}

/// One side of the bidirectional search.
struct Side {
    start: ObjectId,
    /// Hop distance from `start` of every commit reached so far.
    reached: HashMap<ObjectId, usize>,
    frontier: BTreeSet<ObjectId>,
    hops: usize,
}

impl Side {
    fn new(start: ObjectId) -> Self {
        Self {
            start,
            reached: HashMap::from([(start, 0)]),
            frontier: BTreeSet::from([start]),
            hops: 0,
        }
    }

    fn distance(&self, id: &ObjectId) -> Option<usize> {
        self.reached.get(id).copied()
    }

    /// Step one hop. Returns the commits reached for the first time, which
    /// also become the next frontier.
    fn advance(&mut self, txn: &dyn ReadTxn) -> Result<BTreeSet<ObjectId>> {
        self.hops += 1;
        let mut fresh = BTreeSet::new();
        for commit in &self.frontier {
            for parent in txn.parents(commit)? {
                if parent == self.start {
                    return Err(GraphError::Cycle { id: self.start });
                }
                if let Entry::Vacant(slot) = self.reached.entry(parent) {
                    slot.insert(self.hops);
                    fresh.insert(parent);
                }
            }
        }
        self.frontier = fresh.clone();
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::paths::RepoPaths;
    use crate::graph::{BackendRegistry, GraphOptions};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn id(n: u8) -> ObjectId {
        ObjectId::from_bytes(&[n; 20]).unwrap()
    }

    fn store() -> (TempDir, GraphStore) {
        let temp = TempDir::new().unwrap();
        let paths = RepoPaths::new(temp.path().to_path_buf());
        std::fs::create_dir_all(paths.marker_dir()).unwrap();
        let mut store =
            GraphStore::with_registry(paths, GraphOptions::memory(), Arc::new(BackendRegistry::new()));
        store.open().unwrap();
        (temp, store)
    }

    #[test]
    fn ancestor_of_self_and_chain() {
        let (_temp, store) = store();
        store.put(&id(1), &[]).unwrap();
        store.put(&id(2), &[id(1)]).unwrap();
        store.put(&id(3), &[id(2)]).unwrap();

        let ancestry = store.ancestry();
        assert!(ancestry.is_ancestor(&id(3), &id(3)).unwrap());
        assert!(ancestry.is_ancestor(&id(1), &id(3)).unwrap());
        assert!(!ancestry.is_ancestor(&id(3), &id(1)).unwrap());
        assert!(!ancestry.is_ancestor(&id(9), &id(3)).unwrap());
        assert!(matches!(
            ancestry.is_ancestor(&id(1), &id(9)),
            Err(GraphError::UnknownCommit { .. })
        ));
    }

    #[test]
    fn merge_base_when_one_side_contains_the_other() {
        let (_temp, store) = store();
        store.put(&id(1), &[]).unwrap();
        store.put(&id(2), &[id(1)]).unwrap();
        store.put(&id(3), &[id(2)]).unwrap();

        let ancestry = store.ancestry();
        assert_eq!(ancestry.find_common_ancestor(&id(3), &id(1)).unwrap(), Some(id(1)));
        assert_eq!(ancestry.find_common_ancestor(&id(2), &id(3)).unwrap(), Some(id(2)));
    }

    #[test]
    fn merge_base_prefers_nearest() {
        let (_temp, store) = store();
        // 1 <- 2 <- 3 <- 4 (left tip), 3 <- 5 (right tip)
        store.put(&id(1), &[]).unwrap();
        store.put(&id(2), &[id(1)]).unwrap();
        store.put(&id(3), &[id(2)]).unwrap();
        store.put(&id(4), &[id(3)]).unwrap();
        store.put(&id(5), &[id(3)]).unwrap();

        let base = store.ancestry().find_common_ancestor(&id(4), &id(5)).unwrap();
        assert_eq!(base, Some(id(3)));
    }

    #[test]
    fn merge_base_of_branch_and_its_merge() {
        let (_temp, store) = store();
        // feature 2 on 1, merged without fast-forward into 3 = (1, 2)
        store.put(&id(1), &[]).unwrap();
        store.put(&id(2), &[id(1)]).unwrap();
        store.put(&id(3), &[id(1), id(2)]).unwrap();

        let ancestry = store.ancestry();
        assert_eq!(ancestry.find_common_ancestor(&id(2), &id(3)).unwrap(), Some(id(2)));
        assert_eq!(ancestry.find_common_ancestor(&id(3), &id(2)).unwrap(), Some(id(2)));
    }

    #[test]
    fn nearer_base_found_in_later_round_wins() {
        let (_temp, store) = store();
        // 3 -> 2 -> 1 and 7 -> 4 -> 1 meet at 1 (2 + 2 hops),
        // but 7 -> 6 -> 5 -> 3 reaches 3 itself (0 + 3 hops)
        store.put(&id(1), &[]).unwrap();
        store.put(&id(2), &[id(1)]).unwrap();
        store.put(&id(3), &[id(2)]).unwrap();
        store.put(&id(4), &[id(1)]).unwrap();
        store.put(&id(5), &[id(3)]).unwrap();
        store.put(&id(6), &[id(5)]).unwrap();
        store.put(&id(7), &[id(4), id(6)]).unwrap();

        let ancestry = store.ancestry();
        assert_eq!(ancestry.find_common_ancestor(&id(3), &id(7)).unwrap(), Some(id(3)));
        assert_eq!(ancestry.find_common_ancestor(&id(7), &id(3)).unwrap(), Some(id(3)));
    }

    #[test]
    fn equidistant_bases_break_ties_by_identifier() {
        let (_temp, store) = store();
        // criss-cross: both tips have parents 7 and 8
        store.put(&id(8), &[]).unwrap();
        store.put(&id(7), &[]).unwrap();
        store.put(&id(1), &[id(8), id(7)]).unwrap();
        store.put(&id(2), &[id(8), id(7)]).unwrap();

        let ancestry = store.ancestry();
        assert_eq!(ancestry.find_common_ancestor(&id(1), &id(2)).unwrap(), Some(id(7)));
        assert_eq!(ancestry.find_common_ancestor(&id(2), &id(1)).unwrap(), Some(id(7)));
    }

    #[test]
    fn merge_of_merges() {
        let (_temp, store) = store();
        // 1 <- 2, 1 <- 3, merge 4 = (2, 3), tips 5 <- 4 and 6 <- 3
        store.put(&id(1), &[]).unwrap();
        store.put(&id(2), &[id(1)]).unwrap();
        store.put(&id(3), &[id(1)]).unwrap();
        store.put(&id(4), &[id(2), id(3)]).unwrap();
        store.put(&id(5), &[id(4)]).unwrap();
        store.put(&id(6), &[id(3)]).unwrap();

        let base = store.ancestry().find_common_ancestor(&id(5), &id(6)).unwrap();
        assert_eq!(base, Some(id(3)));
    }

    #[test]
    fn unknown_side_is_an_error() {
        let (_temp, store) = store();
        store.put(&id(1), &[]).unwrap();
        let ancestry = store.ancestry();
        assert!(matches!(
            ancestry.find_common_ancestor(&id(1), &id(2)),
            Err(GraphError::UnknownCommit { id: missing }) if missing == id(2)
        ));
        assert!(matches!(
            ancestry.find_common_ancestor(&id(2), &id(2)),
            Err(GraphError::UnknownCommit { .. })
        ));
    }

    #[test]
    fn cycles_are_reported() {
        let (_temp, store) = store();
        store.put(&id(1), &[id(2)]).unwrap();
        store.put(&id(2), &[id(1)]).unwrap();
        store.put(&id(3), &[]).unwrap();

        let ancestry = store.ancestry();
        assert!(matches!(
            ancestry.find_common_ancestor(&id(1), &id(3)),
            Err(GraphError::Cycle { .. })
        ));
        assert!(matches!(
            ancestry.is_ancestor(&id(3), &id(1)),
            Err(GraphError::Cycle { .. })
        ));
    }

    #[test]
    fn depth_matches_store() {
        let (_temp, store) = store();
        store.put(&id(1), &[]).unwrap();
        store.put(&id(2), &[id(1)]).unwrap();
        assert_eq!(store.ancestry().depth(&id(2)).unwrap(), 1);
        assert_eq!(store.get_depth(&id(2)).unwrap(), 1);
    }
}
