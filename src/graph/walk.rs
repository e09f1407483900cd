//! graph::walk
//!
//! Breadth-first iteration over a commit and its ancestors.
//!
//! Commits at the same distance from the start come out in identifier
//! order, and no commit is yielded twice. Parents are read lazily, one node
//! at a time, through [`GraphNode::edges`].

use std::collections::{BTreeSet, HashSet, VecDeque};

use super::node::{Direction, GraphNode};
use super::store::GraphStore;
use super::Result;
use crate::core::types::ObjectId;

/// Iterator returned by [`GraphStore::walk_ancestors`].
///
/// Stops after the first error.
#[derive(Debug)]
pub struct AncestorWalk<'s> {
    store: &'s GraphStore,
    level: VecDeque<ObjectId>,
    next_level: BTreeSet<ObjectId>,
    seen: HashSet<ObjectId>,
    remaining: Option<usize>,
    failed: bool,
}

impl<'s> AncestorWalk<'s> {
    pub(crate) fn new(start: GraphNode<'s>, limit: Option<usize>) -> Self {
        let id = start.identifier();
        Self {
            store: start.store(),
            level: VecDeque::from([id]),
            next_level: BTreeSet::new(),
            seen: HashSet::from([id]),
            remaining: limit,
            failed: false,
        }
    }
}

impl<'s> Iterator for AncestorWalk<'s> {
    type Item = Result<GraphNode<'s>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining == Some(0) {
            return None;
        }
        if self.level.is_empty() {
            self.level = std::mem::take(&mut self.next_level).into_iter().collect();
        }
        let id = self.level.pop_front()?;
        let node = GraphNode::new(self.store, id);

        match node.edges(Direction::Out) {
            Ok(edges) => {
                for edge in edges {
                    if self.seen.insert(edge.head) {
                        self.next_level.insert(edge.head);
                    }
                }
            }
            Err(err) => {
                self.failed = true;
                return Some(Err(err));
            }
        }

        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }
        Some(Ok(node))
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
        // 1 <- 3, 2 <- 3 (merge), 3 <- 4, 1 <- 5 <- 4
        store.put(&id(1), &[]).unwrap();
        store.put(&id(2), &[]).unwrap();
        store.put(&id(3), &[id(2), id(1)]).unwrap();
        store.put(&id(5), &[id(1)]).unwrap();
        store.put(&id(4), &[id(5), id(3)]).unwrap();
        (temp, store)
    }

    fn walk(store: &GraphStore, start: u8, limit: Option<usize>) -> Vec<ObjectId> {
        store
            .walk_ancestors(&id(start), limit)
            .unwrap()
            .map(|node| node.unwrap().identifier())
            .collect()
    }

    #[test]
    fn levels_in_identifier_order() {
        let (_temp, store) = store();
        assert_eq!(walk(&store, 4, None), vec![id(4), id(3), id(5), id(1), id(2)]);
    }

    #[test]
    fn limit_truncates() {
        let (_temp, store) = store();
        assert_eq!(walk(&store, 4, Some(2)), vec![id(4), id(3)]);
        assert!(walk(&store, 4, Some(0)).is_empty());
    }

    #[test]
    fn root_walks_only_itself() {
        let (_temp, store) = store();
        assert_eq!(walk(&store, 1, None), vec![id(1)]);
    }

    #[test]
    fn unknown_start_is_rejected() {
        let (_temp, store) = store();
        assert!(store.walk_ancestors(&id(9), None).is_err());
    }
}
