//! Property-based tests for identifiers and ancestry.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use proptest::prelude::*;
use tempfile::TempDir;

use strata::core::paths::RepoPaths;
use strata::core::types::ObjectId;
use strata::graph::{BackendRegistry, GraphOptions, GraphStore};

// =============================================================================
// Strategies
// =============================================================================

fn object_id() -> impl Strategy<Value = ObjectId> {
    prop::array::uniform20(any::<u8>()).prop_map(|bytes| ObjectId::from_bytes(&bytes).unwrap())
}

/// A random DAG: commit `i` picks up to three parents among commits `0..i`.
///
/// Parent lists are raw picks; duplicates are dropped when building.
fn dag() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (2usize..24).prop_flat_map(|size| {
        (0..size)
            .map(|i| {
                if i == 0 {
                    Just(Vec::new()).boxed()
                } else {
                    prop::collection::vec(0..i, 0..=3).boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}

fn commit(i: usize) -> ObjectId {
    let mut bytes = [0xc0u8; 20];
    bytes[12..].copy_from_slice(&(i as u64).to_be_bytes());
    ObjectId::from_bytes(&bytes).unwrap()
}

fn open_store(dir: &TempDir) -> GraphStore {
    let paths = RepoPaths::new(dir.path().to_path_buf());
    std::fs::create_dir_all(paths.marker_dir()).unwrap();
    let mut store =
        GraphStore::with_registry(paths, GraphOptions::memory(), Arc::new(BackendRegistry::new()));
    store.open().unwrap();
    store
}

fn build(store: &GraphStore, parents: &[Vec<usize>]) {
    for (i, picks) in parents.iter().enumerate() {
        let mut seen = HashSet::new();
        let ids: Vec<_> = picks
            .iter()
            .filter(|p| seen.insert(**p))
            .map(|p| commit(*p))
            .collect();
        store.put(&commit(i), &ids).unwrap();
    }
}

/// Fewest hops from `start` to each of its ancestors (inclusive),
/// computed directly on the input.
fn distances(parents: &[Vec<usize>], start: usize) -> HashMap<usize, usize> {
    let mut hops = HashMap::from([(start, 0)]);
    let mut queue = VecDeque::from([start]);
    while let Some(next) = queue.pop_front() {
        let here = hops[&next];
        for parent in &parents[next] {
            if !hops.contains_key(parent) {
                hops.insert(*parent, here + 1);
                queue.push_back(*parent);
            }
        }
    }
    hops
}

fn ancestors(parents: &[Vec<usize>], start: usize) -> HashSet<usize> {
    distances(parents, start).into_keys().collect()
}

// =============================================================================
// Identifier properties
// =============================================================================

proptest! {
    #[test]
    fn hex_roundtrip(id in object_id()) {
        let hex = id.to_hex();
        prop_assert_eq!(hex.len(), 40);
        prop_assert_eq!(ObjectId::new(&hex).unwrap(), id);
        prop_assert_eq!(ObjectId::new(hex.to_uppercase()).unwrap(), id);
    }

    #[test]
    fn ordering_matches_bytes(a in object_id(), b in object_id()) {
        prop_assert_eq!(a.cmp(&b), a.as_bytes().cmp(b.as_bytes()));
        prop_assert_eq!(a.cmp(&b), a.to_hex().cmp(&b.to_hex()));
    }

    #[test]
    fn wrong_length_rejected(len in 0usize..80) {
        prop_assume!(len != 40);
        let text = "a".repeat(len);
        prop_assert!(ObjectId::new(&text).is_err());
    }
}

// =============================================================================
// Graph properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn merge_base_is_a_nearest_common_ancestor(
        parents in dag(),
        picks in (any::<prop::sample::Index>(), any::<prop::sample::Index>()),
    ) {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        build(&store, &parents);

        let left = picks.0.index(parents.len());
        let right = picks.1.index(parents.len());
        let from_left = distances(&parents, left);
        let from_right = distances(&parents, right);
        let combined: HashMap<usize, usize> = from_left
            .iter()
            .filter_map(|(i, dl)| Some((*i, dl + from_right.get(i)?)))
            .collect();

        let base = store
            .ancestry()
            .find_common_ancestor(&commit(left), &commit(right))
            .unwrap();
        match base {
            Some(base) => {
                let index = (0..parents.len()).find(|i| commit(*i) == base).unwrap();
                prop_assert!(combined.contains_key(&index));
                let nearest = combined.values().copied().min().unwrap();
                prop_assert_eq!(combined[&index], nearest);
            }
            None => prop_assert!(combined.is_empty()),
        }
    }

    #[test]
    fn is_ancestor_matches_reachability(
        parents in dag(),
        picks in (any::<prop::sample::Index>(), any::<prop::sample::Index>()),
    ) {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        build(&store, &parents);

        let candidate = picks.0.index(parents.len());
        let descendant = picks.1.index(parents.len());
        let expected = ancestors(&parents, descendant).contains(&candidate);
        let actual = store
            .ancestry()
            .is_ancestor(&commit(candidate), &commit(descendant))
            .unwrap();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn put_twice_changes_nothing(parents in dag()) {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        build(&store, &parents);

        let before: Vec<_> = (0..parents.len())
            .map(|i| (store.get_parents(&commit(i)).unwrap(), store.get_children(&commit(i)).unwrap()))
            .collect();
        for (i, picks) in parents.iter().enumerate() {
            let mut seen = HashSet::new();
            let ids: Vec<_> = picks.iter().filter(|p| seen.insert(**p)).map(|p| commit(*p)).collect();
            prop_assert!(!store.put(&commit(i), &ids).unwrap());
        }
        let after: Vec<_> = (0..parents.len())
            .map(|i| (store.get_parents(&commit(i)).unwrap(), store.get_children(&commit(i)).unwrap()))
            .collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn graphs_built_forward_verify_clean(parents in dag()) {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        build(&store, &parents);
        let report = store.verify().unwrap();
        prop_assert!(report.is_ok());
        prop_assert_eq!(report.stats.commits, parents.len());
    }
}
