//! Integration tests for the commit graph store.
//!
//! Every scenario runs against both backends through the public API.

use std::sync::Arc;

use tempfile::TempDir;

use strata::core::paths::RepoPaths;
use strata::core::types::ObjectId;
use strata::graph::{BackendKind, BackendRegistry, GraphError, GraphOptions, GraphStore, SPARSE_FLAG};

// =============================================================================
// Test Fixtures
// =============================================================================

/// A scratch repository with its own backend registry.
struct TestRepo {
    dir: TempDir,
    registry: Arc<BackendRegistry>,
}

impl TestRepo {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        std::fs::create_dir_all(dir.path().join(".strata")).expect("failed to create marker");
        Self {
            dir,
            registry: Arc::new(BackendRegistry::new()),
        }
    }

    fn paths(&self) -> RepoPaths {
        RepoPaths::new(self.dir.path().to_path_buf())
    }

    fn store(&self, backend: BackendKind) -> GraphStore {
        let options = GraphOptions {
            backend,
            ..GraphOptions::default()
        };
        let mut store = GraphStore::with_registry(self.paths(), options, Arc::clone(&self.registry));
        store.open().expect("failed to open store");
        store
    }
}

fn id(n: u8) -> ObjectId {
    ObjectId::from_bytes(&[n; 20]).unwrap()
}

const BACKENDS: [BackendKind; 2] = [BackendKind::Memory, BackendKind::Sqlite];

// =============================================================================
// Recording
// =============================================================================

#[test]
fn exists_only_after_put() {
    for backend in BACKENDS {
        let repo = TestRepo::new();
        let store = repo.store(backend);

        assert!(!store.exists(&id(1)).unwrap());
        store.put(&id(1), &[]).unwrap();
        assert!(store.exists(&id(1)).unwrap());
    }
}

#[test]
fn put_is_idempotent() {
    for backend in BACKENDS {
        let repo = TestRepo::new();
        let store = repo.store(backend);

        assert!(store.put(&id(1), &[]).unwrap());
        assert!(store.put(&id(2), &[id(1)]).unwrap());
        assert!(!store.put(&id(2), &[id(1)]).unwrap(), "{backend}");

        assert_eq!(store.get_parents(&id(2)).unwrap(), vec![id(1)]);
        assert_eq!(store.get_children(&id(1)).unwrap(), vec![id(2)]);
    }
}

#[test]
fn put_creates_parent_nodes_lazily() {
    for backend in BACKENDS {
        let repo = TestRepo::new();
        let store = repo.store(backend);

        store.put(&id(3), &[id(1), id(2)]).unwrap();
        assert!(store.exists(&id(1)).unwrap());
        assert!(store.exists(&id(2)).unwrap());
        assert_eq!(store.get_parents(&id(3)).unwrap(), vec![id(1), id(2)]);
        assert!(store.get_parents(&id(1)).unwrap().is_empty());
    }
}

#[test]
fn unknown_commits_have_no_relations() {
    for backend in BACKENDS {
        let repo = TestRepo::new();
        let store = repo.store(backend);

        assert!(store.get_parents(&id(9)).unwrap().is_empty());
        assert!(store.get_children(&id(9)).unwrap().is_empty());
        assert_eq!(store.get_depth(&id(9)).unwrap(), 0);
        assert_eq!(store.get_mapping(&id(9)).unwrap(), ObjectId::NULL);
    }
}

// =============================================================================
// Depth
// =============================================================================

#[test]
fn depth_of_branching_history() {
    for backend in BACKENDS {
        let repo = TestRepo::new();
        let store = repo.store(backend);

        // C1 <- C2 <- C3, C1 <- C4
        store.put(&id(1), &[]).unwrap();
        store.put(&id(2), &[id(1)]).unwrap();
        store.put(&id(3), &[id(2)]).unwrap();
        store.put(&id(4), &[id(1)]).unwrap();

        assert_eq!(store.get_depth(&id(3)).unwrap(), 2);
        assert_eq!(store.get_depth(&id(4)).unwrap(), 1);
        assert_eq!(store.get_depth(&id(1)).unwrap(), 0);
    }
}

#[test]
fn depth_uses_shortest_route() {
    for backend in BACKENDS {
        let repo = TestRepo::new();
        let store = repo.store(backend);

        // long first-parent chain, short second-parent route
        store.put(&id(1), &[]).unwrap();
        for n in 2..=6 {
            store.put(&id(n), &[id(n - 1)]).unwrap();
        }
        store.put(&id(10), &[id(2)]).unwrap();
        store.put(&id(11), &[id(6), id(10)]).unwrap();

        assert_eq!(store.get_depth(&id(6)).unwrap(), 5);
        assert_eq!(store.get_depth(&id(11)).unwrap(), 3);
    }
}

// =============================================================================
// Mapping and properties
// =============================================================================

#[test]
fn mapping_replaces() {
    for backend in BACKENDS {
        let repo = TestRepo::new();
        let store = repo.store(backend);

        store.map(&id(1), &id(2)).unwrap();
        assert!(store.exists(&id(1)).unwrap());
        assert!(store.exists(&id(2)).unwrap());
        assert_eq!(store.get_mapping(&id(1)).unwrap(), id(2));

        store.map(&id(1), &id(3)).unwrap();
        assert_eq!(store.get_mapping(&id(1)).unwrap(), id(3));
        assert_eq!(store.get_mapping(&id(2)).unwrap(), ObjectId::NULL);
    }
}

#[test]
fn sparse_flag_through_node_view() {
    for backend in BACKENDS {
        let repo = TestRepo::new();
        let store = repo.store(backend);

        store.put(&id(1), &[]).unwrap();
        assert!(!store.get_node(&id(1)).unwrap().is_sparse().unwrap());
        assert!(store.mark_sparse(&id(1)).unwrap());
        assert!(store.get_node(&id(1)).unwrap().is_sparse().unwrap());
        assert_eq!(
            store.property(&id(1), SPARSE_FLAG).unwrap().as_deref(),
            Some("true")
        );
    }
}

// =============================================================================
// Truncate
// =============================================================================

#[test]
fn truncate_forgets_everything() {
    for backend in BACKENDS {
        let repo = TestRepo::new();
        let store = repo.store(backend);

        store.put(&id(1), &[]).unwrap();
        store.put(&id(2), &[id(1)]).unwrap();
        store.map(&id(2), &id(1)).unwrap();
        store.truncate().unwrap();

        assert!(!store.exists(&id(1)).unwrap());
        assert_eq!(store.get_depth(&id(2)).unwrap(), 0);
        assert_eq!(store.get_mapping(&id(2)).unwrap(), ObjectId::NULL);
        assert_eq!(store.node_count().unwrap(), 0);

        // still usable
        assert!(store.put(&id(1), &[]).unwrap());
    }
}

// =============================================================================
// Persistence and verification
// =============================================================================

#[test]
fn sqlite_graph_survives_reopen() {
    let repo = TestRepo::new();
    {
        let store = repo.store(BackendKind::Sqlite);
        store.put(&id(1), &[]).unwrap();
        store.put(&id(2), &[id(1)]).unwrap();
    }
    assert!(repo.registry.is_empty());
    assert!(repo.paths().graph_db_path().exists());

    let store = repo.store(BackendKind::Sqlite);
    assert_eq!(store.get_parents(&id(2)).unwrap(), vec![id(1)]);
    assert!(!store.put(&id(1), &[]).unwrap());
}

#[test]
fn memory_graph_is_discarded_at_last_close() {
    let repo = TestRepo::new();
    {
        let store = repo.store(BackendKind::Memory);
        store.put(&id(1), &[]).unwrap();
    }
    let store = repo.store(BackendKind::Memory);
    assert!(!store.exists(&id(1)).unwrap());
}

#[test]
fn verify_reports_stats_and_cycles() {
    for backend in BACKENDS {
        let repo = TestRepo::new();
        let store = repo.store(backend);

        store.put(&id(1), &[]).unwrap();
        store.put(&id(2), &[id(1)]).unwrap();
        store.put(&id(3), &[id(2), id(1)]).unwrap();
        let report = store.verify().unwrap();
        assert!(report.is_ok());
        assert_eq!(report.stats.commits, 3);
        assert_eq!(report.stats.parent_edges, 3);

        // 5 -> 4 recorded first, then 4 -> 5 closes a loop
        store.put(&id(5), &[id(4)]).unwrap();
        store.put(&id(4), &[id(5)]).unwrap();
        let report = store.verify().unwrap();
        assert!(!report.is_ok());
    }
}

#[test]
fn open_outside_repository_fails() {
    let dir = TempDir::new().unwrap();
    let mut store = GraphStore::with_registry(
        RepoPaths::new(dir.path().to_path_buf()),
        GraphOptions::default(),
        Arc::new(BackendRegistry::new()),
    );
    assert!(matches!(
        store.open(),
        Err(GraphError::NotARepository { .. })
    ));
    assert!(matches!(store.exists(&id(1)), Err(GraphError::StoreClosed)));
}

#[test]
fn open_creates_graph_directory() {
    let repo = TestRepo::new();
    assert!(!repo.paths().graph_dir().exists());
    let store = repo.store(BackendKind::Sqlite);
    assert!(repo.paths().graph_dir().is_dir());
    assert!(store.to_string().contains("backend: sqlite"));
}
