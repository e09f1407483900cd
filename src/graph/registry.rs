//! graph::registry
//!
//! Process-wide table of open backends, one per storage location.
//!
//! # Invariants
//!
//! - At most one live backend per location key
//! - The count for a key equals opens minus closes across all handles
//! - A backend is shut down exactly when its count reaches zero
//!
//! All bookkeeping happens under a single mutex, so two threads opening the
//! same location at once construct the backend only once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::backend::GraphBackend;
use super::{BackendKind, Result};

#[derive(Debug)]
struct ServiceEntry {
    backend: Arc<dyn GraphBackend>,
    refs: usize,
}

/// Reference-counted backends keyed by location.
#[derive(Debug, Default)]
pub struct BackendRegistry {
    services: Mutex<HashMap<PathBuf, ServiceEntry>>,
}

impl BackendRegistry {
    /// An empty registry. Tests use their own; the CLI uses [`global`].
    ///
    /// [`global`]: BackendRegistry::global
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every store in this process.
    pub fn global() -> Arc<BackendRegistry> {
        static GLOBAL: OnceLock<Arc<BackendRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(BackendRegistry::new())))
    }

    /// Take a reference to the backend for `location`, constructing it with
    /// `open` if this is the first reference.
    ///
    /// If `open` fails nothing is recorded.
    pub fn acquire<F>(
        &self,
        location: &Path,
        kind: BackendKind,
        open: F,
    ) -> Result<Arc<dyn GraphBackend>>
    where
        F: FnOnce() -> Result<Arc<dyn GraphBackend>>,
    {
        let mut services = self.services.lock();
        if let Some(entry) = services.get_mut(location) {
            entry.refs += 1;
            if entry.backend.kind() != kind {
                warn!(
                    location = %location.display(),
                    open = %entry.backend.kind(),
                    requested = %kind,
                    "graph.registry.kind_mismatch"
                );
            }
            debug!(location = %location.display(), refs = entry.refs, "graph.registry.acquire");
            return Ok(Arc::clone(&entry.backend));
        }

        let backend = open()?;
        services.insert(
            location.to_path_buf(),
            ServiceEntry {
                backend: Arc::clone(&backend),
                refs: 1,
            },
        );
        debug!(location = %location.display(), backend = %kind, "graph.registry.create");
        Ok(backend)
    }

    /// Drop one reference to `location`.
    ///
    /// Returns true if this was the last reference, in which case the
    /// backend has been shut down and forgotten. Releasing an unknown
    /// location is a no-op returning false.
    pub fn release(&self, location: &Path) -> Result<bool> {
        let mut services = self.services.lock();
        let Some(entry) = services.get_mut(location) else {
            return Ok(false);
        };
        entry.refs -= 1;
        debug!(location = %location.display(), refs = entry.refs, "graph.registry.release");
        if entry.refs > 0 {
            return Ok(false);
        }

        if let Some(entry) = services.remove(location) {
            entry.backend.shutdown()?;
            debug!(location = %location.display(), "graph.backend.shutdown");
        }
        Ok(true)
    }

    /// Current reference count for `location` (0 if not open).
    pub fn ref_count(&self, location: &Path) -> usize {
        self.services
            .lock()
            .get(location)
            .map_or(0, |entry| entry.refs)
    }

    /// Number of open locations.
    pub fn len(&self) -> usize {
        self.services.lock().len()
    }

    /// Whether no location is open.
    pub fn is_empty(&self) -> bool {
        self.services.lock().is_empty()
    }
}
