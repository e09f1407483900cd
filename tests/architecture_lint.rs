//! Architecture enforcement tests.
//!
//! Graph semantics (lazy node creation, edge rules, traversals) live in
//! `GraphStore` and are written once against the backend transaction
//! traits. These tests keep the layers apart:
//!
//! 1. **Command isolation** - command handlers go through `GraphStore`,
//!    never through backends or transaction scopes
//! 2. **Graph independence** - `src/graph` does not reach into the CLI,
//!    the UI or configuration files
//! 3. **Write locking** - handlers that mutate the graph hold the
//!    repository lock

use std::fs;
use std::path::{Path, PathBuf};

/// Names a command handler must not mention.
const BACKEND_INTERNALS: &[&str] = &[
    "ReadTxn",
    "WriteTxn",
    "GraphBackend",
    "MemoryBackend",
    "SqliteBackend",
    "graph::backend",
    "graph::memory",
    "graph::sqlite",
    "rusqlite",
];

/// Imports the graph layer must not use.
const GRAPH_FORBIDDEN_IMPORTS: &[&str] = &[
    "crate::cli",
    "crate::ui",
    "crate::core::config",
    "crate::core::ops",
    "anyhow",
    "clap",
];

/// Handlers that mutate the graph.
const MUTATING_HANDLERS: &[&str] = &["record.rs", "maintenance.rs"];

fn rust_files(dir: &str) -> Vec<PathBuf> {
    let mut files: Vec<_> = fs::read_dir(Path::new(dir))
        .unwrap_or_else(|_| panic!("Failed to read {}", dir))
        .map(|entry| entry.expect("Failed to read entry").path())
        .filter(|path| path.extension().map(|e| e == "rs").unwrap_or(false))
        .collect();
    files.sort();
    files
}

/// Source text with `#[cfg(test)]` modules cut off.
fn production_source(path: &Path) -> String {
    let content =
        fs::read_to_string(path).unwrap_or_else(|_| panic!("Failed to read {}", path.display()));
    match content.find("#[cfg(test)]") {
        Some(at) => content[..at].to_string(),
        None => content,
    }
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

// =============================================================================
// Command isolation
// =============================================================================

#[test]
fn commands_do_not_touch_backends() {
    let mut violations = Vec::new();

    for path in rust_files("src/cli/commands") {
        let content = production_source(&path);
        for name in BACKEND_INTERNALS {
            if content.contains(name) {
                violations.push(format!("{}: mentions {}", file_name(&path), name));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Command handlers must use GraphStore instead of backends:\n{}",
        violations.join("\n")
    );
}

// =============================================================================
// Graph independence
// =============================================================================

#[test]
fn graph_layer_stays_below_cli() {
    let mut violations = Vec::new();

    for path in rust_files("src/graph") {
        let content = production_source(&path);
        for line in content.lines().filter(|l| l.trim_start().starts_with("use ")) {
            for forbidden in GRAPH_FORBIDDEN_IMPORTS {
                if line.contains(forbidden) {
                    violations.push(format!("{}: {}", file_name(&path), line.trim()));
                }
            }
        }
    }

    assert!(
        violations.is_empty(),
        "src/graph must not depend on the CLI layer:\n{}",
        violations.join("\n")
    );
}

// =============================================================================
// Write locking
// =============================================================================

#[test]
fn mutating_handlers_take_repo_lock() {
    for name in MUTATING_HANDLERS {
        let path = Path::new("src/cli/commands").join(name);
        let content = production_source(&path);
        assert!(
            content.contains("RepoLock::acquire"),
            "{} mutates the graph but never acquires RepoLock",
            name
        );
    }
}

#[test]
fn read_only_handlers_do_not_lock() {
    for name in ["relationships.rs", "merge_base.rs", "log_cmd.rs"] {
        let path = Path::new("src/cli/commands").join(name);
        let content = production_source(&path);
        assert!(
            !content.contains("RepoLock"),
            "{} only reads and should not block writers",
            name
        );
    }
}
