//! log command - List a commit and its ancestors

use serde::Serialize;

use crate::cli::{Context, Outcome};
use crate::core::types::ObjectId;
use crate::graph::Direction;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// One listed commit, as printed by `--json`.
#[derive(Debug, Serialize)]
struct LogEntry {
    id: ObjectId,
    parents: Vec<ObjectId>,
    sparse: bool,
}

/// List `commit` and its ancestors breadth-first.
///
/// Text output is one line per commit: the identifier, its parents'
/// short forms, and `(sparse)` for sparse commits.
pub fn log(ctx: &Context, commit: &ObjectId, max_count: Option<usize>, json: bool) -> Result<Outcome> {
    let store = ctx.open_store()?;
    let walk = store
        .walk_ancestors(commit, max_count)
        .with_context(|| format!("Cannot list history of {commit}"))?;

    let mut entries = Vec::new();
    for node in walk {
        let node = node?;
        entries.push(LogEntry {
            id: node.identifier(),
            parents: node.edges(Direction::Out)?.map(|edge| edge.head).collect(),
            sparse: node.is_sparse()?,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(Outcome::Done);
    }

    for entry in &entries {
        let mut line = entry.id.to_string();
        if !entry.parents.is_empty() {
            line.push_str(" <- ");
            line.push_str(&output::short_ids(&entry.parents, 10));
        }
        if entry.sparse {
            line.push_str(" (sparse)");
        }
        println!("{}", line);
    }
    Ok(Outcome::Done)
}
