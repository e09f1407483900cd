//! verify and truncate commands - Whole-graph maintenance

use crate::cli::{Context, Outcome, UsageError};
use crate::core::ops::RepoLock;
use crate::graph::GraphError;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Check the graph for cycles and print its size.
///
/// A cycle is reported as an error so the command exits non-zero.
pub fn verify(ctx: &Context, json: bool) -> Result<Outcome> {
    let store = ctx.open_store()?;
    let report = store.verify().context("Failed to verify the commit graph")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print(format!("commits: {}", report.stats.commits), ctx.verbosity());
        output::print(
            format!("parent edges: {}", report.stats.parent_edges),
            ctx.verbosity(),
        );
    }

    match report.cycle {
        Some(id) => Err(GraphError::Cycle { id }.into()),
        None => {
            if !json {
                output::success("ok", ctx.verbosity());
            }
            Ok(Outcome::Done)
        }
    }
}

/// Remove every commit from the graph.
pub fn truncate(ctx: &Context, force: bool) -> Result<Outcome> {
    if !force {
        return Err(UsageError("Refusing to truncate the commit graph without --force".into()).into());
    }

    let store = ctx.open_store()?;
    let _lock = RepoLock::acquire(store.paths()).context("Failed to lock the repository")?;
    let before = store.node_count()?;
    store.truncate().context("Failed to truncate the commit graph")?;

    output::success(format!("Removed {before} commits"), ctx.verbosity());
    Ok(Outcome::Done)
}
