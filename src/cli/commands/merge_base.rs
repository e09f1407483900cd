//! merge-base and is-ancestor commands

use crate::cli::{Context, Outcome};
use crate::core::types::ObjectId;
use crate::graph::GraphError;
use crate::ui::output;
use anyhow::Result;

/// Print a nearest common ancestor of `left` and `right`.
///
/// Disjoint histories are not a failure: the message goes to stderr and
/// the command exits with status 1.
pub fn merge_base(ctx: &Context, left: &ObjectId, right: &ObjectId) -> Result<Outcome> {
    let store = ctx.open_store()?;
    let base = store
        .ancestry()
        .find_common_ancestor(left, right)
        .map_err(describe_unknown)?;

    match base {
        Some(base) => {
            println!("{}", base);
            Ok(Outcome::Done)
        }
        None => {
            output::error("No common ancestor was found.");
            Ok(Outcome::NoResult)
        }
    }
}

/// Exit 0 if `candidate` is an ancestor of `commit`, 1 otherwise.
pub fn is_ancestor(ctx: &Context, candidate: &ObjectId, commit: &ObjectId) -> Result<Outcome> {
    let store = ctx.open_store()?;
    let found = store
        .ancestry()
        .is_ancestor(candidate, commit)
        .map_err(describe_unknown)?;
    Ok(if found {
        Outcome::Done
    } else {
        Outcome::NoResult
    })
}

fn describe_unknown(err: GraphError) -> anyhow::Error {
    match err {
        GraphError::UnknownCommit { id } => anyhow::Error::new(err)
            .context(format!("{id} does not resolve to any recorded commit")),
        other => anyhow::Error::new(other).context("Ancestry query failed"),
    }
}
