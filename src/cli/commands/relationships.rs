//! parents, children, depth and mapping commands - Simple relationship queries

use crate::cli::{Context, Outcome};
use crate::core::types::ObjectId;
use anyhow::Result;

/// Print parent identifiers, first parent first.
///
/// Outputs nothing (exit 0) for a root or unknown commit.
pub fn parents(ctx: &Context, commit: &ObjectId) -> Result<Outcome> {
    let store = ctx.open_store()?;
    for parent in store.get_parents(commit)? {
        println!("{}", parent);
    }
    Ok(Outcome::Done)
}

/// Print identifiers of commits that name `commit` as a parent.
///
/// Outputs nothing (exit 0) if there are none.
pub fn children(ctx: &Context, commit: &ObjectId) -> Result<Outcome> {
    let store = ctx.open_store()?;
    for child in store.get_children(commit)? {
        println!("{}", child);
    }
    Ok(Outcome::Done)
}

/// Print the distance to the nearest parentless commit.
pub fn depth(ctx: &Context, commit: &ObjectId) -> Result<Outcome> {
    let store = ctx.open_store()?;
    println!("{}", store.get_depth(commit)?);
    Ok(Outcome::Done)
}

/// Print the mapping target, or the all-zero identifier.
pub fn mapping(ctx: &Context, commit: &ObjectId) -> Result<Outcome> {
    let store = ctx.open_store()?;
    println!("{}", store.get_mapping(commit)?);
    Ok(Outcome::Done)
}
