//! put, import, map and mark-sparse commands - Graph mutations
//!
//! Every handler here holds the repository lock while it writes.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::cli::{Context, Outcome};
use crate::core::ops::RepoLock;
use crate::core::types::{ObjectId, TypeError};
use crate::graph::GraphStore;
use crate::ui::output;
use anyhow::{bail, Context as _, Result};

fn lock(store: &GraphStore) -> Result<RepoLock> {
    RepoLock::acquire(store.paths()).context("Failed to lock the repository")
}

/// Record one commit with its parents.
pub fn put(ctx: &Context, commit: &ObjectId, parents: &[ObjectId]) -> Result<Outcome> {
    let store = ctx.open_store()?;
    let _lock = lock(&store)?;

    let updated = store
        .put(commit, parents)
        .with_context(|| format!("Failed to record {commit}"))?;
    if !updated {
        output::debug(format!("{commit} already recorded"), ctx.verbosity());
    }
    Ok(Outcome::Done)
}

/// Split one `rev-list --parents` line into a commit and its parents.
///
/// Returns `Ok(None)` for blank lines and `#` comments.
///
/// # Example
///
/// ```
/// use strata::cli::commands::parse_line;
///
/// let line = "2222222222222222222222222222222222222222 1111111111111111111111111111111111111111";
/// let (commit, parents) = parse_line(line).unwrap().unwrap();
/// assert_eq!(parents.len(), 1);
/// assert!(parse_line("  # comment").unwrap().is_none());
/// ```
pub fn parse_line(line: &str) -> Result<Option<(ObjectId, Vec<ObjectId>)>, TypeError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut ids = line.split_whitespace().map(ObjectId::new);
    let Some(commit) = ids.next().transpose()? else {
        return Ok(None);
    };
    let parents = ids.collect::<Result<Vec<_>, _>>()?;
    Ok(Some((commit, parents)))
}

/// Record commits from a file or standard input.
///
/// Lines that were already fully recorded are counted separately from
/// lines that added edges.
pub fn import(ctx: &Context, file: Option<&Path>) -> Result<Outcome> {
    let store = ctx.open_store()?;
    let _lock = lock(&store)?;

    let reader: Box<dyn BufRead> = match file {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut added = 0usize;
    let mut seen = 0usize;
    for (index, line) in reader.lines().enumerate() {
        let number = index + 1;
        let line = line.with_context(|| format!("Failed to read line {number}"))?;
        let Some((commit, parents)) =
            parse_line(&line).with_context(|| format!("Malformed input on line {number}"))?
        else {
            continue;
        };
        seen += 1;
        if store
            .put(&commit, &parents)
            .with_context(|| format!("Failed to record line {number}"))?
        {
            added += 1;
        }
    }

    if seen == 0 {
        bail!("No commits found in input");
    }
    output::success(
        format!("Recorded {added} of {seen} commits ({} already present)", seen - added),
        ctx.verbosity(),
    );
    Ok(Outcome::Done)
}

/// Point `mapped` at `original`.
pub fn map(ctx: &Context, mapped: &ObjectId, original: &ObjectId) -> Result<Outcome> {
    let store = ctx.open_store()?;
    let _lock = lock(&store)?;

    store
        .map(mapped, original)
        .with_context(|| format!("Failed to map {mapped} to {original}"))?;
    Ok(Outcome::Done)
}

/// Flag a recorded commit as sparse.
pub fn mark_sparse(ctx: &Context, commit: &ObjectId) -> Result<Outcome> {
    let store = ctx.open_store()?;
    let _lock = lock(&store)?;

    if !store.mark_sparse(commit)? {
        bail!("Could not mark {commit} as sparse (unknown commit or write failure)");
    }
    Ok(Outcome::Done)
}
