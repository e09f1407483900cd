//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the repository's graph store through the [`Context`]
//! 2. Takes the repository lock if it mutates the graph
//! 3. Calls the store or the ancestry engine
//! 4. Formats and displays output
//!
//! Handlers return [`Outcome::NoResult`] for queries without an answer;
//! failures are errors.

mod completion;
mod config_cmd;
mod init;
mod log_cmd;
mod maintenance;
mod merge_base;
mod record;
mod relationships;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use config_cmd::config;
pub use init::init;
pub use log_cmd::log;
pub use maintenance::{truncate, verify};
pub use merge_base::{is_ancestor, merge_base};
pub use record::{import, map, mark_sparse, parse_line, put};
pub use relationships::{children, depth, mapping, parents};

use crate::cli::args::Command;
use crate::cli::{Context, Outcome};
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<Outcome> {
    match command {
        Command::Init => init(ctx),

        // Recording
        Command::Put { commit, parents } => put(ctx, &commit, &parents),
        Command::Import { file } => import(ctx, file.as_deref()),
        Command::Map { mapped, original } => map(ctx, &mapped, &original),
        Command::MarkSparse { commit } => mark_sparse(ctx, &commit),

        // Queries
        Command::Parents { commit } => parents(ctx, &commit),
        Command::Children { commit } => children(ctx, &commit),
        Command::Depth { commit } => depth(ctx, &commit),
        Command::Mapping { commit } => mapping(ctx, &commit),
        Command::MergeBase { left, right } => merge_base(ctx, &left, &right),
        Command::IsAncestor { candidate, commit } => is_ancestor(ctx, &candidate, &commit),
        Command::Log {
            commit,
            max_count,
            json,
        } => log(ctx, &commit, max_count, json),

        // Maintenance
        Command::Verify { json } => verify(ctx, json),
        Command::Truncate { force } => truncate(ctx, force),

        // Configuration
        Command::Config { path } => config(ctx, path),
        Command::Completion { shell } => completion(shell),
    }
}
