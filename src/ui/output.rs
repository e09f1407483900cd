//! ui::output
//!
//! Console output for command handlers.
//!
//! # Design
//!
//! Command results (identifiers, depths, listings) go to stdout so they can
//! be piped. Diagnostics go to stderr. `--quiet` silences everything except
//! results and errors.

use std::fmt::Display;

use crate::core::types::ObjectId;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Results and errors only
    Quiet,
    /// Results plus confirmations and warnings
    Normal,
    /// Everything, including `[debug]` notes
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags. `--quiet` wins over `--debug`.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print an informational line on stdout (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug note on stderr (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error on stderr (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning on stderr (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a confirmation on stdout (respects quiet mode).
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Abbreviated identifiers separated by spaces.
pub fn short_ids(ids: &[ObjectId], len: usize) -> String {
    ids.iter()
        .map(|id| id.short(len))
        .collect::<Vec<_>>()
        .join(" ")
}
