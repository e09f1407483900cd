//! ui
//!
//! User-facing console output.
//!
//! # Modules
//!
//! - [`output`] - Verbosity-aware printing
//!
//! All command output goes through this module so that `--quiet` and
//! `--debug` behave the same everywhere.

pub mod output;
