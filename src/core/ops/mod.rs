//! core::ops
//!
//! Cross-process coordination for mutating commands.
//!
//! # Modules
//!
//! - [`lock`] - Exclusive repository lock
//!
//! # Architecture
//!
//! Every mutating command acquires the exclusive repo lock before opening the
//! graph store and holds it until the store is closed. Read-only commands do
//! not take the lock; the graph store's own transactions keep them consistent.

pub mod lock;

pub use lock::{LockError, RepoLock};
