//! strata - commit ancestry graph and merge-base engine
//!
//! strata records which commit is an ancestor of which for a versioned
//! data repository, and answers ancestry queries without replaying full
//! commit history: parents, children, depth to the nearest root, ancestor
//! tests and merge bases. Sparse (shallow or filtered) histories are
//! supported through per-commit mappings onto the full history.
//!
//! # Architecture
//!
//! - [`core`] - Identifiers, repository layout, configuration, locking
//! - [`graph`] - Graph store, shared backends, ancestry engine
//! - [`cli`] - Command-line interface over the graph store
//! - [`ui`] - Console output
//!
//! # Correctness Invariants
//!
//! 1. Every store operation is all-or-nothing
//! 2. One backend per storage location per process, torn down by the last close
//! 3. Traversals terminate on any input and report cycles instead of looping
//! 4. Merge-base results are deterministic for identical graphs

pub mod cli;
pub mod core;
pub mod graph;
pub mod ui;
