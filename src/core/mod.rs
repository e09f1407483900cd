//! core
//!
//! Core domain types, schemas, and operations for strata.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ObjectId
//! - [`paths`] - Repository discovery and on-disk layout
//! - [`config`] - Configuration schema and loading
//! - [`ops`] - Cross-process repository locking
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Nothing here knows how the graph is stored

pub mod config;
pub mod ops;
pub mod paths;
pub mod types;
