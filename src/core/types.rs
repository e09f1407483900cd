//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ObjectId`] - Fixed-width content identifier for commits, trees and features
//!
//! # Validation
//!
//! Identifiers are validated at construction time. A value that does not decode
//! to exactly [`ObjectId::LEN`] bytes cannot be represented.
//!
//! # Examples
//!
//! ```
//! use strata::core::types::ObjectId;
//!
//! let id = ObjectId::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
//! assert_eq!(id.to_string(), "abc123def4567890abc123def4567890abc12345");
//!
//! assert!(ObjectId::new("not-a-sha").is_err());
//! assert!(ObjectId::NULL.is_null());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("malformed identifier '{input}': {reason}")]
    MalformedIdentifier { input: String, reason: String },
}

impl TypeError {
    fn malformed(input: &str, reason: impl Into<String>) -> Self {
        TypeError::MalformedIdentifier {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// A content identifier naming a commit, tree or feature.
///
/// Equality and ordering are byte-wise, most significant byte first, so sets
/// of identifiers iterate in a stable order. The textual form is lowercase hex.
///
/// # Example
///
/// ```
/// use strata::core::types::ObjectId;
///
/// let low = ObjectId::from_bytes(&[0x01; 20]).unwrap();
/// let high = ObjectId::from_bytes(&[0xfe; 20]).unwrap();
/// assert!(low < high);
/// assert_eq!(low.short(7), "0101010");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId([u8; ObjectId::LEN]);

impl ObjectId {
    /// Width of an identifier in bytes.
    pub const LEN: usize = 20;

    /// The absent identifier (all zero bytes).
    pub const NULL: ObjectId = ObjectId([0; ObjectId::LEN]);

    /// Decode an identifier from its hex text.
    ///
    /// Upper-case hex is accepted and normalized.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::MalformedIdentifier` if the text is not hex or does not
    /// decode to exactly [`ObjectId::LEN`] bytes.
    pub fn new(text: impl AsRef<str>) -> Result<Self, TypeError> {
        let text = text.as_ref();
        if text.len() != Self::LEN * 2 {
            return Err(TypeError::malformed(
                text,
                format!("expected {} hex characters, got {}", Self::LEN * 2, text.len()),
            ));
        }
        let mut bytes = [0u8; Self::LEN];
        hex::decode_to_slice(text, &mut bytes)
            .map_err(|e| TypeError::malformed(text, e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Build an identifier from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::MalformedIdentifier` if `bytes` is not exactly
    /// [`ObjectId::LEN`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        let raw: [u8; Self::LEN] = bytes.try_into().map_err(|_| {
            TypeError::malformed(
                &hex::encode(bytes),
                format!("expected {} bytes, got {}", Self::LEN, bytes.len()),
            )
        })?;
        Ok(Self(raw))
    }

    /// Check if this is the [`ObjectId::NULL`] sentinel.
    pub fn is_null(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Raw bytes of the identifier.
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get an abbreviated hex form.
    ///
    /// Returns the first `len` hex characters, or the full form if `len` is larger.
    pub fn short(&self, len: usize) -> String {
        let mut full = self.to_hex();
        full.truncate(len);
        full
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.to_hex()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short(10))
    }
}
