//! Identifiers for users and relationship edges
//!
//! Both are UUIDv7 values held as a raw `u128`, which gives:
//! - Chronological sortability (an edge id created later compares greater)
//! - 128-bit uniqueness without coordination
//! - A canonical 36-character string form for logs and the CLI

use crate::RelationshipError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(into = "String", try_from = "String")]
        pub struct $name(u128);

        impl $name {
            /// Generate a new UUIDv7-based identifier
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7().as_u128())
            }

            /// Create an identifier from a raw u128 value
            ///
            /// This is primarily for storage layer deserialization.
            pub const fn from_value(value: u128) -> Self {
                Self(value)
            }

            /// Parse an identifier from its UUID string form
            pub fn parse(s: &str) -> Result<Self, RelationshipError> {
                uuid::Uuid::parse_str(s.trim())
                    .map(|u| Self(u.as_u128()))
                    .map_err(|e| RelationshipError::Invalid(format!("invalid {} '{}': {}", $label, s, e)))
            }

            /// Get the raw u128 value
            pub const fn value(&self) -> u128 {
                self.0
            }

            /// Big-endian byte form used as the storage key
            pub fn to_bytes(&self) -> [u8; 16] {
                self.0.to_be_bytes()
            }

            /// Inverse of [`Self::to_bytes`]
            pub fn from_bytes(bytes: &[u8]) -> Result<Self, RelationshipError> {
                let arr: [u8; 16] = bytes.try_into().map_err(|_| {
                    RelationshipError::Invalid(format!(
                        "expected 16 bytes for {}, got {}",
                        $label,
                        bytes.len()
                    ))
                })?;
                Ok(Self(u128::from_be_bytes(arr)))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", uuid::Uuid::from_u128(self.0))
            }
        }

        impl FromStr for $name {
            type Err = RelationshipError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }

        impl TryFrom<String> for $name {
            type Error = RelationshipError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }
    };
}

define_id!(
    /// Stable, immutable identifier of a user profile
    UserId,
    "user id"
);

define_id!(
    /// Identifier of a relationship edge
    EdgeId,
    "edge id"
);
