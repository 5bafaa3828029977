//! Vigil Domain Layer
//!
//! Core model of the friendship subsystem: who the users are, the directed
//! relationship edges between them, and how an edge set is classified relative
//! to one viewpoint user. Nothing in here performs I/O; persistence is reached
//! through the [`traits::RelationshipStore`] trait, implemented elsewhere.
//!
//! ## Key Concepts
//!
//! - **Edge**: a directed record (requester → recipient) with a status
//! - **Pair state**: the state machine position of an unordered pair of users
//! - **Viewpoint**: the user relative to whom classification buckets are computed
//! - **Classification**: friends / pending-received / pending-sent / strangers
//!
//! ## Architecture
//!
//! - Pure business logic only
//! - Infrastructure implementations live in other crates (`vigil-store`)
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classification;
pub mod edge;
pub mod error;
pub mod id;
pub mod pair_state;
pub mod profile;
pub mod traits;

// Re-exports for convenience
pub use classification::{classify, Bucket, ClassificationResult};
pub use edge::{EdgeStatus, RelationshipEdge};
pub use error::{ErrorKind, RelationshipError};
pub use id::{EdgeId, UserId};
pub use pair_state::PairState;
pub use profile::UserProfile;
