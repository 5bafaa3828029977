//! Vigil Friendship
//!
//! Relationship lifecycle and per-user friendship views on top of a
//! [`RelationshipStore`](vigil_domain::traits::RelationshipStore).
//!
//! # Overview
//!
//! This crate is responsible for:
//! - **Lifecycle**: sending, accepting and rejecting requests, removing friends
//! - **Views**: caching each viewpoint's classification and refreshing it
//!   without overlapping or lost updates
//! - **Change following**: invalidating views when the store reports edits
//!   made by someone else
//! - **Metrics collection**: counting transitions, refreshes and failures
//!
//! # State machine
//!
//! | From | Operation | To |
//! |------|-----------|----|
//! | no relationship | `send_request(a, b)` | pending from `a` |
//! | pending from `a` | `accept_request(edge, b)` | accepted |
//! | pending from `a` | `reject_request(edge, b)` | no relationship |
//! | accepted | `remove_friend(a, b)` | no relationship |
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use vigil_friendship::{FriendshipConfig, FriendshipService};
//! use vigil_store::SqliteStore;
//! # use vigil_domain::UserId;
//!
//! # async fn demo(me: UserId, them: UserId) -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(SqliteStore::new("vigil.db")?);
//! let service = Arc::new(FriendshipService::new(store, FriendshipConfig::default()));
//! let _listener = service.spawn_listener();
//!
//! let request = service.send_friend_request(me, them).await?;
//! service.accept_friend_request(request.id, them).await?;
//!
//! let mine = service.get_classification(me).await?;
//! assert!(mine.friends.iter().any(|p| p.id == them));
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [friendship]
//! rejection_mode = "mark_rejected"   # or "delete"
//! refresh_after_mutation = true
//! listen_for_changes = true
//! change_debounce_ms = 50
//! refresh_timeout_ms = 10000
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod lifecycle;
mod listener;
mod metrics;
mod service;
mod view;

pub use config::{FriendshipConfig, RejectionMode};
pub use error::ConfigError;
pub use lifecycle::RelationshipManager;
pub use listener::ChangeListener;
pub use metrics::FriendshipMetrics;
pub use service::FriendshipService;
pub use view::{FriendshipView, RefreshOutcome, ViewSnapshot};

pub use vigil_domain::{
    classify, Bucket, ClassificationResult, EdgeId, EdgeStatus, RelationshipEdge, RelationshipError, UserId,
    UserProfile,
};
