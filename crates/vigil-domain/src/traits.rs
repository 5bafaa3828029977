//! Trait definitions for external interactions
//!
//! These traits define the boundary between the friendship logic and the
//! persistence service. Implementations live in other crates (`vigil-store`).

use crate::{EdgeId, EdgeStatus, RelationshipEdge, RelationshipError, UserId, UserProfile};
use async_trait::async_trait;
use std::sync::Arc;

/// What happened to an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A new request was stored
    Created,
    /// The status of an existing edge changed
    Updated,
    /// The edge was removed
    Deleted,
}

/// Notification of a committed edge mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeChange {
    /// Edge that changed
    pub edge_id: EdgeId,
    /// Requester of that edge
    pub requester_id: UserId,
    /// Recipient of that edge
    pub recipient_id: UserId,
    /// Kind of mutation
    pub kind: ChangeKind,
}

impl EdgeChange {
    /// Describe a mutation of `edge`
    pub fn of(edge: &RelationshipEdge, kind: ChangeKind) -> Self {
        Self {
            edge_id: edge.id,
            requester_id: edge.requester_id,
            recipient_id: edge.recipient_id,
            kind,
        }
    }

    /// Both parties of the changed edge
    pub fn parties(&self) -> [UserId; 2] {
        [self.requester_id, self.recipient_id]
    }
}

/// Callback invoked by a store after each committed edge mutation
pub type ChangeCallback = Arc<dyn Fn(&EdgeChange) + Send + Sync>;

/// Handle returned by [`RelationshipStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

impl Subscription {
    /// Wrap a store-assigned subscription number
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Store-assigned subscription number
    pub const fn id(&self) -> u64 {
        self.0
    }
}

/// Trait for storing and retrieving profiles and relationship edges
///
/// Implemented by the infrastructure layer (vigil-store). Each single-edge
/// write is atomic; no multi-edge transactions are required of implementors.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// All profiles except `excluding`
    async fn list_profiles(&self, excluding: UserId) -> Result<Vec<UserProfile>, RelationshipError>;

    /// Every edge where `user` is requester or recipient
    async fn list_edges_touching(&self, user: UserId) -> Result<Vec<RelationshipEdge>, RelationshipError>;

    /// Store a new pending edge
    ///
    /// Fails with `AlreadyExists` if a non-rejected edge exists for the pair.
    async fn create_edge(
        &self,
        requester: UserId,
        recipient: UserId,
    ) -> Result<RelationshipEdge, RelationshipError>;

    /// Move a pending edge to `status` on behalf of `acting`
    ///
    /// Only pending edges change status; the check and the write happen as one
    /// step, so of two racing callers exactly one succeeds. Fails with
    /// `NotFound` if absent or no longer pending, `NotAuthorized` unless
    /// `acting` is the recipient, and `Invalid` when `status` is pending.
    async fn update_edge_status(
        &self,
        edge: EdgeId,
        status: EdgeStatus,
        acting: UserId,
    ) -> Result<RelationshipEdge, RelationshipError>;

    /// Remove an edge on behalf of `acting`
    ///
    /// Fails with `NotFound` if absent and `NotAuthorized` unless `acting` is
    /// one of the parties.
    async fn delete_edge(&self, edge: EdgeId, acting: UserId) -> Result<(), RelationshipError>;

    /// Remove an edge on behalf of `acting`, but only while it has `status`
    ///
    /// The status check and the delete are one step. Fails with `NotFound`
    /// if absent or in another status. Returns the edge as it was removed.
    async fn delete_edge_in_status(
        &self,
        edge: EdgeId,
        status: EdgeStatus,
        acting: UserId,
    ) -> Result<RelationshipEdge, RelationshipError>;

    /// Register for push notification of edge changes
    ///
    /// Returns `None` when the store cannot push changes.
    fn subscribe(&self, _on_change: ChangeCallback) -> Option<Subscription> {
        None
    }

    /// Stop a subscription; unknown handles are ignored
    fn unsubscribe(&self, _subscription: Subscription) {}
}
