//! Relationship lifecycle: send, accept, reject, remove
//!
//! Every operation reads a fresh edge snapshot, checks the pair's state
//! machine position, then issues exactly the store mutations it needs. The
//! snapshot check only shapes the error; each mutation carries the status it
//! expects, so the store refuses a write that lost a race with another answer.
//! There are no retries and no optimistic updates; failures go back to the
//! caller.

use crate::metrics::{MetricsRecorder, Transition};
use crate::RejectionMode;
use std::sync::Arc;
use vigil_domain::traits::RelationshipStore;
use vigil_domain::{EdgeId, EdgeStatus, PairState, RelationshipEdge, RelationshipError, UserId};

/// Drives relationship edges through their state machine
///
/// | Operation | Allowed from | Result |
/// |-----------|--------------|--------|
/// | `send_request(from, to)` | no relationship (or rejected) | pending from `from` |
/// | `accept_request(edge, by)` | pending, `by` is recipient | accepted |
/// | `reject_request(edge, by)` | pending, `by` is recipient | no relationship |
/// | `remove_friend(a, b)` | accepted | no relationship |
pub struct RelationshipManager<S: ?Sized> {
    store: Arc<S>,
    rejection_mode: RejectionMode,
    metrics: Arc<MetricsRecorder>,
}

impl<S> RelationshipManager<S>
where
    S: RelationshipStore + ?Sized,
{
    pub(crate) fn new(store: Arc<S>, rejection_mode: RejectionMode, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            store,
            rejection_mode,
            metrics,
        }
    }

    /// How rejections are stored
    pub fn rejection_mode(&self) -> RejectionMode {
        self.rejection_mode
    }

    /// Send a friend request from `from` to `to`
    ///
    /// Fails with `AlreadyExists` when the pair is pending (either direction)
    /// or already friends, and with `Invalid` when `from == to`.
    pub async fn send_request(&self, from: UserId, to: UserId) -> Result<RelationshipEdge, RelationshipError> {
        let result = self.try_send(from, to).await;
        self.observe("send_request", Transition::Sent, result)
    }

    async fn try_send(&self, from: UserId, to: UserId) -> Result<RelationshipEdge, RelationshipError> {
        if from == to {
            return Err(RelationshipError::Invalid("cannot send a friend request to oneself".into()));
        }

        let edges = self.store.list_edges_touching(from).await?;
        match PairState::derive(from, to, &edges) {
            PairState::NoRelationship => {}
            state => {
                tracing::debug!(%from, %to, ?state, "Request refused, pair already related");
                return Err(RelationshipError::AlreadyExists);
            }
        }

        let edge = self.store.create_edge(from, to).await?;
        tracing::info!(edge = %edge.id, %from, %to, "Friend request sent");
        Ok(edge)
    }

    /// Accept the pending request `edge` on behalf of its recipient `by`
    pub async fn accept_request(&self, edge: EdgeId, by: UserId) -> Result<RelationshipEdge, RelationshipError> {
        let result = self.try_accept(edge, by).await;
        self.observe("accept_request", Transition::Accepted, result)
    }

    async fn try_accept(&self, edge: EdgeId, by: UserId) -> Result<RelationshipEdge, RelationshipError> {
        let pending = self.pending_addressed_to(edge, by).await?;
        let accepted = self.store.update_edge_status(pending.id, EdgeStatus::Accepted, by).await?;
        tracing::info!(
            edge = %accepted.id,
            requester = %accepted.requester_id,
            recipient = %accepted.recipient_id,
            "Friend request accepted"
        );
        Ok(accepted)
    }

    /// Reject the pending request `edge` on behalf of its recipient `by`
    ///
    /// Depending on [`RejectionMode`] the edge is marked rejected or deleted;
    /// either way the pair is back to no relationship. Returns the request
    /// with its status set to rejected.
    pub async fn reject_request(&self, edge: EdgeId, by: UserId) -> Result<RelationshipEdge, RelationshipError> {
        let result = self.try_reject(edge, by).await;
        self.observe("reject_request", Transition::Rejected, result)
    }

    async fn try_reject(&self, edge: EdgeId, by: UserId) -> Result<RelationshipEdge, RelationshipError> {
        let pending = self.pending_addressed_to(edge, by).await?;

        let rejected = match self.rejection_mode {
            RejectionMode::MarkRejected => {
                self.store.update_edge_status(pending.id, EdgeStatus::Rejected, by).await?
            }
            RejectionMode::Delete => {
                let removed = self.store.delete_edge_in_status(pending.id, EdgeStatus::Pending, by).await?;
                RelationshipEdge {
                    status: EdgeStatus::Rejected,
                    ..removed
                }
            }
        };

        tracing::info!(
            edge = %rejected.id,
            requester = %rejected.requester_id,
            recipient = %by,
            mode = ?self.rejection_mode,
            "Friend request rejected"
        );
        Ok(rejected)
    }

    /// End the friendship between `a` and `b`, acting as `a`
    ///
    /// Every accepted edge between the pair is deleted. If a delete fails
    /// part-way the error is returned and a later refresh shows what remains.
    pub async fn remove_friend(&self, a: UserId, b: UserId) -> Result<(), RelationshipError> {
        let result = self.try_remove(a, b).await;
        self.observe("remove_friend", Transition::Removed, result)
    }

    async fn try_remove(&self, a: UserId, b: UserId) -> Result<(), RelationshipError> {
        if a == b {
            return Err(RelationshipError::Invalid("cannot unfriend oneself".into()));
        }

        let edges = self.store.list_edges_touching(a).await?;
        let accepted: Vec<&RelationshipEdge> = edges
            .iter()
            .filter(|e| e.is_between(a, b) && e.status == EdgeStatus::Accepted)
            .collect();

        if accepted.is_empty() {
            return Err(RelationshipError::NotFound);
        }

        for edge in &accepted {
            self.store.delete_edge_in_status(edge.id, EdgeStatus::Accepted, a).await?;
        }

        tracing::info!(%a, %b, edges = accepted.len(), "Friend removed");
        Ok(())
    }

    /// Find `edge` among the edges visible to `by` and check that it is a
    /// pending request addressed to `by`
    ///
    /// An edge that `by` cannot see, or that is no longer pending, is
    /// `NotFound`; a pending edge `by` sent is `NotAuthorized`.
    async fn pending_addressed_to(&self, edge: EdgeId, by: UserId) -> Result<RelationshipEdge, RelationshipError> {
        let edges = self.store.list_edges_touching(by).await?;
        let found = edges
            .into_iter()
            .find(|e| e.id == edge)
            .ok_or(RelationshipError::NotFound)?;

        if found.status != EdgeStatus::Pending {
            return Err(RelationshipError::NotFound);
        }
        if found.recipient_id != by {
            return Err(RelationshipError::NotAuthorized);
        }
        Ok(found)
    }

    fn observe<T>(
        &self,
        operation: &'static str,
        transition: Transition,
        result: Result<T, RelationshipError>,
    ) -> Result<T, RelationshipError> {
        match &result {
            Ok(_) => self.metrics.record_transition(transition),
            Err(e) => {
                self.metrics.record_failure(e.kind());
                match e {
                    RelationshipError::StoreUnavailable(_) => {
                        tracing::warn!(operation, error = %e, "Relationship operation failed")
                    }
                    _ => tracing::debug!(operation, error = %e, "Relationship operation refused"),
                }
            }
        }
        result
    }
}
