//! State machine position of an unordered pair of users

use crate::edge::prevailing_edge;
use crate::{EdgeStatus, RelationshipEdge, UserId};

/// Relationship state of a pair `{a, b}`
///
/// `Rejected` edges are terminal and do not block a fresh request, so they
/// collapse to [`PairState::NoRelationship`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairState {
    /// No edge, or only rejected edges
    NoRelationship,

    /// A request sent by the contained user is awaiting an answer
    PendingFrom(UserId),

    /// The users are friends
    Accepted,
}

impl PairState {
    /// Derive the state of `{a, b}` from any edge set
    ///
    /// Edges not connecting the pair are ignored; duplicates are resolved with
    /// the same rule the classifier uses.
    pub fn derive(a: UserId, b: UserId, edges: &[RelationshipEdge]) -> Self {
        let between = edges.iter().filter(|e| !e.is_self_edge() && e.is_between(a, b));

        match prevailing_edge(between) {
            None => PairState::NoRelationship,
            Some(edge) => match edge.status {
                EdgeStatus::Accepted => PairState::Accepted,
                EdgeStatus::Pending => PairState::PendingFrom(edge.requester_id),
                EdgeStatus::Rejected => PairState::NoRelationship,
            },
        }
    }

    /// Whether a new request between the pair would be allowed
    pub fn allows_request(&self) -> bool {
        matches!(self, PairState::NoRelationship)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EdgeId;

    fn edge(from: UserId, to: UserId, status: EdgeStatus, updated_at: u64) -> RelationshipEdge {
        RelationshipEdge {
            id: EdgeId::new(),
            requester_id: from,
            recipient_id: to,
            status,
            created_at: updated_at,
            updated_at,
        }
    }

    #[test]
    fn test_states() {
        let (a, b, c) = (UserId::new(), UserId::new(), UserId::new());

        assert_eq!(PairState::derive(a, b, &[]), PairState::NoRelationship);

        let pending = [edge(a, b, EdgeStatus::Pending, 1)];
        assert_eq!(PairState::derive(b, a, &pending), PairState::PendingFrom(a));

        let accepted = [edge(b, a, EdgeStatus::Accepted, 1)];
        assert_eq!(PairState::derive(a, b, &accepted), PairState::Accepted);

        let rejected = [edge(a, b, EdgeStatus::Rejected, 1)];
        assert_eq!(PairState::derive(a, b, &rejected), PairState::NoRelationship);
        assert!(PairState::derive(a, b, &rejected).allows_request());

        let unrelated = [edge(a, c, EdgeStatus::Accepted, 1)];
        assert_eq!(PairState::derive(a, b, &unrelated), PairState::NoRelationship);
    }

    #[test]
    fn test_fresh_request_after_rejection() {
        let (a, b) = (UserId::new(), UserId::new());
        let edges = [
            edge(a, b, EdgeStatus::Rejected, 1),
            edge(b, a, EdgeStatus::Pending, 2),
        ];
        assert_eq!(PairState::derive(a, b, &edges), PairState::PendingFrom(b));
        assert!(!PairState::derive(a, b, &edges).allows_request());
    }
}
