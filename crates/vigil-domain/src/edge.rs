//! Relationship edges - directed records between two users

use crate::{EdgeId, RelationshipError, UserId};
use serde::{Deserialize, Serialize};

/// Status of a relationship edge
///
/// Edges are created `Pending` by the requester. The recipient either accepts
/// (the edge becomes `Accepted`, updated in place) or rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStatus {
    /// Awaiting the recipient's answer
    Pending,

    /// Both users are friends
    Accepted,

    /// The recipient declined; terminal, does not block a fresh request
    Rejected,
}

impl EdgeStatus {
    /// Get the status name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeStatus::Pending => "pending",
            EdgeStatus::Accepted => "accepted",
            EdgeStatus::Rejected => "rejected",
        }
    }

    /// Parse a status from its stored name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(EdgeStatus::Pending),
            "accepted" => Some(EdgeStatus::Accepted),
            "rejected" => Some(EdgeStatus::Rejected),
            _ => None,
        }
    }
}

impl std::str::FromStr for EdgeStatus {
    type Err = RelationshipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| RelationshipError::Invalid(format!("unknown edge status: {s}")))
    }
}

impl std::fmt::Display for EdgeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed relationship between two users
///
/// Direction records who initiated. At most one non-rejected edge should
/// exist per unordered pair; readers must still tolerate duplicates
/// (see [`prevailing_edge`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    /// Edge identifier
    pub id: EdgeId,

    /// User who sent the request
    pub requester_id: UserId,

    /// User who received the request
    pub recipient_id: UserId,

    /// Current status
    pub status: EdgeStatus,

    /// Creation time (ms since Unix epoch)
    pub created_at: u64,

    /// Last status change (ms since Unix epoch)
    pub updated_at: u64,
}

impl RelationshipEdge {
    /// Create a new pending edge stamped at `now`
    pub fn pending(requester_id: UserId, recipient_id: UserId, now: u64) -> Self {
        Self {
            id: EdgeId::new(),
            requester_id,
            recipient_id,
            status: EdgeStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user` is one of the two parties
    pub fn involves(&self, user: UserId) -> bool {
        self.requester_id == user || self.recipient_id == user
    }

    /// The party that is not `user`, if `user` is a party at all
    pub fn other_party(&self, user: UserId) -> Option<UserId> {
        if self.requester_id == user {
            Some(self.recipient_id)
        } else if self.recipient_id == user {
            Some(self.requester_id)
        } else {
            None
        }
    }

    /// Whether this edge connects `a` and `b`, in either direction
    pub fn is_between(&self, a: UserId, b: UserId) -> bool {
        (self.requester_id == a && self.recipient_id == b)
            || (self.requester_id == b && self.recipient_id == a)
    }

    /// Pending or accepted; a rejected edge is inert
    pub fn is_active(&self) -> bool {
        self.status != EdgeStatus::Rejected
    }

    /// Requester and recipient are the same user
    pub fn is_self_edge(&self) -> bool {
        self.requester_id == self.recipient_id
    }
}

/// Pick the edge that decides the relationship of a pair when several exist
///
/// Any `Accepted` edge wins. Otherwise the most recently updated edge wins,
/// and on equal `updated_at` the first one encountered.
pub fn prevailing_edge<'a, I>(edges: I) -> Option<&'a RelationshipEdge>
where
    I: IntoIterator<Item = &'a RelationshipEdge>,
{
    let mut best: Option<&RelationshipEdge> = None;

    for edge in edges {
        best = match best {
            None => Some(edge),
            Some(current) if current.status == EdgeStatus::Accepted => Some(current),
            Some(_) if edge.status == EdgeStatus::Accepted => Some(edge),
            Some(current) if edge.updated_at > current.updated_at => Some(edge),
            Some(current) => Some(current),
        };
    }

    best
}
