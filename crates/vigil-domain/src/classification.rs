//! Classification of known users relative to a viewpoint
//!
//! Every profile other than the viewpoint lands in exactly one of four
//! buckets. The classifier is pure and total: malformed input (duplicate
//! edges, duplicate profiles, self-edges, edges not touching the viewpoint)
//! is resolved deterministically instead of failing.

use crate::edge::prevailing_edge;
use crate::{EdgeStatus, RelationshipEdge, UserId, UserProfile};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One of the four disjoint classification buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Accepted relationship
    Friends,
    /// The other user asked the viewpoint
    PendingReceived,
    /// The viewpoint asked the other user
    PendingSent,
    /// Anyone else
    Strangers,
}

impl Bucket {
    /// All buckets, in display order
    pub const ALL: [Bucket; 4] = [
        Bucket::Friends,
        Bucket::PendingReceived,
        Bucket::PendingSent,
        Bucket::Strangers,
    ];

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Bucket::Friends => "friends",
            Bucket::PendingReceived => "pending received",
            Bucket::PendingSent => "pending sent",
            Bucket::Strangers => "strangers",
        }
    }
}

/// Partition of known users relative to one viewpoint
///
/// Derived, never persisted, never partially updated: it is always rebuilt
/// from the full edge set. Buckets keep input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// User the buckets are relative to
    pub viewpoint: UserId,
    /// Accepted relationships
    pub friends: Vec<UserProfile>,
    /// Requests waiting on the viewpoint
    pub pending_received: Vec<UserProfile>,
    /// Requests the viewpoint is waiting on
    pub pending_sent: Vec<UserProfile>,
    /// Everyone else
    pub strangers: Vec<UserProfile>,
}

impl ClassificationResult {
    /// An empty classification (nobody known yet)
    pub fn empty(viewpoint: UserId) -> Self {
        Self {
            viewpoint,
            friends: Vec::new(),
            pending_received: Vec::new(),
            pending_sent: Vec::new(),
            strangers: Vec::new(),
        }
    }

    /// Profiles in `bucket`
    pub fn bucket(&self, bucket: Bucket) -> &[UserProfile] {
        match bucket {
            Bucket::Friends => &self.friends,
            Bucket::PendingReceived => &self.pending_received,
            Bucket::PendingSent => &self.pending_sent,
            Bucket::Strangers => &self.strangers,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<UserProfile> {
        match bucket {
            Bucket::Friends => &mut self.friends,
            Bucket::PendingReceived => &mut self.pending_received,
            Bucket::PendingSent => &mut self.pending_sent,
            Bucket::Strangers => &mut self.strangers,
        }
    }

    /// Which bucket `user` is in, if classified at all
    pub fn bucket_of(&self, user: UserId) -> Option<Bucket> {
        Bucket::ALL
            .into_iter()
            .find(|b| self.bucket(*b).iter().any(|p| p.id == user))
    }

    /// Whether `user` is in `bucket`
    pub fn contains(&self, bucket: Bucket, user: UserId) -> bool {
        self.bucket(bucket).iter().any(|p| p.id == user)
    }

    /// Total number of classified profiles
    pub fn len(&self) -> usize {
        Bucket::ALL.iter().map(|b| self.bucket(*b).len()).sum()
    }

    /// Nobody classified
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classify `profiles` relative to `viewpoint` using `edges`
///
/// For each profile other than the viewpoint, the prevailing edge between it
/// and the viewpoint decides the bucket:
/// - `Accepted` → friends
/// - `Pending` sent by the viewpoint → pending sent
/// - `Pending` sent to the viewpoint → pending received
/// - no edge, or a `Rejected` one → strangers
///
/// A profile listed twice is classified once, at its first position.
pub fn classify(
    viewpoint: UserId,
    profiles: &[UserProfile],
    edges: &[RelationshipEdge],
) -> ClassificationResult {
    let mut by_other: HashMap<UserId, Vec<&RelationshipEdge>> = HashMap::new();
    for edge in edges.iter().filter(|e| !e.is_self_edge()) {
        if let Some(other) = edge.other_party(viewpoint) {
            by_other.entry(other).or_default().push(edge);
        }
    }

    let mut result = ClassificationResult::empty(viewpoint);
    let mut seen: HashSet<UserId> = HashSet::with_capacity(profiles.len());

    for profile in profiles {
        if profile.id == viewpoint || !seen.insert(profile.id) {
            continue;
        }

        let prevailing = by_other
            .get(&profile.id)
            .and_then(|candidates| prevailing_edge(candidates.iter().copied()));

        let bucket = match prevailing {
            Some(edge) => match edge.status {
                EdgeStatus::Accepted => Bucket::Friends,
                EdgeStatus::Pending if edge.requester_id == viewpoint => Bucket::PendingSent,
                EdgeStatus::Pending => Bucket::PendingReceived,
                EdgeStatus::Rejected => Bucket::Strangers,
            },
            None => Bucket::Strangers,
        };

        result.bucket_mut(bucket).push(profile.clone());
    }

    result
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::EdgeId;
    use proptest::prelude::*;

    const USERS: u128 = 6;

    fn arb_status() -> impl Strategy<Value = EdgeStatus> {
        prop_oneof![
            Just(EdgeStatus::Pending),
            Just(EdgeStatus::Accepted),
            Just(EdgeStatus::Rejected),
        ]
    }

    fn arb_edges() -> impl Strategy<Value = Vec<RelationshipEdge>> {
        prop::collection::vec((1..=USERS, 1..=USERS, arb_status(), 0u64..5), 0..16).prop_map(
            |raw| {
                raw.into_iter()
                    .map(|(from, to, status, at)| RelationshipEdge {
                        id: EdgeId::new(),
                        requester_id: UserId::from_value(from),
                        recipient_id: UserId::from_value(to),
                        status,
                        created_at: at,
                        updated_at: at,
                    })
                    .collect()
            },
        )
    }

    fn profiles() -> Vec<UserProfile> {
        (1..=USERS)
            .map(|n| UserProfile::new(UserId::from_value(n), format!("user-{}", n)))
            .collect()
    }

    proptest! {
        /// Every other profile lands in exactly one bucket
        #[test]
        fn test_totality_and_disjointness(edges in arb_edges(), viewpoint in 1..=USERS) {
            let viewpoint = UserId::from_value(viewpoint);
            let result = classify(viewpoint, &profiles(), &edges);

            prop_assert_eq!(result.len(), (USERS - 1) as usize);
            for p in profiles().iter().filter(|p| p.id != viewpoint) {
                let hits = Bucket::ALL.iter().filter(|b| result.contains(**b, p.id)).count();
                prop_assert_eq!(hits, 1);
            }
        }

        /// Friendship is symmetric
        #[test]
        fn test_friend_symmetry(edges in arb_edges(), a in 1..=USERS, b in 1..=USERS) {
            prop_assume!(a != b);
            let (a, b) = (UserId::from_value(a), UserId::from_value(b));

            let for_a = classify(a, &profiles(), &edges);
            let for_b = classify(b, &profiles(), &edges);
            prop_assert_eq!(for_a.contains(Bucket::Friends, b), for_b.contains(Bucket::Friends, a));
        }

        /// A pending request is sent on one side and received on the other
        #[test]
        fn test_pending_directionality(edges in arb_edges(), a in 1..=USERS, b in 1..=USERS) {
            prop_assume!(a != b);
            let (a, b) = (UserId::from_value(a), UserId::from_value(b));

            let for_a = classify(a, &profiles(), &edges);
            let for_b = classify(b, &profiles(), &edges);
            prop_assert_eq!(
                for_a.contains(Bucket::PendingSent, b),
                for_b.contains(Bucket::PendingReceived, a)
            );
            prop_assert_eq!(
                for_a.contains(Bucket::Strangers, b),
                for_b.contains(Bucket::Strangers, a)
            );
        }

        /// Same input, same output
        #[test]
        fn test_idempotent(edges in arb_edges(), viewpoint in 1..=USERS) {
            let viewpoint = UserId::from_value(viewpoint);
            prop_assert_eq!(
                classify(viewpoint, &profiles(), &edges),
                classify(viewpoint, &profiles(), &edges)
            );
        }
    }
}
