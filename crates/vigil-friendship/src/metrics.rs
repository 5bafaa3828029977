//! Metrics collection for friendship operations

use std::collections::BTreeMap;
use std::sync::Mutex;
use vigil_domain::ErrorKind;

/// Counters collected by a friendship service
///
/// Tracks lifecycle transitions, view refresh outcomes and failed mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FriendshipMetrics {
    /// Friend requests created
    pub requests_sent: usize,

    /// Requests accepted
    pub requests_accepted: usize,

    /// Requests rejected
    pub requests_rejected: usize,

    /// Friendships removed
    pub friends_removed: usize,

    /// Refreshes that replaced a view's classification
    pub refreshes_applied: usize,

    /// Refreshes skipped because a later one already covered them
    pub refreshes_coalesced: usize,

    /// Refreshes abandoned because the view was closed
    pub refreshes_cancelled: usize,

    /// Refreshes that failed (view stayed stale)
    pub refreshes_failed: usize,

    /// Failed mutations by error kind
    pub failures: BTreeMap<ErrorKind, usize>,
}

impl FriendshipMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Total lifecycle transitions that succeeded
    pub fn total_transitions(&self) -> usize {
        self.requests_sent + self.requests_accepted + self.requests_rejected + self.friends_removed
    }

    /// Total failed mutations across all kinds
    pub fn total_failures(&self) -> usize {
        self.failures.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Friendship Metrics Summary".to_string(),
            "==========================".to_string(),
            format!("Requests sent:      {}", self.requests_sent),
            format!("Requests accepted:  {}", self.requests_accepted),
            format!("Requests rejected:  {}", self.requests_rejected),
            format!("Friends removed:    {}", self.friends_removed),
            String::new(),
            format!(
                "Refreshes: {} applied, {} coalesced, {} cancelled, {} failed",
                self.refreshes_applied,
                self.refreshes_coalesced,
                self.refreshes_cancelled,
                self.refreshes_failed
            ),
        ];

        if !self.failures.is_empty() {
            lines.push(String::new());
            lines.push(format!("Failed mutations ({}):", self.total_failures()));
            for (kind, count) in &self.failures {
                lines.push(format!("  {:<18} {}", kind.as_str(), count));
            }
        }

        lines.join("\n")
    }
}

/// Which lifecycle transition succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Sent,
    Accepted,
    Rejected,
    Removed,
}

/// How a refresh ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefreshEvent {
    Applied,
    Coalesced,
    Cancelled,
    Failed,
}

/// Shared, thread-safe recorder behind [`FriendshipMetrics`]
#[derive(Debug, Default)]
pub(crate) struct MetricsRecorder {
    inner: Mutex<FriendshipMetrics>,
}

impl MetricsRecorder {
    fn update(&self, f: impl FnOnce(&mut FriendshipMetrics)) {
        if let Ok(mut metrics) = self.inner.lock() {
            f(&mut metrics);
        }
    }

    pub(crate) fn record_transition(&self, transition: Transition) {
        self.update(|m| match transition {
            Transition::Sent => m.requests_sent += 1,
            Transition::Accepted => m.requests_accepted += 1,
            Transition::Rejected => m.requests_rejected += 1,
            Transition::Removed => m.friends_removed += 1,
        });
    }

    pub(crate) fn record_refresh(&self, event: RefreshEvent) {
        self.update(|m| match event {
            RefreshEvent::Applied => m.refreshes_applied += 1,
            RefreshEvent::Coalesced => m.refreshes_coalesced += 1,
            RefreshEvent::Cancelled => m.refreshes_cancelled += 1,
            RefreshEvent::Failed => m.refreshes_failed += 1,
        });
    }

    pub(crate) fn record_failure(&self, kind: ErrorKind) {
        self.update(|m| *m.failures.entry(kind).or_insert(0) += 1);
    }

    pub(crate) fn snapshot(&self) -> FriendshipMetrics {
        self.inner.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub(crate) fn reset(&self) {
        self.update(FriendshipMetrics::reset);
    }
}
