//! Per-viewpoint view model over the classification
//!
//! A [`FriendshipView`] caches the last classification for one user and
//! rebuilds it on [`FriendshipView::refresh`]. Refreshes on one view never
//! overlap, readers only ever see a complete classification, and a closed view
//! never applies a late result.

use crate::metrics::{MetricsRecorder, RefreshEvent};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio::sync::Notify;
use vigil_domain::traits::RelationshipStore;
use vigil_domain::{classify, ClassificationResult, RelationshipError, UserId};

/// What a reader sees
#[derive(Debug, Clone)]
pub struct ViewSnapshot {
    /// Last successfully computed classification (empty before the first load)
    pub classification: Arc<ClassificationResult>,

    /// The classification may not reflect the store any more
    pub stale: bool,

    /// When the classification was computed
    pub refreshed_at: Option<SystemTime>,

    /// Number of classifications applied so far; 0 means never loaded
    pub generation: u64,
}

impl ViewSnapshot {
    /// At least one refresh has been applied
    pub fn is_loaded(&self) -> bool {
        self.generation > 0
    }
}

/// How a successful [`FriendshipView::refresh`] call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new classification was computed and published
    Applied,
    /// A refresh that started after this request already covered it
    Coalesced,
    /// The view was closed; nothing was published
    Cancelled,
}

/// Cached classification for one viewpoint user
pub struct FriendshipView<S: ?Sized> {
    viewpoint: UserId,
    store: Arc<S>,
    snapshot: Mutex<ViewSnapshot>,
    refresh_lock: tokio::sync::Mutex<()>,
    /// Bumped by every refresh request and invalidation
    requested: AtomicU64,
    /// Highest request number the published classification accounts for
    covered: AtomicU64,
    closed: AtomicBool,
    close_notify: Notify,
    timeout: Duration,
    metrics: Arc<MetricsRecorder>,
}

impl<S> FriendshipView<S>
where
    S: RelationshipStore + ?Sized,
{
    pub(crate) fn new(viewpoint: UserId, store: Arc<S>, timeout: Duration, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            viewpoint,
            store,
            snapshot: Mutex::new(ViewSnapshot {
                classification: Arc::new(ClassificationResult::empty(viewpoint)),
                stale: true,
                refreshed_at: None,
                generation: 0,
            }),
            refresh_lock: tokio::sync::Mutex::new(()),
            requested: AtomicU64::new(0),
            covered: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            close_notify: Notify::new(),
            timeout,
            metrics,
        }
    }

    /// User this view classifies for
    pub fn viewpoint(&self) -> UserId {
        self.viewpoint
    }

    /// Last known classification and its staleness
    pub fn current(&self) -> ViewSnapshot {
        match self.snapshot.lock() {
            Ok(snapshot) => snapshot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Mark the view stale; the next [`Self::refresh`] recomputes
    pub fn invalidate(&self) {
        self.requested.fetch_add(1, Ordering::SeqCst);
        self.with_snapshot(|s| s.stale = true);
    }

    /// Stop the view: in-flight refreshes are abandoned and nothing is
    /// published afterwards
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!(viewpoint = %self.viewpoint, "View closed");
        }
        self.close_notify.notify_waiters();
        self.with_snapshot(|s| s.stale = true);
    }

    /// Whether [`Self::close`] was called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Re-fetch profiles and edges, classify, and publish the result
    ///
    /// Refreshes on the same view are serialized. A call that had to wait is
    /// answered without fetching if a refresh that began after the call was
    /// made has been published meanwhile. On failure the last classification
    /// stays visible and the view stays stale.
    pub async fn refresh(&self) -> Result<RefreshOutcome, RelationshipError> {
        if self.is_closed() {
            return Ok(self.cancelled());
        }

        let ticket = self.requested.fetch_add(1, Ordering::SeqCst) + 1;

        let _guard = tokio::select! {
            guard = self.refresh_lock.lock() => guard,
            _ = self.wait_closed() => return Ok(self.cancelled()),
        };

        if self.covered.load(Ordering::SeqCst) >= ticket {
            tracing::debug!(viewpoint = %self.viewpoint, ticket, "Refresh coalesced");
            self.metrics.record_refresh(RefreshEvent::Coalesced);
            return Ok(RefreshOutcome::Coalesced);
        }

        let start_mark = self.requested.load(Ordering::SeqCst);

        let fetched = tokio::select! {
            fetched = tokio::time::timeout(self.timeout, self.fetch()) => fetched,
            _ = self.wait_closed() => return Ok(self.cancelled()),
        };

        let classification = match fetched {
            Ok(Ok(classification)) => classification,
            Ok(Err(e)) => return Err(self.failed(e)),
            Err(_) => {
                return Err(self.failed(RelationshipError::StoreUnavailable(format!(
                    "refresh timed out after {:?}",
                    self.timeout
                ))))
            }
        };

        if !self.publish(classification, start_mark) {
            return Ok(self.cancelled());
        }

        self.metrics.record_refresh(RefreshEvent::Applied);
        Ok(RefreshOutcome::Applied)
    }

    async fn fetch(&self) -> Result<ClassificationResult, RelationshipError> {
        let (profiles, edges) = tokio::try_join!(
            self.store.list_profiles(self.viewpoint),
            self.store.list_edges_touching(self.viewpoint),
        )?;
        Ok(classify(self.viewpoint, &profiles, &edges))
    }

    /// Swap in the new classification; returns false if the view was closed
    fn publish(&self, classification: ClassificationResult, start_mark: u64) -> bool {
        let mut published = false;
        self.with_snapshot(|s| {
            // Checked under the snapshot lock so close() cannot interleave
            if self.is_closed() {
                return;
            }
            s.classification = Arc::new(classification);
            s.stale = self.requested.load(Ordering::SeqCst) > start_mark;
            s.refreshed_at = Some(SystemTime::now());
            s.generation += 1;
            published = true;
        });

        if published {
            self.covered.fetch_max(start_mark, Ordering::SeqCst);
            tracing::debug!(viewpoint = %self.viewpoint, covered = start_mark, "View refreshed");
        }
        published
    }

    fn failed(&self, error: RelationshipError) -> RelationshipError {
        self.with_snapshot(|s| s.stale = true);
        self.metrics.record_refresh(RefreshEvent::Failed);
        tracing::warn!(viewpoint = %self.viewpoint, error = %error, "Refresh failed, keeping last classification");
        error
    }

    fn cancelled(&self) -> RefreshOutcome {
        tracing::debug!(viewpoint = %self.viewpoint, "Refresh cancelled");
        self.metrics.record_refresh(RefreshEvent::Cancelled);
        RefreshOutcome::Cancelled
    }

    fn with_snapshot(&self, f: impl FnOnce(&mut ViewSnapshot)) {
        match self.snapshot.lock() {
            Ok(mut snapshot) => f(&mut snapshot),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    async fn wait_closed(&self) {
        loop {
            let notified = self.close_notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_closed() {
                return;
            }
            notified.await;
        }
    }
}
