//! Session-scoped facade consumed by the UI layer

use crate::lifecycle::RelationshipManager;
use crate::metrics::MetricsRecorder;
use crate::view::{FriendshipView, RefreshOutcome};
use crate::{ChangeListener, FriendshipConfig, FriendshipMetrics};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use vigil_domain::traits::RelationshipStore;
use vigil_domain::{ClassificationResult, EdgeId, RelationshipEdge, RelationshipError, UserId};

/// Friendship service for one session
///
/// Construct it once per session and pass it by reference (or `Arc`) to
/// whatever needs it. It owns the lifecycle manager and one view per
/// viewpoint that has been asked for.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use vigil_friendship::{FriendshipConfig, FriendshipService};
/// use vigil_store::SqliteStore;
/// # use vigil_domain::UserId;
///
/// # async fn demo(me: UserId, them: UserId) -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(SqliteStore::new("vigil.db")?);
/// let service = FriendshipService::new(store, FriendshipConfig::default());
///
/// service.send_friend_request(me, them).await?;
/// let classification = service.get_classification(me).await?;
/// println!("{} pending", classification.pending_sent.len());
/// # Ok(())
/// # }
/// ```
pub struct FriendshipService<S: ?Sized> {
    store: Arc<S>,
    config: FriendshipConfig,
    manager: RelationshipManager<S>,
    views: Mutex<HashMap<UserId, Arc<FriendshipView<S>>>>,
    metrics: Arc<MetricsRecorder>,
}

impl<S> FriendshipService<S>
where
    S: RelationshipStore + ?Sized,
{
    /// Create a service over `store`
    pub fn new(store: Arc<S>, config: FriendshipConfig) -> Self {
        let metrics = Arc::new(MetricsRecorder::default());
        let manager = RelationshipManager::new(store.clone(), config.rejection_mode, metrics.clone());

        Self {
            store,
            config,
            manager,
            views: Mutex::new(HashMap::new()),
            metrics,
        }
    }

    /// The store this service operates on
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Active configuration
    pub fn config(&self) -> &FriendshipConfig {
        &self.config
    }

    /// The lifecycle manager, for callers that manage refreshes themselves
    pub fn manager(&self) -> &RelationshipManager<S> {
        &self.manager
    }

    /// Snapshot of the counters collected so far
    pub fn metrics(&self) -> FriendshipMetrics {
        self.metrics.snapshot()
    }

    /// Reset the counters
    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    /// The view for `viewpoint`, created on first use
    ///
    /// A closed view is replaced by a fresh one.
    pub fn view(&self, viewpoint: UserId) -> Arc<FriendshipView<S>> {
        let mut views = match self.views.lock() {
            Ok(views) => views,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(view) = views.get(&viewpoint) {
            if !view.is_closed() {
                return view.clone();
            }
        }

        let view = Arc::new(FriendshipView::new(
            viewpoint,
            self.store.clone(),
            self.config.refresh_timeout(),
            self.metrics.clone(),
        ));
        views.insert(viewpoint, view.clone());
        view
    }

    /// Close and forget the view for `viewpoint`
    ///
    /// Returns whether a view was open.
    pub fn close_view(&self, viewpoint: UserId) -> bool {
        let removed = match self.views.lock() {
            Ok(mut views) => views.remove(&viewpoint),
            Err(poisoned) => poisoned.into_inner().remove(&viewpoint),
        };

        match removed {
            Some(view) => {
                view.close();
                true
            }
            None => false,
        }
    }

    /// Open views among `users`
    pub fn open_views<'a>(&self, users: impl IntoIterator<Item = &'a UserId>) -> Vec<Arc<FriendshipView<S>>> {
        let views = match self.views.lock() {
            Ok(views) => views,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut open: Vec<Arc<FriendshipView<S>>> = Vec::new();
        for user in users {
            if let Some(view) = views.get(user) {
                if !view.is_closed() && !open.iter().any(|v| v.viewpoint() == *user) {
                    open.push(view.clone());
                }
            }
        }
        open
    }

    /// Classification for `viewpoint`, refreshed first if stale
    ///
    /// If the refresh fails but an earlier classification exists, that one is
    /// returned; with nothing to fall back on the error is returned. A view
    /// closed before its first load is replaced and loaded once more.
    pub async fn get_classification(&self, viewpoint: UserId) -> Result<Arc<ClassificationResult>, RelationshipError> {
        if let Some(classification) = Self::load(&self.view(viewpoint)).await? {
            return Ok(classification);
        }

        tracing::debug!(%viewpoint, "View closed before it loaded, retrying on a fresh view");
        Self::load(&self.view(viewpoint))
            .await?
            .ok_or_else(|| RelationshipError::StoreUnavailable("view closed before it loaded".into()))
    }

    /// Refresh `view` if stale; `None` when it was closed with nothing loaded
    async fn load(view: &FriendshipView<S>) -> Result<Option<Arc<ClassificationResult>>, RelationshipError> {
        if view.current().stale {
            match view.refresh().await {
                Ok(RefreshOutcome::Cancelled) if !view.current().is_loaded() => return Ok(None),
                Ok(_) => {}
                Err(e) => {
                    if !view.current().is_loaded() {
                        return Err(e);
                    }
                }
            }
        }

        Ok(Some(view.current().classification))
    }

    /// Send a friend request from `from` to `to`
    pub async fn send_friend_request(&self, from: UserId, to: UserId) -> Result<RelationshipEdge, RelationshipError> {
        let edge = self.manager.send_request(from, to).await?;
        self.after_mutation(&[from, to]).await;
        Ok(edge)
    }

    /// Accept request `edge` as `by`
    pub async fn accept_friend_request(&self, edge: EdgeId, by: UserId) -> Result<RelationshipEdge, RelationshipError> {
        let accepted = self.manager.accept_request(edge, by).await?;
        self.after_mutation(&[accepted.requester_id, accepted.recipient_id]).await;
        Ok(accepted)
    }

    /// Reject request `edge` as `by`
    pub async fn reject_friend_request(&self, edge: EdgeId, by: UserId) -> Result<RelationshipEdge, RelationshipError> {
        let rejected = self.manager.reject_request(edge, by).await?;
        self.after_mutation(&[rejected.requester_id, rejected.recipient_id]).await;
        Ok(rejected)
    }

    /// End the friendship between `a` and `b`, acting as `a`
    pub async fn remove_friend(&self, a: UserId, b: UserId) -> Result<(), RelationshipError> {
        self.manager.remove_friend(a, b).await?;
        self.after_mutation(&[a, b]).await;
        Ok(())
    }

    /// Mark the open views of `users` stale and, if configured, refresh them
    ///
    /// Refresh failures are logged; the views stay stale until the next try.
    pub async fn after_mutation(&self, users: &[UserId]) {
        let views = self.open_views(users);

        for view in &views {
            view.invalidate();
        }

        if !self.config.refresh_after_mutation {
            return;
        }

        for view in &views {
            if let Err(e) = view.refresh().await {
                tracing::warn!(viewpoint = %view.viewpoint(), error = %e, "View left stale after mutation");
            }
        }
    }
}

impl<S> FriendshipService<S>
where
    S: RelationshipStore + ?Sized + 'static,
{
    /// Start a [`ChangeListener`] for this service, unless disabled in config
    pub fn spawn_listener(self: &Arc<Self>) -> Option<ChangeListener<S>> {
        if !self.config.listen_for_changes {
            tracing::debug!("Change listener disabled by configuration");
            return None;
        }
        Some(ChangeListener::start(self))
    }
}
