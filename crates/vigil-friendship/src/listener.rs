//! Background listener that keeps open views in step with store changes
//!
//! Mutations made through the service refresh the affected views directly.
//! Changes made elsewhere (another session, another process writing through
//! the same store) reach the views through this listener.

use crate::FriendshipService;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use vigil_domain::traits::{ChangeCallback, EdgeChange, RelationshipStore, Subscription};
use vigil_domain::UserId;

/// Subscription to store changes that invalidates and refreshes open views
///
/// Bursts of changes arriving within the configured debounce window are
/// folded into one refresh per affected view. The listener holds only a weak
/// reference to its service and stops once the service is dropped.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use vigil_friendship::{FriendshipConfig, FriendshipService};
/// use vigil_store::SqliteStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = Arc::new(SqliteStore::new("vigil.db")?);
///     let service = Arc::new(FriendshipService::new(store, FriendshipConfig::default()));
///
///     let mut listener = service.spawn_listener().expect("listening enabled");
///     // ... views now follow changes made by other writers
///     listener.shutdown();
///     Ok(())
/// }
/// ```
pub struct ChangeListener<S: ?Sized + RelationshipStore> {
    store: Arc<S>,
    subscription: Option<Subscription>,
    active: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl<S> ChangeListener<S>
where
    S: RelationshipStore + ?Sized + 'static,
{
    pub(crate) fn start(service: &Arc<FriendshipService<S>>) -> Self {
        let store = service.store().clone();
        let active = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::unbounded_channel::<EdgeChange>();

        let gate = active.clone();
        let on_change: ChangeCallback = Arc::new(move |change: &EdgeChange| {
            if gate.load(Ordering::SeqCst) {
                // The receiver is gone only after shutdown
                let _ = tx.send(change.clone());
            }
        });

        let Some(subscription) = store.subscribe(on_change) else {
            tracing::debug!("Store does not push changes, listener is inert");
            active.store(false, Ordering::SeqCst);
            return Self {
                store,
                subscription: None,
                active,
                task: None,
            };
        };

        let debounce = service.config().change_debounce();
        let task = tokio::spawn(run(Arc::downgrade(service), rx, debounce));

        tracing::info!(subscription = subscription.id(), ?debounce, "Change listener started");

        Self {
            store,
            subscription: Some(subscription),
            active,
            task: Some(task),
        }
    }

    /// Whether changes are still being followed
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop following changes
    ///
    /// Unsubscribes from the store and aborts any refresh in progress. Calling
    /// it again does nothing.
    pub fn shutdown(&mut self) {
        self.active.store(false, Ordering::SeqCst);

        if let Some(subscription) = self.subscription.take() {
            self.store.unsubscribe(subscription);
            tracing::info!(subscription = subscription.id(), "Change listener stopped");
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<S> Drop for ChangeListener<S>
where
    S: RelationshipStore + ?Sized,
{
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(subscription) = self.subscription.take() {
            self.store.unsubscribe(subscription);
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run<S>(service: Weak<FriendshipService<S>>, mut changes: mpsc::UnboundedReceiver<EdgeChange>, debounce: Duration)
where
    S: RelationshipStore + ?Sized,
{
    while let Some(first) = changes.recv().await {
        let mut dirty: BTreeSet<UserId> = BTreeSet::new();
        if !invalidate(&service, &first, &mut dirty) {
            break;
        }

        let window = sleep(debounce);
        tokio::pin!(window);

        let mut closed = false;
        loop {
            tokio::select! {
                change = changes.recv() => match change {
                    Some(change) => {
                        if !invalidate(&service, &change, &mut dirty) {
                            return;
                        }
                    }
                    None => {
                        closed = true;
                        break;
                    }
                },
                _ = &mut window => break,
            }
        }

        let Some(service) = service.upgrade() else {
            break;
        };

        let views = service.open_views(&dirty);
        tracing::debug!(users = dirty.len(), views = views.len(), "Refreshing views after external change");

        for view in views {
            if let Err(e) = view.refresh().await {
                tracing::warn!(viewpoint = %view.viewpoint(), error = %e, "Refresh after change failed");
            }
        }

        if closed {
            break;
        }
    }

    tracing::debug!("Change listener task finished");
}

/// Mark the parties' open views stale; false once the service is gone
fn invalidate<S>(service: &Weak<FriendshipService<S>>, change: &EdgeChange, dirty: &mut BTreeSet<UserId>) -> bool
where
    S: RelationshipStore + ?Sized,
{
    let Some(service) = service.upgrade() else {
        return false;
    };

    tracing::trace!(edge = %change.edge_id, kind = ?change.kind, "Edge change received");

    let parties = change.parties();
    for view in service.open_views(&parties) {
        view.invalidate();
    }
    dirty.extend(parties);
    true
}
