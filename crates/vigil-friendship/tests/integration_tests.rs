//! Integration tests for the friendship service over a SQLite store

use std::sync::Arc;
use vigil_domain::ErrorKind;
use vigil_friendship::{
    Bucket, EdgeStatus, FriendshipConfig, FriendshipService, RelationshipError, RejectionMode, UserId, UserProfile,
};
use vigil_store::SqliteStore;

struct Fixture {
    store: Arc<SqliteStore>,
    service: FriendshipService<SqliteStore>,
    a: UserId,
    b: UserId,
    c: UserId,
}

fn fixture(config: FriendshipConfig) -> Fixture {
    let store = Arc::new(SqliteStore::new(":memory:").unwrap());
    let (a, b, c) = (UserId::new(), UserId::new(), UserId::new());
    store.upsert_profile(&UserProfile::new(a, "Alice")).unwrap();
    store.upsert_profile(&UserProfile::new(b, "Bob")).unwrap();
    store.upsert_profile(&UserProfile::new(c, "Carol")).unwrap();

    Fixture {
        service: FriendshipService::new(store.clone(), config),
        store,
        a,
        b,
        c,
    }
}

#[tokio::test]
async fn test_no_edges_everyone_is_a_stranger() {
    let fx = fixture(FriendshipConfig::default());

    let result = fx.service.get_classification(fx.a).await.unwrap();
    assert_eq!(result.strangers.len(), 2);
    assert!(result.contains(Bucket::Strangers, fx.b));
    assert!(result.contains(Bucket::Strangers, fx.c));
    assert!(result.friends.is_empty());
    assert!(result.pending_received.is_empty());
    assert!(result.pending_sent.is_empty());
}

#[tokio::test]
async fn test_accept_makes_both_sides_friends() {
    let fx = fixture(FriendshipConfig::default());

    let request = fx.service.send_friend_request(fx.a, fx.b).await.unwrap();
    assert_eq!(request.status, EdgeStatus::Pending);

    let for_a = fx.service.get_classification(fx.a).await.unwrap();
    let for_b = fx.service.get_classification(fx.b).await.unwrap();
    assert_eq!(for_a.bucket_of(fx.b), Some(Bucket::PendingSent));
    assert_eq!(for_b.bucket_of(fx.a), Some(Bucket::PendingReceived));

    let accepted = fx.service.accept_friend_request(request.id, fx.b).await.unwrap();
    assert_eq!(accepted.status, EdgeStatus::Accepted);

    let for_a = fx.service.get_classification(fx.a).await.unwrap();
    let for_b = fx.service.get_classification(fx.b).await.unwrap();
    assert_eq!(for_a.bucket_of(fx.b), Some(Bucket::Friends));
    assert_eq!(for_b.bucket_of(fx.a), Some(Bucket::Friends));
    assert!(for_a.pending_sent.is_empty() && for_a.pending_received.is_empty());
    assert!(for_b.pending_sent.is_empty() && for_b.pending_received.is_empty());
}

#[tokio::test]
async fn test_remove_friend_leaves_no_residual_edge() {
    let fx = fixture(FriendshipConfig::default());

    let request = fx.service.send_friend_request(fx.a, fx.b).await.unwrap();
    fx.service.accept_friend_request(request.id, fx.b).await.unwrap();
    fx.service.remove_friend(fx.a, fx.b).await.unwrap();

    let for_a = fx.service.get_classification(fx.a).await.unwrap();
    let for_b = fx.service.get_classification(fx.b).await.unwrap();
    assert_eq!(for_a.bucket_of(fx.b), Some(Bucket::Strangers));
    assert_eq!(for_b.bucket_of(fx.a), Some(Bucket::Strangers));
    assert!(fx.store.get_edge(request.id).unwrap().is_none());

    let again = fx.service.remove_friend(fx.a, fx.b).await;
    assert_eq!(again, Err(RelationshipError::NotFound));
}

#[tokio::test]
async fn test_rerequest_after_rejection_in_both_modes() {
    for config in [FriendshipConfig::default(), FriendshipConfig::strict_delete()] {
        let mode = config.rejection_mode;
        let fx = fixture(config);

        let request = fx.service.send_friend_request(fx.a, fx.b).await.unwrap();
        fx.service.reject_friend_request(request.id, fx.b).await.unwrap();

        let stored = fx.store.get_edge(request.id).unwrap();
        match mode {
            RejectionMode::MarkRejected => assert_eq!(stored.map(|e| e.status), Some(EdgeStatus::Rejected)),
            RejectionMode::Delete => assert!(stored.is_none()),
        }

        let for_b = fx.service.get_classification(fx.b).await.unwrap();
        assert_eq!(for_b.bucket_of(fx.a), Some(Bucket::Strangers), "{mode:?}");

        let again = fx.service.send_friend_request(fx.a, fx.b).await.unwrap();
        assert_ne!(again.id, request.id);

        let for_b = fx.service.get_classification(fx.b).await.unwrap();
        assert_eq!(for_b.bucket_of(fx.a), Some(Bucket::PendingReceived), "{mode:?}");
    }
}

#[tokio::test]
async fn test_mutation_refreshes_both_open_views() {
    let fx = fixture(FriendshipConfig::default());

    // Open and load both views
    fx.service.get_classification(fx.a).await.unwrap();
    fx.service.get_classification(fx.b).await.unwrap();

    fx.service.send_friend_request(fx.a, fx.b).await.unwrap();

    let view_a = fx.service.view(fx.a).current();
    let view_b = fx.service.view(fx.b).current();
    assert!(!view_a.stale);
    assert!(!view_b.stale);
    assert_eq!(view_a.classification.bucket_of(fx.b), Some(Bucket::PendingSent));
    assert_eq!(view_b.classification.bucket_of(fx.a), Some(Bucket::PendingReceived));
}

#[tokio::test]
async fn test_mutation_without_auto_refresh_marks_views_stale() {
    let config = FriendshipConfig {
        refresh_after_mutation: false,
        ..FriendshipConfig::default()
    };
    let fx = fixture(config);

    fx.service.get_classification(fx.b).await.unwrap();
    fx.service.send_friend_request(fx.a, fx.b).await.unwrap();

    let snapshot = fx.service.view(fx.b).current();
    assert!(snapshot.stale);
    assert_eq!(snapshot.classification.bucket_of(fx.a), Some(Bucket::Strangers));

    let fresh = fx.service.get_classification(fx.b).await.unwrap();
    assert_eq!(fresh.bucket_of(fx.a), Some(Bucket::PendingReceived));
}

#[tokio::test]
async fn test_duplicate_requests_are_refused() {
    let fx = fixture(FriendshipConfig::default());

    fx.service.send_friend_request(fx.a, fx.b).await.unwrap();

    let same = fx.service.send_friend_request(fx.a, fx.b).await;
    let reverse = fx.service.send_friend_request(fx.b, fx.a).await;
    assert_eq!(same, Err(RelationshipError::AlreadyExists));
    assert_eq!(reverse, Err(RelationshipError::AlreadyExists));

    let own = fx.service.send_friend_request(fx.a, fx.a).await;
    assert_eq!(own.map_err(|e| e.kind()), Err(ErrorKind::Invalid));
}

#[tokio::test]
async fn test_only_the_recipient_may_answer() {
    let fx = fixture(FriendshipConfig::default());

    let request = fx.service.send_friend_request(fx.a, fx.b).await.unwrap();

    assert_eq!(
        fx.service.accept_friend_request(request.id, fx.a).await,
        Err(RelationshipError::NotAuthorized)
    );
    assert_eq!(
        fx.service.reject_friend_request(request.id, fx.a).await.map(|_| ()),
        Err(RelationshipError::NotAuthorized)
    );
    assert_eq!(
        fx.service.accept_friend_request(request.id, fx.c).await,
        Err(RelationshipError::NotFound),
        "A bystander cannot even see the request"
    );

    fx.service.accept_friend_request(request.id, fx.b).await.unwrap();
    assert_eq!(
        fx.service.accept_friend_request(request.id, fx.b).await,
        Err(RelationshipError::NotFound),
        "Accepting twice finds no pending request"
    );
}

#[tokio::test]
async fn test_metrics_track_transitions_and_failures() {
    let fx = fixture(FriendshipConfig::default());

    let request = fx.service.send_friend_request(fx.a, fx.b).await.unwrap();
    let _ = fx.service.send_friend_request(fx.b, fx.a).await;
    fx.service.accept_friend_request(request.id, fx.b).await.unwrap();

    let metrics = fx.service.metrics();
    assert_eq!(metrics.requests_sent, 1);
    assert_eq!(metrics.requests_accepted, 1);
    assert_eq!(metrics.failures.get(&ErrorKind::AlreadyExists), Some(&1));

    fx.service.reset_metrics();
    assert_eq!(fx.service.metrics().total_transitions(), 0);
}

#[tokio::test]
async fn test_closed_view_is_replaced_on_next_use() {
    let fx = fixture(FriendshipConfig::default());

    let first = fx.service.view(fx.a);
    assert!(fx.service.close_view(fx.a));
    assert!(first.is_closed());
    assert!(!fx.service.close_view(fx.a));

    let result = fx.service.get_classification(fx.a).await.unwrap();
    assert_eq!(result.len(), 2);
    assert!(!Arc::ptr_eq(&first, &fx.service.view(fx.a)));
}

#[tokio::test]
async fn test_listener_disabled_by_config() {
    let config = FriendshipConfig {
        listen_for_changes: false,
        ..FriendshipConfig::default()
    };
    let fx = fixture(config);
    let service = Arc::new(fx.service);

    assert!(service.spawn_listener().is_none());
    assert_eq!(fx.store.subscriber_count(), 0);
}
