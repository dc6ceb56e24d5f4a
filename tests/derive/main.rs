//! Tests for #[derive(Toggleable)] on custom item types.

use std::sync::Arc;

use optimistic_toggle::{
    InMemoryItemStore, InMemoryRelationBackend, ItemStore, RelationKind, RelationState, Session,
    SessionContext, ToggleError, ToggleReconciler, Toggleable,
};

#[derive(Debug, Clone, PartialEq, Toggleable)]
struct Photo {
    #[toggle(id)]
    slug: String,
    #[toggle(relation = Bookmark)]
    saved: bool,
}

#[derive(Debug, Clone, PartialEq, Toggleable)]
struct Article {
    id: String,
    title: String,
    #[toggle(relation = Like, count = likes)]
    liked: bool,
    likes: u64,
    #[toggle(relation = Bookmark)]
    bookmarked: bool,
}

#[test]
fn custom_id_field() {
    let photo = Photo {
        slug: "harbor".into(),
        saved: true,
    };
    assert_eq!(photo.id(), "harbor");
    assert_eq!(
        photo.relation(RelationKind::Bookmark),
        Some(RelationState::new(true, None))
    );
    assert_eq!(photo.relation(RelationKind::Like), None);
}

#[test]
fn set_relation_writes_flag_and_count() {
    let mut article = Article {
        id: "a1".into(),
        title: "Tide tables".into(),
        liked: false,
        likes: 2,
        bookmarked: false,
    };

    assert!(article.set_relation(RelationKind::Like, RelationState::new(true, Some(3))));
    assert!(article.liked);
    assert_eq!(article.likes, 3);

    assert!(article.set_relation(RelationKind::Bookmark, RelationState::new(true, None)));
    assert!(article.bookmarked);
    assert_eq!(article.likes, 3);
}

#[test]
fn missing_relation_is_not_set() {
    let mut photo = Photo {
        slug: "harbor".into(),
        saved: false,
    };
    assert!(!photo.set_relation(RelationKind::Like, RelationState::new(true, Some(1))));
    assert!(!photo.saved);
}

#[tokio::test]
async fn reconciler_rejects_unsupported_relation() {
    let store = Arc::new(
        InMemoryItemStore::with_items(vec![Photo {
            slug: "harbor".into(),
            saved: false,
        }])
        .unwrap(),
    );
    let backend = Arc::new(InMemoryRelationBackend::new());
    let session = SessionContext::signed_in(Session::new("user-7"));
    let reconciler = ToggleReconciler::new(Arc::clone(&store), Arc::clone(&backend), session);

    let err = reconciler.toggle_like("harbor", false).unwrap_err();
    assert_eq!(
        err,
        ToggleError::UnsupportedRelation {
            id: "harbor".into(),
            kind: RelationKind::Like,
        }
    );
    assert!(!store.get("harbor").unwrap().unwrap().saved);

    let pending = reconciler.toggle_bookmark("harbor", false).unwrap();
    assert!(store.get("harbor").unwrap().unwrap().saved);
    assert!(pending.outcome().await.is_confirmed());
    assert!(backend.is_active("user-7", RelationKind::Bookmark, "harbor"));
}

#[tokio::test]
async fn reconciler_accepts_dyn_mutator() {
    use optimistic_toggle::RelationMutator;

    let store = Arc::new(
        InMemoryItemStore::with_items(vec![Article {
            id: "a1".into(),
            title: "Tide tables".into(),
            liked: false,
            likes: 0,
            bookmarked: false,
        }])
        .unwrap(),
    );
    let backend = Arc::new(InMemoryRelationBackend::new());
    let mutator: Arc<dyn RelationMutator> = backend.clone();
    let reconciler =
        ToggleReconciler::new(store.clone(), mutator, SessionContext::signed_in(Session::new("u")));

    let pending = reconciler.toggle_like("a1", false).unwrap();
    assert_eq!(store.get("a1").unwrap().unwrap().likes, 1);
    assert!(pending.outcome().await.is_confirmed());
    assert_eq!(backend.count(RelationKind::Like, "a1"), 1);
}

#[cfg(feature = "emitter")]
#[tokio::test]
async fn unsupported_relation_publishes_no_change() {
    use std::sync::Mutex;
    use std::time::Duration;

    let store = Arc::new(
        InMemoryItemStore::with_items(vec![Photo {
            slug: "harbor".into(),
            saved: false,
        }])
        .unwrap(),
    );
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    store
        .on_change(move |event| sink.lock().unwrap().push(event))
        .unwrap();

    let backend = Arc::new(InMemoryRelationBackend::new());
    let session = SessionContext::signed_in(Session::new("user-7"));
    let reconciler = ToggleReconciler::new(Arc::clone(&store), Arc::clone(&backend), session);

    assert!(reconciler.toggle_like("harbor", false).is_err());

    // Listeners run on their own threads
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(backend.call_count(), 0);
}
