//! Integration tests for FeedLoader: fetch, decode, replace.

use std::sync::Arc;

use optimistic_toggle::{
    DecodeError, FeedError, FeedLoader, InMemoryFeed, InMemoryItemStore, InMemoryRelationBackend,
    ItemStore, Post, Session, SessionContext, StoreError, ToggleReconciler,
};
use serde_json::{json, Value};

fn row(id: &str, liked: bool, like_count: u64) -> Value {
    json!({
        "id": id,
        "user_id": "author-1",
        "text_content": "golden hour",
        "image_url": format!("https://cdn.example/images/{id}.jpg"),
        "created_at": "2025-11-08T14:30:00Z",
        "profiles": { "username": "ana", "avatar_url": "https://cdn.example/avatars/ana.png" },
        "like_count": like_count,
        "liked_by_user": liked,
        "bookmarked_by_user": false,
        "comment_count": 1
    })
}

struct Setup {
    store: Arc<InMemoryItemStore<Post>>,
    feed: Arc<InMemoryFeed>,
    session: SessionContext,
    loader: FeedLoader<InMemoryItemStore<Post>, InMemoryFeed>,
}

fn setup(rows: Vec<Value>) -> Setup {
    let store = Arc::new(InMemoryItemStore::new());
    let feed = Arc::new(InMemoryFeed::with_rows(rows));
    let session = SessionContext::signed_in(Session::new("user-1"));
    let loader = FeedLoader::new(Arc::clone(&store), Arc::clone(&feed), session.clone());
    Setup {
        store,
        feed,
        session,
        loader,
    }
}

fn ids(store: &InMemoryItemStore<Post>) -> Vec<String> {
    store.snapshot().unwrap().into_iter().map(|p| p.id).collect()
}

#[tokio::test]
async fn refresh_replaces_store_in_feed_order() {
    let s = setup(vec![row("p2", false, 0), row("p1", true, 5)]);

    assert_eq!(s.loader.refresh().await.unwrap(), 2);
    assert_eq!(ids(&s.store), vec!["p2", "p1"]);
    assert_eq!(s.feed.fetches(), vec!["user-1".to_string()]);

    let p1 = s.store.get("p1").unwrap().unwrap();
    assert!(p1.liked_by_user);
    assert_eq!(p1.author_name(), "ana");

    s.feed.set_rows(vec![row("p3", false, 0)]);
    assert_eq!(s.loader.refresh().await.unwrap(), 1);
    assert_eq!(ids(&s.store), vec!["p3"]);
}

#[tokio::test]
async fn fetch_failure_keeps_previous_items() {
    let s = setup(vec![row("p1", false, 0)]);
    s.loader.refresh().await.unwrap();

    s.feed.fail_next("rpc get_posts_with_details failed");
    s.feed.set_rows(vec![row("p9", false, 0)]);

    let err = s.loader.refresh().await.unwrap_err();
    assert_eq!(
        err,
        FeedError::FetchFailed("rpc get_posts_with_details failed".into())
    );
    assert_eq!(ids(&s.store), vec!["p1"]);

    // Next refresh goes through.
    s.loader.refresh().await.unwrap();
    assert_eq!(ids(&s.store), vec!["p9"]);
}

#[tokio::test]
async fn malformed_record_fails_fast() {
    let mut broken = row("p2", false, 0);
    broken.as_object_mut().unwrap().remove("image_url");
    let s = setup(vec![row("p1", false, 0), broken]);

    let err = s.loader.refresh().await.unwrap_err();
    assert!(matches!(
        err,
        FeedError::Decode(DecodeError::Malformed { index: 1, .. })
    ));
    assert!(s.store.is_empty().unwrap());
}

#[tokio::test]
async fn duplicate_ids_are_rejected() {
    let s = setup(vec![row("p1", false, 0), row("p1", true, 1)]);

    let err = s.loader.refresh().await.unwrap_err();
    assert_eq!(err, FeedError::Store(StoreError::DuplicateId("p1".into())));
    assert!(s.store.is_empty().unwrap());
}

#[tokio::test]
async fn signed_out_refresh_does_not_fetch() {
    let s = setup(vec![row("p1", false, 0)]);
    s.session.sign_out();

    assert_eq!(s.loader.refresh().await.unwrap_err(), FeedError::Unauthenticated);
    assert!(s.feed.fetches().is_empty());
}

#[tokio::test]
async fn refresh_overwrites_optimistic_state() {
    let s = setup(vec![row("p1", false, 3)]);
    s.loader.refresh().await.unwrap();

    let backend = Arc::new(InMemoryRelationBackend::new());
    let reconciler = ToggleReconciler::new(Arc::clone(&s.store), backend, s.session.clone());

    let pending = reconciler.toggle_like("p1", false).unwrap();
    assert!(pending.outcome().await.is_confirmed());
    assert_eq!(s.store.get("p1").unwrap().unwrap().like_count, 4);

    // The server aggregate is the eventual correction.
    s.feed.set_rows(vec![row("p1", true, 12)]);
    s.loader.refresh().await.unwrap();

    let p1 = s.store.get("p1").unwrap().unwrap();
    assert!(p1.liked_by_user);
    assert_eq!(p1.like_count, 12);
}
