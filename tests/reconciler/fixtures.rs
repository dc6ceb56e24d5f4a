//! Shared setup for reconciler tests.

use std::sync::Arc;
use std::time::Duration;

use optimistic_toggle::{
    InMemoryItemStore, InMemoryRelationBackend, ItemStore, Post, ReconcilerConfig, Session,
    SessionContext, ToggleReconciler,
};

pub const USER: &str = "user-1";

pub fn post(id: &str, liked: bool, like_count: u64) -> Post {
    Post {
        id: id.to_string(),
        user_id: "author-1".to_string(),
        text_content: format!("caption for {id}"),
        image_url: format!("https://cdn.example/images/{id}.jpg"),
        created_at: "2025-11-08T14:30:00Z".parse().unwrap(),
        author: None,
        like_count,
        liked_by_user: liked,
        bookmarked_by_user: false,
        comment_count: 0,
    }
}

pub struct Harness {
    pub store: Arc<InMemoryItemStore<Post>>,
    pub backend: Arc<InMemoryRelationBackend>,
    pub session: SessionContext,
    pub reconciler: ToggleReconciler<InMemoryItemStore<Post>, InMemoryRelationBackend>,
}

impl Harness {
    pub fn new(posts: Vec<Post>) -> Self {
        Self::with_config(posts, ReconcilerConfig::default())
    }

    pub fn with_config(posts: Vec<Post>, config: ReconcilerConfig) -> Self {
        let store = Arc::new(InMemoryItemStore::with_items(posts).unwrap());
        let backend = Arc::new(InMemoryRelationBackend::new());
        let session = SessionContext::signed_in(Session::new(USER));
        let reconciler = ToggleReconciler::with_config(
            Arc::clone(&store),
            Arc::clone(&backend),
            session.clone(),
            config,
        );

        Self {
            store,
            backend,
            session,
            reconciler,
        }
    }

    pub fn post(&self, id: &str) -> Post {
        self.store.get(id).unwrap().unwrap()
    }

    /// (liked_by_user, like_count) of a post.
    pub fn like_state(&self, id: &str) -> (bool, u64) {
        let post = self.post(id);
        (post.liked_by_user, post.like_count)
    }
}

/// Poll `condition` until it holds or a second passes.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
