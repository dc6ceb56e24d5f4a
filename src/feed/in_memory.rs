use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::{FeedError, FeedSource};

/// In-memory feed source for testing.
#[derive(Clone, Default)]
pub struct InMemoryFeed {
    rows: Arc<Mutex<Vec<Value>>>,
    failure: Arc<Mutex<Option<String>>>,
    fetches: Arc<Mutex<Vec<String>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InMemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Value>) -> Self {
        let feed = Self::new();
        feed.set_rows(rows);
        feed
    }

    /// Rows returned by every later fetch.
    pub fn set_rows(&self, rows: Vec<Value>) {
        *lock(&self.rows) = rows;
    }

    /// Fail the next fetch with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        *lock(&self.failure) = Some(message.into());
    }

    /// User ids of every fetch so far.
    pub fn fetches(&self) -> Vec<String> {
        lock(&self.fetches).clone()
    }
}

#[async_trait]
impl FeedSource for InMemoryFeed {
    async fn fetch(&self, user_id: &str) -> Result<Vec<Value>, FeedError> {
        lock(&self.fetches).push(user_id.to_string());

        if let Some(message) = lock(&self.failure).take() {
            return Err(FeedError::FetchFailed(message));
        }

        Ok(lock(&self.rows).clone())
    }
}
