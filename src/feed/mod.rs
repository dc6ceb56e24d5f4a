//! Bulk feed loading - fetch, decode, replace.
//!
//! A refresh either replaces the whole store with freshly decoded records or
//! leaves it exactly as it was.

mod in_memory;
mod loader;

use async_trait::async_trait;
use serde_json::Value;

use crate::model::DecodeError;
use crate::store::StoreError;

pub use in_memory::InMemoryFeed;
pub use loader::FeedLoader;

/// Error type for feed refreshes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// The remote fetch failed; callers surface this to the user.
    #[error("failed to fetch feed: {0}")]
    FetchFailed(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no signed-in session")]
    Unauthenticated,
}

/// Remote source of aggregated feed rows for a user.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, user_id: &str) -> Result<Vec<Value>, FeedError>;
}
