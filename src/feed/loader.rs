use std::sync::Arc;

use tracing::{info, warn};

use super::{FeedError, FeedSource};
use crate::model::{decode_records, Record};
use crate::session::SessionContext;
use crate::store::ItemStore;

/// Refreshes an item store from a feed source.
pub struct FeedLoader<S, F: ?Sized> {
    store: Arc<S>,
    source: Arc<F>,
    session: SessionContext,
}

impl<S, F: ?Sized> Clone for FeedLoader<S, F> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            source: Arc::clone(&self.source),
            session: self.session.clone(),
        }
    }
}

impl<S, F> FeedLoader<S, F>
where
    S: ItemStore,
    S::Item: Record,
    F: FeedSource + ?Sized,
{
    pub fn new(store: Arc<S>, source: Arc<F>, session: SessionContext) -> Self {
        Self {
            store,
            source,
            session,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Fetch and decode every row, then replace the store.
    ///
    /// Returns the number of items now held. On any error the store keeps
    /// its previous contents.
    pub async fn refresh(&self) -> Result<usize, FeedError> {
        let user_id = self.session.user_id().ok_or(FeedError::Unauthenticated)?;

        let rows = self.source.fetch(&user_id).await.inspect_err(|err| {
            warn!(error = %err, "feed fetch failed");
        })?;

        let items = decode_records::<S::Item>(rows).inspect_err(|err| {
            warn!(error = %err, "feed contained a malformed record");
        })?;

        let len = items.len();
        self.store.replace_all(items)?;
        info!(len, "feed refreshed");

        Ok(len)
    }
}
