//! InMemoryItemStore - Vec-backed item store with an id index.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[cfg(feature = "emitter")]
use std::sync::Mutex;

#[cfg(feature = "emitter")]
use event_emitter_rs::EventEmitter;
#[cfg(feature = "emitter")]
use tracing::warn;

#[cfg(feature = "emitter")]
use super::StoreEvent;
use super::{ItemStore, StoreError};
use crate::relation::Toggleable;

struct Items<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Toggleable> Items<T> {
    fn build(items: Vec<T>) -> Result<Self, StoreError> {
        let mut index = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            if index.insert(item.id().to_string(), position).is_some() {
                return Err(StoreError::DuplicateId(item.id().to_string()));
            }
        }
        Ok(Self { items, index })
    }
}

/// In-memory item store.
///
/// Clone-friendly via Arc; every clone sees the same items.
pub struct InMemoryItemStore<T> {
    items: Arc<RwLock<Items<T>>>,
    #[cfg(feature = "emitter")]
    emitter: Arc<Mutex<EventEmitter>>,
}

impl<T> Clone for InMemoryItemStore<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            #[cfg(feature = "emitter")]
            emitter: Arc::clone(&self.emitter),
        }
    }
}

impl<T: Toggleable> Default for InMemoryItemStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Toggleable> InMemoryItemStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(Items {
                items: Vec::new(),
                index: HashMap::new(),
            })),
            #[cfg(feature = "emitter")]
            emitter: Arc::new(Mutex::new(EventEmitter::new())),
        }
    }

    /// Create a store pre-filled with `items`.
    pub fn with_items(items: Vec<T>) -> Result<Self, StoreError> {
        let store = Self::new();
        store.replace_all(items)?;
        Ok(store)
    }

    /// Register a listener for every mutation. Returns the listener id.
    ///
    /// Listeners run on their own thread after the mutation is visible.
    #[cfg(feature = "emitter")]
    pub fn on_change<F>(&self, listener: F) -> Result<String, StoreError>
    where
        F: Fn(StoreEvent) + Send + Sync + 'static,
    {
        let mut emitter = self
            .emitter
            .lock()
            .map_err(|_| StoreError::LockPoisoned("on_change"))?;
        Ok(emitter.on(StoreEvent::CHANNEL, listener))
    }

    /// Detach a listener registered with `on_change`. Returns true if it existed.
    #[cfg(feature = "emitter")]
    pub fn remove_listener(&self, listener_id: &str) -> Result<bool, StoreError> {
        let mut emitter = self
            .emitter
            .lock()
            .map_err(|_| StoreError::LockPoisoned("remove_listener"))?;
        Ok(emitter.remove_listener(listener_id).is_some())
    }

    /// Runs after the write is committed, so a failure here is only logged.
    #[cfg(feature = "emitter")]
    fn notify(&self, event: StoreEvent) {
        match self.emitter.lock() {
            Ok(mut emitter) => {
                emitter.emit(StoreEvent::CHANNEL, event);
            }
            Err(_) => warn!(?event, "store listeners unavailable, change not published"),
        }
    }
}

impl<T: Toggleable> ItemStore for InMemoryItemStore<T> {
    type Item = T;

    fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        let items = self
            .items
            .read()
            .map_err(|_| StoreError::LockPoisoned("get"))?;

        Ok(items
            .index
            .get(id)
            .map(|&position| items.items[position].clone()))
    }

    fn snapshot(&self) -> Result<Vec<T>, StoreError> {
        let items = self
            .items
            .read()
            .map_err(|_| StoreError::LockPoisoned("snapshot"))?;
        Ok(items.items.clone())
    }

    fn len(&self) -> Result<usize, StoreError> {
        let items = self
            .items
            .read()
            .map_err(|_| StoreError::LockPoisoned("len"))?;
        Ok(items.items.len())
    }

    fn patch(
        &self,
        id: &str,
        patch: &mut dyn FnMut(&mut T),
    ) -> Result<Option<T>, StoreError> {
        let patched = {
            let mut items = self
                .items
                .write()
                .map_err(|_| StoreError::LockPoisoned("patch"))?;

            let Some(&position) = items.index.get(id) else {
                return Ok(None);
            };
            let item = &mut items.items[position];
            patch(item);
            item.clone()
        };

        #[cfg(feature = "emitter")]
        self.notify(StoreEvent::Patched { id: id.to_string() });

        Ok(Some(patched))
    }

    fn replace_all(&self, items: Vec<T>) -> Result<(), StoreError> {
        let replacement = Items::build(items)?;
        let len = replacement.items.len();

        {
            let mut items = self
                .items
                .write()
                .map_err(|_| StoreError::LockPoisoned("replace_all"))?;
            *items = replacement;
        }

        #[cfg(feature = "emitter")]
        self.notify(StoreEvent::Replaced { len });
        #[cfg(not(feature = "emitter"))]
        let _ = len;

        Ok(())
    }
}
