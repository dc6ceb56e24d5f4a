//! Item stores - the client-side collection the reconciler patches.
//!
//! A store holds an ordered list of items keyed by id. Bulk fetches replace
//! it wholesale; toggles patch single items in place. Readers observe every
//! mutation as soon as the call returns.
//!
//! ## Example
//!
//! ```ignore
//! use optimistic_toggle::{InMemoryItemStore, ItemStore, Post};
//!
//! let store = InMemoryItemStore::<Post>::new();
//! store.replace_all(posts)?;
//! let post = store.get("p1")?;
//! ```

mod error;
#[cfg(feature = "emitter")]
mod events;
mod in_memory;
mod store;

pub use error::StoreError;
#[cfg(feature = "emitter")]
pub use events::StoreEvent;
pub use in_memory::InMemoryItemStore;
pub use store::ItemStore;
