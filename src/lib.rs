//! Optimistic reconciliation of per-user toggleable relations.
//!
//! Likes and bookmarks are applied to a local item store immediately and
//! persisted to a remote source of truth in the background. See
//! [`ToggleReconciler`] for the contract.

// Lets `#[derive(Toggleable)]` name this crate from inside it.
extern crate self as optimistic_toggle;

mod feed;
mod model;
mod reconciler;
mod relation;
mod remote;
mod session;
mod store;

pub use feed::{FeedError, FeedLoader, FeedSource, InMemoryFeed};
pub use model::{decode_records, AuthorSummary, DecodeError, Post, Record};
pub use reconciler::{
    ConfigError, FailurePolicy, PendingToggle, ReconcilerConfig, ToggleError, ToggleFailure,
    ToggleOutcome, ToggleReconciler,
};
pub use relation::{RelationKind, RelationState, ToggleIntent, Toggleable};
pub use remote::{InMemoryRelationBackend, RelationCall, RelationMutator, RelationOp, RemoteError};
pub use session::{Session, SessionContext};
#[cfg(feature = "emitter")]
pub use store::StoreEvent;
pub use store::{InMemoryItemStore, ItemStore, StoreError};

// Derive macro for `Toggleable`
pub use optimistic_toggle_macros::Toggleable;

// Re-export so implementors of the async collaborator traits need not depend on it directly
pub use async_trait::async_trait;
