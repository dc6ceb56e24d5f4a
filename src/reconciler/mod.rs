//! Optimistic toggle reconciliation.
//!
//! A toggle is applied to the local store at once, then persisted remotely in
//! a spawned task. The caller gets a [`PendingToggle`] it may await, abort or
//! simply drop.
//!
//! ## Example
//!
//! ```ignore
//! use optimistic_toggle::{InMemoryItemStore, InMemoryRelationBackend, SessionContext, ToggleReconciler};
//!
//! let reconciler = ToggleReconciler::new(store, backend, session);
//! let pending = reconciler.toggle_like("p1", post.liked_by_user)?;
//! // UI re-renders from the store right away; the remote call runs on its own.
//! ```

mod config;
mod error;
mod pending;
#[allow(clippy::module_inception)]
mod reconciler;

pub use config::{ConfigError, FailurePolicy, ReconcilerConfig};
pub use error::ToggleError;
pub use pending::{PendingToggle, ToggleFailure, ToggleOutcome};
pub use reconciler::ToggleReconciler;
