//! Remote relation mutations - the source of truth for relation rows.
//!
//! The backend is opaque: all the reconciler needs is a way to insert and
//! delete one (user, relation, item) row.

mod error;
mod in_memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::relation::RelationKind;

pub use error::RemoteError;
pub use in_memory::{InMemoryRelationBackend, RelationCall};

/// Direction of a remote relation mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationOp {
    Add,
    Remove,
}

impl RelationOp {
    pub fn for_requested(requested_active: bool) -> Self {
        if requested_active {
            RelationOp::Add
        } else {
            RelationOp::Remove
        }
    }
}

/// Inserts and deletes relation rows on the remote source of truth.
///
/// Implementations should tolerate duplicate calls; a duplicate insert may be
/// reported as [`RemoteError::Duplicate`], which callers treat as a no-op.
#[async_trait]
pub trait RelationMutator: Send + Sync {
    async fn add_relation(
        &self,
        user_id: &str,
        kind: RelationKind,
        item_id: &str,
    ) -> Result<(), RemoteError>;

    async fn remove_relation(
        &self,
        user_id: &str,
        kind: RelationKind,
        item_id: &str,
    ) -> Result<(), RemoteError>;

    /// Dispatch `op` to `add_relation` or `remove_relation`.
    async fn apply(
        &self,
        op: RelationOp,
        user_id: &str,
        kind: RelationKind,
        item_id: &str,
    ) -> Result<(), RemoteError> {
        match op {
            RelationOp::Add => self.add_relation(user_id, kind, item_id).await,
            RelationOp::Remove => self.remove_relation(user_id, kind, item_id).await,
        }
    }
}
