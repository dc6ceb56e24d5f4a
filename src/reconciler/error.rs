use crate::relation::RelationKind;
use crate::store::StoreError;

/// Error returned synchronously by a toggle request.
///
/// Every variant means the local store was left unchanged and no remote call
/// was issued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToggleError {
    /// No item with this id is present in the store.
    #[error("item not found: {id}")]
    NotFound { id: String },
    /// The item exists but does not carry this relation.
    #[error("item {id} has no {kind} relation")]
    UnsupportedRelation { id: String, kind: RelationKind },
    /// Nobody is signed in.
    #[error("no signed-in session")]
    Unauthenticated,
    /// The store could not be read or written; nothing was patched.
    #[error(transparent)]
    Store(#[from] StoreError),
}
