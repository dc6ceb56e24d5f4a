/// Error type for item store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The underlying lock was poisoned during the named operation.
    #[error("item store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    /// A bulk replace contained the same id twice.
    #[error("duplicate item id in bulk replace: {0}")]
    DuplicateId(String),
}
