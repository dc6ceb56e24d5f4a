use serde::{Deserialize, Serialize};

/// Change notification published by a store after a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreEvent {
    /// A single item was patched in place.
    Patched { id: String },
    /// The whole collection was replaced.
    Replaced { len: usize },
}

impl StoreEvent {
    pub(crate) const CHANNEL: &'static str = "store:changed";
}
