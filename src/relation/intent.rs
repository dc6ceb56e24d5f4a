use serde::{Deserialize, Serialize};

use super::RelationKind;

/// A single user-initiated request to flip one relation on one item.
///
/// Lives for one reconciliation cycle only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleIntent {
    pub item_id: String,
    pub kind: RelationKind,
    pub previous_active: bool,
    pub requested_active: bool,
    /// Sequence number assigned by the reconciler; a higher number supersedes
    /// a lower one for the same (item, kind).
    pub generation: u64,
}

impl ToggleIntent {
    pub fn new(item_id: impl Into<String>, kind: RelationKind, current_active: bool) -> Self {
        Self {
            item_id: item_id.into(),
            kind,
            previous_active: current_active,
            requested_active: !current_active,
            generation: 0,
        }
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Whether the remote side should gain a relation row.
    pub fn is_add(&self) -> bool {
        self.requested_active
    }
}
