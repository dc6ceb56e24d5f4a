//! Relations - per-user boolean facts (liked, bookmarked) cached on items.
//!
//! An item participating in a relation exposes its cached state through the
//! [`Toggleable`] trait, usually derived:
//!
//! ```ignore
//! use optimistic_toggle::Toggleable;
//!
//! #[derive(Clone, Toggleable)]
//! struct Photo {
//!     id: String,
//!     #[toggle(relation = Like, count = likes)]
//!     liked: bool,
//!     likes: u64,
//! }
//! ```

mod intent;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use intent::ToggleIntent;

/// The kinds of toggleable relation a user can hold to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Like,
    Bookmark,
}

impl RelationKind {
    /// Remote table holding one row per active (user, item) relation.
    pub fn table(&self) -> &'static str {
        match self {
            RelationKind::Like => "likes",
            RelationKind::Bookmark => "saved_posts",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::Like => write!(f, "like"),
            RelationKind::Bookmark => write!(f, "bookmark"),
        }
    }
}

/// Last known client-side state of one relation on one item.
///
/// `count` is `None` for relations without an aggregate (bookmarks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationState {
    pub active: bool,
    pub count: Option<u64>,
}

impl RelationState {
    pub fn new(active: bool, count: Option<u64>) -> Self {
        Self { active, count }
    }

    /// State after flipping away from `current_active`.
    ///
    /// The count moves relative to the caller's view of the relation, not the
    /// stored flag, and never drops below zero.
    pub fn toggled(&self, current_active: bool) -> Self {
        let count = self.count.map(|count| {
            if current_active {
                count.saturating_sub(1)
            } else {
                count.saturating_add(1)
            }
        });

        Self {
            active: !current_active,
            count,
        }
    }
}

/// Items whose relation state can be patched in place by id.
pub trait Toggleable: Clone + Send + Sync + 'static {
    /// Stable identifier of this item.
    fn id(&self) -> &str;

    /// Current state of `kind`, or `None` if this item does not carry it.
    fn relation(&self, kind: RelationKind) -> Option<RelationState>;

    /// Overwrite the state of `kind`. Returns false if this item does not carry it.
    fn set_relation(&mut self, kind: RelationKind, state: RelationState) -> bool;
}
