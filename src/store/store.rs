//! ItemStore - ordered, id-keyed collection of toggleable items.

use super::StoreError;
use crate::relation::Toggleable;

/// Ordered collection of items keyed by id.
///
/// `patch` is an atomic read-modify-write on a single item; implementations
/// must not expose a half-applied patch to concurrent readers.
pub trait ItemStore: Send + Sync {
    type Item: Toggleable;

    /// Get a copy of an item by id.
    fn get(&self, id: &str) -> Result<Option<Self::Item>, StoreError>;

    /// Copy of every item in store order.
    fn snapshot(&self) -> Result<Vec<Self::Item>, StoreError>;

    /// Number of items held.
    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Apply `patch` to the item with `id` in place.
    ///
    /// Returns the patched item, or `None` (and changes nothing) if absent.
    fn patch(
        &self,
        id: &str,
        patch: &mut dyn FnMut(&mut Self::Item),
    ) -> Result<Option<Self::Item>, StoreError>;

    /// Replace every item, keeping the given order.
    fn replace_all(&self, items: Vec<Self::Item>) -> Result<(), StoreError>;
}
