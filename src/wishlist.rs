//! Wishlist
//!
//! Persisted set of product ids the shopper has saved for later. Like the
//! cart it lives in local storage and survives reloads.

use serde::{Deserialize, Serialize};

use crate::{
    products::ProductId,
    storage::{KeyValueStore, StorageError, WISHLIST_KEY},
};

/// Insertion-ordered set of wishlisted product ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist {
    ids: Vec<ProductId>,
}

impl Wishlist {
    /// Create an empty wishlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the persisted wishlist, starting empty when nothing usable is
    /// stored.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match Self::restore_from(store) {
            Ok(Some(wishlist)) => wishlist,
            Ok(None) => Self::new(),
            Err(err) => {
                tracing::warn!(%err, "discarding unusable wishlist snapshot");
                Self::new()
            }
        }
    }

    fn restore_from(store: &dyn KeyValueStore) -> Result<Option<Self>, StorageError> {
        let Some(raw) = store.get(WISHLIST_KEY)? else {
            return Ok(None);
        };

        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Persist the current contents.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when serialization or the write fails.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        if self.ids.is_empty() {
            return store.remove(WISHLIST_KEY);
        }

        let raw = serde_json::to_string(self)?;
        store.put(WISHLIST_KEY, &raw)
    }

    /// Toggle a product: returns `true` if it is now wishlisted, `false` if
    /// it was just removed.
    pub fn toggle(&mut self, id: ProductId) -> bool {
        if self.contains(id) {
            self.ids.retain(|stored| *stored != id);
            false
        } else {
            self.ids.push(id);
            true
        }
    }

    /// Check whether a product is wishlisted.
    pub fn contains(&self, id: ProductId) -> bool {
        self.ids.contains(&id)
    }

    /// Wishlisted ids in insertion order.
    pub fn ids(&self) -> &[ProductId] {
        &self.ids
    }

    /// Number of wishlisted products.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if the wishlist is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
