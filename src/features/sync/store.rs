//! Durable storage for queue-shaped data.
//!
//! A [`SlotStore`] keeps one JSON array in a named database slot. Reads never
//! fail: missing or unreadable data loads as an empty list.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::RollcallError;
use crate::storage::Database;

/// Slot holding the offline queue.
pub const QUEUE_SLOT: &str = "offline_queue";

/// Slot holding operations rejected during reconciliation.
pub const DEAD_LETTER_SLOT: &str = "offline_queue_dead_letter";

/// A list of `T` persisted under a fixed key.
pub struct SlotStore<'a, T> {
    db: &'a Database,
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Serialize + DeserializeOwned> SlotStore<'a, T> {
    #[must_use]
    pub const fn new(db: &'a Database, key: &'static str) -> Self {
        Self {
            db,
            key,
            _marker: PhantomData,
        }
    }

    /// Load the persisted list.
    ///
    /// Returns an empty list when the slot is missing, unreadable or holds
    /// data that does not decode.
    #[must_use]
    pub fn load(&self) -> Vec<T> {
        let raw = match self.db.read_slot(self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(slot = self.key, error = %e, "could not read slot, treating as empty");
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(slot = self.key, error = %e, "slot holds invalid data, treating as empty");
            Vec::new()
        })
    }

    /// Replace the persisted list.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be serialized or written.
    pub fn save(&self, items: &[T]) -> Result<(), RollcallError> {
        let raw = serde_json::to_string(items)?;
        self.db.write_slot(self.key, &raw)
    }

    /// Remove the persisted list entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be deleted.
    pub fn clear(&self) -> Result<(), RollcallError> {
        self.db.delete_slot(self.key)
    }
}
