//! Offline queue management.
//!
//! The persisted list is the single source of truth: every read goes to the
//! store and every mutation re-loads, edits and saves before returning, so an
//! acknowledged enqueue or removal survives a restart.

use std::cell::RefCell;

use tracing::debug;

use super::operation::{DeadLetter, QueuedOperation};
use super::store::{SlotStore, DEAD_LETTER_SLOT, QUEUE_SLOT};
use crate::error::RollcallError;
use crate::storage::Database;

type CountListener = Box<dyn Fn(usize)>;

/// Ordered queue of writes waiting for the service.
pub struct SyncQueue<'a> {
    store: SlotStore<'a, QueuedOperation>,
    listeners: RefCell<Vec<CountListener>>,
}

impl<'a> SyncQueue<'a> {
    /// Create a queue backed by the given database.
    #[must_use]
    pub fn new(db: &'a Database) -> Self {
        Self {
            store: SlotStore::new(db, QUEUE_SLOT),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Register a callback invoked with the new count after every change.
    pub fn subscribe(&self, listener: impl Fn(usize) + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    fn notify(&self, count: usize) {
        for listener in self.listeners.borrow().iter() {
            listener(count);
        }
    }

    /// Append an operation and return the new count.
    ///
    /// Identical operations are kept as distinct entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be persisted.
    pub fn enqueue(&self, operation: QueuedOperation) -> Result<usize, RollcallError> {
        let mut operations = self.store.load();
        debug!(%operation, position = operations.len(), "enqueue");
        operations.push(operation);
        self.store.save(&operations)?;

        let count = operations.len();
        self.notify(count);
        Ok(count)
    }

    /// Remove the operation at `index`.
    ///
    /// Out-of-range indexes are ignored and return `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be persisted.
    pub fn dequeue_at(&self, index: usize) -> Result<Option<QueuedOperation>, RollcallError> {
        let mut operations = self.store.load();
        if index >= operations.len() {
            return Ok(None);
        }

        let removed = operations.remove(index);
        debug!(operation = %removed, index, "dequeue");
        self.store.save(&operations)?;

        self.notify(operations.len());
        Ok(Some(removed))
    }

    /// Number of queued operations.
    #[must_use]
    pub fn count(&self) -> usize {
        self.store.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Snapshot of the queue in replay order.
    #[must_use]
    pub fn list(&self) -> Vec<QueuedOperation> {
        self.store.load()
    }

    /// Position of the first queued create for a student with this name.
    #[must_use]
    pub fn find_pending_create(&self, name: &str) -> Option<usize> {
        self.store
            .load()
            .iter()
            .position(|op| op.creates_student_named(name))
    }

    /// Replace the whole queue, e.g. with the tail left after a partial
    /// reconciliation.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be persisted.
    pub fn replace(&self, operations: &[QueuedOperation]) -> Result<(), RollcallError> {
        self.store.save(operations)?;
        self.notify(operations.len());
        Ok(())
    }

    /// Remove every queued operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be cleared.
    pub fn clear(&self) -> Result<(), RollcallError> {
        self.store.clear()?;
        self.notify(0);
        Ok(())
    }
}

/// Operations the service refused during reconciliation.
pub struct DeadLetters<'a> {
    store: SlotStore<'a, DeadLetter>,
}

impl<'a> DeadLetters<'a> {
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self {
            store: SlotStore::new(db, DEAD_LETTER_SLOT),
        }
    }

    #[must_use]
    pub fn list(&self) -> Vec<DeadLetter> {
        self.store.load()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.store.load().len()
    }

    /// Append rejected operations, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted.
    pub fn extend(&self, letters: Vec<DeadLetter>) -> Result<(), RollcallError> {
        if letters.is_empty() {
            return Ok(());
        }

        let mut all = self.store.load();
        all.extend(letters);
        self.store.save(&all)
    }

    /// Move every dead letter back to the end of `queue`.
    ///
    /// Operations are re-queued before the list is cleared, so an
    /// interruption can duplicate an entry but never lose one.
    ///
    /// # Errors
    ///
    /// Returns an error if either list cannot be persisted.
    pub fn requeue_into(&self, queue: &SyncQueue<'_>) -> Result<usize, RollcallError> {
        let letters = self.store.load();
        let count = letters.len();

        for letter in letters {
            queue.enqueue(letter.operation)?;
        }
        self.store.clear()?;

        Ok(count)
    }

    /// Discard every dead letter.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be cleared.
    pub fn clear(&self) -> Result<(), RollcallError> {
        self.store.clear()
    }
}
