//! Shared sync state.
//!
//! [`SyncContext`] holds the service availability flag and the observers
//! interested in it. One context is created at startup and handed to the
//! connectivity monitor, the submission path and the reconciliation engine.

use std::cell::{Cell, RefCell};

/// A change of service availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityChange {
    pub previous: bool,
    pub current: bool,
}

impl AvailabilityChange {
    /// The service just became reachable; queued writes may be replayed.
    #[must_use]
    pub const fn came_online(&self) -> bool {
        !self.previous && self.current
    }

    #[must_use]
    pub const fn went_offline(&self) -> bool {
        self.previous && !self.current
    }
}

type Listener = Box<dyn Fn(AvailabilityChange)>;

/// Process-wide availability state.
///
/// Starts out unavailable until the first health check says otherwise.
pub struct SyncContext {
    available: Cell<bool>,
    listeners: RefCell<Vec<Listener>>,
}

impl SyncContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            available: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available.get()
    }

    /// Register a callback invoked on every availability change.
    pub fn subscribe(&self, listener: impl Fn(AvailabilityChange) + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    /// Record the latest availability observation.
    ///
    /// Listeners only hear about actual transitions; repeating the current
    /// state returns `None` and notifies nobody.
    pub fn set_available(&self, available: bool) -> Option<AvailabilityChange> {
        let previous = self.available.replace(available);
        if previous == available {
            return None;
        }

        let change = AvailabilityChange {
            previous,
            current: available,
        };
        for listener in self.listeners.borrow().iter() {
            listener(change);
        }
        Some(change)
    }
}

impl Default for SyncContext {
    fn default() -> Self {
        Self::new()
    }
}
