//! Process-scoped snapshot cells
//!
//! Each external adapter (token catalog, address book, account info) writes its
//! latest resolved result into a [`SnapshotCell`]. Readers always see the most
//! recent write; there is no staleness token, the last write wins.

use std::sync::{Arc, RwLock};

/// Current contents of a snapshot cell
#[derive(Debug)]
pub enum Snapshot<T> {
    /// No adapter result has arrived yet
    NotLoaded,
    /// Latest resolved adapter result
    Loaded(Arc<T>),
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        match self {
            Snapshot::NotLoaded => Snapshot::NotLoaded,
            Snapshot::Loaded(value) => Snapshot::Loaded(Arc::clone(value)),
        }
    }
}

impl<T> Snapshot<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Snapshot::Loaded(_))
    }

    /// Borrow the loaded value, if any
    pub fn as_loaded(&self) -> Option<&Arc<T>> {
        match self {
            Snapshot::Loaded(value) => Some(value),
            Snapshot::NotLoaded => None,
        }
    }

    pub fn into_loaded(self) -> Option<Arc<T>> {
        match self {
            Snapshot::Loaded(value) => Some(value),
            Snapshot::NotLoaded => None,
        }
    }
}

/// Shared, overwrite-only holder for the latest snapshot of `T`
#[derive(Debug)]
pub struct SnapshotCell<T> {
    inner: RwLock<Snapshot<T>>,
}

impl<T> Default for SnapshotCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SnapshotCell<T> {
    /// Create an empty cell in the `NotLoaded` state
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Snapshot::NotLoaded),
        }
    }

    /// Create a cell that already holds a value
    pub fn with_value(value: T) -> Self {
        Self {
            inner: RwLock::new(Snapshot::Loaded(Arc::new(value))),
        }
    }

    /// Read the current snapshot
    pub fn get(&self) -> Snapshot<T> {
        // A poisoned lock still holds a complete snapshot: writers only swap Arcs
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the current snapshot unconditionally
    pub fn set(&self, value: T) {
        let next = Snapshot::Loaded(Arc::new(value));
        match self.inner.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Return to the `NotLoaded` state
    pub fn clear(&self) {
        match self.inner.write() {
            Ok(mut guard) => *guard = Snapshot::NotLoaded,
            Err(poisoned) => *poisoned.into_inner() = Snapshot::NotLoaded,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.get().is_loaded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_not_loaded() {
        let cell: SnapshotCell<Vec<u32>> = SnapshotCell::new();
        assert!(!cell.is_loaded());
        assert!(cell.get().as_loaded().is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let cell = SnapshotCell::new();
        cell.set(vec![1, 2]);
        let first = cell.get().into_loaded().unwrap();
        cell.set(vec![3]);

        // Earlier readers keep their own Arc
        assert_eq!(*first, vec![1, 2]);
        assert_eq!(*cell.get().into_loaded().unwrap(), vec![3]);
    }

    #[test]
    fn test_clear() {
        let cell = SnapshotCell::with_value("x".to_string());
        assert!(cell.is_loaded());
        cell.clear();
        assert!(!cell.is_loaded());
    }
}
