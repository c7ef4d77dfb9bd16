//! Value Store
//!
//! Owns the canonical copy of every value the tracker knows about. Values
//! are unique and iterate in ascending order. Each value gets a [`Handle`]
//! on insertion that keeps addressing it until that value is removed.

use std::collections::BTreeMap;
use std::fmt;

use crate::arena::{Arena, Key};

/// Stable reference to a value in a [`Store`].
///
/// A handle is unaffected by insertions and removals of other values. Once
/// its own value is removed it stops resolving, even if the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(Key);

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.0.index())
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0.index())
    }
}

/// A set of unique, ordered values addressed by [`Handle`].
#[derive(Debug, Clone)]
pub struct Store<T> {
    values: Arena<T>,
    index: BTreeMap<T, Handle>,
}

impl<T: Ord + Clone> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            values: Arena::new(),
            index: BTreeMap::new(),
        }
    }

    /// Create an empty store with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Arena::with_capacity(capacity),
            index: BTreeMap::new(),
        }
    }

    /// Insert a value.
    ///
    /// Returns the value's handle and whether it was newly inserted. An
    /// equal value already present keeps its handle.
    pub fn insert(&mut self, value: T) -> (Handle, bool) {
        if let Some(&handle) = self.index.get(&value) {
            return (handle, false);
        }

        let handle = Handle(self.values.insert(value.clone()));
        self.index.insert(value, handle);
        (handle, true)
    }

    /// Find the handle of a value.
    pub fn find(&self, value: &T) -> Option<Handle> {
        self.index.get(value).copied()
    }

    /// Check whether a value is present.
    pub fn contains(&self, value: &T) -> bool {
        self.index.contains_key(value)
    }

    /// Check whether a handle still resolves.
    pub fn contains_handle(&self, handle: Handle) -> bool {
        self.values.contains(handle.0)
    }

    /// Resolve a handle.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.values.get(handle.0)
    }

    /// Remove the value behind `handle`.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let value = self.values.remove(handle.0)?;
        self.index.remove(&value);
        Some(value)
    }

    /// Get the number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over values in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.index.keys()
    }

    /// Iterate over `(value, handle)` pairs in ascending value order.
    pub fn entries(&self) -> impl Iterator<Item = (&T, Handle)> + '_ {
        self.index.iter().map(|(value, &handle)| (value, handle))
    }

    /// Remove every value. Outstanding handles stop resolving.
    pub fn clear(&mut self) {
        self.values.clear();
        self.index.clear();
    }
}

impl<T: Ord + Clone> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}
