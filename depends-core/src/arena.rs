//! Generational Slot Arena
//!
//! Backing storage for both the DAG's nodes and the tracker's value store.
//! Entries are addressed by a [`Key`] made of a slot index and the slot's
//! generation at insertion time. Removing an entry bumps the generation, so
//! a key to a removed entry never resolves to whatever reuses the slot later.

/// Key into an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Key {
    index: usize,
    generation: u32,
}

impl Key {
    /// Slot index, for diagnostics.
    pub(crate) fn index(self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone)]
enum Entry<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32 },
}

/// A vector of slots with a free list.
#[derive(Debug, Clone)]
pub(crate) struct Arena<T> {
    entries: Vec<Entry<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Self::with_capacity(0)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Store a value, reusing a vacant slot if there is one.
    pub(crate) fn insert(&mut self, value: T) -> Key {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let generation = match self.entries[index] {
                Entry::Vacant { generation } => generation,
                Entry::Occupied { generation, .. } => {
                    debug_assert!(false, "free list points at an occupied slot");
                    generation.wrapping_add(1)
                }
            };
            self.entries[index] = Entry::Occupied { generation, value };
            return Key { index, generation };
        }

        let index = self.entries.len();
        self.entries.push(Entry::Occupied {
            generation: 0,
            value,
        });
        Key {
            index,
            generation: 0,
        }
    }

    pub(crate) fn get(&self, key: Key) -> Option<&T> {
        match self.entries.get(key.index)? {
            Entry::Occupied { generation, value } if *generation == key.generation => Some(value),
            _ => None,
        }
    }

    pub(crate) fn get_mut(&mut self, key: Key) -> Option<&mut T> {
        match self.entries.get_mut(key.index)? {
            Entry::Occupied { generation, value } if *generation == key.generation => Some(value),
            _ => None,
        }
    }

    pub(crate) fn contains(&self, key: Key) -> bool {
        self.get(key).is_some()
    }

    /// Remove the value behind `key`. Stale keys are ignored.
    pub(crate) fn remove(&mut self, key: Key) -> Option<T> {
        let entry = self.entries.get_mut(key.index)?;
        match entry {
            Entry::Occupied { generation, .. } if *generation == key.generation => {}
            _ => return None,
        }

        let vacant = Entry::Vacant {
            generation: key.generation.wrapping_add(1),
        };
        let Entry::Occupied { value, .. } = std::mem::replace(entry, vacant) else {
            return None;
        };

        self.free.push(key.index);
        self.len -= 1;
        Some(value)
    }

    /// Mutable access to every live value.
    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut().filter_map(|entry| match entry {
            Entry::Occupied { value, .. } => Some(value),
            Entry::Vacant { .. } => None,
        })
    }

    /// Drop every value. Generations are kept so outstanding keys stay stale.
    pub(crate) fn clear(&mut self) {
        self.free.clear();
        for (index, entry) in self.entries.iter_mut().enumerate() {
            if let Entry::Occupied { generation, .. } = *entry {
                *entry = Entry::Vacant {
                    generation: generation.wrapping_add(1),
                };
            }
            self.free.push(index);
        }
        self.len = 0;
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_survive_unrelated_removals() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        let c = arena.insert("c");

        assert_eq!(arena.remove(b), Some("b"));
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.get(c), Some(&"c"));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn reused_slot_does_not_alias_stale_key() {
        let mut arena = Arena::new();
        let old = arena.insert(1);
        arena.remove(old);

        let new = arena.insert(2);
        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert!(arena.get(old).is_none());
        assert_eq!(arena.get(new), Some(&2));
        assert!(arena.remove(old).is_none());
    }

    #[test]
    fn clear_invalidates_all_keys() {
        let mut arena = Arena::new();
        let keys: Vec<_> = (0..4).map(|i| arena.insert(i)).collect();

        arena.clear();
        assert_eq!(arena.len(), 0);
        assert!(keys.iter().all(|key| !arena.contains(*key)));

        let fresh = arena.insert(9);
        assert!(!keys.contains(&fresh));
    }
}
