//! Dependency Tracker
//!
//! A [`Tracker`] records "X depends on Y" relationships between values. It
//! keeps two mirrored graphs over the handles of a [`Store`]:
//!
//! - `prerequisites`: an edge `x -> y` means y is a prerequisite of x
//! - `dependants`: an edge `y -> x` means x is a dependant of y
//!
//! Every mutation touches both graphs or neither, so for any pair of values
//! `dependants.linked(y, x) == prerequisites.linked(x, y)`.
//!
//! Relationship edits and queries are relative to a single selected value,
//! the *focus*. The focus starts unset, is set by [`Tracker::select`] and is
//! cleared by [`Tracker::clear_focus`] or by erasing the focused value.

use std::collections::HashMap;
use std::hash::Hash;

use indexmap::IndexSet;
use tracing::{debug, error, trace};

use super::store::{Handle, Store};
use crate::graph::{Dag, DagError, DagResult, NodeId};

/// Where a value lives in each mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slots {
    dependant: NodeId,
    prerequisite: NodeId,
}

/// Which mirror a query walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Prerequisites,
    Dependants,
}

/// Tracks prerequisite/dependant relationships between values.
///
/// # Example
///
/// ```
/// use depends_core::tracker::Tracker;
///
/// let mut tracker = Tracker::new();
///
/// // "app" needs "lib", which needs "core"
/// tracker.select("app");
/// tracker.add_prerequisite("lib").unwrap();
/// tracker.select("lib");
/// tracker.add_prerequisite("core").unwrap();
///
/// assert!(tracker.depends(&"app", &"core"));
/// assert!(!tracker.depends(&"core", &"app"));
///
/// // Prerequisites come first
/// let order: Vec<_> = tracker.build_order().copied().collect();
/// assert_eq!(order, vec!["core", "lib", "app"]);
/// ```
#[derive(Debug, Clone)]
pub struct Tracker<T> {
    store: Store<T>,
    dependants: Dag<Handle>,
    prerequisites: Dag<Handle>,
    slots: HashMap<Handle, Slots>,
    focus: Option<Handle>,
}

impl<T> Tracker<T>
where
    T: Ord + Hash + Clone,
{
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty tracker with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: Store::with_capacity(capacity),
            dependants: Dag::with_capacity(capacity),
            prerequisites: Dag::with_capacity(capacity),
            slots: HashMap::with_capacity(capacity),
            focus: None,
        }
    }

    /// Get the number of values.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check whether the tracker holds no values.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Check whether a value is present.
    pub fn contains(&self, value: &T) -> bool {
        self.store.contains(value)
    }

    /// Find the handle of a value.
    pub fn find(&self, value: &T) -> Option<Handle> {
        self.store.find(value)
    }

    /// Resolve a handle.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.store.get(handle)
    }

    /// Iterate over values in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.store.iter()
    }

    /// Insert a value without relating it to anything.
    ///
    /// Returns the value's handle and whether it was newly inserted.
    pub fn insert(&mut self, value: T) -> (Handle, bool) {
        let (handle, inserted) = self.store.insert(value);
        if inserted {
            let slots = Slots {
                dependant: self.dependants.get_or_insert(handle),
                prerequisite: self.prerequisites.get_or_insert(handle),
            };
            self.slots.insert(handle, slots);
            trace!(%handle, "inserted value");
        }
        (handle, inserted)
    }

    /// Remove every value and clear the focus.
    pub fn clear(&mut self) {
        self.focus = None;
        self.slots.clear();
        self.dependants.clear();
        self.prerequisites.clear();
        self.store.clear();
    }

    /// The focused value's handle, if any.
    pub fn focus(&self) -> Option<Handle> {
        self.focus
    }

    /// The focused value, if any.
    pub fn focused_value(&self) -> Option<&T> {
        self.focus.and_then(|handle| self.store.get(handle))
    }

    /// Unset the focus.
    pub fn clear_focus(&mut self) {
        self.focus = None;
    }

    /// Focus on `value`, inserting it if absent.
    pub fn select(&mut self, value: T) -> Handle {
        let (handle, _) = self.insert(value);
        self.focus = Some(handle);
        trace!(%handle, "selected");
        handle
    }

    /// Focus on the value behind `handle`.
    ///
    /// Fails with [`DagError::InvalidArgument`] if the handle no longer
    /// resolves; the previous focus is kept in that case.
    pub fn select_handle(&mut self, handle: Handle) -> DagResult<()> {
        self.slots_of(handle)?;
        self.focus = Some(handle);
        trace!(%handle, "selected");
        Ok(())
    }

    /// Record that the focused value depends on `value`.
    ///
    /// `value` is inserted if absent, and stays inserted even if the link
    /// is refused. Fails with [`DagError::NoFocus`] when nothing is
    /// selected and with [`DagError::CircularReference`] when `value`
    /// already depends on the focus.
    pub fn add_prerequisite(&mut self, value: T) -> DagResult<Handle> {
        self.require_focus()?;
        let (handle, _) = self.insert(value);
        self.add_prerequisite_handle(handle)?;
        Ok(handle)
    }

    /// [`Tracker::add_prerequisite`] by handle.
    pub fn add_prerequisite_handle(&mut self, handle: Handle) -> DagResult<()> {
        let focus = self.require_focus()?;
        self.link_pair(focus, handle)
    }

    /// Record that `value` depends on the focused value.
    ///
    /// The mirror image of [`Tracker::add_prerequisite`].
    pub fn add_dependant(&mut self, value: T) -> DagResult<Handle> {
        self.require_focus()?;
        let (handle, _) = self.insert(value);
        self.add_dependant_handle(handle)?;
        Ok(handle)
    }

    /// [`Tracker::add_dependant`] by handle.
    pub fn add_dependant_handle(&mut self, handle: Handle) -> DagResult<()> {
        let focus = self.require_focus()?;
        self.link_pair(handle, focus)
    }

    /// Forget that the focused value depends on `value`.
    ///
    /// Returns whether a relationship was removed. Unknown values are not
    /// an error.
    pub fn remove_prerequisite(&mut self, value: &T) -> DagResult<bool> {
        self.require_focus()?;
        match self.store.find(value) {
            Some(handle) => self.remove_prerequisite_handle(handle),
            None => Ok(false),
        }
    }

    /// [`Tracker::remove_prerequisite`] by handle.
    pub fn remove_prerequisite_handle(&mut self, handle: Handle) -> DagResult<bool> {
        let focus = self.require_focus()?;
        self.unlink_pair(focus, handle)
    }

    /// Forget that `value` depends on the focused value.
    pub fn remove_dependant(&mut self, value: &T) -> DagResult<bool> {
        self.require_focus()?;
        match self.store.find(value) {
            Some(handle) => self.remove_dependant_handle(handle),
            None => Ok(false),
        }
    }

    /// [`Tracker::remove_dependant`] by handle.
    pub fn remove_dependant_handle(&mut self, handle: Handle) -> DagResult<bool> {
        let focus = self.require_focus()?;
        self.unlink_pair(handle, focus)
    }

    /// Values the focused value depends on.
    ///
    /// Direct prerequisites only, unless `transitive` is set, in which case
    /// everything reachable is included. Values appear once, in the order
    /// they are discovered.
    pub fn prerequisites(&self, transitive: bool) -> DagResult<IndexSet<T>> {
        self.related(View::Prerequisites, transitive)
    }

    /// Values that depend on the focused value.
    pub fn dependants(&self, transitive: bool) -> DagResult<IndexSet<T>> {
        self.related(View::Dependants, transitive)
    }

    /// Check whether `target` depends on `source`, directly or not.
    ///
    /// Values that are not present depend on nothing. A value is
    /// considered to depend on itself.
    pub fn depends(&self, target: &T, source: &T) -> bool {
        match (self.store.find(target), self.store.find(source)) {
            (Some(target), Some(source)) => self.depends_handles(target, source),
            _ => false,
        }
    }

    /// [`Tracker::depends`] by handle.
    pub fn depends_handles(&self, target: Handle, source: Handle) -> bool {
        let (Some(t), Some(s)) = (self.slots.get(&target), self.slots.get(&source)) else {
            return false;
        };

        let forward = self.dependants.linked(s.dependant, t.dependant);
        let backward = self.prerequisites.linked(t.prerequisite, s.prerequisite);
        if forward != backward {
            error!(%target, %source, forward, backward, "mirror invariant violated");
        }
        debug_assert_eq!(forward, backward, "mirror invariant violated");

        forward
    }

    /// Erase a value and every relationship it takes part in.
    ///
    /// Returns whether the value was present. Clears the focus if it was
    /// the focused value.
    pub fn erase(&mut self, value: &T) -> DagResult<bool> {
        match self.store.find(value) {
            Some(handle) => self.erase_handle(handle).map(|_| true),
            None => Ok(false),
        }
    }

    /// [`Tracker::erase`] by handle, returning the erased value.
    pub fn erase_handle(&mut self, handle: Handle) -> DagResult<T> {
        let slots = self.slots_of(handle)?;

        if self.focus == Some(handle) {
            self.focus = None;
        }

        self.dependants.erase(slots.dependant)?;
        self.prerequisites.erase(slots.prerequisite)?;
        self.slots.remove(&handle);

        let value = self
            .store
            .remove(handle)
            .ok_or_else(|| DagError::not_found("value"))?;
        trace!(%handle, "erased value");
        Ok(value)
    }

    /// Values ordered so that every prerequisite comes before the values
    /// depending on it.
    pub fn build_order(&self) -> impl Iterator<Item = &T> + '_ {
        self.dependants
            .iter()
            .filter_map(move |&handle| self.store.get(handle))
    }

    /// Values ordered so that every dependant comes before its
    /// prerequisites.
    pub fn teardown_order(&self) -> impl Iterator<Item = &T> + '_ {
        self.prerequisites
            .iter()
            .filter_map(move |&handle| self.store.get(handle))
    }

    fn require_focus(&self) -> DagResult<Handle> {
        self.focus.ok_or(DagError::NoFocus)
    }

    fn slots_of(&self, handle: Handle) -> DagResult<Slots> {
        self.slots
            .get(&handle)
            .copied()
            .ok_or_else(|| DagError::invalid_argument(format!("stale handle {handle}")))
    }

    /// Make `dependant` depend on `prerequisite` in both mirrors.
    ///
    /// `Dag::link` changes nothing when it fails, so linking one mirror and
    /// rolling it back if the other refuses keeps the pair in step.
    fn link_pair(&mut self, dependant: Handle, prerequisite: Handle) -> DagResult<()> {
        let dep = self.slots_of(dependant)?;
        let pre = self.slots_of(prerequisite)?;

        self.prerequisites.link(dep.prerequisite, pre.prerequisite)?;
        if let Err(err) = self.dependants.link(pre.dependant, dep.dependant) {
            error!(%dependant, %prerequisite, %err, "mirror invariant violated, rolling back");
            self.prerequisites.unlink(dep.prerequisite, pre.prerequisite)?;
            return Err(err);
        }

        debug!(%dependant, %prerequisite, "dependency added");
        Ok(())
    }

    /// Undo one `link_pair(dependant, prerequisite)`.
    fn unlink_pair(&mut self, dependant: Handle, prerequisite: Handle) -> DagResult<bool> {
        let dep = self.slots_of(dependant)?;
        let pre = self.slots_of(prerequisite)?;

        let was_prerequisite = self.prerequisites.unlink(dep.prerequisite, pre.prerequisite)?;
        let was_dependant = self.dependants.unlink(pre.dependant, dep.dependant)?;
        if was_prerequisite != was_dependant {
            error!(
                %dependant,
                %prerequisite,
                was_prerequisite,
                was_dependant,
                "mirror invariant violated"
            );
        }
        debug_assert_eq!(was_prerequisite, was_dependant, "mirror invariant violated");

        if was_prerequisite {
            debug!(%dependant, %prerequisite, "dependency removed");
        }
        Ok(was_prerequisite)
    }

    fn related(&self, view: View, transitive: bool) -> DagResult<IndexSet<T>> {
        let focus = self.require_focus()?;
        let slots = self.slots_of(focus)?;
        let (dag, start) = match view {
            View::Prerequisites => (&self.prerequisites, slots.prerequisite),
            View::Dependants => (&self.dependants, slots.dependant),
        };

        let direct = dag
            .targets(start)
            .ok_or_else(|| DagError::not_found("node"))?;

        let mut handles = IndexSet::new();
        for &target in direct {
            if transitive {
                dag.visit(target, |_, node| {
                    handles.insert(*node.value());
                })?;
            } else if let Some(&handle) = dag.value(target) {
                handles.insert(handle);
            }
        }

        Ok(handles
            .into_iter()
            .filter_map(|handle| self.store.get(handle).cloned())
            .collect())
    }
}

impl<T> Default for Tracker<T>
where
    T: Ord + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Extend<T> for Tracker<T>
where
    T: Ord + Hash + Clone,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, values: I) {
        for value in values {
            self.insert(value);
        }
    }
}

impl<T> FromIterator<T> for Tracker<T>
where
    T: Ord + Hash + Clone,
{
    fn from_iter<I: IntoIterator<Item = T>>(values: I) -> Self {
        let mut tracker = Self::new();
        tracker.extend(values);
        tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set<const N: usize>(values: [i32; N]) -> IndexSet<i32> {
        IndexSet::from(values)
    }

    #[test]
    fn starts_without_focus() {
        let mut tracker: Tracker<i32> = (0..3).collect();
        assert_eq!(tracker.focus(), None);
        assert_eq!(tracker.prerequisites(false), Err(DagError::NoFocus));
        assert_eq!(tracker.add_prerequisite(1), Err(DagError::NoFocus));
        assert_eq!(tracker.remove_dependant(&1), Err(DagError::NoFocus));
    }

    #[test]
    fn select_inserts_and_focuses() {
        let mut tracker = Tracker::new();
        let handle = tracker.select(7);
        assert_eq!(tracker.focus(), Some(handle));
        assert_eq!(tracker.focused_value(), Some(&7));
        assert_eq!(tracker.len(), 1);

        // Selecting again reuses the stored value
        assert_eq!(tracker.select(7), handle);
        assert_eq!(tracker.len(), 1);

        tracker.clear_focus();
        assert_eq!(tracker.focus(), None);
    }

    #[test]
    fn select_stale_handle_is_rejected() {
        let mut tracker = Tracker::new();
        let stale = tracker.select(1);
        let kept = tracker.select(2);
        tracker.erase(&1).unwrap();

        assert!(matches!(
            tracker.select_handle(stale),
            Err(DagError::InvalidArgument { .. })
        ));
        assert_eq!(tracker.focus(), Some(kept));
    }

    #[test]
    fn prerequisite_chain() {
        let mut tracker = Tracker::new();
        tracker.select(0);
        tracker.add_dependant(1).unwrap();
        tracker.select(1);
        tracker.add_dependant(2).unwrap();

        tracker.select(0);
        assert_eq!(tracker.dependants(false), Ok(set([1])));
        assert_eq!(tracker.dependants(true), Ok(set([1, 2])));

        tracker.select(2);
        assert_eq!(tracker.prerequisites(false), Ok(set([1])));
        assert_eq!(tracker.prerequisites(true), Ok(set([1, 0])));

        assert!(tracker.depends(&2, &0));
        assert!(!tracker.depends(&0, &2));
    }

    #[test]
    fn circular_dependency_changes_neither_mirror() {
        let mut tracker = Tracker::new();
        tracker.select("a");
        tracker.add_prerequisite("b").unwrap();

        tracker.select("b");
        let err = tracker.add_prerequisite("a").unwrap_err();
        assert_eq!(err, DagError::CircularReference);

        assert_eq!(tracker.prerequisites(false), Ok(IndexSet::new()));
        assert_eq!(tracker.dependants(false), Ok(IndexSet::from(["a"])));
        assert!(!tracker.depends(&"b", &"a"));

        let err = tracker.add_dependant("b").unwrap_err();
        assert!(err.is_circular_reference());
    }

    #[test]
    fn remove_relationships() {
        let mut tracker = Tracker::new();
        tracker.select(1);
        tracker.add_prerequisite(2).unwrap();
        tracker.add_dependant(3).unwrap();

        assert_eq!(tracker.remove_prerequisite(&2), Ok(true));
        assert_eq!(tracker.remove_prerequisite(&2), Ok(false));
        assert_eq!(tracker.remove_prerequisite(&99), Ok(false));
        assert_eq!(tracker.remove_dependant(&3), Ok(true));

        assert_eq!(tracker.prerequisites(true), Ok(IndexSet::new()));
        assert_eq!(tracker.dependants(true), Ok(IndexSet::new()));
        assert!(!tracker.depends(&1, &2));
        assert!(!tracker.depends(&3, &1));
    }

    #[test]
    fn erase_focused_value() {
        let mut tracker = Tracker::new();
        tracker.select(0);
        tracker.add_prerequisite(1).unwrap();
        tracker.add_dependant(2).unwrap();

        assert_eq!(tracker.erase(&0), Ok(true));
        assert_eq!(tracker.focus(), None);
        assert!(!tracker.contains(&0));
        assert!(!tracker.depends(&2, &1));

        tracker.select(2);
        assert_eq!(tracker.prerequisites(true), Ok(IndexSet::new()));
        assert_eq!(tracker.erase(&0), Ok(false));
    }

    #[test]
    fn build_and_teardown_orders() {
        let mut tracker = Tracker::new();
        tracker.select("link");
        tracker.add_prerequisite("compile").unwrap();
        tracker.select("compile");
        tracker.add_prerequisite("fetch").unwrap();

        let build: Vec<_> = tracker.build_order().copied().collect();
        assert_eq!(build, vec!["fetch", "compile", "link"]);

        let teardown: Vec<_> = tracker.teardown_order().copied().collect();
        assert_eq!(teardown, vec!["link", "compile", "fetch"]);
    }

    #[test]
    fn clear_resets_everything() {
        let mut tracker = Tracker::new();
        let handle = tracker.select(1);
        tracker.add_prerequisite(2).unwrap();

        tracker.clear();
        assert!(tracker.is_empty());
        assert_eq!(tracker.focus(), None);
        assert_eq!(tracker.get(handle), None);
    }
}
