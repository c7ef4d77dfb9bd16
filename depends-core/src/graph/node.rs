//! Graph Nodes
//!
//! This module defines the node type that lives in a [`Dag`](super::Dag)
//! and the scoped "visiting" mark used for cycle detection.

use std::cell::Cell;
use std::fmt;

use smallvec::SmallVec;

use crate::arena::Key;

/// Identifier of a node inside one [`Dag`](super::Dag).
///
/// Ids stay valid while the node exists, whatever else is inserted, linked
/// or erased. Once the node is erased its id never resolves again, even if
/// the slot gets reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) Key);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0.index())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0.index())
    }
}

/// Outgoing edges of a node. Most nodes have only a handful.
pub(crate) type Edges = SmallVec<[NodeId; 4]>;

/// A node in the graph.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// The value this node decorates.
    value: T,

    /// Path-count pressure into this node: 1 plus the score of every
    /// direct predecessor. Drives the DAG's sort order.
    score: u64,

    /// Targets of this node's outgoing edges, in link order.
    /// The same target may appear more than once.
    edges: Edges,

    /// Set while a traversal is inside this node.
    visiting: Cell<bool>,
}

impl<T> Node<T> {
    /// Create an unlinked node with a score of 1.
    pub(crate) fn new(value: T) -> Self {
        Self {
            value,
            score: 1,
            edges: Edges::new(),
            visiting: Cell::new(false),
        }
    }

    /// Rebuild a node from persisted parts.
    pub(crate) fn from_parts(value: T, score: u64, edges: Edges) -> Self {
        Self {
            value,
            score,
            edges,
            visiting: Cell::new(false),
        }
    }

    /// Get the node's value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consume the node, returning its value.
    pub(crate) fn into_value(self) -> T {
        self.value
    }

    /// Get the node's score.
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Targets of the outgoing edges.
    pub fn targets(&self) -> &[NodeId] {
        &self.edges
    }

    /// Whether a traversal is currently inside this node.
    pub fn is_visiting(&self) -> bool {
        self.visiting.get()
    }

    /// Mark this node as visiting until the returned guard is dropped.
    pub(crate) fn mark(&self) -> VisitMark<'_> {
        VisitMark::set(&self.visiting)
    }

    pub(crate) fn push_edge(&mut self, target: NodeId) {
        self.edges.push(target);
    }

    /// Remove one edge to `target`. Returns false if there was none.
    pub(crate) fn remove_edge(&mut self, target: NodeId) -> bool {
        match self.edges.iter().position(|&t| t == target) {
            Some(at) => {
                self.edges.remove(at);
                true
            }
            None => false,
        }
    }

    /// Remove every edge to `target`, returning how many there were.
    pub(crate) fn remove_edges_to(&mut self, target: NodeId) -> usize {
        let before = self.edges.len();
        self.edges.retain(|t| *t != target);
        before - self.edges.len()
    }

    pub(crate) fn add_score(&mut self, delta: u64) {
        self.score = self.score.saturating_add(delta);
    }

    pub(crate) fn sub_score(&mut self, delta: u64) {
        self.score = self.score.saturating_sub(delta).max(1);
    }
}

/// Guard that clears a node's visiting flag when dropped.
///
/// The flag is cleared on every exit path, including early returns
/// through `?`, so a failed traversal leaves no marks behind.
pub(crate) struct VisitMark<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> VisitMark<'a> {
    fn set(flag: &'a Cell<bool>) -> Self {
        debug_assert!(!flag.get(), "node marked twice");
        flag.set(true);
        Self { flag }
    }
}

impl Drop for VisitMark<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}
