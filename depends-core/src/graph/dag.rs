//! Directed Acyclic Graph
//!
//! [`Dag`] owns a set of nodes and keeps two things true after every
//! mutating call: the edge relation has no cycle, and the public sequence of
//! nodes is sorted ascending by score.
//!
//! # Algorithm
//!
//! Cycle detection uses a depth-first traversal that marks each node as
//! "visiting" while the traversal is below it:
//!
//! 1. To link `source -> target`, mark `source` and traverse from `target`.
//!    Reaching a marked node means `target` already has a path back to
//!    `source`, so the link is refused and nothing changes.
//! 2. Otherwise push the edge and traverse from `target` again, adding the
//!    score of `source` to every node reached (once per path).
//! 3. Stable-sort the sequence by score.
//!
//! Unlinking runs step 2 in reverse. The traversal keeps its own stack of
//! frames, so graph depth is not limited by the call stack, and each frame
//! owns the mark of its node so that a failed traversal unwinds cleanly.
//!
//! Because scores only ever flow along edges, a node's score is always 1
//! plus the scores of its direct predecessors. Nodes nothing points at sort
//! first; the deepest targets sort last.

use std::ops::Range;

use tracing::{debug, trace};

use super::error::{DagError, DagResult};
use super::node::{Edges, Node, NodeId, VisitMark};
use crate::arena::Arena;

/// A directed acyclic graph over values of type `T`.
///
/// Values are unique within one graph. Nodes are addressed by [`NodeId`],
/// which stays valid until the node itself is erased.
///
/// # Example
///
/// ```
/// use depends_core::graph::Dag;
///
/// let mut dag: Dag<i32> = (0..5).collect();
/// dag.link_values(&1, &2).unwrap();
/// dag.link_values(&2, &3).unwrap();
///
/// // 3 -> 1 would close 1 -> 2 -> 3 -> 1
/// assert!(dag.link_values(&3, &1).unwrap_err().is_circular_reference());
///
/// assert!(dag.linked_values(&1, &3).unwrap());
/// assert_eq!(dag.iter().last(), Some(&3));
/// ```
#[derive(Debug, Clone)]
pub struct Dag<T> {
    /// Every node, addressed by id.
    nodes: Arena<Node<T>>,

    /// Node ids sorted ascending by score.
    order: Vec<NodeId>,
}

/// One level of an in-progress traversal.
struct Frame<'a> {
    targets: &'a [NodeId],
    cursor: usize,
    _mark: VisitMark<'a>,
}

impl<T> Dag<T> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty graph with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
        }
    }

    /// Get the number of nodes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Check whether `id` refers to a node of this graph.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id.0)
    }

    /// Get a node.
    pub fn get(&self, id: NodeId) -> Option<&Node<T>> {
        self.nodes.get(id.0)
    }

    /// Get a node's value.
    pub fn value(&self, id: NodeId) -> Option<&T> {
        self.get(id).map(Node::value)
    }

    /// Get a node's score.
    pub fn score(&self, id: NodeId) -> Option<u64> {
        self.get(id).map(Node::score)
    }

    /// Get the targets of a node's outgoing edges.
    pub fn targets(&self, id: NodeId) -> Option<&[NodeId]> {
        self.get(id).map(Node::targets)
    }

    /// Node ids in sequence (score) order.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Position of a node in the sequence.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.order.iter().position(|&other| other == id)
    }

    /// Iterate over values in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.nodes().map(|(_, node)| node.value())
    }

    /// Iterate over nodes in sequence order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node<T>)> + '_ {
        self.order
            .iter()
            .filter_map(move |&id| self.nodes.get(id.0).map(|node| (id, node)))
    }

    /// Depth-first traversal from `start`.
    ///
    /// `visitor` is called on entry to every node reached, once per path
    /// leading to it. Entering a node the traversal is already inside
    /// fails with [`DagError::CircularReference`]. Marks are cleared on
    /// every exit path.
    ///
    /// The visitor must not call back into this graph.
    pub fn visit<F>(&self, start: NodeId, mut visitor: F) -> DagResult<()>
    where
        F: FnMut(NodeId, &Node<T>),
    {
        if !self.contains(start) {
            return Err(DagError::not_found("node"));
        }

        let mut stack = Vec::new();
        self.enter(start, &mut visitor, &mut stack)?;

        loop {
            let next = match stack.last_mut() {
                Some(frame) => match frame.targets.get(frame.cursor) {
                    Some(&target) => {
                        frame.cursor += 1;
                        Some(target)
                    }
                    None => None,
                },
                None => break,
            };

            match next {
                Some(target) => self.enter(target, &mut visitor, &mut stack)?,
                None => {
                    stack.pop();
                }
            }
        }

        Ok(())
    }

    fn enter<'a, F>(
        &'a self,
        id: NodeId,
        visitor: &mut F,
        stack: &mut Vec<Frame<'a>>,
    ) -> DagResult<()>
    where
        F: FnMut(NodeId, &Node<T>),
    {
        // Edges left dangling by `erase_range` lead nowhere.
        let Some(node) = self.nodes.get(id.0) else {
            return Ok(());
        };

        if node.is_visiting() {
            return Err(DagError::CircularReference);
        }

        visitor(id, node);
        stack.push(Frame {
            targets: node.targets(),
            cursor: 0,
            _mark: node.mark(),
        });
        Ok(())
    }

    /// Add an edge `source -> target`.
    ///
    /// Fails with [`DagError::CircularReference`], leaving the graph
    /// untouched, if `target` can already reach `source` (this includes
    /// `source == target`). On success the score of `source` is added to
    /// `target` and everything reachable from it.
    pub fn link(&mut self, source: NodeId, target: NodeId) -> DagResult<()> {
        if let Err(err) = self.check_link(source, target) {
            debug!(%source, %target, %err, "link rejected");
            return Err(err);
        }

        let source_node = self.node_mut(source)?;
        source_node.push_edge(target);
        let score = source_node.score();

        self.adjust_closure(target, |node| node.add_score(score))?;
        self.sort();

        debug!(%source, %target, score, "linked");
        Ok(())
    }

    /// Traverse from `target` with `source` pinned as visiting.
    fn check_link(&self, source: NodeId, target: NodeId) -> DagResult<()> {
        let source_node = self.node(source)?;
        self.node(target)?;

        let _pin = source_node.mark();
        self.visit(target, |_, _| {})
    }

    /// Remove one edge `source -> target`.
    ///
    /// Returns whether an edge was removed. When it was, the score of
    /// `source` is subtracted from `target` and everything reachable from
    /// it. Other paths between the two nodes are not looked for.
    pub fn unlink(&mut self, source: NodeId, target: NodeId) -> DagResult<bool> {
        self.node(target)?;

        let source_node = self.node_mut(source)?;
        if !source_node.remove_edge(target) {
            return Ok(false);
        }
        let score = source_node.score();

        self.adjust_closure(target, |node| node.sub_score(score))?;
        self.sort();

        debug!(%source, %target, score, "unlinked");
        Ok(true)
    }

    /// Check whether a path `source -> ... -> target` exists.
    ///
    /// A node is always linked to itself. Unknown ids are never linked.
    pub fn linked(&self, source: NodeId, target: NodeId) -> bool {
        let (Some(_), Some(target_node)) = (self.get(source), self.get(target)) else {
            return false;
        };

        let _pin = target_node.mark();
        matches!(
            self.visit(source, |_, _| {}),
            Err(DagError::CircularReference)
        )
    }

    /// Erase a node, severing every edge into or out of it.
    ///
    /// Outgoing edges are unlinked one by one so that downstream scores
    /// stay consistent. Returns the node's value.
    pub fn erase(&mut self, id: NodeId) -> DagResult<T> {
        loop {
            let Some(&target) = self.node(id)?.targets().first() else {
                break;
            };
            if self.contains(target) {
                self.unlink(id, target)?;
            } else {
                self.node_mut(id)?.remove_edges_to(target);
            }
        }

        for node in self.nodes.values_mut() {
            node.remove_edges_to(id);
        }

        self.order.retain(|&other| other != id);
        let node = self
            .nodes
            .remove(id.0)
            .ok_or_else(|| DagError::not_found("node"))?;

        trace!(%id, "erased node");
        Ok(node.into_value())
    }

    /// Erase the nodes at sequence positions `range`.
    ///
    /// Unlike [`Dag::erase`] this does not scan the rest of the graph for
    /// edges into the erased nodes. Callers must make sure no surviving
    /// node still links to one of them; traversals skip such edges, but
    /// scores are not corrected.
    pub fn erase_range(&mut self, range: Range<usize>) -> DagResult<Vec<T>> {
        if range.start > range.end || range.end > self.order.len() {
            return Err(DagError::invalid_argument(format!(
                "range {}..{} out of bounds for {} nodes",
                range.start,
                range.end,
                self.order.len()
            )));
        }

        let erased: Vec<NodeId> = self.order.drain(range).collect();
        trace!(count = erased.len(), "erased node range");

        Ok(erased
            .into_iter()
            .filter_map(|id| self.nodes.remove(id.0))
            .map(Node::into_value)
            .collect())
    }

    /// Remove every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
    }

    fn node(&self, id: NodeId) -> DagResult<&Node<T>> {
        self.nodes.get(id.0).ok_or_else(|| DagError::not_found("node"))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> DagResult<&mut Node<T>> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| DagError::not_found("node"))
    }

    /// Apply `adjust` to every node reachable from `start`, once per path.
    fn adjust_closure<F>(&mut self, start: NodeId, adjust: F) -> DagResult<()>
    where
        F: Fn(&mut Node<T>),
    {
        let mut reached = Vec::new();
        self.visit(start, |id, _| reached.push(id))?;

        for id in reached {
            if let Some(node) = self.nodes.get_mut(id.0) {
                adjust(node);
            }
        }
        Ok(())
    }

    /// Restore the score order. Stable, so ties keep their relative order.
    pub(crate) fn sort(&mut self) {
        let nodes = &self.nodes;
        self.order
            .sort_by_key(|id| nodes.get(id.0).map_or(0, Node::score));
    }

    /// Append a node with a given score, skipping the duplicate check.
    pub(crate) fn restore(&mut self, value: T, score: u64) -> NodeId {
        let id = NodeId(self.nodes.insert(Node::from_parts(value, score, Edges::new())));
        self.order.push(id);
        id
    }

    fn push_node(&mut self, value: T) -> NodeId {
        let id = NodeId(self.nodes.insert(Node::new(value)));
        // A fresh node has the lowest possible score.
        self.order.insert(0, id);
        id
    }
}

impl<T: PartialEq> Dag<T> {
    /// Insert a value without linking it.
    ///
    /// Returns the new node's id, or `None` if an equal value is already
    /// present (in which case nothing changes).
    pub fn insert(&mut self, value: T) -> Option<NodeId> {
        if self.find(&value).is_some() {
            return None;
        }
        Some(self.push_node(value))
    }

    /// Get the node holding `value`, inserting it if absent.
    pub fn get_or_insert(&mut self, value: T) -> NodeId {
        match self.find(&value) {
            Some(id) => id,
            None => self.push_node(value),
        }
    }

    /// Find the node holding `value` (linear search).
    pub fn find(&self, value: &T) -> Option<NodeId> {
        self.nodes()
            .find(|(_, node)| node.value() == value)
            .map(|(id, _)| id)
    }

    /// Check whether `value` is present.
    pub fn contains_value(&self, value: &T) -> bool {
        self.find(value).is_some()
    }

    /// [`Dag::link`] by value.
    pub fn link_values(&mut self, source: &T, target: &T) -> DagResult<()> {
        let source = self.resolve(source)?;
        let target = self.resolve(target)?;
        self.link(source, target)
    }

    /// [`Dag::unlink`] by value.
    pub fn unlink_values(&mut self, source: &T, target: &T) -> DagResult<bool> {
        let source = self.resolve(source)?;
        let target = self.resolve(target)?;
        self.unlink(source, target)
    }

    /// [`Dag::linked`] by value.
    pub fn linked_values(&self, source: &T, target: &T) -> DagResult<bool> {
        let source = self.resolve(source)?;
        let target = self.resolve(target)?;
        Ok(self.linked(source, target))
    }

    /// [`Dag::erase`] by value.
    pub fn erase_value(&mut self, value: &T) -> DagResult<T> {
        let id = self.resolve(value)?;
        self.erase(id)
    }

    fn resolve(&self, value: &T) -> DagResult<NodeId> {
        self.find(value).ok_or_else(|| DagError::not_found("value"))
    }
}

impl<T> Default for Dag<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Two graphs are equal when their sequences hold equal values with equal
/// scores and equal edge lists (compared by target value).
impl<T: PartialEq> PartialEq for Dag<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.nodes().zip(other.nodes()).all(|((_, lhs), (_, rhs))| {
                lhs.value() == rhs.value()
                    && lhs.score() == rhs.score()
                    && lhs.targets().len() == rhs.targets().len()
                    && lhs
                        .targets()
                        .iter()
                        .zip(rhs.targets())
                        .all(|(&l, &r)| self.value(l) == other.value(r))
            })
    }
}

impl<T: PartialEq> Extend<T> for Dag<T> {
    /// Insert every value, skipping duplicates.
    fn extend<I: IntoIterator<Item = T>>(&mut self, values: I) {
        for value in values {
            self.insert(value);
        }
    }
}

impl<T: PartialEq> FromIterator<T> for Dag<T> {
    fn from_iter<I: IntoIterator<Item = T>>(values: I) -> Self {
        let mut dag = Self::new();
        dag.extend(values);
        dag
    }
}
