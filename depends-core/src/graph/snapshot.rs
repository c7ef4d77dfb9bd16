//! Graph Snapshots
//!
//! A [`Snapshot`] is the flat form of a [`Dag`]: every node's value, score
//! and outgoing edges (as positions in the snapshot) in sequence order.
//! Persistence layers serialize this and hand it back to
//! [`Dag::from_snapshot`], which rebuilds an equal graph.
//!
//! With the `serde` feature the snapshot types derive `Serialize` and
//! `Deserialize`, so any serde format can carry them.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::dag::Dag;
use super::error::{DagError, DagResult};
use super::node::NodeId;

/// The flat, index-linked form of a [`Dag`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Snapshot<T> {
    /// Nodes in sequence order.
    pub nodes: Vec<SnapshotNode<T>>,
}

/// One node of a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SnapshotNode<T> {
    pub value: T,
    pub score: u64,
    /// Positions of the edge targets within [`Snapshot::nodes`].
    pub edges: Vec<usize>,
}

impl<T: Clone> Dag<T> {
    /// Flatten the graph.
    pub fn snapshot(&self) -> Snapshot<T> {
        let positions: HashMap<NodeId, usize> = self
            .order()
            .iter()
            .enumerate()
            .map(|(position, &id)| (id, position))
            .collect();

        let nodes = self
            .nodes()
            .map(|(_, node)| SnapshotNode {
                value: node.value().clone(),
                score: node.score(),
                edges: node
                    .targets()
                    .iter()
                    .filter_map(|target| positions.get(target).copied())
                    .collect(),
            })
            .collect();

        Snapshot { nodes }
    }
}

impl<T: PartialEq> Dag<T> {
    /// Rebuild a graph from a snapshot.
    ///
    /// Edge positions, scores and value uniqueness are checked. Acyclicity
    /// is not: a snapshot taken from a [`Dag`] is acyclic by construction.
    pub fn from_snapshot(snapshot: Snapshot<T>) -> DagResult<Self> {
        let len = snapshot.nodes.len();

        for (position, node) in snapshot.nodes.iter().enumerate() {
            if node.score == 0 {
                return Err(DagError::invalid_snapshot(format!(
                    "node {position} has a score of 0"
                )));
            }
            if let Some(&edge) = node.edges.iter().find(|&&edge| edge >= len) {
                return Err(DagError::invalid_snapshot(format!(
                    "node {position} links to position {edge}, past the last node ({len})"
                )));
            }
            if snapshot.nodes[..position]
                .iter()
                .any(|earlier| earlier.value == node.value)
            {
                return Err(DagError::invalid_snapshot(format!(
                    "node {position} repeats an earlier value"
                )));
            }
        }

        let mut dag = Dag::with_capacity(len);
        let mut edge_lists = Vec::with_capacity(len);
        let ids: Vec<NodeId> = snapshot
            .nodes
            .into_iter()
            .map(|node| {
                edge_lists.push(node.edges);
                dag.restore(node.value, node.score)
            })
            .collect();

        for (&id, edges) in ids.iter().zip(edge_lists) {
            let node = dag.node_mut(id)?;
            for edge in edges {
                node.push_edge(ids[edge]);
            }
        }

        dag.sort();
        Ok(dag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Dag<&'static str> {
        let mut dag: Dag<&'static str> = ["fetch", "build", "test", "lint"].into_iter().collect();
        dag.link_values(&"fetch", &"build").unwrap();
        dag.link_values(&"build", &"test").unwrap();
        dag.link_values(&"fetch", &"lint").unwrap();
        dag
    }

    #[test]
    fn snapshot_lists_nodes_in_sequence_order() {
        let dag = chain();
        let snapshot = dag.snapshot();

        let values: Vec<_> = snapshot.nodes.iter().map(|node| node.value).collect();
        let expected: Vec<_> = dag.iter().copied().collect();
        assert_eq!(values, expected);

        let fetch = &snapshot.nodes[0];
        assert_eq!(fetch.value, "fetch");
        assert_eq!(fetch.score, 1);
        assert_eq!(fetch.edges.len(), 2);
    }

    #[test]
    fn rebuilt_graph_is_equal() {
        let dag = chain();
        let rebuilt = Dag::from_snapshot(dag.snapshot()).unwrap();
        assert_eq!(rebuilt, dag);

        // The rebuilt graph keeps enforcing acyclicity
        let mut rebuilt = rebuilt;
        assert!(rebuilt
            .link_values(&"test", &"fetch")
            .unwrap_err()
            .is_circular_reference());
    }

    #[test]
    fn out_of_range_edge_is_rejected() {
        let snapshot = Snapshot {
            nodes: vec![SnapshotNode {
                value: 1,
                score: 1,
                edges: vec![1],
            }],
        };
        assert!(matches!(
            Dag::from_snapshot(snapshot),
            Err(DagError::InvalidSnapshot { .. })
        ));
    }

    #[test]
    fn duplicate_value_is_rejected() {
        let node = SnapshotNode {
            value: 7,
            score: 1,
            edges: vec![],
        };
        let snapshot = Snapshot {
            nodes: vec![node.clone(), node],
        };
        assert!(matches!(
            Dag::from_snapshot(snapshot),
            Err(DagError::InvalidSnapshot { .. })
        ));
    }
}
