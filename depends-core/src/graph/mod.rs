//! Directed Acyclic Graph
//!
//! This module implements a generic DAG container that refuses any link
//! which would close a cycle and keeps its nodes ordered by score.
//!
//! # Overview
//!
//! - Nodes hold a value, a score and a list of outgoing edges
//! - An edge `a -> b` pushes the score of `a` into `b` and everything
//!   downstream of it, so nodes nothing points at come first and the
//!   deepest targets come last
//! - Reading the graph in sequence order therefore yields a valid
//!   processing order for the relation the edges encode
//!
//! # Design Decisions
//!
//! 1. Nodes live in a generational arena and are addressed by [`NodeId`].
//!    Ids survive unrelated mutations and never alias a later node.
//!
//! 2. Cycle detection marks nodes while a depth-first traversal is below
//!    them. The mark is a drop guard held by the traversal's own stack, so
//!    it is released on every exit path and deep graphs do not recurse.
//!
//! 3. [`Dag::linked`] reuses the same traversal as a plain boolean query.

mod dag;
mod error;
mod node;
mod snapshot;

pub use dag::Dag;
pub use error::{DagError, DagResult};
pub use node::{Node, NodeId};
pub use snapshot::{Snapshot, SnapshotNode};
