//! Depends Core
//!
//! This crate provides a generic dependency tracker built on a directed
//! acyclic graph container. It implements:
//!
//! - A DAG that refuses links which would create a cycle
//! - Score-based ordering: reading the graph front to back yields a valid
//!   processing order for its edges
//! - Cycle-safe link, unlink and erase operations
//! - A tracker that records prerequisite/dependant relationships between
//!   values around a single selected value
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `graph`: The DAG container, its nodes, errors and snapshots
//! - `tracker`: The value store and the mirrored-graph dependency tracker
//!
//! Both containers are single-owner: every mutation takes `&mut self` and
//! runs to completion on the caller's thread. Share them across threads
//! behind a lock.
//!
//! # Example
//!
//! ```rust
//! use depends_core::graph::{Dag, DagError};
//!
//! let mut dag: Dag<&str> = ["parse", "check", "emit"].into_iter().collect();
//! dag.link_values(&"parse", &"check").unwrap();
//! dag.link_values(&"check", &"emit").unwrap();
//!
//! // Closing the loop is refused
//! assert_eq!(
//!     dag.link_values(&"emit", &"parse"),
//!     Err(DagError::CircularReference)
//! );
//!
//! let order: Vec<_> = dag.iter().copied().collect();
//! assert_eq!(order, vec!["parse", "check", "emit"]);
//! ```

mod arena;
pub mod graph;
pub mod tracker;

pub use graph::{Dag, DagError, DagResult, NodeId};
pub use tracker::{Handle, Tracker};
