//! Dependency Tracking
//!
//! This module layers prerequisite/dependant bookkeeping on top of
//! [`Dag`](crate::graph::Dag).
//!
//! # Concepts
//!
//! ## Store
//!
//! The [`Store`] owns one canonical copy of every value and hands out
//! [`Handle`]s that stay valid until their own value is removed. The graphs
//! hold handles, never values.
//!
//! ## Mirrors
//!
//! "X depends on Y" is recorded twice: as `X -> Y` in a prerequisites graph
//! and as `Y -> X` in a dependants graph. The two are private to the
//! [`Tracker`] and only ever change together, so each direction can be
//! walked without reversing edges.
//!
//! ## Focus
//!
//! Edits and queries act on one selected value at a time. The focus is
//! either unset or a handle; selecting sets it, erasing the focused value
//! or clearing it unsets it.

mod relations;
mod store;

pub use relations::Tracker;
pub use store::{Handle, Store};
