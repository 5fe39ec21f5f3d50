//! Taleforge — Story Navigation context.
//!
//! Walks a loaded story graph: tracks the current node, the set of nodes ever
//! visited, and the back-navigable history of the path taken.

pub mod application;
pub mod domain;
