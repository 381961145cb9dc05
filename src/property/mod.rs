//! Layered property resolution
//!
//! Layers form a forest through their parent pointers. A lookup starts at
//! the most specific layer and walks towards the root:
//! - the first layer binding the key to a value wins (shadowing)
//! - `inherit` markers defer to the parent
//! - references resolve another key from the starting layer
//! - an ancestor declaring a different type for the key is a type mismatch

mod graph;
mod resolver;

pub use graph::LayerGraph;
pub use resolver::{PropertyResolver, ResolvedProperty};
