//! Tree ensemble representation.

mod forest;
mod tree;

pub use forest::{Forest, ForestValidationError};
pub use tree::{Tree, TreeValidationError};

/// Index of a node within its tree.
pub type NodeId = u32;
