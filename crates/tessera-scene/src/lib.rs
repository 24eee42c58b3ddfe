//! Tessera Scene - Scene graph used as the attachment target for assets
//!
//! Nodes are addressed by generational [`NodeId`]s so that handles cached by
//! callers (for teardown or physics binding) can be checked for staleness
//! after a subtree is removed.

mod graph;
mod group;
mod manager;

pub use graph::{NodeId, NodeTree, SceneGraph, SceneNode};
pub use group::DrawableGroup;
pub use manager::{SceneId, SceneManager};
