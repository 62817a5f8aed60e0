/// Identifier for a node in a [`crate::simulation::Simulation`].
///
/// Ids are handed out in spawn order and never reused within one
/// simulation instance, so they stay valid (and comparable) after
/// older nodes are evicted.
pub type NodeId = u64;

/// Identifier of the spawn epoch a node belongs to.
pub type ClusterId = u32;
