//! Storage for the physical network: nodes, the springs between them,
//! and the [`Network`] container that keeps the two consistent.

use crate::config::SpringParams;
use crate::types::{ClusterId, NodeId};
use glam::Vec2;

/// One typed glyph in the simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Unique id, increasing in spawn order.
    pub id: NodeId,
    /// Character the node was spawned for.
    pub symbol: char,
    /// Cluster that was active when the node spawned.
    pub cluster: ClusterId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Render radius; shrinks to zero while the node is dying.
    pub radius: f32,
    /// Marked for fade-out by the capacity policy.
    pub dying: bool,
}

/// Role of a spring in its cluster's topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpringKind {
    /// Links a node to the previous node of its cluster.
    Chain,
    /// Weaker link to a random earlier node of the cluster.
    Brace,
}

/// Damped spring between two nodes, referenced by id.
#[derive(Clone, Debug, PartialEq)]
pub struct Spring {
    pub a: NodeId,
    pub b: NodeId,
    pub kind: SpringKind,
    pub rest_length: f32,
    pub stiffness: f32,
    pub damping: f32,
}

impl Node {
    /// Creates a live node at rest.
    ///
    /// ### Parameters
    /// - `id` - Must exceed every id already stored in the [`Network`].
    /// - `symbol` - Typed character.
    /// - `cluster` - Owning cluster.
    /// - `pos` - Initial position.
    /// - `radius` - Initial render radius.
    pub fn new(id: NodeId, symbol: char, cluster: ClusterId, pos: Vec2, radius: f32) -> Self {
        Self {
            id,
            symbol,
            cluster,
            pos,
            vel: Vec2::ZERO,
            radius,
            dying: false,
        }
    }
}

impl Spring {
    /// Creates a spring from `a` to `b` with the given parameters.
    pub fn new(a: NodeId, b: NodeId, kind: SpringKind, params: SpringParams) -> Self {
        Self {
            a,
            b,
            kind,
            rest_length: params.rest_length,
            stiffness: params.stiffness,
            damping: params.damping,
        }
    }

    /// Whether `id` is one of the two endpoints.
    pub fn touches(&self, id: NodeId) -> bool {
        self.a == id || self.b == id
    }
}

/// Nodes in spawn order plus the springs between them.
///
/// Node ids grow monotonically and removals keep the relative order, so
/// `nodes` is always sorted by id and lookups are binary searches.
#[derive(Debug, Default)]
pub struct Network {
    pub nodes: Vec<Node>,
    pub springs: Vec<Spring>,
}

impl Network {
    /// Position of node `id` in `nodes`.
    ///
    /// ### Returns
    /// The index, or `None` if no such node is stored.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.binary_search_by_key(&id, |n| n.id).ok()
    }

    /// Looks up a node by id.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    /// Appends a node; its id must be greater than every stored id.
    pub fn push(&mut self, node: Node) {
        debug_assert!(self.nodes.last().is_none_or(|last| last.id < node.id));
        self.nodes.push(node);
    }

    /// Adds a spring. Both endpoints are expected to be stored.
    pub fn link(&mut self, spring: Spring) {
        debug_assert!(spring.a != spring.b);
        self.springs.push(spring);
    }

    /// Removes the node at `idx` together with every spring touching it.
    ///
    /// ### Parameters
    /// - `idx` - Index into `nodes`, not a node id.
    ///
    /// ### Returns
    /// The removed node.
    ///
    /// ### Panics
    /// Panics if `idx` is out of bounds.
    pub fn remove_at(&mut self, idx: usize) -> Node {
        let node = self.nodes.remove(idx);
        self.springs.retain(|s| !s.touches(node.id));
        node
    }

    /// Removes every node matching `pred`, and their springs, in one pass.
    /// Returns the removed ids in spawn order.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&Node) -> bool) -> Vec<NodeId> {
        let mut removed = Vec::new();
        self.nodes.retain(|n| {
            if pred(n) {
                removed.push(n.id);
                false
            } else {
                true
            }
        });
        if !removed.is_empty() {
            // `removed` is sorted because `nodes` is.
            self.springs.retain(|s| {
                removed.binary_search(&s.a).is_err() && removed.binary_search(&s.b).is_err()
            });
        }
        removed
    }

    /// Most recently spawned node of `cluster`, if any.
    pub fn last_in_cluster(&self, cluster: ClusterId) -> Option<&Node> {
        self.nodes.iter().rev().find(|n| n.cluster == cluster)
    }

    /// Number of stored nodes in `cluster`.
    pub fn cluster_size(&self, cluster: ClusterId) -> usize {
        self.nodes.iter().filter(|n| n.cluster == cluster).count()
    }

    /// Number of nodes not marked as dying.
    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.dying).count()
    }

    /// Drops every node and spring.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.springs.clear();
    }
}
