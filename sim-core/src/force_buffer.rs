use glam::Vec2;

/// Scratch buffer that accumulates the net force on each node during one
/// integration sub-step.
///
/// Entry `i` belongs to the node at index `i` of the network's node list
/// (an index, not a [`crate::types::NodeId`]), so the buffer is only valid
/// until the node list changes. The simulation rebuilds it with
/// [`ForceBuffer::ensure_len`] at the start of every sub-step.
#[derive(Debug, Default)]
pub struct ForceBuffer {
    force: Vec<Vec2>,
}

impl ForceBuffer {
    /// Creates a zeroed buffer for `len` nodes.
    pub fn with_len(len: usize) -> Self {
        Self {
            force: vec![Vec2::ZERO; len],
        }
    }

    /// Resizes the buffer to `len` entries and zeroes all of them, even if
    /// the length was already correct.
    pub fn ensure_len(&mut self, len: usize) {
        if self.force.len() != len {
            self.force.resize(len, Vec2::ZERO);
        }
        self.clear();
    }

    pub fn clear(&mut self) {
        self.force.fill(Vec2::ZERO);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.force.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.force.is_empty()
    }

    /// Adds `f` to the force on node `idx`.
    ///
    /// ### Panics
    /// Panics if `idx` is out of bounds.
    #[inline]
    pub fn add(&mut self, idx: usize, f: Vec2) {
        self.force[idx] += f;
    }

    /// Applies `f` to `a` and the opposite force to `b`.
    #[inline]
    pub fn add_pair(&mut self, a: usize, b: usize, f: Vec2) {
        self.force[a] += f;
        self.force[b] -= f;
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Vec2 {
        self.force[idx]
    }
}
