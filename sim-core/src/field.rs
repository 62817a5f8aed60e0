//! Per-frame handoff from the simulation to an implicit-surface renderer.
//!
//! [`FieldSynchronizer::sync`] rebuilds a [`FieldUniforms`] block from a
//! [`Snapshot`] every frame. The block is plain old data laid out for a
//! 16-byte aligned uniform buffer, so a backend can upload
//! [`FieldSynchronizer::as_bytes`] as-is.
//!
//! The block holds at most [`FIELD_CAPACITY`] nodes. This is a renderer
//! limit, not a simulation limit: when more nodes exist, only the most
//! recent ones are packed and the rest keep simulating unseen.

use crate::{
    camera::{CameraBasis, CameraPose},
    error::ConfigError,
    simulation::Snapshot,
};
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use tracing::trace;

/// Fixed node capacity of [`FieldUniforms`].
pub const FIELD_CAPACITY: usize = 128;

/// Softening term in [`FieldUniforms::density_at`].
const DENSITY_EPS: f32 = 1e-4;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct FieldNode {
    pub position: [f32; 3],
    pub radius: f32,
}

/// Everything the field shader reads for one frame.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FieldUniforms {
    pub nodes: [FieldNode; FIELD_CAPACITY],
    pub node_count: u32,
    pub time: f32,
    pub resolution: [f32; 2],
    /// Camera position; `w` holds `tan(fov_y / 2)`.
    pub origin: [f32; 4],
    pub forward: [f32; 4],
    /// `w` holds the viewport aspect ratio.
    pub right: [f32; 4],
    pub up: [f32; 4],
}

impl Default for FieldUniforms {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl FieldUniforms {
    /// The packed nodes, without the unused tail.
    pub fn active_nodes(&self) -> &[FieldNode] {
        &self.nodes[..self.node_count as usize]
    }

    /// Camera basis as packed into the block.
    pub fn camera(&self) -> CameraBasis {
        CameraBasis {
            origin: Vec3::from_slice(&self.origin[..3]),
            forward: Vec3::from_slice(&self.forward[..3]),
            right: Vec3::from_slice(&self.right[..3]),
            up: Vec3::from_slice(&self.up[..3]),
            tan_half_fov: self.origin[3],
            aspect: self.right[3],
        }
    }

    /// Reference metaball field: `Σ r² / (|p - c|² + ε)` over active nodes.
    ///
    /// Each term strictly decreases with distance to its node, so nearby
    /// nodes blend into one surface at any iso threshold.
    pub fn density_at(&self, p: Vec3) -> f32 {
        self.active_nodes()
            .iter()
            .map(|n| {
                let d2 = (p - Vec3::from(n.position)).length_squared();
                n.radius * n.radius / (d2 + DENSITY_EPS)
            })
            .sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldConfig {
    /// Nodes packed per frame, at most [`FIELD_CAPACITY`].
    pub max_nodes: usize,
    /// Radius used for every node instead of its own, when set.
    pub uniform_radius: Option<f32>,
    /// Depth of the simulation plane in world space.
    pub plane_z: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            max_nodes: FIELD_CAPACITY,
            uniform_radius: None,
            plane_z: 0.0,
        }
    }
}

/// Packs simulation snapshots into [`FieldUniforms`].
///
/// Apart from its configuration and viewport size the synchronizer keeps
/// no state: every [`Self::sync`] overwrites the whole block.
pub struct FieldSynchronizer {
    cfg: FieldConfig,
    resolution: Vec2,
    block: FieldUniforms,
    truncated: usize,
}

impl FieldSynchronizer {
    pub fn new(cfg: FieldConfig) -> Result<Self, ConfigError> {
        if cfg.max_nodes > FIELD_CAPACITY {
            return Err(ConfigError::FieldCapacity {
                requested: cfg.max_nodes,
                capacity: FIELD_CAPACITY,
            });
        }
        if let Some(r) = cfg.uniform_radius {
            ConfigError::check_positive("field.uniform_radius", r)?;
        }
        Ok(Self {
            cfg,
            resolution: Vec2::ONE,
            block: FieldUniforms::zeroed(),
            truncated: 0,
        })
    }

    /// Updates the viewport size. Simulation state is not involved.
    pub fn resize(&mut self, width: f32, height: f32) {
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            self.resolution = Vec2::new(width, height);
        }
    }

    pub fn resolution(&self) -> Vec2 {
        self.resolution
    }

    /// Rebuilds the uniform block from `snapshot` and `camera`.
    pub fn sync(&mut self, snapshot: &Snapshot<'_>, camera: &CameraPose) -> &FieldUniforms {
        let nodes = snapshot.nodes;
        let keep = nodes.len().min(self.cfg.max_nodes);
        self.truncated = nodes.len() - keep;

        let block = &mut self.block;
        block.nodes = [FieldNode::zeroed(); FIELD_CAPACITY];
        for (slot, n) in block.nodes.iter_mut().zip(&nodes[nodes.len() - keep..]) {
            *slot = FieldNode {
                position: [n.pos.x, n.pos.y, self.cfg.plane_z],
                radius: self.cfg.uniform_radius.unwrap_or(n.radius).max(0.0),
            };
        }
        block.node_count = keep as u32;
        block.time = snapshot.time;
        block.resolution = self.resolution.to_array();

        let basis = camera.basis(self.resolution.x / self.resolution.y);
        block.origin = basis.origin.extend(basis.tan_half_fov).to_array();
        block.forward = basis.forward.extend(0.0).to_array();
        block.right = basis.right.extend(basis.aspect).to_array();
        block.up = basis.up.extend(0.0).to_array();

        if self.truncated > 0 {
            trace!(packed = keep, dropped = self.truncated, "field truncated");
        }
        &self.block
    }

    pub fn uniforms(&self) -> &FieldUniforms {
        &self.block
    }

    /// Nodes left out of the last [`Self::sync`].
    pub fn truncated(&self) -> usize {
        self.truncated
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.block)
    }

    pub fn config(&self) -> &FieldConfig {
        &self.cfg
    }
}
