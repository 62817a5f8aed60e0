//! Core of the glyph field piece: a node-spring simulation and the
//! per-frame handoff to an implicit-surface renderer.
//!
//! Main components:
//! - [`simulation`] — nodes, springs, clusters and the physics step.
//! - [`phases`] — the individual force phases run by each sub-step.
//! - [`field`] — packs snapshots into the renderer's uniform block.
//! - [`camera`] — camera pose and ray basis.
//! - [`config`] — tunable parameters and capacity policy.
//! - [`noise_field`] — ambient noise field and phantom cursors.
//! - [`node`] — node and spring storage.
//! - [`force_buffer`] — per-node force accumulation.
//! - [`input`] — external input events.
//! - [`error`] — configuration errors.
//! - [`types`] — shared ids.

pub mod camera;
pub mod config;
pub mod error;
pub mod field;
pub mod force_buffer;
pub mod input;
pub mod node;
pub mod noise_field;
pub mod phases;
pub mod simulation;
pub mod types;

pub use camera::{CameraBasis, CameraPose};
pub use config::{EvictionPolicy, SimConfig};
pub use error::ConfigError;
pub use field::{FIELD_CAPACITY, FieldConfig, FieldSynchronizer, FieldUniforms};
pub use input::InputEvent;
pub use simulation::{Simulation, Snapshot};
