//! Tunable parameters for the simulation.
//!
//! Every group implements [`Default`] with the values the piece ships
//! with, and the whole tree is (de)serializable so a JSON file only has
//! to mention the values it overrides.

use crate::error::ConfigError;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What happens to the oldest nodes once the simulation is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Remove the oldest node outright.
    Fifo,
    /// Mark the oldest live nodes as dying and shrink them away.
    #[default]
    Fade,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityConfig {
    pub policy: EvictionPolicy,
    /// Hard ceiling on stored nodes, live and dying together.
    pub max_nodes: usize,
    /// Live (non-dying) nodes kept under [`EvictionPolicy::Fade`].
    pub live_limit: usize,
    /// Radius lost per second by a dying node.
    pub fade_rate: f32,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            policy: EvictionPolicy::Fade,
            max_nodes: 150,
            live_limit: 120,
            fade_rate: 0.5,
        }
    }
}

/// Jitter disc around the spawn center.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterConfig {
    pub min_radius: f32,
    pub max_radius: f32,
    /// Display radius given to freshly spawned nodes.
    pub node_radius: f32,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            min_radius: 0.05,
            max_radius: 0.4,
            node_radius: 0.35,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpringParams {
    pub rest_length: f32,
    pub stiffness: f32,
    pub damping: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    /// Link to the previous node of the same cluster.
    pub chain: SpringParams,
    /// Weaker link to a random earlier node of the same cluster.
    pub brace: SpringParams,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            chain: SpringParams {
                rest_length: 0.6,
                stiffness: 6.0,
                damping: 0.8,
            },
            brace: SpringParams {
                rest_length: 0.9,
                stiffness: 2.0,
                damping: 0.4,
            },
        }
    }
}

/// Slow sinusoidal modulation of repulsion between different clusters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathingConfig {
    pub enabled: bool,
    pub period: f32,
    pub amplitude: f32,
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period: 8.0,
            amplitude: 0.5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepulsionConfig {
    pub radius: f32,
    pub strength: f32,
    pub breathing: BreathingConfig,
}

impl Default for RepulsionConfig {
    fn default() -> Self {
        Self {
            radius: 0.5,
            strength: 0.6,
            breathing: BreathingConfig::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    pub enabled: bool,
    /// Spatial frequency of the noise field.
    pub scale: f32,
    /// How fast the field drifts along its time axis.
    pub time_scale: f32,
    pub strength: f32,
    /// Offset between the x and y sampling coordinates.
    pub axis_offset: f32,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scale: 0.35,
            time_scale: 0.15,
            strength: 1.2,
            axis_offset: 31.7,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhantomConfig {
    pub enabled: bool,
    pub count: usize,
    pub speed: f32,
    /// Half extents of the area the phantoms roam around the centroid.
    pub scale: Vec2,
}

impl Default for PhantomConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            count: 3,
            speed: 0.07,
            scale: Vec2::new(4.0, 2.5),
        }
    }
}

/// Pointer (real or phantom) repulsion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub radius: f32,
    pub strength: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            radius: 1.2,
            strength: 4.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub min_distance: f32,
    pub max_distance: f32,
    /// Half extents of the region spawn centers are kept inside.
    pub half_extents: Vec2,
    pub clamp_passes: u32,
    pub unsettle_impulse: f32,
    pub initial_center: Vec2,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            min_distance: 1.5,
            max_distance: 3.0,
            half_extents: Vec2::new(5.0, 3.0),
            clamp_passes: 3,
            unsettle_impulse: 0.4,
            initial_center: Vec2::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorConfig {
    pub substep: f32,
    pub max_substeps: u32,
    /// Linear velocity drag per second.
    pub drag: f32,
    pub max_speed: f32,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            substep: 1.0 / 60.0,
            max_substeps: 4,
            drag: 1.5,
            max_speed: 6.0,
        }
    }
}

/// Full configuration of a [`crate::simulation::Simulation`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seeds the coherent-noise sources.
    pub seed: u32,
    pub capacity: CapacityConfig,
    pub scatter: ScatterConfig,
    pub springs: SpringConfig,
    pub repulsion: RepulsionConfig,
    pub ambient: AmbientConfig,
    pub phantoms: PhantomConfig,
    pub interaction: InteractionConfig,
    pub cluster: ClusterConfig,
    pub integrator: IntegratorConfig,
}

impl SimConfig {
    /// Parses a config from JSON; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Checks every constraint the simulation relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cap = &self.capacity;
        if cap.max_nodes == 0 {
            return Err(ConfigError::ZeroCount {
                field: "capacity.max_nodes",
            });
        }
        if cap.live_limit > cap.max_nodes {
            return Err(ConfigError::LiveLimitAboveCeiling {
                live_limit: cap.live_limit,
                max_nodes: cap.max_nodes,
            });
        }
        ConfigError::check_positive("capacity.fade_rate", cap.fade_rate)?;

        let sc = &self.scatter;
        ConfigError::check_positive("scatter.min_radius", sc.min_radius)?;
        ConfigError::check_positive("scatter.max_radius", sc.max_radius)?;
        ConfigError::check_range("scatter", sc.min_radius, sc.max_radius)?;
        ConfigError::check_positive("scatter.node_radius", sc.node_radius)?;

        for (name, p) in [
            ("springs.chain", &self.springs.chain),
            ("springs.brace", &self.springs.brace),
        ] {
            ConfigError::check_non_negative(name, p.rest_length)?;
            ConfigError::check_non_negative(name, p.stiffness)?;
            ConfigError::check_non_negative(name, p.damping)?;
        }

        ConfigError::check_positive("repulsion.radius", self.repulsion.radius)?;
        ConfigError::check_non_negative("repulsion.strength", self.repulsion.strength)?;
        ConfigError::check_positive("repulsion.breathing.period", self.repulsion.breathing.period)?;
        ConfigError::check_non_negative(
            "repulsion.breathing.amplitude",
            self.repulsion.breathing.amplitude,
        )?;

        let am = &self.ambient;
        ConfigError::check_non_negative("ambient.scale", am.scale)?;
        ConfigError::check_non_negative("ambient.time_scale", am.time_scale)?;
        ConfigError::check_non_negative("ambient.strength", am.strength)?;
        ConfigError::check_finite("ambient.axis_offset", am.axis_offset)?;

        let ph = &self.phantoms;
        ConfigError::check_non_negative("phantoms.speed", ph.speed)?;
        ConfigError::check_non_negative("phantoms.scale.x", ph.scale.x)?;
        ConfigError::check_non_negative("phantoms.scale.y", ph.scale.y)?;

        ConfigError::check_positive("interaction.radius", self.interaction.radius)?;
        ConfigError::check_non_negative("interaction.strength", self.interaction.strength)?;

        let cl = &self.cluster;
        ConfigError::check_non_negative("cluster.min_distance", cl.min_distance)?;
        ConfigError::check_positive("cluster.max_distance", cl.max_distance)?;
        ConfigError::check_range("cluster.distance", cl.min_distance, cl.max_distance)?;
        ConfigError::check_positive("cluster.half_extents.x", cl.half_extents.x)?;
        ConfigError::check_positive("cluster.half_extents.y", cl.half_extents.y)?;
        ConfigError::check_non_negative("cluster.unsettle_impulse", cl.unsettle_impulse)?;
        ConfigError::check_finite("cluster.initial_center.x", cl.initial_center.x)?;
        ConfigError::check_finite("cluster.initial_center.y", cl.initial_center.y)?;

        let it = &self.integrator;
        ConfigError::check_positive("integrator.substep", it.substep)?;
        if it.max_substeps == 0 {
            return Err(ConfigError::ZeroCount {
                field: "integrator.max_substeps",
            });
        }
        ConfigError::check_non_negative("integrator.drag", it.drag)?;
        ConfigError::check_positive("integrator.max_speed", it.max_speed)?;
        Ok(())
    }
}
