//! Force phases run by [`crate::simulation::Simulation::step`].
//!
//! Every integration sub-step runs, in order:
//! 1. [`ambient_phase`]: coherent-noise drift, damped by cluster size.
//! 2. [`point_interaction_phase`]: once per phantom cursor, then once
//!    more for the held pointer.
//! 3. [`repulsion_phase`]: short-range pairwise push.
//! 4. [`spring_phase`]: Hookean springs with axial damping.
//! 5. [`integrate_phase`]: semi-implicit Euler over the accumulated forces.
//!
//! Phases 1 to 4 only read the network and write into a [`ForceBuffer`]
//! indexed like `net.nodes`.

use crate::{
    config::{AmbientConfig, IntegratorConfig, InteractionConfig, RepulsionConfig},
    force_buffer::ForceBuffer,
    noise_field::AmbientField,
    node::Network,
    types::ClusterId,
};
use glam::Vec2;
use std::collections::HashMap;
use std::f32::consts::TAU;

/// Distances below this are treated as coincident.
pub const MIN_SEPARATION: f32 = 1e-5;

/// Adds the ambient noise force to every node.
///
/// The force is the [`AmbientField`] sample at the node position and
/// time `t`, scaled by `cfg.strength / cluster_size`, so larger clusters
/// drift less.
///
/// ### Parameters
/// - `net` - The network; only read access is required.
/// - `field` - Noise source to sample.
/// - `cfg` - Field scale, speed and strength.
/// - `t` - Simulation time of the current sub-step.
/// - `acc` - Force buffer indexed like `net.nodes`.
pub fn ambient_phase(
    net: &Network,
    field: &AmbientField,
    cfg: &AmbientConfig,
    t: f32,
    acc: &mut ForceBuffer,
) {
    let mut sizes: HashMap<ClusterId, usize> = HashMap::new();
    for n in &net.nodes {
        *sizes.entry(n.cluster).or_default() += 1;
    }

    for (i, n) in net.nodes.iter().enumerate() {
        let size = sizes.get(&n.cluster).copied().unwrap_or(1).max(1) as f32;
        acc.add(i, field.sample(cfg, n.pos, t) * (cfg.strength / size));
    }
}

/// Force a pointer at `point` exerts on a node at `pos`.
///
/// Repulsive along `pos - point`, scaled by `strength * (1 - d / radius)`;
/// zero outside the radius or when the two coincide.
#[inline]
pub fn point_force(pos: Vec2, point: Vec2, cfg: &InteractionConfig) -> Vec2 {
    let delta = pos - point;
    let d = delta.length();
    if d >= cfg.radius || d < MIN_SEPARATION {
        return Vec2::ZERO;
    }
    delta / d * cfg.strength * (1.0 - d / cfg.radius)
}

/// Adds the repulsion of a pointer at `point` to every node in range.
///
/// ### Parameters
/// - `net` - The network; only read access is required.
/// - `point` - Pointer or phantom cursor position in world space.
/// - `cfg` - Interaction radius and strength.
/// - `acc` - Force buffer indexed like `net.nodes`.
pub fn point_interaction_phase(
    net: &Network,
    point: Vec2,
    cfg: &InteractionConfig,
    acc: &mut ForceBuffer,
) {
    for (i, n) in net.nodes.iter().enumerate() {
        let f = point_force(n.pos, point, cfg);
        if f != Vec2::ZERO {
            acc.add(i, f);
        }
    }
}

/// Multiplier applied to repulsion between nodes of different clusters.
pub fn breathing_factor(cfg: &RepulsionConfig, t: f32) -> f32 {
    let b = &cfg.breathing;
    if b.enabled {
        1.0 + b.amplitude * (TAU * t / b.period).sin()
    } else {
        1.0
    }
}

/// Pushes apart every pair of nodes closer than `cfg.radius`.
///
/// Magnitude is `strength * (1 - d / radius) / d`: inversely proportional
/// to the separation and reaching zero at the radius. Pairs from
/// different clusters are additionally scaled by [`breathing_factor`].
/// Coincident pairs are split along the x axis.
///
/// ### Parameters
/// - `net` - The network; only read access is required.
/// - `cfg` - Repulsion radius, strength and breathing.
/// - `t` - Simulation time, used by the breathing modulation.
/// - `acc` - Force buffer indexed like `net.nodes`.
pub fn repulsion_phase(net: &Network, cfg: &RepulsionConfig, t: f32, acc: &mut ForceBuffer) {
    let r = cfg.radius;
    let r2 = r * r;
    let breath = breathing_factor(cfg, t);
    let nodes = &net.nodes;

    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            let delta = nodes[i].pos - nodes[j].pos;
            let d2 = delta.length_squared();
            if d2 >= r2 {
                continue;
            }

            let d = d2.sqrt();
            let (dir, d) = if d < MIN_SEPARATION {
                (Vec2::X, MIN_SEPARATION)
            } else {
                (delta / d, d)
            };

            let mut mag = cfg.strength * (1.0 - d / r) / d;
            if nodes[i].cluster != nodes[j].cluster {
                mag *= breath;
            }
            acc.add_pair(i, j, dir * mag);
        }
    }
}

/// Applies every spring: `k * (len - rest)` toward the rest length plus
/// `c * relative velocity` along the spring axis.
pub fn spring_phase(net: &Network, acc: &mut ForceBuffer) {
    for s in &net.springs {
        let (Some(ia), Some(ib)) = (net.index_of(s.a), net.index_of(s.b)) else {
            continue;
        };
        let (a, b) = (&net.nodes[ia], &net.nodes[ib]);

        let delta = b.pos - a.pos;
        let len = delta.length();
        if len < MIN_SEPARATION {
            continue;
        }
        let dir = delta / len;

        let stretch = len - s.rest_length;
        let rel_vel = (b.vel - a.vel).dot(dir);
        let f = dir * (s.stiffness * stretch + s.damping * rel_vel);
        acc.add_pair(ia, ib, f);
    }
}

/// Integrates one sub-step of length `h` with unit masses.
///
/// Velocity is damped by linear drag and clamped to `cfg.max_speed`
/// before positions advance.
///
/// ### Parameters
/// - `net` - The network whose nodes are moved.
/// - `acc` - Forces accumulated by the previous phases.
/// - `cfg` - Drag and speed limit.
/// - `h` - Sub-step length in seconds.
pub fn integrate_phase(net: &mut Network, acc: &ForceBuffer, cfg: &IntegratorConfig, h: f32) {
    let keep = (1.0 - cfg.drag * h).max(0.0);
    for (i, n) in net.nodes.iter_mut().enumerate() {
        let f = acc.get(i);
        n.vel = ((n.vel + f * h) * keep).clamp_length_max(cfg.max_speed);
        n.pos += n.vel * h;
    }
}
