//! Coherent-noise sources: the ambient force field and the phantom
//! cursor paths.
//!
//! Both wrap [`noise::Perlin`], which is deterministic for a given seed
//! and input, so two simulations built from the same config follow the
//! same trajectories.

use crate::config::{AmbientConfig, PhantomConfig};
use glam::Vec2;
use noise::{NoiseFn, Perlin};

/// Lattice period of [`Perlin`]: its permutation table hashes coordinates
/// modulo 256 on every axis.
const PERIOD: f64 = 256.0;

/// Maps a sample coordinate into one noise period.
///
/// Perlin panics on coordinates too large to floor into an `isize`, so
/// long runs and large scales are folded back here. Non-finite inputs map
/// to the origin.
fn lattice(v: f32) -> f64 {
    let v = f64::from(v);
    if v.is_finite() { v.rem_euclid(PERIOD) } else { 0.0 }
}

/// Two-axis vector field sampled from one Perlin source.
///
/// The y axis samples at coordinates shifted by `axis_offset`, so the two
/// components are unrelated functions of position and time.
#[derive(Clone, Debug)]
pub struct AmbientField {
    noise: Perlin,
}

impl AmbientField {
    pub fn new(seed: u32) -> Self {
        Self {
            noise: Perlin::new(seed),
        }
    }

    /// Raw field direction at `pos` and time `t`, each component in `[-1, 1]`.
    pub fn sample(&self, cfg: &AmbientConfig, pos: Vec2, t: f32) -> Vec2 {
        let x = pos.x * cfg.scale;
        let y = pos.y * cfg.scale + t * cfg.time_scale;
        let o = cfg.axis_offset;
        Vec2::new(
            self.noise.get([lattice(x), lattice(y)]) as f32,
            self.noise.get([lattice(x + o), lattice(y + o)]) as f32,
        )
    }
}

/// Per-phantom sampling coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhantomCursor {
    offset: f32,
    base_x: f32,
    base_y: f32,
}

impl PhantomCursor {
    /// Position relative to the anchor at time `t`.
    fn offset_at(&self, noise: &Perlin, cfg: &PhantomConfig, t: f32) -> Vec2 {
        let u = lattice(t * cfg.speed + self.offset);
        Vec2::new(
            noise.get([u, lattice(self.base_x)]) as f32,
            noise.get([u, lattice(self.base_y)]) as f32,
        ) * cfg.scale
    }
}

/// Fixed set of noise-driven interaction points.
#[derive(Clone, Debug)]
pub struct PhantomSet {
    noise: Perlin,
    cursors: Vec<PhantomCursor>,
}

impl PhantomSet {
    pub fn new(seed: u32, count: usize) -> Self {
        // Irrational-ish strides keep every phantom on its own lattice path.
        let cursors = (0..count)
            .map(|i| {
                let i = i as f32;
                PhantomCursor {
                    offset: 17.31 * i + 3.7,
                    base_x: 101.3 + 11.7 * i,
                    base_y: 257.9 + 23.1 * i,
                }
            })
            .collect();
        Self {
            noise: Perlin::new(seed.wrapping_add(1)),
            cursors,
        }
    }

    /// World positions of every phantom at time `t`.
    pub fn positions<'a>(
        &'a self,
        cfg: &'a PhantomConfig,
        anchor: Vec2,
        t: f32,
    ) -> impl Iterator<Item = Vec2> + 'a {
        self.cursors
            .iter()
            .map(move |c| anchor + c.offset_at(&self.noise, cfg, t))
    }
}
