//! CPU stand-in for the field shader.
//!
//! Casts one ray per preview pixel through the packed camera basis, hits
//! the simulation plane and shades the metaball density found there. Slow
//! compared to a GPU raymarcher but enough for a few hundred nodes at a
//! low preview resolution.

use glam::Vec2;
use glyphfield_core::FieldUniforms;

/// Density at which the surface is drawn.
pub const ISO_LEVEL: f32 = 1.0;

const BACKGROUND: [u8; 3] = [10, 8, 18];
const GLOW: [f32; 3] = [90.0, 60.0, 160.0];
const BODY: [f32; 3] = [235.0, 200.0, 255.0];

/// Maps a density to an RGBA pixel: background, a soft glow below the iso
/// level, and a bright body above it that pulses slowly with `time`.
pub fn shade(density: f32, time: f32) -> [u8; 4] {
    if density >= ISO_LEVEL {
        let pulse = 0.85 + 0.15 * (time * 0.7).sin();
        let k = ((density - ISO_LEVEL) * 0.5 + 0.5).min(1.0) * pulse;
        return [
            (BODY[0] * k) as u8,
            (BODY[1] * k) as u8,
            (BODY[2] * k) as u8,
            255,
        ];
    }

    let half = ISO_LEVEL * 0.5;
    if density > half {
        let g = (density - half) / half;
        [
            lerp(BACKGROUND[0], GLOW[0], g),
            lerp(BACKGROUND[1], GLOW[1], g),
            lerp(BACKGROUND[2], GLOW[2], g),
            255,
        ]
    } else {
        [BACKGROUND[0], BACKGROUND[1], BACKGROUND[2], 255]
    }
}

fn lerp(a: u8, b: f32, t: f32) -> u8 {
    (f32::from(a) + (b - f32::from(a)) * t.clamp(0.0, 1.0)) as u8
}

/// Renders the field into an RGBA buffer of `size[0] * size[1]` pixels.
pub fn render(block: &FieldUniforms, size: [usize; 2], plane_z: f32, out: &mut Vec<u8>) {
    let [w, h] = size;
    out.clear();
    out.reserve(w * h * 4);

    let cam = block.camera();
    for y in 0..h {
        let ndc_y = 1.0 - (y as f32 + 0.5) / h as f32 * 2.0;
        for x in 0..w {
            let ndc = Vec2::new((x as f32 + 0.5) / w as f32 * 2.0 - 1.0, ndc_y);
            let density = cam
                .hit_plane(ndc, plane_z)
                .map_or(0.0, |p| block.density_at(p));
            out.extend_from_slice(&shade(density, block.time));
        }
    }
}
