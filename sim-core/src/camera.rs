//! Camera pose and the ray basis handed to the field renderer.

use glam::{Vec2, Vec3};

/// Where the camera is and what it looks at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 8.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 60f32.to_radians(),
        }
    }
}

/// Orthonormal ray basis derived from a [`CameraPose`] and viewport aspect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraBasis {
    pub origin: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub tan_half_fov: f32,
    /// Width over height.
    pub aspect: f32,
}

impl CameraPose {
    /// Builds the ray basis for a viewport of the given aspect ratio.
    ///
    /// Falls back to looking down `-Z` when position and target coincide,
    /// and picks another up vector when `up` is parallel to the view axis.
    pub fn basis(&self, aspect: f32) -> CameraBasis {
        let forward = (self.target - self.position).normalize_or(Vec3::NEG_Z);
        let mut right = forward.cross(self.up).normalize_or_zero();
        if right == Vec3::ZERO {
            let alt = if forward.y.abs() < 0.9 { Vec3::Y } else { Vec3::Z };
            right = forward.cross(alt).normalize();
        }
        let up = right.cross(forward);
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };

        CameraBasis {
            origin: self.position,
            forward,
            right,
            up,
            tan_half_fov: (self.fov_y * 0.5).tan(),
            aspect,
        }
    }
}

impl CameraBasis {
    /// Unit ray direction through normalized device coordinates
    /// (`[-1, 1]` on both axes, +y up).
    pub fn ray(&self, ndc: Vec2) -> Vec3 {
        (self.forward
            + self.right * (ndc.x * self.tan_half_fov * self.aspect)
            + self.up * (ndc.y * self.tan_half_fov))
            .normalize()
    }

    /// Normalized device coordinates of `p`, or `None` behind the camera.
    pub fn project(&self, p: Vec3) -> Option<Vec2> {
        let v = p - self.origin;
        let depth = v.dot(self.forward);
        if depth <= 1e-6 {
            return None;
        }
        Some(Vec2::new(
            v.dot(self.right) / (depth * self.tan_half_fov * self.aspect),
            v.dot(self.up) / (depth * self.tan_half_fov),
        ))
    }

    /// Where the ray through `ndc` meets the plane `z = plane_z`.
    pub fn hit_plane(&self, ndc: Vec2, plane_z: f32) -> Option<Vec3> {
        let dir = self.ray(ndc);
        if dir.z.abs() < 1e-6 {
            return None;
        }
        let t = (plane_z - self.origin.z) / dir.z;
        (t > 0.0).then(|| self.origin + dir * t)
    }
}
