use crate::constants::{CAMERA_FOV_Y, CAMERA_Z};
use glam::{Mat4, Vec2, Vec3, Vec4};

/// Fixed perspective camera on +Z looking at the origin.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    view_proj: Mat4,
    width: f32,
    height: f32,
    focal_px: f32,
}

/// A world point in canvas pixels, with the pixels one world unit covers at
/// that depth.
#[derive(Clone, Copy, Debug)]
pub struct Projected {
    pub screen: Vec2,
    pub px_per_unit: f32,
}

impl Camera {
    pub fn new(width: f32, height: f32) -> Self {
        let height = height.max(1.0);
        let aspect = width / height;
        let proj = Mat4::perspective_rh(CAMERA_FOV_Y, aspect, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, CAMERA_Z), Vec3::ZERO, Vec3::Y);
        Self {
            view_proj: proj * view,
            width,
            height,
            focal_px: height / (2.0 * (CAMERA_FOV_Y * 0.5).tan()),
        }
    }

    /// Project `p`. Points behind the eye give `None`.
    pub fn project(&self, p: Vec3) -> Option<Projected> {
        let clip = self.view_proj * Vec4::new(p.x, p.y, p.z, 1.0);
        if clip.w <= 1e-4 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Projected {
            screen: Vec2::new(
                (ndc.x + 1.0) * 0.5 * self.width,
                (1.0 - ndc.y) * 0.5 * self.height,
            ),
            px_per_unit: self.focal_px / clip.w,
        })
    }
}
