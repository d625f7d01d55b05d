// camera.rs — 透视相机（位置 + 注视点 + 延迟更新的投影矩阵）

use glam::{Mat4, Vec3};

pub const NEAR: f32 = 1.0;
pub const FAR: f32 = 1100.0;

#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    /// Vertical field of view, degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    target: Vec3,
    projection: Mat4,
    projection_dirty: bool,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near: NEAR,
            far: FAR,
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            projection: Mat4::IDENTITY,
            projection_dirty: true,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn set_fov(&mut self, fov: f32) {
        if fov != self.fov {
            self.fov = fov;
            self.projection_dirty = true;
        }
    }

    /// Ignores degenerate sizes; the previous aspect stays in effect.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.projection_dirty = true;
    }

    pub fn is_projection_dirty(&self) -> bool {
        self.projection_dirty
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far);
        self.projection_dirty = false;
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&mut self) -> Mat4 {
        if self.projection_dirty {
            self.update_projection_matrix();
        }
        self.projection
    }

    pub fn view_projection(&mut self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }
}
