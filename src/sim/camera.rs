//! Orthographic tracking camera
//!
//! Looks at the tower from a fixed isometric direction. Its height only ever
//! increases during a session so the view follows the stack upward.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::{CAMERA_FAR, CAMERA_NEAR, VIEW_WIDTH};

/// Eye position at session start
pub const CAMERA_START: Vec3 = Vec3::new(4.0, 4.0, 4.0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrthoCamera {
    pub position: Vec3,
    /// Fixed viewing direction (towards the origin from `CAMERA_START`)
    pub look_dir: Vec3,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
}

impl OrthoCamera {
    pub fn new(aspect: f32) -> Self {
        let mut camera = Self {
            position: CAMERA_START,
            look_dir: (-CAMERA_START).normalize(),
            left: 0.0,
            right: 0.0,
            top: 0.0,
            bottom: 0.0,
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
        };
        camera.set_aspect(aspect);
        camera
    }

    /// Back to the start position, looking at the origin
    pub fn reset(&mut self) {
        self.position = CAMERA_START;
        self.look_dir = (-CAMERA_START).normalize();
    }

    /// Recompute projection bounds for a viewport; zero-sized viewports are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.set_aspect(width as f32 / height as f32);
    }

    fn set_aspect(&mut self, aspect: f32) {
        let height = VIEW_WIDTH / aspect;
        self.left = VIEW_WIDTH / -2.0;
        self.right = VIEW_WIDTH / 2.0;
        self.top = height / 2.0;
        self.bottom = height / -2.0;
    }

    /// Raise the eye to `y` if that is higher than where it is now
    #[inline]
    pub fn track(&mut self, y: f32) {
        self.position.y = self.position.y.max(y);
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.look_dir, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::orthographic_rh(self.left, self.right, self.bottom, self.top, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }
}
