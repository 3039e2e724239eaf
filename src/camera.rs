//! Orbit camera with idle auto-rotation.

use glam::{Mat4, Vec3};

use crate::lifecycle::Viewport;
use crate::scene::SceneKind;
use crate::simulation::Interaction;

/// Camera orbiting a target point.
///
/// Yaw advances on its own while idle; pointer tilt from the scene's
/// [`Interaction`] is layered on top of the base angles.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Horizontal angle in radians.
    pub yaw: f32,
    /// Vertical angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Idle yaw speed in radians per second.
    pub auto_rotate: f32,
    base_yaw: f32,
    base_pitch: f32,
}

impl OrbitCamera {
    /// Framing suited to a scene kind.
    pub fn for_kind(kind: SceneKind) -> Self {
        let (distance, pitch, auto_rotate) = match kind {
            SceneKind::Chaos => (22.0, 0.25, 0.05),
            SceneKind::Orb => (4.2, 0.2, 0.3),
        };
        Self {
            yaw: 0.0,
            pitch,
            distance,
            target: Vec3::ZERO,
            fov_y: 45f32.to_radians(),
            aspect: 1.0,
            near: 0.05,
            far: 200.0,
            auto_rotate,
            base_yaw: 0.0,
            base_pitch: pitch,
        }
    }

    /// World-space eye position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Match the projection to a viewport. Touches nothing else.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.aspect = viewport.aspect();
    }

    /// Camera right and up vectors in world space, for billboarding.
    pub fn right_up(&self) -> (Vec3, Vec3) {
        let forward = (self.target - self.position()).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        (right, up)
    }

    /// Advance idle rotation and apply the eased pointer tilt.
    pub fn update(&mut self, dt: f32, interaction: &Interaction) {
        self.base_yaw = (self.base_yaw + self.auto_rotate * dt).rem_euclid(std::f32::consts::TAU);
        self.yaw = self.base_yaw + interaction.tilt.x;
        self.pitch = (self.base_pitch + interaction.tilt.y).clamp(-1.4, 1.4);
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::for_kind(SceneKind::Chaos)
    }
}
