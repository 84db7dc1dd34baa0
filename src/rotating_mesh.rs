use std::f32::consts::TAU;

use glam::{Quat, Vec3};

use crate::color::Color;
use crate::debug::ParamHandle;
use crate::mesh::Transform;
use crate::scene::{DrawItem, MeshId, SceneObject};

/// Spin rate used when nothing else is configured, in radians per second.
pub const DEFAULT_ANGULAR_VELOCITY: f32 = 0.5;

/// Where a [`RotatingMesh`] reads its spin rate from each frame.
#[derive(Clone, Debug)]
pub enum AngularVelocity {
    Constant(f32),
    /// Live value owned by the debug panel.
    Bound(ParamHandle),
}

impl AngularVelocity {
    pub fn get(&self) -> f32 {
        match self {
            AngularVelocity::Constant(w) => *w,
            AngularVelocity::Bound(param) => param.get(),
        }
    }
}

impl Default for AngularVelocity {
    fn default() -> Self {
        AngularVelocity::Constant(DEFAULT_ANGULAR_VELOCITY)
    }
}

/// A mesh spinning about a fixed axis at a (possibly live) angular velocity.
#[derive(Clone, Debug)]
pub struct RotatingMesh {
    mesh: MeshId,
    base: Transform,
    axis: Vec3,
    angle: f32,
    velocity: AngularVelocity,
    color: Color,
}

impl RotatingMesh {
    /// Spins about +Y, starting from the identity orientation.
    pub fn new(mesh: MeshId, velocity: AngularVelocity) -> Self {
        Self {
            mesh,
            base: Transform::new(),
            axis: Vec3::Y,
            angle: 0.0,
            velocity,
            color: Color::WHITE,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_transform(mut self, base: Transform) -> Self {
        self.base = base;
        self
    }

    pub fn set_velocity(&mut self, velocity: AngularVelocity) {
        self.velocity = velocity;
    }

    pub fn angular_velocity(&self) -> f32 {
        self.velocity.get()
    }

    /// Accumulated rotation angle, wrapped to `[0, TAU)`.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn transform(&self) -> Transform {
        Transform {
            rotation: self.base.rotation * Quat::from_axis_angle(self.axis, self.angle),
            ..self.base
        }
    }
}

impl SceneObject for RotatingMesh {
    fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.angle = (self.angle + self.velocity.get() * dt).rem_euclid(TAU);
    }

    fn draw_item(&self) -> DrawItem {
        DrawItem {
            mesh: self.mesh,
            transform: self.transform(),
            color: self.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn same_rotation(a: Quat, b: Quat) -> bool {
        // q and -q are the same rotation
        a.dot(b).abs() > 1.0 - 1e-5
    }

    #[test]
    fn rotates_by_w_times_t_about_y() {
        let mut mesh = RotatingMesh::new(MeshId(0), AngularVelocity::Constant(0.5));
        for _ in 0..60 {
            mesh.update(1.0 / 60.0);
        }

        let expected = Quat::from_rotation_y(0.5);
        assert!(same_rotation(mesh.transform().rotation, expected));
    }

    #[test]
    fn keeps_initial_orientation() {
        let initial = Quat::from_rotation_x(0.3);
        let mut mesh = RotatingMesh::new(MeshId(0), AngularVelocity::Constant(2.0))
            .with_transform(Transform::new().rotation(initial));
        mesh.update(0.25);

        let expected = initial * Quat::from_rotation_y(0.5);
        assert!(same_rotation(mesh.transform().rotation, expected));
    }

    #[test]
    fn bound_parameter_changes_rate_without_rebuild() {
        let param = ParamHandle::new(DEFAULT_ANGULAR_VELOCITY);
        let mut mesh = RotatingMesh::new(MeshId(0), AngularVelocity::Bound(param.clone()));

        mesh.update(1.0);
        assert!((mesh.angle() - 0.5).abs() < 1e-6);

        param.set(2.0);
        mesh.update(1.0);
        assert!((mesh.angle() - 2.5).abs() < 1e-6);
    }

    #[test]
    fn angle_wraps_and_ignores_negative_dt() {
        let mut mesh = RotatingMesh::new(MeshId(0), AngularVelocity::Constant(TAU));
        mesh.update(1.25);
        assert!((mesh.angle() - TAU * 0.25).abs() < 1e-4);

        mesh.update(-1.0);
        assert!((mesh.angle() - TAU * 0.25).abs() < 1e-4);
    }

    #[test]
    fn default_velocity() {
        assert_eq!(AngularVelocity::default().get(), DEFAULT_ANGULAR_VELOCITY);
    }
}
