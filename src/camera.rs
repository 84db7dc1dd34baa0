use glam::{Mat4, Vec3};

/// A perspective camera for the demo scene.
///
/// `position` and `forward` are what the orbit controls drive; the mesh pass
/// builds its view and projection matrices from them each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub fov: f32, // radians, vertical
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
            fov: 45f32.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, position: impl Into<Vec3>) -> Self {
        self.position = position.into();
        self
    }

    pub fn looking_at(mut self, target: impl Into<Vec3>) -> Self {
        self.forward = (target.into() - self.position).normalize_or(Vec3::NEG_Z);
        self
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees.to_radians();
        self
    }

    /// Move the camera without changing where it looks.
    pub fn set_position(&mut self, position: impl Into<Vec3>) {
        self.position = position.into();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looking_at_origin_from_front() {
        let camera = Camera::new().at([0.0, 0.0, 5.0]).looking_at(Vec3::ZERO);
        assert!((camera.forward - Vec3::NEG_Z).length() < 1e-6);

        // The origin lands in front of the camera (negative view-space z).
        let view_space = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!((view_space.z + 5.0).abs() < 1e-5);
    }
}
