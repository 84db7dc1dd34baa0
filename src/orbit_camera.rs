use glam::Vec3;
use winit::event::MouseButton;

use crate::camera::Camera;
use crate::input::Input;

const ELEVATION_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Mouse-driven camera that orbits around a target point.
///
/// Left-drag rotates, the scroll wheel zooms. The starting distance comes
/// from the `orbit_controls` option of the render configuration.
///
/// # Example
/// ```ignore
/// let mut orbit = OrbitCamera::new().target(Vec3::ZERO).distance(5.0);
///
/// // In frame loop:
/// orbit.update(&input);
/// orbit.apply(&mut camera);
/// ```
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Distance from target.
    pub distance: f32,
    /// Horizontal angle in radians (yaw).
    pub azimuth: f32,
    /// Vertical angle in radians (pitch), clamped short of the poles.
    pub elevation: f32,
    /// Mouse sensitivity in radians per pixel.
    pub sensitivity: f32,
    /// Scroll zoom sensitivity.
    pub zoom_sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 5.0,
            azimuth: 0.0,
            elevation: 0.0,
            sensitivity: 0.005,
            zoom_sensitivity: 0.5,
            min_distance: 0.5,
            max_distance: 100.0,
        }
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target point to orbit around.
    pub fn target(mut self, target: impl Into<Vec3>) -> Self {
        self.target = target.into();
        self
    }

    /// Set the distance from target.
    pub fn distance(mut self, distance: f32) -> Self {
        self.distance = distance.clamp(self.min_distance, self.max_distance);
        self
    }

    /// Set the initial elevation (vertical angle) in radians.
    pub fn elevation(mut self, elevation: f32) -> Self {
        self.elevation = elevation.clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
        self
    }

    /// Set distance limits.
    pub fn distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self.distance = self.distance.clamp(min, max);
        self
    }

    /// Update the orbit from this frame's pointer input.
    pub fn update(&mut self, input: &Input) {
        if input.mouse_down(MouseButton::Left) {
            let delta = input.mouse_delta();
            self.azimuth -= delta.x * self.sensitivity;
            self.elevation = (self.elevation + delta.y * self.sensitivity)
                .clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
        }

        let scroll = input.scroll_delta();
        if scroll.y.abs() > 0.0 {
            self.distance = (self.distance - scroll.y * self.zoom_sensitivity)
                .clamp(self.min_distance, self.max_distance);
        }
    }

    /// Camera position for the current orbit state.
    pub fn position(&self) -> Vec3 {
        let offset = Vec3::new(
            self.distance * self.elevation.cos() * self.azimuth.sin(),
            self.distance * self.elevation.sin(),
            self.distance * self.elevation.cos() * self.azimuth.cos(),
        );
        self.target + offset
    }

    /// Write the orbit position and look direction into `camera`,
    /// keeping its lens settings.
    pub fn apply(&self, camera: &mut Camera) {
        let position = self.position();
        camera.position = position;
        camera.forward = (self.target - position).normalize_or(Vec3::NEG_Z);
        camera.up = Vec3::Y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn rest_position_matches_demo_camera() {
        let orbit = OrbitCamera::new().distance(5.0);
        assert!((orbit.position() - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn drag_rotates_only_while_held() {
        let mut orbit = OrbitCamera::new();
        let mut input = Input::new();

        input.mouse_moved(Vec2::new(100.0, 0.0));
        input.begin_frame();
        input.mouse_moved(Vec2::new(120.0, 0.0));
        orbit.update(&input);
        assert_eq!(orbit.azimuth, 0.0);

        input.begin_frame();
        input.mouse_button(MouseButton::Left, true);
        input.mouse_moved(Vec2::new(140.0, 0.0));
        orbit.update(&input);
        assert!((orbit.azimuth + 20.0 * orbit.sensitivity).abs() < 1e-6);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut orbit = OrbitCamera::new().distance_limits(1.0, 6.0);
        let mut input = Input::new();
        input.scrolled(Vec2::new(0.0, -100.0));
        orbit.update(&input);
        assert_eq!(orbit.distance, 6.0);
    }

    #[test]
    fn apply_points_camera_at_target() {
        let orbit = OrbitCamera::new().distance(3.0).elevation(0.4);
        let mut camera = Camera::new();
        orbit.apply(&mut camera);
        let to_target = (orbit.target - camera.position).normalize();
        assert!((camera.forward - to_target).length() < 1e-5);
    }
}
