//! Optional debug affordances: FPS counter, orbit controls, parameter panel
//! and screenshot button.
//!
//! Every tool is an `Option` on [`DebugTools`] and is only constructed when
//! the configuration (and, for the screenshot button, the debug flag) asks
//! for it. All of them draw through the 2D overlay, after post-processing.

mod fps;
mod panel;
mod screenshot;

pub use fps::FpsCounter;
pub use panel::{Panel, ParamHandle, position_to_value, value_to_position};
pub use screenshot::{
    PendingCapture, ScreenshotButton, ScreenshotError, bgra_to_rgba, screenshot_path, unpad_rows,
};

use glam::Vec2;
use winit::event::MouseButton;

use crate::camera::Camera;
use crate::config::{DebugFlag, RenderConfig};
use crate::draw2d::Draw2d;
use crate::input::Input;
use crate::orbit_camera::OrbitCamera;

/// A rectangle in window pixels, origin top-left.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// Which debug tools ended up attached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttachedTools {
    pub fps: bool,
    pub orbit: bool,
    pub panel: bool,
    pub screenshot: bool,
}

impl AttachedTools {
    pub fn any(&self) -> bool {
        self.fps || self.orbit || self.panel || self.screenshot
    }
}

/// Who owns the current left-button drag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PointerOwner {
    Scene,
    Overlay,
}

#[derive(Default)]
pub struct DebugTools {
    pub fps: Option<FpsCounter>,
    pub orbit: Option<OrbitCamera>,
    pub panel: Option<Panel>,
    pub screenshot: Option<ScreenshotButton>,
    pointer: Option<PointerOwner>,
}

impl DebugTools {
    /// Build the tools `config` asks for. The screenshot button exists only
    /// when `debug` is on.
    pub fn from_config(config: &RenderConfig, debug: DebugFlag) -> Self {
        let tools = Self {
            fps: config.show_fps.then(FpsCounter::new),
            orbit: config
                .orbit_controls
                .map(|orbit| OrbitCamera::new().distance(orbit.distance)),
            panel: (!config.panel_inputs.is_empty()).then(|| Panel::new(&config.panel_inputs)),
            screenshot: debug
                .is_on()
                .then(|| ScreenshotButton::new(config.screenshot_dir.clone())),
            pointer: None,
        };
        tracing::debug!(attached = ?tools.attached(), "debug tools built");
        tools
    }

    pub fn attached(&self) -> AttachedTools {
        AttachedTools {
            fps: self.fps.is_some(),
            orbit: self.orbit.is_some(),
            panel: self.panel.is_some(),
            screenshot: self.screenshot.is_some(),
        }
    }

    /// Live value behind the panel input called `label`.
    pub fn param(&self, label: &str) -> Option<ParamHandle> {
        self.panel.as_ref().and_then(|panel| panel.param(label))
    }

    /// Feed one frame of input to the tools.
    ///
    /// Overlay widgets see the pointer first. A drag that starts on a widget
    /// stays with the overlay until release, so the orbit camera only moves
    /// for drags that start over the scene.
    pub fn update(&mut self, input: &Input, dt: f32, screen: Vec2, camera: &mut Camera) {
        if let Some(fps) = &mut self.fps {
            fps.tick(dt);
        }

        let mut over_overlay = false;
        if let Some(panel) = &mut self.panel {
            over_overlay |= panel.handle_pointer(input, screen.x);
        }
        if let Some(button) = &mut self.screenshot {
            over_overlay |= button.handle_pointer(input, screen);
        }

        if input.mouse_pressed(MouseButton::Left) {
            self.pointer = Some(if over_overlay {
                PointerOwner::Overlay
            } else {
                PointerOwner::Scene
            });
        }

        let overlay_has_pointer = match self.pointer {
            Some(owner) => owner == PointerOwner::Overlay,
            None => over_overlay,
        };

        if let Some(orbit) = &mut self.orbit {
            if !overlay_has_pointer {
                orbit.update(input);
            }
            orbit.apply(camera);
        }

        if !input.mouse_down(MouseButton::Left) {
            self.pointer = None;
        }
    }

    /// True once per click of the screenshot button.
    pub fn take_screenshot_request(&mut self) -> bool {
        self.screenshot
            .as_mut()
            .is_some_and(|button| button.take_request())
    }

    pub fn draw(&self, draw: &mut Draw2d, screen: Vec2) {
        if let Some(fps) = &self.fps {
            fps.draw(draw);
        }
        if let Some(panel) = &self.panel {
            panel.draw(draw, screen.x);
        }
        if let Some(button) = &self.screenshot {
            button.draw(draw, screen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ANGULAR_VELOCITY_LABEL;
    use crate::rotating_mesh::DEFAULT_ANGULAR_VELOCITY;

    const SCREEN: Vec2 = Vec2::new(800.0, 600.0);

    #[test]
    fn tools_exist_iff_debug_is_on() {
        for on in [false, true] {
            let config = RenderConfig::demo(DebugFlag(on));
            let attached = DebugTools::from_config(&config, DebugFlag(on)).attached();
            assert_eq!(
                attached,
                AttachedTools {
                    fps: on,
                    orbit: on,
                    panel: on,
                    screenshot: on,
                }
            );
        }
    }

    #[test]
    fn each_tool_follows_its_own_option() {
        let config = RenderConfig::default().show_fps(true);
        let attached = DebugTools::from_config(&config, DebugFlag(false)).attached();
        assert!(attached.fps);
        assert!(!attached.orbit && !attached.panel && !attached.screenshot);
    }

    #[test]
    fn demo_panel_starts_at_default_velocity() {
        let config = RenderConfig::demo(DebugFlag(true));
        let tools = DebugTools::from_config(&config, DebugFlag(true));
        let param = tools.param(ANGULAR_VELOCITY_LABEL).expect("bound parameter");
        assert_eq!(param.get(), DEFAULT_ANGULAR_VELOCITY);
    }

    #[test]
    fn orbit_starts_at_configured_distance() {
        let config = RenderConfig::default().orbit_controls(7.5);
        let mut tools = DebugTools::from_config(&config, DebugFlag(true));
        let mut camera = Camera::new();
        tools.update(&Input::new(), 0.0, SCREEN, &mut camera);
        assert!((camera.position.length() - 7.5).abs() < 1e-4);
    }

    #[test]
    fn slider_drag_does_not_orbit() {
        let config = RenderConfig::demo(DebugFlag(true));
        let mut tools = DebugTools::from_config(&config, DebugFlag(true));
        let mut camera = Camera::new();
        let mut input = Input::new();

        let row = tools.panel.as_ref().map(|p| p.row(0, SCREEN.x)).unwrap_or_default();
        let start = Vec2::new(row.x + row.width * 0.5, row.y + row.height * 0.5);

        input.mouse_moved(start);
        tools.update(&input, 0.0, SCREEN, &mut camera);
        input.begin_frame();

        input.mouse_button(MouseButton::Left, true);
        tools.update(&input, 0.0, SCREEN, &mut camera);
        input.begin_frame();

        input.mouse_moved(start + Vec2::new(-400.0, 0.0));
        tools.update(&input, 0.0, SCREEN, &mut camera);

        assert_eq!(tools.orbit.as_ref().map(|o| o.azimuth), Some(0.0));
        let value = tools.param(ANGULAR_VELOCITY_LABEL).map(|p| p.get());
        assert_eq!(value, Some(0.1));
    }

    #[test]
    fn scene_drag_orbits_even_over_the_panel() {
        let config = RenderConfig::demo(DebugFlag(true));
        let mut tools = DebugTools::from_config(&config, DebugFlag(true));
        let mut camera = Camera::new();
        let mut input = Input::new();

        input.mouse_moved(Vec2::new(100.0, 300.0));
        tools.update(&input, 0.0, SCREEN, &mut camera);
        input.begin_frame();

        input.mouse_button(MouseButton::Left, true);
        tools.update(&input, 0.0, SCREEN, &mut camera);
        input.begin_frame();

        input.mouse_moved(Vec2::new(SCREEN.x - 20.0, 20.0));
        tools.update(&input, 0.0, SCREEN, &mut camera);

        let azimuth = tools.orbit.as_ref().map_or(0.0, |o| o.azimuth);
        assert!(azimuth != 0.0);
        assert_eq!(
            tools.param(ANGULAR_VELOCITY_LABEL).map(|p| p.get()),
            Some(DEFAULT_ANGULAR_VELOCITY)
        );
    }

    #[test]
    fn rect_contains_is_half_open() {
        let rect = Rect::new(10.0, 10.0, 5.0, 5.0);
        assert!(rect.contains(Vec2::new(10.0, 10.0)));
        assert!(!rect.contains(Vec2::new(15.0, 12.0)));
    }
}
