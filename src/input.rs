use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Tracks pointer state for the debug tools.
///
/// Per-frame values (`pressed`, `released`, deltas) are reset by
/// [`begin_frame`](Self::begin_frame).
#[derive(Default)]
pub struct Input {
    buttons_down: HashSet<MouseButton>,
    buttons_pressed: HashSet<MouseButton>,
    buttons_released: HashSet<MouseButton>,
    mouse_position: Vec2,
    mouse_delta: Vec2,
    scroll_delta: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call once per frame after the frame has consumed the input.
    pub fn begin_frame(&mut self) {
        self.buttons_pressed.clear();
        self.buttons_released.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    /// Process a window event and update input state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse_button(*button, *state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_moved(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let d = match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    MouseScrollDelta::PixelDelta(pos) => {
                        Vec2::new(pos.x as f32, pos.y as f32) / 120.0
                    }
                };
                self.scrolled(d);
            }
            _ => {}
        }
    }

    pub fn mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            if !self.buttons_down.contains(&button) {
                self.buttons_pressed.insert(button);
            }
            self.buttons_down.insert(button);
        } else {
            self.buttons_down.remove(&button);
            self.buttons_released.insert(button);
        }
    }

    pub fn mouse_moved(&mut self, position: Vec2) {
        self.mouse_delta += position - self.mouse_position;
        self.mouse_position = position;
    }

    pub fn scrolled(&mut self, delta: Vec2) {
        self.scroll_delta += delta;
    }

    /// Returns true if the mouse button is currently held down.
    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    /// Returns true if the mouse button was pressed this frame.
    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    /// Returns true if the mouse button was released this frame.
    pub fn mouse_released(&self, button: MouseButton) -> bool {
        self.buttons_released.contains(&button)
    }

    /// Current mouse position in window coordinates.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Mouse movement delta this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Scroll wheel delta this frame, in lines.
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_is_reported_for_one_frame() {
        let mut input = Input::new();
        input.mouse_button(MouseButton::Left, true);
        assert!(input.mouse_pressed(MouseButton::Left));
        assert!(input.mouse_down(MouseButton::Left));

        input.begin_frame();
        assert!(!input.mouse_pressed(MouseButton::Left));
        assert!(input.mouse_down(MouseButton::Left));

        input.mouse_button(MouseButton::Left, false);
        assert!(input.mouse_released(MouseButton::Left));
        assert!(!input.mouse_down(MouseButton::Left));
    }

    #[test]
    fn deltas_accumulate_until_frame_reset() {
        let mut input = Input::new();
        input.mouse_moved(Vec2::new(10.0, 0.0));
        input.mouse_moved(Vec2::new(15.0, 5.0));
        assert_eq!(input.mouse_delta(), Vec2::new(15.0, 5.0));

        input.begin_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
        assert_eq!(input.mouse_position(), Vec2::new(15.0, 5.0));
    }
}
