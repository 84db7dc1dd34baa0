use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;
use winit::event::MouseButton;

use crate::color::Color;
use crate::config::{PanelInput, PanelScale};
use crate::debug::Rect;
use crate::draw2d::Draw2d;
use crate::input::Input;

const WIDTH: f32 = 240.0;
const MARGIN: f32 = 10.0;
const PADDING: f32 = 8.0;
const ROW_HEIGHT: f32 = 40.0;
const TRACK_HEIGHT: f32 = 6.0;
const KNOB_WIDTH: f32 = 8.0;

/// A live `f32` shared between a panel slider and whatever reads it.
///
/// Cloning shares the value. Both sides run on the event-loop thread.
#[derive(Clone, Debug, Default)]
pub struct ParamHandle(Rc<Cell<f32>>);

impl ParamHandle {
    pub fn new(value: f32) -> Self {
        Self(Rc::new(Cell::new(value)))
    }

    pub fn get(&self) -> f32 {
        self.0.get()
    }

    pub fn set(&self, value: f32) {
        self.0.set(value);
    }
}

fn is_log(input: &PanelInput) -> bool {
    input.scale == PanelScale::Log && input.min > 0.0 && input.max > input.min
}

/// Slider position in `0..=1` for `value`.
pub fn value_to_position(input: &PanelInput, value: f32) -> f32 {
    let value = value.clamp(input.min, input.max);
    let t = if is_log(input) {
        (value / input.min).ln() / (input.max / input.min).ln()
    } else {
        (value - input.min) / (input.max - input.min)
    };
    if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 }
}

/// Value at slider position `position`, clamped to the input's range.
pub fn position_to_value(input: &PanelInput, position: f32) -> f32 {
    let t = position.clamp(0.0, 1.0);
    let value = if is_log(input) {
        input.min * (input.max / input.min).powf(t)
    } else {
        input.min + (input.max - input.min) * t
    };
    value.clamp(input.min, input.max)
}

struct Slider {
    input: PanelInput,
    param: ParamHandle,
}

/// Range sliders anchored to the top-right corner of the window.
pub struct Panel {
    sliders: Vec<Slider>,
    dragging: Option<usize>,
}

impl Panel {
    /// One slider per input, each starting at its (clamped) initial value.
    pub fn new(inputs: &[PanelInput]) -> Self {
        let sliders = inputs
            .iter()
            .map(|input| {
                let initial = input.initial.clamp(input.min, input.max);
                if initial != input.initial {
                    tracing::warn!(
                        label = %input.label,
                        initial = input.initial,
                        clamped = initial,
                        "panel initial value outside its range"
                    );
                }
                Slider {
                    input: input.clone(),
                    param: ParamHandle::new(initial),
                }
            })
            .collect();
        Self {
            sliders,
            dragging: None,
        }
    }

    pub fn len(&self) -> usize {
        self.sliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sliders.is_empty()
    }

    pub fn param(&self, label: &str) -> Option<ParamHandle> {
        self.sliders
            .iter()
            .find(|s| s.input.label == label)
            .map(|s| s.param.clone())
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    pub fn bounds(&self, screen_width: f32) -> Rect {
        Rect::new(
            screen_width - WIDTH - MARGIN,
            MARGIN,
            WIDTH,
            ROW_HEIGHT * self.sliders.len() as f32 + PADDING,
        )
    }

    /// Pointer-sensitive area of slider `index`.
    pub fn row(&self, index: usize, screen_width: f32) -> Rect {
        let bounds = self.bounds(screen_width);
        Rect::new(
            bounds.x + PADDING,
            bounds.y + PADDING + ROW_HEIGHT * index as f32,
            bounds.width - 2.0 * PADDING,
            ROW_HEIGHT - PADDING,
        )
    }

    fn track(&self, index: usize, screen_width: f32) -> Rect {
        let row = self.row(index, screen_width);
        Rect::new(
            row.x,
            row.y + row.height - TRACK_HEIGHT - 2.0,
            row.width,
            TRACK_HEIGHT,
        )
    }

    /// Process pointer input. Returns true while the pointer is over the
    /// panel or a slider is being dragged.
    pub fn handle_pointer(&mut self, input: &Input, screen_width: f32) -> bool {
        let pointer = input.mouse_position();

        if input.mouse_pressed(MouseButton::Left) {
            self.dragging =
                (0..self.sliders.len()).find(|&i| self.row(i, screen_width).contains(pointer));
        }

        let Some(index) = self.dragging else {
            return self.bounds(screen_width).contains(pointer);
        };

        self.drag_to(index, pointer, screen_width);
        if !input.mouse_down(MouseButton::Left) {
            self.dragging = None;
        }
        true
    }

    fn drag_to(&self, index: usize, pointer: Vec2, screen_width: f32) {
        let track = self.track(index, screen_width);
        let slider = &self.sliders[index];
        let value = position_to_value(&slider.input, (pointer.x - track.x) / track.width);
        if value != slider.param.get() {
            tracing::debug!(label = %slider.input.label, value, "panel value changed");
            slider.param.set(value);
        }
    }

    pub fn draw(&self, draw: &mut Draw2d, screen_width: f32) {
        let bounds = self.bounds(screen_width);
        draw.rect(bounds.x, bounds.y, bounds.width, bounds.height, Color::DEBUG_BG);

        for (i, slider) in self.sliders.iter().enumerate() {
            let row = self.row(i, screen_width);
            let value = slider.param.get();
            draw.text(row.x, row.y, &slider.input.label, Color::WHITE);

            let readout = format!("{value:.2}");
            let readout_x = row.x + row.width - draw.measure(&readout);
            draw.text(readout_x, row.y, &readout, Color::DEBUG_ACCENT);

            let track = self.track(i, screen_width);
            draw.rect(track.x, track.y, track.width, track.height, Color::DEBUG_BORDER);

            let t = value_to_position(&slider.input, value);
            draw.rect(track.x, track.y, track.width * t, track.height, Color::DEBUG_ACCENT);

            let knob_x = track.x + track.width * t - KNOB_WIDTH * 0.5;
            let knob_color = if self.dragging == Some(i) {
                Color::DEBUG_ACCENT
            } else {
                Color::WHITE
            };
            draw.rect(knob_x, track.y - 4.0, KNOB_WIDTH, track.height + 8.0, knob_color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speed() -> PanelInput {
        PanelInput::range("speed", 0.1, 30.0, 0.5).log()
    }

    #[test]
    fn log_scale_maps_ends_and_geometric_middle() {
        let input = speed();
        assert_eq!(position_to_value(&input, 0.0), 0.1);
        assert!((position_to_value(&input, 1.0) - 30.0).abs() < 1e-4);

        let middle = (0.1f32 * 30.0).sqrt();
        assert!((position_to_value(&input, 0.5) - middle).abs() < 1e-4);
        assert!((value_to_position(&input, middle) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn linear_scale_is_proportional() {
        let input = PanelInput::range("x", -1.0, 3.0, 0.0);
        assert_eq!(position_to_value(&input, 0.25), 0.0);
        assert_eq!(value_to_position(&input, 2.0), 0.75);
    }

    #[test]
    fn values_are_clamped() {
        let input = speed();
        assert_eq!(position_to_value(&input, -2.0), 0.1);
        assert!((position_to_value(&input, 7.0) - 30.0).abs() < 1e-4);
        assert_eq!(value_to_position(&input, 100.0), 1.0);
        assert_eq!(value_to_position(&input, 0.0), 0.0);

        let panel = Panel::new(&[PanelInput::range("x", 0.0, 1.0, 5.0)]);
        assert_eq!(panel.param("x").map(|p| p.get()), Some(1.0));
    }

    #[test]
    fn params_are_found_by_label_and_shared() {
        let panel = Panel::new(&[speed(), PanelInput::range("size", 1.0, 2.0, 1.5)]);
        assert_eq!(panel.len(), 2);
        assert!(panel.param("missing").is_none());

        let a = panel.param("size").expect("size");
        let b = panel.param("size").expect("size");
        a.set(1.75);
        assert_eq!(b.get(), 1.75);
    }

    #[test]
    fn drag_captures_until_release() {
        let mut panel = Panel::new(&[PanelInput::range("x", 0.0, 10.0, 5.0)]);
        let width = 800.0;
        let track = panel.track(0, width);
        let mut input = Input::new();

        input.mouse_moved(Vec2::new(track.x + track.width * 0.2, track.y));
        input.mouse_button(MouseButton::Left, true);
        assert!(panel.handle_pointer(&input, width));
        assert!(panel.is_dragging());
        assert!((panel.param("x").map_or(0.0, |p| p.get()) - 2.0).abs() < 1e-4);

        // Still captured far outside the panel
        input.begin_frame();
        input.mouse_moved(Vec2::new(0.0, 500.0));
        assert!(panel.handle_pointer(&input, width));
        assert_eq!(panel.param("x").map(|p| p.get()), Some(0.0));

        input.begin_frame();
        input.mouse_button(MouseButton::Left, false);
        panel.handle_pointer(&input, width);
        assert!(!panel.is_dragging());

        input.begin_frame();
        assert!(!panel.handle_pointer(&input, width));
    }

    #[test]
    fn press_outside_rows_does_not_drag() {
        let mut panel = Panel::new(&[speed()]);
        let mut input = Input::new();
        input.mouse_moved(Vec2::new(5.0, 5.0));
        input.mouse_button(MouseButton::Left, true);
        assert!(!panel.handle_pointer(&input, 800.0));
        assert!(!panel.is_dragging());
    }
}
