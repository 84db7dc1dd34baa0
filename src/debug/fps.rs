use std::collections::VecDeque;

use crate::color::Color;
use crate::debug::Rect;
use crate::draw2d::Draw2d;

/// Length of the averaging window in seconds.
const WINDOW: f32 = 1.0;
/// Published values kept for the graph.
const HISTORY_LEN: usize = 60;

const WIDTH: f32 = 90.0;
const HEIGHT: f32 = 52.0;
const GRAPH_HEIGHT: f32 = 28.0;
const PADDING: f32 = 4.0;

/// Frames-per-second meter in the style of stats.js.
///
/// Frames are counted over a one-second window; the average is published
/// when the window closes, so the readout changes once per second rather than
/// jittering every frame.
#[derive(Clone, Debug)]
pub struct FpsCounter {
    frames: u32,
    elapsed: f32,
    current: Option<f32>,
    min: f32,
    max: f32,
    history: VecDeque<f32>,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self {
            frames: 0,
            elapsed: 0.0,
            current: None,
            min: f32::INFINITY,
            max: 0.0,
            history: VecDeque::with_capacity(HISTORY_LEN),
        }
    }
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one frame that took `dt` seconds. Returns the new average when
    /// this frame closed a window.
    pub fn tick(&mut self, dt: f32) -> Option<f32> {
        self.frames += 1;
        self.elapsed += dt.max(0.0);
        if self.elapsed < WINDOW {
            return None;
        }

        let fps = self.frames as f32 / self.elapsed;
        self.frames = 0;
        self.elapsed = 0.0;

        self.current = Some(fps);
        self.min = self.min.min(fps);
        self.max = self.max.max(fps);
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(fps);
        Some(fps)
    }

    /// Last published average, `None` during the first second.
    pub fn fps(&self) -> Option<f32> {
        self.current
    }

    /// Lowest and highest published averages.
    pub fn range(&self) -> Option<(f32, f32)> {
        self.current.map(|_| (self.min, self.max))
    }

    pub fn history(&self) -> impl Iterator<Item = f32> + '_ {
        self.history.iter().copied()
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, WIDTH, HEIGHT)
    }

    pub fn draw(&self, draw: &mut Draw2d) {
        let bounds = self.bounds();
        draw.rect(bounds.x, bounds.y, bounds.width, bounds.height, Color::DEBUG_BG);

        let label = match (self.current, self.range()) {
            (Some(fps), Some((min, max))) => format!("{fps:.0} FPS ({min:.0}-{max:.0})"),
            _ => "-- FPS".to_string(),
        };
        draw.text(bounds.x + PADDING, bounds.y + PADDING, &label, Color::DEBUG_ACCENT);

        let graph = Rect::new(
            bounds.x + PADDING,
            bounds.y + bounds.height - PADDING - GRAPH_HEIGHT,
            bounds.width - 2.0 * PADDING,
            GRAPH_HEIGHT,
        );
        draw.rect(graph.x, graph.y, graph.width, graph.height, Color::DEBUG_BORDER.with_alpha(0.3));

        if self.max <= 0.0 {
            return;
        }
        let bar_width = graph.width / HISTORY_LEN as f32;
        // Newest sample on the right edge
        let start = HISTORY_LEN - self.history.len();
        for (i, fps) in self.history().enumerate() {
            let h = (fps / self.max).clamp(0.0, 1.0) * graph.height;
            let x = graph.x + (start + i) as f32 * bar_width;
            draw.rect(x, graph.y + graph.height - h, bar_width, h, Color::DEBUG_ACCENT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publishes_average_once_per_window() {
        let mut fps = FpsCounter::new();
        assert_eq!(fps.tick(0.25), None);
        assert_eq!(fps.tick(0.25), None);
        assert_eq!(fps.tick(0.25), None);
        assert_eq!(fps.tick(0.25), Some(4.0));
        assert_eq!(fps.fps(), Some(4.0));

        // Next window starts from zero
        assert_eq!(fps.tick(0.5), None);
        assert_eq!(fps.tick(0.5), Some(2.0));
        assert_eq!(fps.range(), Some((2.0, 4.0)));
    }

    #[test]
    fn nothing_published_before_first_window() {
        let mut fps = FpsCounter::new();
        fps.tick(0.1);
        assert_eq!(fps.fps(), None);
        assert_eq!(fps.range(), None);
        assert_eq!(fps.history().count(), 0);
    }

    #[test]
    fn history_keeps_last_sixty() {
        let mut fps = FpsCounter::new();
        for i in 0..70 {
            // One frame per window, each a little slower
            fps.tick(1.0 + i as f32);
        }
        let history: Vec<f32> = fps.history().collect();
        assert_eq!(history.len(), HISTORY_LEN);
        assert_eq!(history[HISTORY_LEN - 1], 1.0 / 70.0);
        assert_eq!(history[0], 1.0 / 11.0);
    }

    #[test]
    fn negative_dt_counts_as_zero() {
        let mut fps = FpsCounter::new();
        fps.tick(-5.0);
        assert_eq!(fps.tick(1.0), Some(2.0));
    }
}
