//! RGBA colors and the parsers the demo configuration needs.

use thiserror::Error;

/// RGBA color with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// A color string could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("color must start with '#': {0:?}")]
    MissingHash(String),
    #[error("expected 3 or 6 hex digits, got {0:?}")]
    BadLength(String),
    #[error("invalid hex digit in {0:?}")]
    BadDigit(String),
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    /// Semi-transparent dark background for debug panels.
    pub const DEBUG_BG: Color = Color::rgba(0.1, 0.1, 0.1, 0.85);
    /// Accent color for borders and slider tracks.
    pub const DEBUG_BORDER: Color = Color::rgba(0.4, 0.4, 0.4, 1.0);
    /// Highlight used by slider handles and the FPS graph.
    pub const DEBUG_ACCENT: Color = Color::rgba(0.0, 1.0, 1.0, 1.0);

    /// Parse a CSS-style hex color: `#rgb` or `#rrggbb`.
    pub fn from_hex(s: &str) -> Result<Self, ColorError> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| ColorError::MissingHash(s.to_string()))?;

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorError::BadDigit(s.to_string()));
        }

        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(ColorError::BadLength(s.to_string())),
        };

        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| ColorError::BadDigit(s.to_string()))
        };

        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Build a color from hue, saturation and lightness, all in `0.0..=1.0`.
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        if s <= 0.0 {
            return Self::rgb(l, l, l);
        }

        let h = h.rem_euclid(1.0);
        let hi = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let lo = 2.0 * l - hi;

        Self::rgb(
            hue_to_rgb(lo, hi, h + 1.0 / 3.0),
            hue_to_rgb(lo, hi, h),
            hue_to_rgb(lo, hi, h - 1.0 / 3.0),
        )
    }

    pub fn with_alpha(mut self, a: f32) -> Self {
        self.a = a;
        self
    }

    /// Converts sRGB-encoded channels to linear light, leaving alpha as is.
    pub fn to_linear(self) -> Self {
        fn channel(c: f32) -> f32 {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        Self::rgba(channel(self.r), channel(self.g), channel(self.b), self.a)
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

fn hue_to_rgb(lo: f32, hi: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        lo + (hi - lo) * 6.0 * t
    } else if t < 0.5 {
        hi
    } else if t < 2.0 / 3.0 {
        lo + (hi - lo) * 6.0 * (2.0 / 3.0 - t)
    } else {
        lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn short_hex_expands() {
        assert_eq!(Color::from_hex("#000").unwrap(), Color::BLACK);
        assert_eq!(Color::from_hex("#fff").unwrap(), Color::WHITE);
    }

    #[test]
    fn long_hex_parses_channels() {
        let c = Color::from_hex("#ff8000").unwrap();
        assert!(close(c.r, 1.0));
        assert!(close(c.g, 128.0 / 255.0));
        assert!(close(c.b, 0.0));
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn bad_hex_is_rejected() {
        assert!(matches!(
            Color::from_hex("000"),
            Err(ColorError::MissingHash(_))
        ));
        assert!(matches!(
            Color::from_hex("#0000"),
            Err(ColorError::BadLength(_))
        ));
        assert!(matches!(
            Color::from_hex("#+f+f+f"),
            Err(ColorError::BadDigit(_))
        ));
        assert!(matches!(
            Color::from_hex("#zzz"),
            Err(ColorError::BadDigit(_))
        ));
    }

    #[test]
    fn hsl_primaries() {
        let red = Color::from_hsl(0.0, 1.0, 0.5);
        assert!(close(red.r, 1.0) && close(red.g, 0.0) && close(red.b, 0.0));

        let green = Color::from_hsl(1.0 / 3.0, 1.0, 0.5);
        assert!(close(green.r, 0.0) && close(green.g, 1.0) && close(green.b, 0.0));

        let grey = Color::from_hsl(0.7, 0.0, 0.25);
        assert!(close(grey.r, 0.25) && close(grey.g, 0.25) && close(grey.b, 0.25));
    }

    #[test]
    fn linear_conversion_keeps_endpoints() {
        let c = Color::rgba(0.0, 0.5, 1.0, 0.3).to_linear();
        assert!(close(c.r, 0.0));
        assert!(close(c.g, 0.214));
        assert!(close(c.b, 1.0));
        assert_eq!(c.a, 0.3);
    }
}
