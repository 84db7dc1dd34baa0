use std::path::PathBuf;

use thiserror::Error;

use crate::color::Color;
use crate::rotating_mesh::DEFAULT_ANGULAR_VELOCITY;

/// Label of the panel slider bound to the mesh's spin rate.
pub const ANGULAR_VELOCITY_LABEL: &str = "Angular Velocity";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("panel input {label:?}: min {min} must be below max {max}")]
    EmptyRange { label: String, min: f32, max: f32 },
    #[error("panel input {label:?}: log scale needs a positive min, got {min}")]
    LogScaleMin { label: String, min: f32 },
    #[error("panel input {0:?} is declared twice")]
    DuplicateLabel(String),
    #[error("background alpha {0} is outside 0..=1")]
    BackgroundAlpha(f32),
}

/// Whether the debug tools are wired in. Read once from the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebugFlag(pub bool);

impl DebugFlag {
    pub fn is_on(self) -> bool {
        self.0
    }
}

/// Starting state for the orbit camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitControls {
    pub distance: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PanelScale {
    #[default]
    Linear,
    /// Equal slider travel multiplies the value by the same factor.
    Log,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PanelInputKind {
    #[default]
    Range,
}

/// One control in the debug panel.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelInput {
    pub kind: PanelInputKind,
    pub label: String,
    pub min: f32,
    pub max: f32,
    pub initial: f32,
    pub scale: PanelScale,
}

impl PanelInput {
    /// A linear range slider.
    pub fn range(label: impl Into<String>, min: f32, max: f32, initial: f32) -> Self {
        Self {
            kind: PanelInputKind::Range,
            label: label.into(),
            min,
            max,
            initial,
            scale: PanelScale::Linear,
        }
    }

    pub fn log(mut self) -> Self {
        self.scale = PanelScale::Log;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.min.is_nan() || self.max.is_nan() || self.min >= self.max {
            return Err(ConfigError::EmptyRange {
                label: self.label.clone(),
                min: self.min,
                max: self.max,
            });
        }
        if self.scale == PanelScale::Log && self.min <= 0.0 {
            return Err(ConfigError::LogScaleMin {
                label: self.label.clone(),
                min: self.min,
            });
        }
        Ok(())
    }
}

/// Everything the render application is built from.
///
/// Built once with the chainable setters, then handed to [`crate::run`]; the
/// render application never changes it afterwards.
///
/// ```ignore
/// let config = RenderConfig::default()
///     .title("My Demo")
///     .size(1280, 720)
///     .background(Color::from_hex("#202030")?)
///     .orbit_controls(5.0);
/// ```
#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Ask for a surface that composites with what is behind the window.
    pub alpha: bool,
    pub background: Color,
    pub background_alpha: f32,
    pub postprocessing: bool,
    pub show_fps: bool,
    pub orbit_controls: Option<OrbitControls>,
    pub panel_inputs: Vec<PanelInput>,
    /// TTF/OTF used for overlay text. System fonts are tried when unset.
    pub font: Option<PathBuf>,
    pub screenshot_dir: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: "glint".to_string(),
            width: 1280,
            height: 720,
            alpha: false,
            background: Color::BLACK,
            background_alpha: 1.0,
            postprocessing: false,
            show_fps: false,
            orbit_controls: None,
            panel_inputs: Vec::new(),
            font: None,
            screenshot_dir: PathBuf::from("."),
        }
    }
}

impl RenderConfig {
    /// The configuration the demo runs with. Debug-only options are left
    /// unset unless `debug` is on.
    pub fn demo(debug: DebugFlag) -> Self {
        let config = Self::default()
            .alpha(true)
            .background(Color::BLACK)
            .background_alpha(1.0)
            .postprocessing(true);

        if !debug.is_on() {
            return config;
        }

        config
            .show_fps(true)
            .orbit_controls(5.0)
            .panel_input(
                PanelInput::range(ANGULAR_VELOCITY_LABEL, 0.1, 30.0, DEFAULT_ANGULAR_VELOCITY)
                    .log(),
            )
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn alpha(mut self, alpha: bool) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn background_alpha(mut self, alpha: f32) -> Self {
        self.background_alpha = alpha;
        self
    }

    pub fn postprocessing(mut self, enabled: bool) -> Self {
        self.postprocessing = enabled;
        self
    }

    pub fn show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }

    pub fn orbit_controls(mut self, distance: f32) -> Self {
        self.orbit_controls = Some(OrbitControls { distance });
        self
    }

    pub fn panel_input(mut self, input: PanelInput) -> Self {
        self.panel_inputs.push(input);
        self
    }

    pub fn font(mut self, path: impl Into<PathBuf>) -> Self {
        self.font = Some(path.into());
        self
    }

    pub fn screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = dir.into();
        self
    }

    /// Check the option combinations the render application relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.background_alpha) {
            return Err(ConfigError::BackgroundAlpha(self.background_alpha));
        }
        for (i, input) in self.panel_inputs.iter().enumerate() {
            input.validate()?;
            if self.panel_inputs[..i].iter().any(|p| p.label == input.label) {
                return Err(ConfigError::DuplicateLabel(input.label.clone()));
            }
        }
        Ok(())
    }

    /// Clear color for the first pass. Opaque unless `alpha` is on.
    pub fn clear_color(&self) -> wgpu::Color {
        let alpha = if self.alpha { self.background_alpha } else { 1.0 };
        self.background.to_linear().with_alpha(alpha).to_wgpu()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_without_debug_has_no_debug_options() {
        let config = RenderConfig::demo(DebugFlag(false));
        assert!(config.alpha);
        assert!(config.postprocessing);
        assert_eq!(config.background, Color::BLACK);
        assert!(!config.show_fps);
        assert!(config.orbit_controls.is_none());
        assert!(config.panel_inputs.is_empty());
    }

    #[test]
    fn demo_with_debug_adds_spin_slider() {
        let config = RenderConfig::demo(DebugFlag(true));
        assert!(config.show_fps);
        assert_eq!(config.orbit_controls, Some(OrbitControls { distance: 5.0 }));

        let [input] = config.panel_inputs.as_slice() else {
            panic!("expected a single panel input");
        };
        assert_eq!(input.label, ANGULAR_VELOCITY_LABEL);
        assert_eq!(input.initial, DEFAULT_ANGULAR_VELOCITY);
        assert_eq!(input.scale, PanelScale::Log);
        assert_eq!((input.min, input.max), (0.1, 30.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let empty = RenderConfig::default().panel_input(PanelInput::range("a", 1.0, 1.0, 1.0));
        assert!(matches!(empty.validate(), Err(ConfigError::EmptyRange { .. })));

        let log = RenderConfig::default().panel_input(PanelInput::range("b", 0.0, 1.0, 0.5).log());
        assert!(matches!(log.validate(), Err(ConfigError::LogScaleMin { .. })));

        let twice = RenderConfig::default()
            .panel_input(PanelInput::range("c", 0.0, 1.0, 0.5))
            .panel_input(PanelInput::range("c", 0.0, 2.0, 0.5));
        assert_eq!(
            twice.validate(),
            Err(ConfigError::DuplicateLabel("c".to_string()))
        );

        let alpha = RenderConfig::default().background_alpha(1.5);
        assert_eq!(alpha.validate(), Err(ConfigError::BackgroundAlpha(1.5)));
    }

    #[test]
    fn clear_color_ignores_alpha_on_opaque_surfaces() {
        let opaque = RenderConfig::default().background_alpha(0.25);
        assert_eq!(opaque.clear_color().a, 1.0);

        let transparent = opaque.alpha(true);
        assert_eq!(transparent.clear_color().a, 0.25);
    }
}
