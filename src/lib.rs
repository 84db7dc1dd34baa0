//! # glint
//!
//! A starter template for small GPU demos: one rotating mesh under a natural
//! light rig, a full-screen vignette pass, and debug tools (FPS counter,
//! orbit camera, parameter panel, screenshot button) that only exist when
//! debug mode is on.
//!
//! ```no_run
//! use glint::{DebugFlag, RenderConfig, RunOptions};
//!
//! fn main() -> anyhow::Result<()> {
//!     let debug = DebugFlag(std::env::args().any(|a| a == "--debug"));
//!     glint::run(
//!         RenderConfig::demo(debug),
//!         RunOptions { debug, ..RunOptions::default() },
//!     )
//! }
//! ```
//!
//! Setup happens in a fixed order once the model has loaded; see
//! [`Bootstrap`] for the sequence and [`RenderHost`] for the boundary it
//! drives.

mod app;
mod assets;
mod bootstrap;
mod camera;
mod color;
mod config;
pub mod debug;
mod draw2d;
mod font;
mod geometry;
mod gpu;
mod input;
mod lighting;
mod mesh;
mod mesh_pass;
mod orbit_camera;
mod post_process;
mod render_app;
mod render_graph;
mod rotating_mesh;
mod scene;

pub use app::{RunOptions, run};
pub use assets::{AssetError, AssetManager, AssetSource, LoadedAssets, MODEL_EXTENT, PendingLoad};
pub use bootstrap::{
    Bootstrap, BootstrapError, CAMERA_POSITION, DebugHandle, MODEL_ASSET, RenderHost,
};
pub use camera::Camera;
pub use color::{Color, ColorError};
pub use config::{
    ANGULAR_VELOCITY_LABEL, ConfigError, DebugFlag, OrbitControls, PanelInput, PanelInputKind,
    PanelScale, RenderConfig,
};
pub use debug::{AttachedTools, DebugTools, ParamHandle};
pub use draw2d::Draw2d;
pub use font::{FontAtlas, FontError};
pub use geometry::{GeometryError, Primitive, RawGeometry};
pub use gpu::{GpuContext, GpuError};
pub use input::Input;
pub use lighting::{Light, LightUniforms, MAX_DIRECTIONAL_LIGHTS, add_natural_light};
pub use mesh::{Mesh, Transform, Vertex3d};
pub use mesh_pass::MeshPass;
pub use orbit_camera::OrbitCamera;
pub use post_process::{
    PASS_VERTEX_SHADER, ShaderError, ShaderPass, ShaderPassDescriptor, Uniform, UniformBlock,
    VIGNETTE_FRAGMENT_SHADER,
};
pub use render_app::{RenderApp, RenderError};
pub use render_graph::{
    MeshQueue, RenderContext, RenderGraph, RenderNode, RenderTarget, SceneNode, ShaderPassNode,
};
pub use rotating_mesh::{AngularVelocity, DEFAULT_ANGULAR_VELOCITY, RotatingMesh};
pub use scene::{DrawItem, MeshId, Scene, SceneObject};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
