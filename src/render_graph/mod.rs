//! Linear render graph: the scene, then zero or more shader passes, then
//! an overlay for the debug UI.
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │  SceneNode  │───▶│ ShaderPass  │───▶│   Screen    │
//! │ (meshes)    │    │  (vignette) │    │  + overlay  │
//! └─────────────┘    └─────────────┘    └─────────────┘
//!       │                  │
//!       ▼                  ▼
//!   Target A ◀────────▶ Target B        (ping-pong)
//! ```
//!
//! With postprocessing disabled the graph holds only the scene node, which
//! then renders straight to the screen.

mod graph;
mod render_node;
mod render_target;
mod scene_node;
mod shader_pass_node;

pub use graph::RenderGraph;
pub use render_node::RenderNode;
pub use render_target::{RenderContext, RenderTarget};
pub use scene_node::{MeshQueue, SceneNode};
pub use shader_pass_node::ShaderPassNode;
