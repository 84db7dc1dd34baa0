use crate::gpu::GpuContext;
use crate::render_graph::RenderContext;

/// A stage of the render graph.
///
/// Each node receives the previous stage's output (`None` for the first
/// node) and writes to `target`, which is either an intermediate buffer or
/// the final destination.
pub trait RenderNode {
    fn execute(
        &mut self,
        ctx: &mut RenderContext,
        target: &wgpu::TextureView,
        input: Option<&wgpu::TextureView>,
    );

    /// Called once per frame before any node executes, to resize
    /// size-dependent resources.
    fn prepare(&mut self, _gpu: &GpuContext) {}

    fn label(&self) -> &str;
}
