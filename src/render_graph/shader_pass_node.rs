use crate::post_process::ShaderPass;
use crate::render_graph::{RenderContext, RenderNode};

/// Runs a [`ShaderPass`] over the previous stage's output.
///
/// Never the first node: the render application always puts the scene
/// ahead of it. Without an input the node leaves the target untouched.
pub struct ShaderPassNode {
    pub pass: ShaderPass,
}

impl ShaderPassNode {
    pub fn new(pass: ShaderPass) -> Self {
        Self { pass }
    }
}

impl RenderNode for ShaderPassNode {
    fn execute(
        &mut self,
        ctx: &mut RenderContext,
        target: &wgpu::TextureView,
        input: Option<&wgpu::TextureView>,
    ) {
        let Some(input_view) = input else {
            tracing::warn!(pass = self.pass.label(), "shader pass has no input, skipped");
            return;
        };

        let mut render_pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(self.pass.label()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.pass
            .render(ctx.gpu, &mut render_pass, ctx.time, input_view);
    }

    fn label(&self) -> &str {
        self.pass.label()
    }
}
