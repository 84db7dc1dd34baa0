use crate::camera::Camera;
use crate::gpu::GpuContext;
use crate::render_graph::{RenderContext, RenderNode, RenderTarget};

/// Executes a chain of render nodes with ping-pong intermediate buffers.
///
/// ```text
/// Pass 0: None     → Target A
/// Pass 1: Target A → Target B
/// Pass 2: Target B → Screen
/// ```
///
/// A single-node graph renders straight to the destination.
pub struct RenderGraph {
    nodes: Vec<Box<dyn RenderNode>>,
    target_a: RenderTarget,
    target_b: RenderTarget,
}

impl RenderGraph {
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            nodes: Vec::new(),
            target_a: RenderTarget::new(gpu, "RenderGraph Target A"),
            target_b: RenderTarget::new(gpu, "RenderGraph Target B"),
        }
    }

    /// Append a node; it runs after every node already in the graph.
    pub fn push<N: RenderNode + 'static>(&mut self, node: N) {
        tracing::debug!(node = node.label(), index = self.nodes.len(), "render node added");
        self.nodes.push(Box::new(node));
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Render a frame to the surface, then draw `ui_fn` on top of it.
    ///
    /// The overlay pass loads the finished frame, so UI is never affected by
    /// post-processing.
    pub fn execute_with_ui<F>(
        &mut self,
        gpu: &GpuContext,
        time: f32,
        camera: &Camera,
        ui_fn: F,
    ) -> Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&GpuContext, &mut wgpu::RenderPass),
    {
        let output = gpu.surface.get_current_texture()?;
        let screen_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("RenderGraph Encoder"),
            });

        self.run_nodes(gpu, &mut encoder, time, camera, &screen_view);

        {
            let mut ui_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("UI Overlay Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &screen_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            ui_fn(gpu, &mut ui_pass);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Render a frame into `target` instead of the surface, without the
    /// overlay. Extra commands (such as a readback copy) can be recorded by
    /// `after` into the same submission.
    pub fn execute_to_target<F>(
        &mut self,
        gpu: &GpuContext,
        time: f32,
        camera: &Camera,
        target: &wgpu::TextureView,
        after: F,
    ) where
        F: FnOnce(&mut wgpu::CommandEncoder),
    {
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("RenderGraph To Target Encoder"),
            });

        self.run_nodes(gpu, &mut encoder, time, camera, target);
        after(&mut encoder);

        gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    fn run_nodes(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        time: f32,
        camera: &Camera,
        destination: &wgpu::TextureView,
    ) {
        for node in &mut self.nodes {
            node.prepare(gpu);
        }
        self.target_a.ensure_size(gpu, "RenderGraph Target A");
        self.target_b.ensure_size(gpu, "RenderGraph Target B");

        let mut ctx = RenderContext {
            gpu,
            encoder,
            time,
            camera,
        };

        let node_count = self.nodes.len();
        let mut current_input: Option<&wgpu::TextureView> = None;

        for (i, node) in self.nodes.iter_mut().enumerate() {
            let is_last = i + 1 == node_count;
            let target = if is_last {
                destination
            } else if i % 2 == 0 {
                &self.target_a.view
            } else {
                &self.target_b.view
            };

            node.execute(&mut ctx, target, current_input);

            if !is_last {
                current_input = Some(target);
            }
        }
    }
}
