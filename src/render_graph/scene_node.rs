//! The first stage of the graph: lit meshes over the background color.

use std::cell::RefCell;
use std::rc::Rc;

use crate::gpu::GpuContext;
use crate::lighting::LightUniforms;
use crate::mesh::Mesh;
use crate::mesh_pass::{DrawCall, MeshPass};
use crate::render_graph::{RenderContext, RenderNode};
use crate::scene::{DrawItem, MeshId};

/// Uploaded meshes plus this frame's draw list and lights.
///
/// Shared as `Rc<RefCell<MeshQueue>>` between the render application, which
/// fills it each frame from the scene, and the [`SceneNode`] that draws it.
#[derive(Default)]
pub struct MeshQueue {
    pub meshes: Vec<Mesh>,
    pub draw_queue: Vec<DrawItem>,
    pub lights: LightUniforms,
}

impl MeshQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        let id = MeshId(self.meshes.len());
        self.meshes.push(mesh);
        id
    }

    /// Replace the draw list and lights for the coming frame.
    pub fn submit(&mut self, items: Vec<DrawItem>, lights: LightUniforms) {
        self.draw_queue = items;
        self.lights = lights;
    }
}

/// Clears to the background color and draws the queued meshes.
pub struct SceneNode {
    pass: MeshPass,
    queue: Rc<RefCell<MeshQueue>>,
    clear_color: wgpu::Color,
}

impl SceneNode {
    /// `clear_color` is the configured background, alpha included.
    pub fn new(gpu: &GpuContext, queue: Rc<RefCell<MeshQueue>>, clear_color: wgpu::Color) -> Self {
        Self {
            pass: MeshPass::new(gpu),
            queue,
            clear_color,
        }
    }
}

impl RenderNode for SceneNode {
    fn execute(
        &mut self,
        ctx: &mut RenderContext,
        target: &wgpu::TextureView,
        _input: Option<&wgpu::TextureView>,
    ) {
        let queue = self.queue.borrow();

        let draw_calls: Vec<DrawCall> = queue
            .draw_queue
            .iter()
            .filter_map(|item| {
                queue.meshes.get(item.mesh.0).map(|mesh| DrawCall {
                    mesh,
                    transform: item.transform,
                    color: item.color,
                })
            })
            .collect();

        let mut render_pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.pass.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.pass.render(
            ctx.gpu,
            &mut render_pass,
            ctx.camera,
            ctx.time,
            &queue.lights,
            &draw_calls,
        );
    }

    fn prepare(&mut self, gpu: &GpuContext) {
        self.pass.ensure_depth_size(gpu);
    }

    fn label(&self) -> &str {
        "scene"
    }
}
