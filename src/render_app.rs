//! The render application: window, GPU context, scene and effect chain.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use thiserror::Error;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::bootstrap::RenderHost;
use crate::config::RenderConfig;
use crate::debug::{DebugTools, PendingCapture};
use crate::draw2d::Draw2d;
use crate::font::FontAtlas;
use crate::geometry::RawGeometry;
use crate::gpu::{GpuContext, GpuError};
use crate::input::Input;
use crate::lighting::LightUniforms;
use crate::post_process::{ShaderError, ShaderPass, ShaderPassDescriptor};
use crate::render_graph::{MeshQueue, RenderGraph, SceneNode, ShaderPassNode};
use crate::scene::{MeshId, Scene};

/// Pixel size of overlay text.
const OVERLAY_FONT_SIZE: f32 = 14.0;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("postprocessing is disabled in the render configuration")]
    PostprocessingDisabled,
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error("surface error: {0}")]
    Surface(wgpu::SurfaceError),
}

/// Owns everything needed to put the scene on screen.
///
/// Frames only advance after [`start`](RenderHost::start); before that the
/// window is hidden and redraw requests are ignored.
pub struct RenderApp {
    config: RenderConfig,
    pub window: Arc<Window>,
    pub gpu: GpuContext,
    pub scene: Scene,
    graph: RenderGraph,
    mesh_queue: Rc<RefCell<MeshQueue>>,
    overlay: Option<Draw2d>,
    debug: DebugTools,
    input: Input,
    running: bool,
    start_time: Instant,
    last_frame: Instant,
}

impl RenderApp {
    pub fn new(window: Arc<Window>, config: RenderConfig) -> Result<Self, RenderError> {
        let gpu = GpuContext::new(window.clone(), config.alpha)?;

        let mesh_queue = Rc::new(RefCell::new(MeshQueue::new()));
        let mut graph = RenderGraph::new(&gpu);
        graph.push(SceneNode::new(&gpu, mesh_queue.clone(), config.clear_color()));

        let now = Instant::now();
        Ok(Self {
            config,
            window,
            gpu,
            scene: Scene::new(),
            graph,
            mesh_queue,
            overlay: None,
            debug: DebugTools::default(),
            input: Input::new(),
            running: false,
            start_time: now,
            last_frame: now,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of stages in the effect chain, scene included.
    pub fn pass_count(&self) -> usize {
        self.graph.len()
    }

    /// Forward a window event to input tracking and the surface.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        self.input.handle_event(event);
        if let WindowEvent::Resized(size) = event {
            self.gpu.resize(size.width, size.height);
        }
    }

    /// Advance and render one frame of the loop, then queue the next one.
    pub fn frame(&mut self) -> Result<(), RenderError> {
        if !self.running {
            return Ok(());
        }

        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.scene.update(dt);
        let screen = Vec2::new(self.gpu.width() as f32, self.gpu.height() as f32);
        self.debug
            .update(&self.input, dt, screen, &mut self.scene.camera);

        self.render()?;

        if self.debug.take_screenshot_request() {
            self.capture();
        }
        if let Some(button) = &mut self.debug.screenshot {
            button.poll(&self.gpu);
        }

        self.input.begin_frame();
        self.window.request_redraw();
        Ok(())
    }

    fn time(&self) -> f32 {
        self.start_time.elapsed().as_secs_f32()
    }

    /// Draw the current state without advancing it.
    fn render(&mut self) -> Result<(), RenderError> {
        let time = self.time();
        self.mesh_queue.borrow_mut().submit(
            self.scene.draw_items(),
            LightUniforms::from_lights(self.scene.lights()),
        );

        if let Some(overlay) = &mut self.overlay {
            let screen = Vec2::new(self.gpu.width() as f32, self.gpu.height() as f32);
            overlay.clear();
            self.debug.draw(overlay, screen);
        }

        let overlay = self.overlay.as_ref();
        let result = self
            .graph
            .execute_with_ui(&self.gpu, time, &self.scene.camera, |gpu, pass| {
                if let Some(overlay) = overlay {
                    overlay.render(gpu, pass);
                }
            });

        match result {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated, reconfiguring");
                self.gpu.reconfigure();
                Ok(())
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timed out, frame skipped");
                Ok(())
            }
            Err(err) => Err(RenderError::Surface(err)),
        }
    }

    fn capture(&mut self) {
        let time = self.time();
        let Some(button) = &mut self.debug.screenshot else {
            return;
        };
        if button.is_busy() {
            return;
        }

        let path = button.next_path();
        match PendingCapture::start(&self.gpu, &mut self.graph, time, &self.scene.camera, path) {
            Ok(capture) => button.begin(capture),
            Err(err) => tracing::error!(error = %err, "screenshot failed"),
        }
    }
}

impl RenderHost for RenderApp {
    fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn set_visible(&mut self, visible: bool) {
        self.window.set_visible(visible);
    }

    fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    fn upload_geometry(&mut self, geometry: &RawGeometry) -> MeshId {
        let mesh = geometry.upload(&self.gpu);
        self.mesh_queue.borrow_mut().add_mesh(mesh)
    }

    fn add_pass(&mut self, descriptor: &ShaderPassDescriptor) -> Result<(), RenderError> {
        if !self.config.postprocessing {
            return Err(RenderError::PostprocessingDisabled);
        }
        let pass = ShaderPass::new(&self.gpu, descriptor)?;
        self.graph.push(ShaderPassNode::new(pass));
        tracing::info!(pass = %descriptor.label, "post-processing pass added");
        Ok(())
    }

    fn attach_debug(&mut self, tools: DebugTools) {
        let font = match FontAtlas::load(&self.gpu, self.config.font.as_deref(), OVERLAY_FONT_SIZE)
        {
            Ok(font) => Some(font),
            Err(err) => {
                tracing::warn!(error = %err, "no overlay font, debug text disabled");
                None
            }
        };
        self.overlay = Some(Draw2d::new(&self.gpu, font));
        tracing::info!(attached = ?tools.attached(), "debug tools attached");
        self.debug = tools;
    }

    fn start(&mut self) {
        let now = Instant::now();
        self.start_time = now;
        self.last_frame = now;
        self.running = true;
        tracing::info!("render loop started");
    }

    fn draw(&mut self) {
        if let Err(err) = self.render() {
            tracing::error!(error = %err, "draw failed");
        }
        self.window.request_redraw();
    }
}
