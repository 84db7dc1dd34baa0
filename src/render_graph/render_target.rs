use crate::camera::Camera;
use crate::gpu::GpuContext;

/// An off-screen color target that passes can render to and sample from.
pub struct RenderTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    usage: wgpu::TextureUsages,
    width: u32,
    height: u32,
}

impl RenderTarget {
    /// A surface-sized target usable as attachment and texture binding.
    pub fn new(gpu: &GpuContext, label: &str) -> Self {
        Self::with_usage(
            gpu,
            label,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        )
    }

    /// A surface-sized target that can also be copied out, for readback.
    pub fn readable(gpu: &GpuContext, label: &str) -> Self {
        Self::with_usage(
            gpu,
            label,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        )
    }

    fn with_usage(gpu: &GpuContext, label: &str, usage: wgpu::TextureUsages) -> Self {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: gpu.config.format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            usage,
            width: gpu.width(),
            height: gpu.height(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Recreate the texture if the surface size changed.
    pub fn ensure_size(&mut self, gpu: &GpuContext, label: &str) {
        if self.width != gpu.width() || self.height != gpu.height() {
            *self = Self::with_usage(gpu, label, self.usage);
        }
    }
}

/// Per-frame state handed to every node.
pub struct RenderContext<'a> {
    pub gpu: &'a GpuContext,
    pub encoder: &'a mut wgpu::CommandEncoder,
    /// Seconds since the render loop started.
    pub time: f32,
    pub camera: &'a Camera,
}
