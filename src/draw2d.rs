use crate::color::Color;
use crate::font::FontAtlas;
use crate::gpu::GpuContext;

/// Vertex for overlay quads and glyphs.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex2d {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex2d {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex2d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            // color
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Draw2dUniforms {
    resolution: [f32; 2],
    _padding: [f32; 2],
}

const MAX_VERTICES: usize = 16384;

/// Immediate-mode overlay for the debug tools: flat rectangles and text.
///
/// Draw calls are batched and flushed in one pass after post-processing,
/// so the overlay is never vignetted. Without a font, text calls are no-ops.
/// Colors are given in sRGB, like everything else in the configuration.
pub struct Draw2d {
    colored_pipeline: wgpu::RenderPipeline,
    textured_pipeline: wgpu::RenderPipeline,

    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,

    font: Option<FontAtlas>,
    font_bind_group: Option<wgpu::BindGroup>,

    colored_vertices: Vec<Vertex2d>,
    text_vertices: Vec<Vertex2d>,
}

impl Draw2d {
    pub fn new(gpu: &GpuContext, font: Option<FontAtlas>) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Draw2d Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/draw2d.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw2d Uniforms"),
            size: std::mem::size_of::<Draw2dUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Draw2d Uniform Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw2d Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Draw2d Texture Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let font_bind_group = font.as_ref().map(|font| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Font Bind Group"),
                layout: &texture_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&font.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&font.sampler),
                    },
                ],
            })
        });

        let blend_state = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let make_pipeline = |label: &str, layouts: &[&wgpu::BindGroupLayout], fs: &str| {
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: layouts,
                push_constant_ranges: &[],
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs"),
                    buffers: &[Vertex2d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fs),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: Some(blend_state),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let colored_pipeline = make_pipeline(
            "Draw2d Colored Pipeline",
            &[&uniform_bind_group_layout],
            "fs_colored",
        );
        let textured_pipeline = make_pipeline(
            "Draw2d Textured Pipeline",
            &[&uniform_bind_group_layout, &texture_bind_group_layout],
            "fs_textured",
        );

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw2d Vertex Buffer"),
            size: (MAX_VERTICES * std::mem::size_of::<Vertex2d>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            colored_pipeline,
            textured_pipeline,
            vertex_buffer,
            uniform_buffer,
            uniform_bind_group,
            font,
            font_bind_group,
            colored_vertices: Vec::with_capacity(1024),
            text_vertices: Vec::with_capacity(1024),
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Text width in pixels, or zero without a font.
    pub fn measure(&self, text: &str) -> f32 {
        self.font.as_ref().map_or(0.0, |f| f.measure(text))
    }

    /// Clear all draw calls for the new frame.
    pub fn clear(&mut self) {
        self.colored_vertices.clear();
        self.text_vertices.clear();
    }

    /// Draw a colored rectangle in window pixels (origin top-left).
    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        push_quad(
            &mut self.colored_vertices,
            [x, y, x + w, y + h],
            [0.0, 0.0, 0.0, 0.0],
            color.to_linear().to_array(),
        );
    }

    /// Draw text with its top-left corner at `(x, y)`.
    pub fn text(&mut self, x: f32, y: f32, text: &str, color: Color) {
        let Some(font) = &self.font else {
            return;
        };

        let c = color.to_linear().to_array();
        let mut cursor_x = x;
        let baseline_y = y + font.size();

        for ch in text.chars() {
            let Some(glyph) = font.glyph(ch) else {
                cursor_x += font.size() * 0.5;
                continue;
            };

            if glyph.width > 0 && glyph.height > 0 {
                let gx = cursor_x + glyph.offset_x;
                // ymin is measured up from the baseline to the glyph's bottom edge
                let gy = baseline_y - glyph.offset_y - glyph.height as f32;
                let [u0, v0, du, dv] = glyph.uv;

                push_quad(
                    &mut self.text_vertices,
                    [gx, gy, gx + glyph.width as f32, gy + glyph.height as f32],
                    [u0, v0, u0 + du, v0 + dv],
                    c,
                );
            }

            cursor_x += glyph.advance;
        }
    }

    /// Flush batched draw calls into `render_pass`.
    pub fn render(&self, gpu: &GpuContext, render_pass: &mut wgpu::RenderPass) {
        let uniforms = Draw2dUniforms {
            resolution: [gpu.width() as f32, gpu.height() as f32],
            _padding: [0.0, 0.0],
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let colored = self.colored_vertices.len().min(MAX_VERTICES);
        if colored > 0 {
            gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(&self.colored_vertices[..colored]),
            );

            render_pass.set_pipeline(&self.colored_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.draw(0..colored as u32, 0..1);
        }

        let text = self.text_vertices.len().min(MAX_VERTICES - colored);
        if let Some(bind_group) = &self.font_bind_group
            && text > 0
        {
            gpu.queue.write_buffer(
                &self.vertex_buffer,
                (colored * std::mem::size_of::<Vertex2d>()) as u64,
                bytemuck::cast_slice(&self.text_vertices[..text]),
            );

            render_pass.set_pipeline(&self.textured_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.draw(colored as u32..(colored + text) as u32, 0..1);
        }
    }
}

/// Appends two triangles covering `rect` = (x0, y0, x1, y1).
fn push_quad(out: &mut Vec<Vertex2d>, rect: [f32; 4], uv: [f32; 4], color: [f32; 4]) {
    let [x0, y0, x1, y1] = rect;
    let [u0, v0, u1, v1] = uv;
    let v = |position: [f32; 2], uv: [f32; 2]| Vertex2d {
        position,
        uv,
        color,
    };
    out.extend_from_slice(&[
        v([x0, y0], [u0, v0]),
        v([x1, y0], [u1, v0]),
        v([x0, y1], [u0, v1]),
        v([x1, y0], [u1, v0]),
        v([x1, y1], [u1, v1]),
        v([x0, y1], [u0, v1]),
    ]);
}
