//! Full-screen shader passes built from WGSL source and a uniform mapping.
//!
//! Every pass binds the same group 0 layout:
//!
//! ```wgsl
//! struct Uniforms {
//!     resolution: vec2f,
//!     time: f32,
//!     // user uniforms follow, in declaration order
//! }
//! @group(0) @binding(0) var<uniform> u: Uniforms;
//! @group(0) @binding(1) var input_texture: texture_2d<f32>;
//! @group(0) @binding(2) var input_sampler: sampler;
//! ```
//!
//! The texture binding always receives the previous stage's output; a
//! [`Uniform::Texture`] entry in the mapping just names it.

use std::borrow::Cow;

use glam::{Vec2, Vec3, Vec4};
use thiserror::Error;

use crate::gpu::GpuContext;

/// Full-screen triangle with a `uv` varying at location 0.
pub const PASS_VERTEX_SHADER: &str = include_str!("shaders/pass.wgsl");

/// Darkens the frame toward the corners.
pub const VIGNETTE_FRAGMENT_SHADER: &str = include_str!("shaders/vignette.wgsl");

/// Byte size of the built-in `resolution` and `time` fields.
const BUILTIN_SIZE: usize = 12;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader '{label}' failed to compile: {message}")]
    Compile { label: String, message: String },
    #[error("uniform '{0}' is declared twice")]
    DuplicateUniform(String),
    #[error("only one texture uniform is supported, found '{0}' after '{1}'")]
    MultipleTextures(String, String),
    #[error("no uniform named '{0}'")]
    UnknownUniform(String),
    #[error("uniform '{name}' is a {expected}, not a {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// A value in a pass's uniform mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Uniform {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    /// The previous stage's color output.
    Texture,
}

impl Uniform {
    fn kind(&self) -> &'static str {
        match self {
            Uniform::Float(_) => "f32",
            Uniform::Vec2(_) => "vec2f",
            Uniform::Vec3(_) => "vec3f",
            Uniform::Vec4(_) => "vec4f",
            Uniform::Texture => "texture",
        }
    }

    /// (alignment, size) under WGSL uniform address space rules.
    fn layout(&self) -> Option<(usize, usize)> {
        match self {
            Uniform::Float(_) => Some((4, 4)),
            Uniform::Vec2(_) => Some((8, 8)),
            Uniform::Vec3(_) => Some((16, 12)),
            Uniform::Vec4(_) => Some((16, 16)),
            Uniform::Texture => None,
        }
    }
}

/// Everything needed to build a [`ShaderPass`].
#[derive(Clone, Debug)]
pub struct ShaderPassDescriptor {
    pub label: String,
    pub vertex_shader: Cow<'static, str>,
    pub fragment_shader: Cow<'static, str>,
    pub uniforms: Vec<(String, Uniform)>,
}

impl ShaderPassDescriptor {
    /// The corner-darkening pass the demo appends after the scene.
    pub fn vignette() -> Self {
        Self {
            label: "Vignette".to_string(),
            vertex_shader: Cow::Borrowed(PASS_VERTEX_SHADER),
            fragment_shader: Cow::Borrowed(VIGNETTE_FRAGMENT_SHADER),
            uniforms: vec![
                ("input".to_string(), Uniform::Texture),
                ("offset".to_string(), Uniform::Float(1.0)),
                ("darkness".to_string(), Uniform::Float(1.0)),
            ],
        }
    }
}

#[derive(Clone, Debug)]
struct UniformField {
    name: String,
    offset: usize,
    value: Uniform,
}

/// CPU copy of a pass's uniform buffer, laid out for WGSL.
#[derive(Clone, Debug)]
pub struct UniformBlock {
    fields: Vec<UniformField>,
    texture: Option<String>,
    data: Vec<u8>,
}

impl UniformBlock {
    pub fn new(uniforms: &[(String, Uniform)]) -> Result<Self, ShaderError> {
        let mut fields: Vec<UniformField> = Vec::with_capacity(uniforms.len());
        let mut texture: Option<String> = None;
        let mut cursor = BUILTIN_SIZE;
        let mut max_align = 8;

        for (name, value) in uniforms {
            let duplicate =
                fields.iter().any(|f| &f.name == name) || texture.as_ref() == Some(name);
            if duplicate {
                return Err(ShaderError::DuplicateUniform(name.clone()));
            }

            let Some((align, size)) = value.layout() else {
                if let Some(first) = &texture {
                    return Err(ShaderError::MultipleTextures(name.clone(), first.clone()));
                }
                texture = Some(name.clone());
                continue;
            };

            let offset = cursor.next_multiple_of(align);
            cursor = offset + size;
            max_align = max_align.max(align);
            fields.push(UniformField {
                name: name.clone(),
                offset,
                value: *value,
            });
        }

        let size = cursor.next_multiple_of(max_align).next_multiple_of(16);
        let mut block = Self {
            fields,
            texture,
            data: vec![0; size],
        };
        for i in 0..block.fields.len() {
            let field = block.fields[i].clone();
            block.write(field.offset, field.value);
        }
        Ok(block)
    }

    /// Buffer size in bytes, a multiple of 16.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.offset)
    }

    pub fn texture_name(&self) -> Option<&str> {
        self.texture.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<Uniform> {
        if self.texture.as_deref() == Some(name) {
            return Some(Uniform::Texture);
        }
        self.fields.iter().find(|f| f.name == name).map(|f| f.value)
    }

    /// Replace a uniform's value. The type must match the declaration.
    pub fn set(&mut self, name: &str, value: Uniform) -> Result<(), ShaderError> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| ShaderError::UnknownUniform(name.to_string()))?;

        if std::mem::discriminant(&field.value) != std::mem::discriminant(&value) {
            return Err(ShaderError::TypeMismatch {
                name: name.to_string(),
                expected: field.value.kind(),
                found: value.kind(),
            });
        }

        field.value = value;
        let offset = field.offset;
        self.write(offset, value);
        Ok(())
    }

    pub fn set_builtins(&mut self, resolution: Vec2, time: f32) {
        self.data[0..8].copy_from_slice(bytemuck::cast_slice(&resolution.to_array()));
        self.data[8..12].copy_from_slice(bytemuck::bytes_of(&time));
    }

    fn write(&mut self, offset: usize, value: Uniform) {
        let (floats, len) = match value {
            Uniform::Float(v) => ([v, 0.0, 0.0, 0.0], 1),
            Uniform::Vec2(v) => ([v.x, v.y, 0.0, 0.0], 2),
            Uniform::Vec3(v) => (v.extend(0.0).to_array(), 3),
            Uniform::Vec4(v) => (v.to_array(), 4),
            Uniform::Texture => return,
        };
        let bytes: &[u8] = bytemuck::cast_slice(&floats[..len]);
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
}

/// A compiled full-screen effect stage.
pub struct ShaderPass {
    label: String,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniforms: UniformBlock,
}

impl ShaderPass {
    /// Compile both shader stages and build the pipeline.
    ///
    /// WGSL errors are caught in a validation scope and returned instead of
    /// reaching the device's uncaptured error handler.
    pub fn new(gpu: &GpuContext, descriptor: &ShaderPassDescriptor) -> Result<Self, ShaderError> {
        let uniforms = UniformBlock::new(&descriptor.uniforms)?;
        let device = &gpu.device;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} Vertex", descriptor.label)),
            source: wgpu::ShaderSource::Wgsl(descriptor.vertex_shader.clone()),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} Fragment", descriptor.label)),
            source: wgpu::ShaderSource::Wgsl(descriptor.fragment_shader.clone()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} Uniforms", descriptor.label)),
            size: uniforms.size() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shader Pass Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shader Pass Bind Group Layout"),
            entries: &[
                // Uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Input texture
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shader Pass Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&descriptor.label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex,
                entry_point: Some("vs"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
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
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderError::Compile {
                label: descriptor.label.clone(),
                message: error.to_string(),
            });
        }

        tracing::debug!(
            label = %descriptor.label,
            uniform_bytes = uniforms.size(),
            "shader pass compiled"
        );

        Ok(Self {
            label: descriptor.label.clone(),
            pipeline,
            uniform_buffer,
            bind_group_layout,
            sampler,
            uniforms,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn uniforms(&self) -> &UniformBlock {
        &self.uniforms
    }

    pub fn set_uniform(&mut self, name: &str, value: Uniform) -> Result<(), ShaderError> {
        self.uniforms.set(name, value)
    }

    /// Draw the effect, sampling `input_view`, into the current render pass.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        render_pass: &mut wgpu::RenderPass,
        time: f32,
        input_view: &wgpu::TextureView,
    ) {
        self.uniforms
            .set_builtins(Vec2::new(gpu.width() as f32, gpu.height() as f32), time);
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, self.uniforms.bytes());

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shader Pass Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(input_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(entries: &[(&str, Uniform)]) -> Vec<(String, Uniform)> {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    fn read_f32(block: &UniformBlock, offset: usize) -> f32 {
        bytemuck::pod_read_unaligned(&block.bytes()[offset..offset + 4])
    }

    #[test]
    fn builtins_only_is_16_bytes() {
        let block = UniformBlock::new(&[]).unwrap();
        assert_eq!(block.size(), 16);
    }

    #[test]
    fn fields_follow_wgsl_alignment() {
        let block = UniformBlock::new(&mapping(&[
            ("a", Uniform::Float(1.0)),
            ("b", Uniform::Vec2(Vec2::ONE)),
            ("c", Uniform::Vec3(Vec3::ONE)),
            ("d", Uniform::Float(2.0)),
            ("e", Uniform::Vec4(Vec4::ONE)),
        ]))
        .unwrap();

        assert_eq!(block.offset_of("a"), Some(12));
        assert_eq!(block.offset_of("b"), Some(16));
        assert_eq!(block.offset_of("c"), Some(32));
        // f32 packs into the vec3's trailing 4 bytes
        assert_eq!(block.offset_of("d"), Some(44));
        assert_eq!(block.offset_of("e"), Some(48));
        assert_eq!(block.size(), 64);
        assert_eq!(read_f32(&block, 44), 2.0);
    }

    #[test]
    fn texture_takes_no_buffer_space() {
        let block = UniformBlock::new(&ShaderPassDescriptor::vignette().uniforms).unwrap();
        assert_eq!(block.texture_name(), Some("input"));
        assert_eq!(block.offset_of("input"), None);
        assert_eq!(block.offset_of("offset"), Some(12));
        assert_eq!(block.offset_of("darkness"), Some(16));
        assert_eq!(block.size(), 32);
        assert_eq!(block.get("input"), Some(Uniform::Texture));
    }

    #[test]
    fn invalid_mappings_are_rejected() {
        assert!(matches!(
            UniformBlock::new(&mapping(&[
                ("x", Uniform::Float(0.0)),
                ("x", Uniform::Float(1.0)),
            ])),
            Err(ShaderError::DuplicateUniform(name)) if name == "x"
        ));
        assert!(matches!(
            UniformBlock::new(&mapping(&[("a", Uniform::Texture), ("b", Uniform::Texture)])),
            Err(ShaderError::MultipleTextures(..))
        ));
    }

    #[test]
    fn set_checks_name_and_type() {
        let mut block =
            UniformBlock::new(&mapping(&[("darkness", Uniform::Float(1.0))])).unwrap();

        block.set("darkness", Uniform::Float(0.25)).unwrap();
        assert_eq!(read_f32(&block, 12), 0.25);

        assert!(matches!(
            block.set("darkness", Uniform::Vec2(Vec2::ZERO)),
            Err(ShaderError::TypeMismatch { expected: "f32", .. })
        ));
        assert!(matches!(
            block.set("missing", Uniform::Float(0.0)),
            Err(ShaderError::UnknownUniform(_))
        ));
    }

    #[test]
    fn builtins_are_written_first() {
        let mut block = UniformBlock::new(&[]).unwrap();
        block.set_builtins(Vec2::new(800.0, 600.0), 1.5);
        assert_eq!(read_f32(&block, 0), 800.0);
        assert_eq!(read_f32(&block, 4), 600.0);
        assert_eq!(read_f32(&block, 8), 1.5);
    }
}
