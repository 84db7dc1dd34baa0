//! Glyph atlas for overlay text, rasterized with `fontdue`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};
use thiserror::Error;

use crate::gpu::GpuContext;

/// Fonts tried in order when no `--font` is given.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/System/Library/Fonts/Menlo.ttc",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const ATLAS_PADDING: u32 = 1;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse font: {0}")]
    Parse(&'static str),
    #[error("no usable font found (pass --font <path>)")]
    NotFound,
}

/// Placement of a single glyph in the atlas.
#[derive(Clone, Copy, Debug)]
pub struct GlyphInfo {
    /// Atlas rectangle (x, y, width, height) normalized to [0, 1].
    pub uv: [f32; 4],
    pub width: u32,
    pub height: u32,
    /// Offset from the pen position to the glyph's bottom-left corner.
    pub offset_x: f32,
    pub offset_y: f32,
    pub advance: f32,
}

/// Printable ASCII rasterized once into a single R8 texture.
pub struct FontAtlas {
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    glyphs: HashMap<char, GlyphInfo>,
    size: f32,
    line_height: f32,
}

impl FontAtlas {
    /// Loads the font at `path`, or the first system font found when `None`.
    pub fn load(gpu: &GpuContext, path: Option<&Path>, size: f32) -> Result<Self, FontError> {
        let (path, data) = match path {
            Some(path) => {
                let data = std::fs::read(path).map_err(|source| FontError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                (path.to_path_buf(), data)
            }
            None => SYSTEM_FONTS
                .iter()
                .map(PathBuf::from)
                .find_map(|p| std::fs::read(&p).ok().map(|d| (p, d)))
                .ok_or(FontError::NotFound)?,
        };

        tracing::debug!(path = %path.display(), size, "loading overlay font");
        Self::from_bytes(gpu, &data, size)
    }

    /// Builds an atlas from TTF/OTF data.
    pub fn from_bytes(gpu: &GpuContext, font_data: &[u8], size: f32) -> Result<Self, FontError> {
        let font = Font::from_bytes(font_data, FontSettings::default()).map_err(FontError::Parse)?;

        let rasterized: Vec<(char, fontdue::Metrics, Vec<u8>)> = (32u8..=126u8)
            .map(|c| {
                let c = c as char;
                let (metrics, bitmap) = font.rasterize(c, size);
                (c, metrics, bitmap)
            })
            .collect();

        let sizes: Vec<(u32, u32)> = rasterized
            .iter()
            .map(|(_, m, _)| (m.width as u32, m.height as u32))
            .collect();
        let packing = pack_rows(&sizes, ATLAS_PADDING);
        let (atlas_width, atlas_height) = (packing.width, packing.height);

        let mut atlas_data = vec![0u8; (atlas_width * atlas_height) as usize];
        let mut glyphs = HashMap::new();

        for ((c, metrics, bitmap), &(x, y)) in rasterized.iter().zip(&packing.positions) {
            let glyph_w = metrics.width as u32;
            let glyph_h = metrics.height as u32;

            for gy in 0..glyph_h {
                let src = (gy * glyph_w) as usize;
                let dst = ((y + gy) * atlas_width + x) as usize;
                atlas_data[dst..dst + glyph_w as usize]
                    .copy_from_slice(&bitmap[src..src + glyph_w as usize]);
            }

            glyphs.insert(
                *c,
                GlyphInfo {
                    uv: [
                        x as f32 / atlas_width as f32,
                        y as f32 / atlas_height as f32,
                        glyph_w as f32 / atlas_width as f32,
                        glyph_h as f32 / atlas_height as f32,
                    ],
                    width: glyph_w,
                    height: glyph_h,
                    offset_x: metrics.xmin as f32,
                    offset_y: metrics.ymin as f32,
                    advance: metrics.advance_width,
                },
            );
        }

        let extent = wgpu::Extent3d {
            width: atlas_width,
            height: atlas_height,
            depth_or_array_layers: 1,
        };
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Font Atlas"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &atlas_data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(atlas_width),
                rows_per_image: Some(atlas_height),
            },
            extent,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Font Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let line_height = font
            .horizontal_line_metrics(size)
            .map(|m| m.new_line_size)
            .unwrap_or(size * 1.2);

        Ok(Self {
            view,
            sampler,
            glyphs,
            size,
            line_height,
        })
    }

    pub fn glyph(&self, c: char) -> Option<&GlyphInfo> {
        self.glyphs.get(&c)
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Width of `text` in pixels, using the fallback advance for missing glyphs.
    pub fn measure(&self, text: &str) -> f32 {
        text.chars()
            .map(|c| self.glyphs.get(&c).map_or(self.size * 0.5, |g| g.advance))
            .sum()
    }
}

#[derive(Debug, PartialEq)]
struct Packing {
    width: u32,
    height: u32,
    positions: Vec<(u32, u32)>,
}

/// Shelf-packs rectangles left to right, doubling the smaller atlas side
/// until everything fits.
fn pack_rows(sizes: &[(u32, u32)], padding: u32) -> Packing {
    let (mut width, mut height) = (256u32, 256u32);

    loop {
        let mut positions = Vec::with_capacity(sizes.len());
        let (mut x, mut y, mut row_height) = (padding, padding, 0u32);
        let mut fits = true;

        for &(w, h) in sizes {
            if x + w + padding > width {
                x = padding;
                y += row_height + padding;
                row_height = 0;
            }
            if x + w + padding > width || y + h + padding > height {
                fits = false;
                break;
            }
            positions.push((x, y));
            x += w + padding;
            row_height = row_height.max(h);
        }

        if fits {
            return Packing {
                width,
                height,
                positions,
            };
        }

        if width <= height {
            width *= 2;
        } else {
            height *= 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing_wraps_rows() {
        let packing = pack_rows(&[(100, 10), (100, 20), (100, 5)], 1);
        assert_eq!(packing.width, 256);
        assert_eq!(packing.positions, vec![(1, 1), (102, 1), (1, 22)]);
    }

    #[test]
    fn packing_grows_until_it_fits() {
        let sizes = vec![(200, 200); 4];
        let packing = pack_rows(&sizes, 1);
        assert!(packing.width >= 402 && packing.height >= 402);
        for (&(x, y), &(w, h)) in packing.positions.iter().zip(&sizes) {
            assert!(x + w < packing.width && y + h < packing.height);
        }
    }
}
