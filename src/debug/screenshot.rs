//! Save the current frame as a PNG.
//!
//! A capture renders the graph once more into an offscreen target, copies it
//! into a mappable buffer and returns a [`PendingCapture`]. The event loop
//! polls it each frame; once the map callback fires, rows are unpadded,
//! swizzled to RGBA if needed and written with `image`.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec2;
use thiserror::Error;
use winit::event::MouseButton;

use crate::camera::Camera;
use crate::color::Color;
use crate::debug::Rect;
use crate::draw2d::Draw2d;
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::render_graph::{RenderGraph, RenderTarget};

const WIDTH: f32 = 110.0;
const HEIGHT: f32 = 28.0;
const MARGIN: f32 = 10.0;

#[derive(Error, Debug)]
pub enum ScreenshotError {
    #[error("cannot read back surface format {0:?}")]
    UnsupportedFormat(wgpu::TextureFormat),
    #[error("mapping the readback buffer failed: {0}")]
    Map(#[from] wgpu::BufferAsyncError),
    #[error("readback callback was dropped")]
    Disconnected,
    #[error("readback held {got} bytes, expected {expected}")]
    BufferSize { expected: usize, got: usize },
    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write screenshot: {0}")]
    Encode(#[from] image::ImageError),
}

/// `<dir>/<unix-millis>.png`
pub fn screenshot_path(dir: &Path, unix_millis: u128) -> PathBuf {
    dir.join(format!("{unix_millis}.png"))
}

/// Copy `height` rows of `width` RGBA pixels out of a buffer whose rows are
/// `padded_bytes_per_row` apart.
pub fn unpad_rows(data: &[u8], width: u32, height: u32, padded_bytes_per_row: u32) -> Vec<u8> {
    let row_bytes = width as usize * 4;
    let stride = padded_bytes_per_row as usize;
    let mut out = Vec::with_capacity(row_bytes * height as usize);
    for row in data.chunks(stride).take(height as usize) {
        out.extend_from_slice(&row[..row_bytes.min(row.len())]);
    }
    out
}

/// Swap the red and blue channel of every pixel in place.
pub fn bgra_to_rgba(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
}

/// Whether rows of `format` come back as BGRA. `None` for formats the
/// readback does not handle.
fn is_bgra(format: wgpu::TextureFormat) -> Option<bool> {
    match format {
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => Some(true),
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => Some(false),
        _ => None,
    }
}

/// A frame copy on its way back from the GPU.
pub struct PendingCapture {
    buffer: wgpu::Buffer,
    receiver: Receiver<Result<(), wgpu::BufferAsyncError>>,
    width: u32,
    height: u32,
    padded_bytes_per_row: u32,
    bgra: bool,
    path: PathBuf,
}

impl PendingCapture {
    /// Render the graph into an offscreen copy of the surface and start
    /// reading it back. The overlay is not part of the capture.
    pub fn start(
        gpu: &GpuContext,
        graph: &mut RenderGraph,
        time: f32,
        camera: &Camera,
        path: PathBuf,
    ) -> Result<Self, ScreenshotError> {
        let format = gpu.config.format;
        let bgra = is_bgra(format).ok_or(ScreenshotError::UnsupportedFormat(format))?;

        let target = RenderTarget::readable(gpu, "Screenshot Target");
        let (width, height) = (target.width(), target.height());
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = (width * 4).div_ceil(align) * align;

        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Screenshot Readback"),
            size: padded_bytes_per_row as u64 * height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        graph.execute_to_target(gpu, time, camera, &target.view, |encoder| {
            encoder.copy_texture_to_buffer(
                target.texture.as_image_copy(),
                wgpu::TexelCopyBufferInfo {
                    buffer: &buffer,
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(padded_bytes_per_row),
                        rows_per_image: Some(height),
                    },
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        });

        let (sender, receiver) = mpsc::channel();
        buffer.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        tracing::debug!(width, height, path = %path.display(), "screenshot readback started");
        Ok(Self {
            buffer,
            receiver,
            width,
            height,
            padded_bytes_per_row,
            bgra,
            path,
        })
    }

    /// Drive the map callback without blocking. Returns the saved path (or
    /// the failure) once the readback has finished.
    pub fn poll(&self, gpu: &GpuContext) -> Option<Result<PathBuf, ScreenshotError>> {
        let _ = gpu.device.poll(wgpu::PollType::Poll);
        match self.receiver.try_recv() {
            Ok(Ok(())) => Some(self.save()),
            Ok(Err(err)) => Some(Err(err.into())),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ScreenshotError::Disconnected)),
        }
    }

    fn save(&self) -> Result<PathBuf, ScreenshotError> {
        let mut pixels = {
            let data = self.buffer.slice(..).get_mapped_range();
            unpad_rows(&data, self.width, self.height, self.padded_bytes_per_row)
        };
        self.buffer.unmap();

        if self.bgra {
            bgra_to_rgba(&mut pixels);
        }

        let expected = self.width as usize * self.height as usize * 4;
        let got = pixels.len();
        let image = image::RgbaImage::from_raw(self.width, self.height, pixels)
            .ok_or(ScreenshotError::BufferSize { expected, got })?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| ScreenshotError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        image.save(&self.path)?;
        Ok(self.path.clone())
    }
}

/// Bottom-right button that requests a capture on click.
pub struct ScreenshotButton {
    dir: PathBuf,
    armed: bool,
    requested: bool,
    pending: Option<PendingCapture>,
}

impl ScreenshotButton {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            armed: false,
            requested: false,
            pending: None,
        }
    }

    pub fn bounds(&self, screen: Vec2) -> Rect {
        Rect::new(
            screen.x - WIDTH - MARGIN,
            screen.y - HEIGHT - MARGIN,
            WIDTH,
            HEIGHT,
        )
    }

    /// A click is a press and release both over the button. Returns true
    /// while the pointer is over it or a press on it is held.
    pub fn handle_pointer(&mut self, input: &Input, screen: Vec2) -> bool {
        let over = self.bounds(screen).contains(input.mouse_position());

        if input.mouse_pressed(MouseButton::Left) {
            self.armed = over;
        }
        if input.mouse_released(MouseButton::Left) {
            if self.armed && over && self.pending.is_none() {
                self.requested = true;
            }
            self.armed = false;
        }
        over || self.armed
    }

    /// True once per click.
    pub fn take_request(&mut self) -> bool {
        std::mem::take(&mut self.requested)
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Where the next capture goes, named after the current time.
    pub fn next_path(&self) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis());
        screenshot_path(&self.dir, millis)
    }

    pub fn begin(&mut self, capture: PendingCapture) {
        self.pending = Some(capture);
    }

    /// Finish a pending capture if its readback is ready.
    pub fn poll(&mut self, gpu: &GpuContext) {
        let Some(result) = self.pending.as_ref().and_then(|p| p.poll(gpu)) else {
            return;
        };
        self.pending = None;
        match result {
            Ok(path) => tracing::info!(path = %path.display(), "screenshot saved"),
            Err(err) => tracing::error!(error = %err, "screenshot failed"),
        }
    }

    pub fn draw(&self, draw: &mut Draw2d, screen: Vec2) {
        let b = self.bounds(screen);
        let fill = if self.armed {
            Color::DEBUG_BORDER
        } else {
            Color::DEBUG_BG
        };
        draw.rect(b.x, b.y, b.width, b.height, Color::DEBUG_ACCENT);
        draw.rect(b.x + 1.0, b.y + 1.0, b.width - 2.0, b.height - 2.0, fill);

        let label = if self.is_busy() { "Saving..." } else { "Screenshot" };
        let text_x = b.x + (b.width - draw.measure(label)) * 0.5;
        draw.text(text_x, b.y + 6.0, label, Color::WHITE);
    }
}
