//! Offscreen rendering and CPU readback for screenshots.
//!
//! A frame is drawn into an [`OffscreenTarget`], copied into a mappable
//! buffer and returned as a [`CapturedImage`]. Readback blocks the calling
//! thread; BMP encoding is handed to a [`ScreenshotWriter`] thread.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::JoinHandle;

use anyhow::{Context, Result};

const BYTES_PER_PIXEL: u32 = 4;

// ── row layout ────────────────────────────────────────────────────────────

/// Bytes per row of a buffer-side texture copy, padded to wgpu's alignment.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT
}

/// Strips per-row padding, returning tightly packed 4-byte pixels.
pub fn unpad_rows(data: &[u8], width: u32, height: u32, padded_row: u32) -> Vec<u8> {
    let row = (width * BYTES_PER_PIXEL) as usize;
    let mut out = Vec::with_capacity(row * height as usize);
    for chunk in data.chunks(padded_row as usize).take(height as usize) {
        out.extend_from_slice(&chunk[..row]);
    }
    out
}

// ── channel order ─────────────────────────────────────────────────────────

/// Byte order of a captured 8-bit pixel.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ChannelOrder {
    Bgra,
    Rgba,
}

impl ChannelOrder {
    /// Returns `None` for formats that are not 8-bit 4-channel color.
    pub fn from_format(format: wgpu::TextureFormat) -> Option<Self> {
        use wgpu::TextureFormat as F;
        match format {
            F::Bgra8Unorm | F::Bgra8UnormSrgb => Some(Self::Bgra),
            F::Rgba8Unorm | F::Rgba8UnormSrgb => Some(Self::Rgba),
            _ => None,
        }
    }

    /// Drops alpha and reorders to RGB.
    pub fn to_rgb(self, pixels: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(pixels.len() / 4 * 3);
        for px in pixels.chunks_exact(4) {
            match self {
                Self::Bgra => out.extend_from_slice(&[px[2], px[1], px[0]]),
                Self::Rgba => out.extend_from_slice(&px[..3]),
            }
        }
        out
    }
}

// ── captured image ────────────────────────────────────────────────────────

/// Pixels read back from the GPU, tightly packed, top row first.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub width: u32,
    pub height: u32,
    pub order: ChannelOrder,
    pub pixels: Vec<u8>,
}

impl CapturedImage {
    pub fn to_rgb(&self) -> Vec<u8> {
        self.order.to_rgb(&self.pixels)
    }

    /// Writes an uncompressed BMP, replacing any existing file.
    pub fn save_bmp(&self, path: &Path) -> Result<()> {
        let img = image::RgbImage::from_raw(self.width, self.height, self.to_rgb())
            .context("captured pixel buffer does not match its dimensions")?;
        img.save_with_format(path, image::ImageFormat::Bmp)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

// ── offscreen target ──────────────────────────────────────────────────────

/// A color texture the size of the window that can be copied back to the CPU.
pub struct OffscreenTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    order: ChannelOrder,
    width: u32,
    height: u32,
}

impl OffscreenTarget {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, width: u32, height: u32) -> Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "cannot capture a {width}x{height} frame");
        let order = ChannelOrder::from_format(format)
            .with_context(|| format!("capture from {format:?} is not supported"))?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("fractal capture target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            texture,
            view,
            order,
            width,
            height,
        })
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Submits `encoder` (which should have drawn into [`view`](Self::view)),
    /// then copies the texture back and waits for it.
    pub fn read_back(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mut encoder: wgpu::CommandEncoder,
    ) -> Result<CapturedImage> {
        let padded_row = padded_bytes_per_row(self.width);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fractal capture readback"),
            size: padded_row as u64 * self.height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        encoder.copy_texture_to_buffer(
            self.texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("device poll failed during readback")?;
        rx.recv()
            .context("readback callback was dropped")?
            .context("failed to map readback buffer")?;

        let pixels = {
            let mapped = slice.get_mapped_range();
            unpad_rows(&mapped, self.width, self.height, padded_row)
        };
        buffer.unmap();

        Ok(CapturedImage {
            width: self.width,
            height: self.height,
            order: self.order,
            pixels,
        })
    }
}

// ── writer ────────────────────────────────────────────────────────────────

/// Encodes captures on a background thread, one at a time.
#[derive(Default)]
pub struct ScreenshotWriter {
    pending: Option<JoinHandle<()>>,
}

impl ScreenshotWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a previous capture is still being written.
    pub fn is_busy(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Starts writing `image` to `path`. Returns `false` (and drops the image)
    /// if a write is already in flight.
    pub fn submit(&mut self, image: CapturedImage, path: PathBuf) -> bool {
        if self.is_busy() {
            return false;
        }
        self.finish();

        let spawned = std::thread::Builder::new()
            .name("screenshot-writer".into())
            .spawn(move || match image.save_bmp(&path) {
                Ok(()) => log::info!("screenshot written to {}", path.display()),
                Err(e) => log::error!("screenshot failed: {e:#}"),
            });

        match spawned {
            Ok(handle) => {
                self.pending = Some(handle);
                true
            }
            Err(e) => {
                log::error!("failed to start screenshot writer: {e}");
                false
            }
        }
    }

    /// Waits for an in-flight write.
    pub fn finish(&mut self) {
        if let Some(handle) = self.pending.take() {
            if handle.join().is_err() {
                log::error!("screenshot writer panicked");
            }
        }
    }
}

impl Drop for ScreenshotWriter {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── row layout ────────────────────────────────────────────────────────

    #[test]
    fn rows_pad_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(800), 3328);
        assert_eq!(padded_bytes_per_row(1), 256);
    }

    #[test]
    fn unpad_keeps_only_pixel_bytes() {
        // 2x2 image, 8 data bytes per row padded to 12.
        let data = [
            1, 2, 3, 4, 5, 6, 7, 8, 0, 0, 0, 0, //
            9, 10, 11, 12, 13, 14, 15, 16, 0, 0, 0, 0,
        ];
        let out = unpad_rows(&data, 2, 2, 12);
        assert_eq!(out, (1..=16).collect::<Vec<u8>>());
    }

    // ── channel order ─────────────────────────────────────────────────────

    #[test]
    fn bgra_is_swizzled_to_rgb() {
        let px = [10, 20, 30, 255, 1, 2, 3, 0];
        assert_eq!(ChannelOrder::Bgra.to_rgb(&px), vec![30, 20, 10, 3, 2, 1]);
        assert_eq!(ChannelOrder::Rgba.to_rgb(&px), vec![10, 20, 30, 1, 2, 3]);
    }

    #[test]
    fn only_8bit_color_formats_are_capturable() {
        assert_eq!(
            ChannelOrder::from_format(wgpu::TextureFormat::Bgra8UnormSrgb),
            Some(ChannelOrder::Bgra)
        );
        assert_eq!(
            ChannelOrder::from_format(wgpu::TextureFormat::Rgba8Unorm),
            Some(ChannelOrder::Rgba)
        );
        assert_eq!(ChannelOrder::from_format(wgpu::TextureFormat::Rgba16Float), None);
    }

    // ── bmp ───────────────────────────────────────────────────────────────

    #[test]
    fn save_bmp_overwrites_existing_file() {
        let path = std::env::temp_dir().join(format!("fractal-capture-{}.bmp", std::process::id()));
        let img = CapturedImage {
            width: 2,
            height: 1,
            order: ChannelOrder::Bgra,
            pixels: vec![0, 0, 255, 255, 255, 0, 0, 255],
        };

        img.save_bmp(&path).unwrap();
        img.save_bmp(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(&bytes[..2], b"BM");
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let img = CapturedImage {
            width: 4,
            height: 4,
            order: ChannelOrder::Rgba,
            pixels: vec![0; 8],
        };
        assert!(img.save_bmp(Path::new("unused.bmp")).is_err());
    }
}
