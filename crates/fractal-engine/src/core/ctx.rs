use anyhow::Result;
use winit::window::Window;

use crate::device::{Gpu, SurfaceErrorAction};
use crate::input::InputState;
use crate::render::{CapturedImage, OffscreenTarget, RenderCtx, RenderTarget};
use crate::time::FrameTime;

use super::app::AppControl;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Returns the drawable size as `(width, height)` in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }
}

/// Context passed to `core::App::on_load`.
pub struct LoadCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu:    &'a Gpu<'w>,
}

/// Context passed to `core::App::on_update` once per fixed tick.
pub struct UpdateCtx<'a> {
    pub input: &'a InputState,
}

/// Per-frame context passed to `core::App::on_render`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu:    &'a mut Gpu<'w>,
    pub input:  &'a InputState,
    pub time:   FrameTime,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Clears the surface with `clear`, calls `draw` with a ready [`RenderCtx`] and
    /// [`RenderTarget`], then presents the frame.
    ///
    /// Surface errors skip the frame; only a fatal one returns `Exit`.
    pub fn render<F>(&mut self, clear: wgpu::Color, draw: F) -> AppControl
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                let action = self.gpu.handle_surface_error(err.clone());
                return match action {
                    SurfaceErrorAction::Fatal => {
                        log::error!("surface error: {err}; stopping");
                        AppControl::Exit
                    }
                    _ => {
                        log::warn!("surface error: {err}; frame skipped ({action:?})");
                        AppControl::Continue
                    }
                };
            }
        };

        let rctx = RenderCtx::new(self.gpu.queue());

        // RenderTarget borrows frame.encoder; dropped before submit() takes frame.
        {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            target.clear(clear);
            draw(&rctx, &mut target);
        }

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);

        AppControl::Continue
    }

    /// Draws the same way as [`render`](Self::render) but into an offscreen
    /// texture of the drawable size, and reads the pixels back.
    ///
    /// Blocks until the GPU has finished the copy.
    pub fn capture<F>(&mut self, clear: wgpu::Color, draw: F) -> Result<CapturedImage>
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
    {
        let size = self.gpu.size();
        let device = self.gpu.device();
        let queue = self.gpu.queue();

        let target_tex = OffscreenTarget::new(device, self.gpu.surface_format(), size.width, size.height)?;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("fractal capture encoder"),
        });

        let rctx = RenderCtx::new(queue);
        {
            let mut target = RenderTarget::new(&mut encoder, target_tex.view());
            target.clear(clear);
            draw(&rctx, &mut target);
        }

        target_tex.read_back(device, queue, encoder)
    }
}
