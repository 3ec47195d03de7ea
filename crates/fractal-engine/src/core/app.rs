use crate::input::{Key, KeyState, MouseWheelDelta};

use super::ctx::{FrameCtx, LoadCtx, UpdateCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// The runtime calls these in a fixed order: `on_load` once the window and
/// GPU exist, then `on_resize` with the initial drawable size, then input
/// callbacks as events arrive and `on_update`/`on_render` each frame, and
/// finally `on_unload` before the GPU is released.
pub trait App {
    /// Creates GPU resources. An error aborts startup and is returned from
    /// `Runtime::run`.
    fn on_load(&mut self, ctx: &LoadCtx<'_, '_>) -> anyhow::Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Drawable size changed (physical pixels, never zero).
    fn on_resize(&mut self, width: u32, height: u32) {
        let _ = (width, height);
    }

    fn on_key(&mut self, key: Key, state: KeyState, repeat: bool) {
        let _ = (key, state, repeat);
    }

    /// Cursor position in physical pixels, origin top-left.
    fn on_mouse_move(&mut self, x: f32, y: f32) {
        let _ = (x, y);
    }

    fn on_mouse_wheel(&mut self, delta: MouseWheelDelta) {
        let _ = delta;
    }

    /// Called once per fixed update tick.
    fn on_update(&mut self, ctx: &UpdateCtx<'_>) -> AppControl {
        let _ = ctx;
        AppControl::Continue
    }

    /// Called once per rendered frame.
    fn on_render(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Releases everything created in `on_load`.
    fn on_unload(&mut self) {}
}
