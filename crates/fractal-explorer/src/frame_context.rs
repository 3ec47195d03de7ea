use fractal_engine::coords::{Vec2, Viewport};

use crate::view::Complex;

/// Window size and last cursor position, in physical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FrameContext {
    pub width: u32,
    pub height: u32,
    pub cursor: Option<Vec2>,
}

impl FrameContext {
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        let p = Vec2::new(x, y);
        if p.is_finite() {
            self.cursor = Some(p);
        }
    }

    /// Maps the cursor linearly onto `[-1, 1]²`: `(2x/w - 1, 2y/h - 1)`.
    ///
    /// `None` until the cursor has moved, or while a dimension is zero.
    pub fn cursor_to_plane(&self) -> Option<Complex> {
        let p = self.cursor?;
        if self.width == 0 || self.height == 0 {
            return None;
        }
        Some(Complex::new(
            2.0 * p.x / self.width as f32 - 1.0,
            2.0 * p.y / self.height as f32 - 1.0,
        ))
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width as f32, self.height as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(w: u32, h: u32) -> FrameContext {
        let mut c = FrameContext::default();
        c.resize(w, h);
        c
    }

    #[test]
    fn no_cursor_maps_to_nothing() {
        assert_eq!(ctx(800, 600).cursor_to_plane(), None);
    }

    #[test]
    fn corners_and_center_map_exactly() {
        let mut c = ctx(800, 600);

        c.cursor_moved(0.0, 0.0);
        assert_eq!(c.cursor_to_plane(), Some(Complex::new(-1.0, -1.0)));

        c.cursor_moved(800.0, 600.0);
        assert_eq!(c.cursor_to_plane(), Some(Complex::new(1.0, 1.0)));

        c.cursor_moved(400.0, 300.0);
        assert_eq!(c.cursor_to_plane(), Some(Complex::new(0.0, 0.0)));
    }

    #[test]
    fn zero_sized_window_maps_to_nothing() {
        let mut c = ctx(0, 600);
        c.cursor_moved(10.0, 10.0);
        assert_eq!(c.cursor_to_plane(), None);
    }

    #[test]
    fn non_finite_cursor_is_dropped() {
        let mut c = ctx(100, 100);
        c.cursor_moved(50.0, 50.0);
        c.cursor_moved(f32::NAN, 1.0);
        assert_eq!(c.cursor, Some(Vec2::new(50.0, 50.0)));
    }
}
