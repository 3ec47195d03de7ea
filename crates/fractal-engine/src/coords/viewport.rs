/// Drawable size in physical pixels.
///
/// Renderers hand this to shaders that map fragment coordinates onto the
/// complex plane.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Size as a `[width, height]` pair, the layout of a `vec2<f32>` uniform.
    #[inline]
    pub fn to_array(self) -> [f32; 2] {
        [self.width, self.height]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_is_width_then_height() {
        assert_eq!(Viewport::new(800.0, 600.0).to_array(), [800.0, 600.0]);
    }
}
