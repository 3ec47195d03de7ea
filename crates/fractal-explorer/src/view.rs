//! What part of the complex plane is on screen, and how it is interpreted.

/// Smallest zoom the view accepts. Keeps the pan step `PAN_STEP / zoom`
/// finite when a wheel delta of exactly -1 would otherwise zero it.
pub const MIN_ZOOM: f32 = 1e-6;

/// Point on the complex plane (single precision, like the shader).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Complex {
    pub re: f32,
    pub im: f32,
}

impl Complex {
    pub const ORIGIN: Complex = Complex { re: 0.0, im: 0.0 };

    #[inline]
    pub const fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 2] {
        [self.re, self.im]
    }
}

/// Which iteration rule the fragment shader evaluates.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum FractalMode {
    #[default]
    Mandelbrot,
    Julia,
}

impl FractalMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Mandelbrot => Self::Julia,
            Self::Julia => Self::Mandelbrot,
        }
    }

    /// Value of the shader's `mandelbrot` flag.
    pub fn shader_flag(self) -> i32 {
        match self {
            Self::Mandelbrot => 1,
            Self::Julia => 0,
        }
    }
}

/// Pan/zoom state of the explorer.
///
/// In Mandelbrot mode `center` is the point in the middle of the window; in
/// Julia mode it is the seed of the Julia set.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub center: Complex,
    zoom: f32,
    pub mode: FractalMode,
    /// While armed, the Julia seed follows the keyboard instead of the cursor.
    pub julia_pick_armed: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            center: Complex::ORIGIN,
            zoom: 1.0,
            mode: FractalMode::Mandelbrot,
            julia_pick_armed: false,
        }
    }
}

impl ViewState {
    /// Always positive.
    #[inline]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Multiplies the zoom by `factor`, keeping it positive.
    ///
    /// The sign of the product is dropped so a large negative wheel delta
    /// never mirrors the view. Non-finite factors are ignored.
    pub fn scale_zoom(&mut self, factor: f32) {
        let next = (self.zoom * factor).abs();
        if !next.is_finite() {
            log::debug!("ignoring zoom factor {factor}");
            return;
        }
        self.zoom = next.max(MIN_ZOOM);
    }

    /// Back to the origin at zoom 1. Mode flags are kept.
    pub fn reset(&mut self) {
        self.center = Complex::ORIGIN;
        self.zoom = 1.0;
    }

    /// Moves the center by `(dre, dim)` world units.
    pub fn pan(&mut self, dre: f32, dim: f32) {
        self.center.re += dre;
        self.center.im += dim;
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    pub fn toggle_pick(&mut self) {
        self.julia_pick_armed = !self.julia_pick_armed;
    }

    /// Keyboard panning is active in Mandelbrot mode and while a Julia pick
    /// is armed; otherwise the cursor drives the center (free-look).
    pub fn pans_with_keyboard(&self) -> bool {
        self.mode == FractalMode::Mandelbrot || self.julia_pick_armed
    }
}
