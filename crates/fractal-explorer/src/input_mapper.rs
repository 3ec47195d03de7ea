//! Keyboard/mouse → view state.

use fractal_engine::input::{InputState, Key, KeyState, MouseWheelDelta};

use crate::frame_context::FrameContext;
use crate::view::ViewState;

/// World units panned per update tick at zoom 1.
pub const PAN_STEP: f32 = 0.05;

/// Pixel-precise wheel deltas are converted to notches with this ratio.
pub const PIXELS_PER_LINE: f32 = 100.0;

/// Keys the explorer reacts to.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct KeyBindings {
    pub toggle_mode: Key,
    pub toggle_pick: Key,
    pub reset: Key,
    pub capture: Key,
    pub pan_left: Key,
    pub pan_right: Key,
    pub pan_up: Key,
    pub pan_down: Key,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            toggle_mode: Key::Escape,
            toggle_pick: Key::P,
            reset: Key::Space,
            capture: Key::H,
            pan_left: Key::A,
            pan_right: Key::D,
            pan_up: Key::W,
            pan_down: Key::S,
        }
    }
}

/// Applies input to a [`ViewState`].
///
/// Discrete events (toggles, wheel) apply immediately; held keys and the
/// cursor are sampled once per fixed update tick in [`tick`](Self::tick).
#[derive(Debug, Clone, Default)]
pub struct InputMapper {
    bindings: KeyBindings,
}

impl InputMapper {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    /// Toggles fire on the press transition only; auto-repeat is ignored.
    pub fn on_key(&self, view: &mut ViewState, key: Key, state: KeyState, repeat: bool) {
        if state != KeyState::Pressed || repeat {
            return;
        }

        if key == self.bindings.toggle_mode {
            view.toggle_mode();
            log::debug!("mode: {:?}", view.mode);
        } else if key == self.bindings.toggle_pick {
            view.toggle_pick();
            log::debug!("julia pick armed: {}", view.julia_pick_armed);
        }
    }

    /// `zoom = |zoom * (1 + dy)|`, with `dy` in wheel notches.
    ///
    /// A notch is `1.0`, so one notch down multiplies by zero and lands on
    /// [`MIN_ZOOM`](crate::view::MIN_ZOOM); each notch up then doubles the
    /// zoom, and twenty of them are needed to get back near 1.
    pub fn on_wheel(&self, view: &mut ViewState, delta: MouseWheelDelta) {
        let dy = match delta {
            MouseWheelDelta::Line { y, .. } => y,
            MouseWheelDelta::Pixel { y, .. } => y / PIXELS_PER_LINE,
        };
        view.scale_zoom(1.0 + dy);
    }

    /// One fixed update tick: pan or free-look, then reset.
    pub fn tick(&self, view: &mut ViewState, input: &InputState, frame: &FrameContext) {
        let b = &self.bindings;

        if view.pans_with_keyboard() {
            let step = PAN_STEP / view.zoom();
            let axis = |neg: Key, pos: Key| {
                let mut d = 0.0;
                if input.key_down(neg) {
                    d -= step;
                }
                if input.key_down(pos) {
                    d += step;
                }
                d
            };
            let dre = axis(b.pan_left, b.pan_right);
            let dim = axis(b.pan_down, b.pan_up);
            if dre != 0.0 || dim != 0.0 {
                view.pan(dre, dim);
            }
        } else if let Some(seed) = frame.cursor_to_plane() {
            view.center = seed;
        }

        if input.key_down(b.reset) {
            view.reset();
        }
    }

    /// True while the screenshot key is held.
    pub fn capture_requested(&self, input: &InputState) -> bool {
        input.key_down(self.bindings.capture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Complex, FractalMode, MIN_ZOOM};

    fn held(keys: &[Key]) -> InputState {
        let mut s = InputState::default();
        s.keys_down.extend(keys.iter().copied());
        s
    }

    fn frame_with_cursor(x: f32, y: f32) -> FrameContext {
        let mut f = FrameContext::default();
        f.resize(800, 800);
        f.cursor_moved(x, y);
        f
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    // ── toggles ───────────────────────────────────────────────────────────

    #[test]
    fn escape_flips_mode_on_press_only() {
        let m = InputMapper::default();
        let mut v = ViewState::default();

        m.on_key(&mut v, Key::Escape, KeyState::Pressed, false);
        assert_eq!(v.mode, FractalMode::Julia);

        m.on_key(&mut v, Key::Escape, KeyState::Pressed, true);
        m.on_key(&mut v, Key::Escape, KeyState::Released, false);
        assert_eq!(v.mode, FractalMode::Julia);

        m.on_key(&mut v, Key::Escape, KeyState::Pressed, false);
        assert_eq!(v.mode, FractalMode::Mandelbrot);
    }

    #[test]
    fn p_flips_pick_independently_of_mode() {
        let m = InputMapper::default();
        let mut v = ViewState::default();

        m.on_key(&mut v, Key::P, KeyState::Pressed, false);
        assert!(v.julia_pick_armed);
        assert_eq!(v.mode, FractalMode::Mandelbrot);

        m.on_key(&mut v, Key::P, KeyState::Pressed, false);
        assert!(!v.julia_pick_armed);
    }

    // ── wheel ─────────────────────────────────────────────────────────────

    #[test]
    fn wheel_line_delta_scales_zoom() {
        let m = InputMapper::default();
        let mut v = ViewState::default();
        m.on_wheel(&mut v, MouseWheelDelta::Line { x: 0.0, y: 1.0 });
        assert_eq!(v.zoom(), 2.0);
        m.on_wheel(&mut v, MouseWheelDelta::Line { x: 0.0, y: -0.5 });
        assert_eq!(v.zoom(), 1.0);
    }

    #[test]
    fn wheel_pixel_delta_is_converted_to_lines() {
        let m = InputMapper::default();
        let mut v = ViewState::default();
        m.on_wheel(&mut v, MouseWheelDelta::Pixel { x: 0.0, y: 100.0 });
        assert_eq!(v.zoom(), 2.0);
    }

    #[test]
    fn one_notch_down_bottoms_out_and_twenty_up_recover() {
        let m = InputMapper::default();
        let mut v = ViewState::default();
        m.on_wheel(&mut v, MouseWheelDelta::Line { x: 0.0, y: -1.0 });
        assert_eq!(v.zoom(), MIN_ZOOM);

        let mut notches = 0;
        while v.zoom() < 1.0 {
            m.on_wheel(&mut v, MouseWheelDelta::Line { x: 0.0, y: 1.0 });
            notches += 1;
        }
        assert_eq!(notches, 20);
    }

    #[test]
    fn large_negative_wheel_keeps_zoom_positive() {
        let m = InputMapper::default();
        let mut v = ViewState::default();
        m.on_wheel(&mut v, MouseWheelDelta::Line { x: 0.0, y: -3.0 });
        assert_eq!(v.zoom(), 2.0);
        m.on_wheel(&mut v, MouseWheelDelta::Line { x: 0.0, y: -1.0 });
        assert!(v.zoom() > 0.0);
    }

    // ── panning ───────────────────────────────────────────────────────────

    #[test]
    fn each_pan_key_moves_in_its_direction() {
        let m = InputMapper::default();
        let frame = FrameContext::default();
        let cases = [
            (Key::A, Complex::new(-PAN_STEP, 0.0)),
            (Key::D, Complex::new(PAN_STEP, 0.0)),
            (Key::W, Complex::new(0.0, PAN_STEP)),
            (Key::S, Complex::new(0.0, -PAN_STEP)),
        ];

        for (key, expected) in cases {
            let mut v = ViewState::default();
            m.tick(&mut v, &held(&[key]), &frame);
            assert_eq!(v.center, expected, "key {key:?}");
        }
    }

    #[test]
    fn pan_step_shrinks_with_zoom() {
        let m = InputMapper::default();
        let mut v = ViewState::default();
        v.scale_zoom(4.0);
        m.tick(&mut v, &held(&[Key::D]), &FrameContext::default());
        assert!(approx(v.center.re, PAN_STEP / 4.0));
    }

    #[test]
    fn opposite_keys_cancel() {
        let m = InputMapper::default();
        let mut v = ViewState::default();
        m.tick(&mut v, &held(&[Key::A, Key::D, Key::W, Key::S]), &FrameContext::default());
        assert_eq!(v.center, Complex::ORIGIN);
    }

    // ── free-look ─────────────────────────────────────────────────────────

    #[test]
    fn julia_without_pick_follows_cursor() {
        let m = InputMapper::default();
        let mut v = ViewState::default();
        v.toggle_mode();

        m.tick(&mut v, &held(&[Key::D]), &frame_with_cursor(600.0, 200.0));
        assert_eq!(v.center, Complex::new(0.5, -0.5));
    }

    #[test]
    fn julia_with_pick_ignores_cursor_and_pans() {
        let m = InputMapper::default();
        let mut v = ViewState::default();
        v.toggle_mode();
        v.toggle_pick();

        m.tick(&mut v, &held(&[Key::D]), &frame_with_cursor(600.0, 200.0));
        assert_eq!(v.center, Complex::new(PAN_STEP, 0.0));
    }

    #[test]
    fn free_look_without_cursor_keeps_center() {
        let m = InputMapper::default();
        let mut v = ViewState::default();
        v.toggle_mode();
        v.center = Complex::new(0.3, 0.2);

        let mut frame = FrameContext::default();
        frame.resize(800, 800);
        m.tick(&mut v, &held(&[]), &frame);
        assert_eq!(v.center, Complex::new(0.3, 0.2));
    }

    // ── reset / capture ───────────────────────────────────────────────────

    #[test]
    fn space_resets_after_panning_in_same_tick() {
        let m = InputMapper::default();
        let mut v = ViewState::default();
        v.scale_zoom(3.0);
        m.tick(&mut v, &held(&[Key::D, Key::Space]), &FrameContext::default());
        assert_eq!(v.center, Complex::ORIGIN);
        assert_eq!(v.zoom(), 1.0);
    }

    #[test]
    fn capture_tracks_held_h() {
        let m = InputMapper::default();
        assert!(m.capture_requested(&held(&[Key::H])));
        assert!(!m.capture_requested(&held(&[Key::A])));
    }

    #[test]
    fn pan_zoom_pan_reset_scenario() {
        let m = InputMapper::default();
        let frame = FrameContext::default();
        let mut v = ViewState::default();

        m.tick(&mut v, &held(&[Key::D]), &frame);
        assert!(approx(v.center.re, 0.05) && v.center.im == 0.0);

        m.on_wheel(&mut v, MouseWheelDelta::Line { x: 0.0, y: 1.0 });
        assert_eq!(v.zoom(), 2.0);

        m.tick(&mut v, &held(&[Key::D]), &frame);
        assert!(approx(v.center.re, 0.075) && v.center.im == 0.0);

        m.tick(&mut v, &held(&[Key::Space]), &frame);
        assert_eq!(v.center, Complex::ORIGIN);
        assert_eq!(v.zoom(), 1.0);
    }
}
