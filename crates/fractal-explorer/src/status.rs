//! One-line, in-place diagnostic written after every frame.

use std::io::Write;
use std::time::Duration;

use crate::frame_context::FrameContext;
use crate::view::ViewState;

pub fn format_status(frame: &FrameContext, view: &ViewState, render_time: Duration) -> String {
    format!(
        "Width:{} Height:{} RenderTime: {}ms Location: {} + {}i Zoom: {}",
        frame.width,
        frame.height,
        render_time.as_millis(),
        view.center.re,
        view.center.im,
        view.zoom()
    )
}

/// Rewrites a single terminal line in place.
pub struct StatusLine<W: Write> {
    out: W,
    enabled: bool,
}

impl<W: Write> StatusLine<W> {
    pub fn new(out: W, enabled: bool) -> Self {
        Self { out, enabled }
    }

    /// Writes `\r{line}` and clears the rest of the row.
    ///
    /// A write failure disables the line for the rest of the session.
    pub fn emit(&mut self, line: &str) {
        if !self.enabled {
            return;
        }

        let res = write!(self.out, "\r{line}\x1b[K").and_then(|()| self.out.flush());
        if let Err(e) = res {
            log::warn!("status line disabled: {e}");
            self.enabled = false;
        }
    }

    /// Moves past the status row so later output starts on a fresh line.
    pub fn finish(&mut self) {
        if self.enabled {
            let _ = writeln!(self.out);
            let _ = self.out.flush();
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Complex;

    #[test]
    fn status_reports_real_then_imaginary() {
        let mut frame = FrameContext::default();
        frame.resize(800, 600);
        let mut view = ViewState::default();
        view.center = Complex::new(0.25, -1.5);
        view.scale_zoom(2.0);

        let s = format_status(&frame, &view, Duration::from_micros(12_700));
        assert_eq!(
            s,
            "Width:800 Height:600 RenderTime: 12ms Location: 0.25 + -1.5i Zoom: 2"
        );
    }

    #[test]
    fn emit_overwrites_in_place() {
        let mut line = StatusLine::new(Vec::new(), true);
        line.emit("a");
        line.emit("b");
        let out = String::from_utf8(line.into_inner()).unwrap();
        assert_eq!(out, "\ra\x1b[K\rb\x1b[K");
    }

    #[test]
    fn disabled_line_writes_nothing() {
        let mut line = StatusLine::new(Vec::new(), false);
        line.emit("a");
        line.finish();
        assert!(line.into_inner().is_empty());
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_error_disables_line() {
        let mut line = StatusLine::new(Broken, true);
        line.emit("a");
        assert!(!line.enabled);
    }
}
