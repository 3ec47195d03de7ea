use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use winit::dpi::LogicalSize;

use fractal_engine::window::RuntimeConfig;

pub const ENV_VERTEX_SHADER: &str = "FRACTAL_VERTEX_SHADER";
pub const ENV_FRAGMENT_SHADER: &str = "FRACTAL_FRAGMENT_SHADER";
pub const ENV_SCREENSHOT: &str = "FRACTAL_SCREENSHOT";
/// Silences the status line. `0`, `false` and `no` (any case) leave it on;
/// any other non-empty value turns it off.
pub const ENV_QUIET: &str = "FRACTAL_QUIET";

const DEFAULT_VERTEX_SHADER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/fractal.vert.wgsl");
const DEFAULT_FRAGMENT_SHADER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/fractal.frag.wgsl");

/// Explorer settings. Defaults can be overridden from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerConfig {
    pub title: String,
    /// Initial window size in logical pixels.
    pub width: f64,
    pub height: f64,
    pub update_hz: f64,
    pub render_hz: f64,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    /// Where the capture key writes its BMP. Overwritten on every capture.
    pub screenshot_path: PathBuf,
    /// Print the per-frame status line to stdout.
    pub status_line: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            title: "The Mandelbrot Set Explorer".to_string(),
            width: 800.0,
            height: 800.0,
            update_hz: 60.0,
            render_hz: 60.0,
            vertex_shader: PathBuf::from(DEFAULT_VERTEX_SHADER),
            fragment_shader: PathBuf::from(DEFAULT_FRAGMENT_SHADER),
            screenshot_path: PathBuf::from("image.bmp"),
            status_line: true,
        }
    }
}

/// WGSL text of both stages.
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

fn read_shader(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read shader {}", path.display()))
}

fn is_falsy(value: &OsStr) -> bool {
    let value = value.to_string_lossy();
    ["0", "false", "no"].iter().any(|f| value.trim().eq_ignore_ascii_case(f))
}

impl ExplorerConfig {
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var_os(key))
    }

    /// Applies overrides from `lookup` (normally the process environment).
    /// Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(p) = get(ENV_VERTEX_SHADER) {
            self.vertex_shader = p.into();
        }
        if let Some(p) = get(ENV_FRAGMENT_SHADER) {
            self.fragment_shader = p.into();
        }
        if let Some(p) = get(ENV_SCREENSHOT) {
            self.screenshot_path = p.into();
        }
        if let Some(v) = get(ENV_QUIET) {
            self.status_line = is_falsy(&v);
        }

        self
    }

    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: self.title.clone(),
            initial_size: LogicalSize::new(self.width, self.height),
            update_hz: self.update_hz,
            render_hz: self.render_hz,
        }
    }

    pub fn load_shader_sources(&self) -> Result<ShaderSources> {
        Ok(ShaderSources {
            vertex: read_shader(&self.vertex_shader)?,
            fragment: read_shader(&self.fragment_shader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let map: HashMap<String, OsString> =
            pairs.iter().map(|(k, v)| (k.to_string(), OsString::from(v))).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_classic_window() {
        let c = ExplorerConfig::default();
        assert_eq!(c.title, "The Mandelbrot Set Explorer");
        assert_eq!((c.width, c.height), (800.0, 800.0));
        assert_eq!((c.update_hz, c.render_hz), (60.0, 60.0));
        assert_eq!(c.screenshot_path, PathBuf::from("image.bmp"));
        assert!(c.status_line);
    }

    #[test]
    fn env_overrides_paths_and_quiet() {
        let c = ExplorerConfig::default().with_overrides(env(&[
            (ENV_VERTEX_SHADER, "/tmp/v.wgsl"),
            (ENV_FRAGMENT_SHADER, "/tmp/f.wgsl"),
            (ENV_SCREENSHOT, "shot.bmp"),
            (ENV_QUIET, "1"),
        ]));
        assert_eq!(c.vertex_shader, PathBuf::from("/tmp/v.wgsl"));
        assert_eq!(c.fragment_shader, PathBuf::from("/tmp/f.wgsl"));
        assert_eq!(c.screenshot_path, PathBuf::from("shot.bmp"));
        assert!(!c.status_line);
    }

    #[test]
    fn empty_or_zero_values_keep_defaults() {
        let c = ExplorerConfig::default().with_overrides(env(&[(ENV_SCREENSHOT, ""), (ENV_QUIET, "0")]));
        assert_eq!(c, ExplorerConfig::default());
    }

    #[test]
    fn quiet_accepts_common_false_spellings() {
        for off in ["false", "No", " FALSE "] {
            let c = ExplorerConfig::default().with_overrides(env(&[(ENV_QUIET, off)]));
            assert!(c.status_line, "{off:?} should keep the status line");
        }
        for on in ["1", "true", "yes"] {
            let c = ExplorerConfig::default().with_overrides(env(&[(ENV_QUIET, on)]));
            assert!(!c.status_line, "{on:?} should silence the status line");
        }
    }

    #[test]
    fn runtime_config_carries_window_settings() {
        let r = ExplorerConfig::default().runtime();
        assert_eq!(r.title, "The Mandelbrot Set Explorer");
        assert_eq!(r.initial_size, LogicalSize::new(800.0, 800.0));
        assert_eq!(r.update_hz, 60.0);
    }

    #[test]
    fn bundled_shaders_load() {
        let src = ExplorerConfig::default().load_shader_sources().unwrap();
        assert!(src.vertex.contains("@vertex"));
        assert!(src.fragment.contains("complexLocation"));
    }

    #[test]
    fn missing_shader_names_the_path() {
        let c = ExplorerConfig {
            vertex_shader: PathBuf::from("/nonexistent/v.wgsl"),
            ..ExplorerConfig::default()
        };
        let err = c.load_shader_sources().err().unwrap();
        assert!(format!("{err:#}").contains("/nonexistent/v.wgsl"));
    }
}
