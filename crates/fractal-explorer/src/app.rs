use std::io::Stdout;
use std::time::Instant;

use anyhow::Result;

use fractal_engine::core::{App, AppControl, FrameCtx, LoadCtx, UpdateCtx};
use fractal_engine::input::{Key, KeyState, MouseWheelDelta};
use fractal_engine::render::ScreenshotWriter;

use crate::config::ExplorerConfig;
use crate::frame_context::FrameContext;
use crate::input_mapper::{InputMapper, KeyBindings};
use crate::scene::FractalScene;
use crate::status::{format_status, StatusLine};
use crate::view::ViewState;

const CLEAR: wgpu::Color = wgpu::Color::BLACK;

/// The explorer: view state driven by input, drawn by the fractal scene.
pub struct ExplorerApp {
    config: ExplorerConfig,
    view: ViewState,
    frame: FrameContext,
    mapper: InputMapper,
    /// Present between `on_load` and `on_unload`.
    scene: Option<FractalScene>,
    status: StatusLine<Stdout>,
    screenshots: ScreenshotWriter,
}

impl ExplorerApp {
    pub fn new(config: ExplorerConfig) -> Self {
        let status = StatusLine::new(std::io::stdout(), config.status_line);
        Self {
            config,
            view: ViewState::default(),
            frame: FrameContext::default(),
            mapper: InputMapper::new(KeyBindings::default()),
            scene: None,
            status,
            screenshots: ScreenshotWriter::new(),
        }
    }

    /// Renders the current view offscreen and hands it to the writer.
    ///
    /// Skipped while a previous capture is still being encoded.
    fn capture(&mut self, ctx: &mut FrameCtx<'_, '_>) {
        if self.screenshots.is_busy() {
            return;
        }
        let Some(scene) = self.scene.as_mut() else { return };

        match ctx.capture(CLEAR, |rctx, target| scene.draw(rctx, target)) {
            Ok(image) => {
                self.screenshots.submit(image, self.config.screenshot_path.clone());
            }
            Err(e) => log::error!("capture failed: {e:#}"),
        }
    }
}

impl App for ExplorerApp {
    fn on_load(&mut self, ctx: &LoadCtx<'_, '_>) -> Result<()> {
        let sources = self.config.load_shader_sources()?;
        let scene = FractalScene::new(ctx.gpu.device(), ctx.gpu.surface_format(), &sources)?;
        self.scene = Some(scene);

        let (w, h) = ctx.window.physical_size();
        self.frame.resize(w, h);

        log::info!(
            "loaded {} + {}",
            self.config.vertex_shader.display(),
            self.config.fragment_shader.display()
        );
        Ok(())
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        self.frame.resize(width, height);
    }

    fn on_key(&mut self, key: Key, state: KeyState, repeat: bool) {
        self.mapper.on_key(&mut self.view, key, state, repeat);
    }

    fn on_mouse_move(&mut self, x: f32, y: f32) {
        self.frame.cursor_moved(x, y);
    }

    fn on_mouse_wheel(&mut self, delta: MouseWheelDelta) {
        self.mapper.on_wheel(&mut self.view, delta);
    }

    fn on_update(&mut self, ctx: &UpdateCtx<'_>) -> AppControl {
        self.mapper.tick(&mut self.view, ctx.input, &self.frame);
        AppControl::Continue
    }

    fn on_render(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(scene) = self.scene.as_mut() else {
            return AppControl::Continue;
        };

        let started = Instant::now();
        scene.update_uniforms(&self.view, &self.frame);
        let control = ctx.render(CLEAR, |rctx, target| scene.draw(rctx, target));
        let render_time = started.elapsed();

        let line = format_status(&self.frame, &self.view, render_time);
        log::trace!("frame {}: {line}", ctx.time.frame_index);
        self.status.emit(&line);

        if self.mapper.capture_requested(ctx.input) {
            self.capture(ctx);
        }

        control
    }

    fn on_unload(&mut self) {
        self.scene = None;
        self.screenshots.finish();
        self.status.finish();
        log::info!("explorer unloaded");
    }
}
