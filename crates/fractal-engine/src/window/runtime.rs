use std::time::Instant;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx, LoadCtx, UpdateCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::platform::translate_window_event;
use crate::input::{InputEvent, InputState};
use crate::time::{FixedStep, FrameClock, Pacer};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Fixed update ticks per second.
    pub update_hz: f64,
    /// Target redraws per second.
    pub render_hz: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "fractal".to_string(),
            initial_size: LogicalSize::new(800.0, 800.0),
            update_hz: 60.0,
            render_hz: 60.0,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window and drives `app` until it exits or the window closes.
    ///
    /// A failure in `App::on_load` stops the loop and is returned here.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    input: InputState,
    clock: FrameClock,
    updates: FixedStep,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    pacer: Pacer,

    failure: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        let pacer = Pacer::from_hz(config.render_hz, Instant::now());
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            pacer,
            failure: None,
            exit_requested: false,
        }
    }

    fn create_window_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();

        WindowEntryTryBuilder {
            input: InputState::default(),
            clock: FrameClock::default(),
            updates: FixedStep::from_hz(self.config.update_hz),
            window,
            gpu_builder: |w| {
                pollster::block_on(Gpu::new(w, gpu_init)).context("GPU initialization failed")
            },
        }
        .try_build()
    }

    /// Creates the window, GPU and application resources.
    fn load(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let created = self.create_window_entry(event_loop)?;
        let entry = self.entry.insert(created);

        let app = &mut self.app;
        let size = entry.with(|fields| {
            let info = fields.gpu.adapter_info();
            log::info!("using {} ({:?})", info.name, info.backend);

            let ctx = LoadCtx {
                window: WindowCtx { window: fields.window },
                gpu: fields.gpu,
            };
            app.on_load(&ctx).map(|()| fields.gpu.size())
        })?;

        if size.width > 0 && size.height > 0 {
            self.app.on_resize(size.width, size.height);
        }

        entry.with_clock_mut(|c| c.reset());
        entry.with_window(|w| w.request_redraw());
        self.pacer = Pacer::from_hz(self.config.render_hz, Instant::now());
        Ok(())
    }

    /// Unloads the application, then releases the GPU and the window.
    fn shutdown(&mut self) {
        if let Some(entry) = self.entry.take() {
            self.app.on_unload();
            drop(entry);
            log::debug!("window and GPU released");
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        self.shutdown();
        event_loop.exit();
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let Some(entry) = self.entry.as_mut() else { return };

        entry.with_gpu_mut(|gpu| gpu.resize(size));
        if size.width > 0 && size.height > 0 {
            log::debug!("resized to {}x{}", size.width, size.height);
            self.app.on_resize(size.width, size.height);
        }
        entry.with_window(|w| w.request_redraw());
    }

    /// Runs the fixed update ticks owed since the last frame, then renders.
    fn redraw(&mut self) -> AppControl {
        let Some(entry) = self.entry.as_mut() else {
            return AppControl::Continue;
        };
        let app = &mut self.app;

        entry.with_mut(|fields| {
            let time = fields.clock.tick();
            let due = fields.updates.advance(time.delta);

            for _ in 0..due {
                let ctx = UpdateCtx { input: &*fields.input };
                if app.on_update(&ctx) == AppControl::Exit {
                    return AppControl::Exit;
                }
            }

            let mut ctx = FrameCtx {
                window: WindowCtx { window: fields.window },
                gpu: fields.gpu,
                input: &*fields.input,
                time,
            };
            app.on_render(&mut ctx)
        })
    }
}

/// Forwards a translated input event to the matching `App` callback.
fn dispatch_input<A: CoreApp>(app: &mut A, ev: &InputEvent) {
    match ev {
        InputEvent::Key { key, state, repeat, .. } => app.on_key(*key, *state, *repeat),
        InputEvent::PointerMoved(p) => app.on_mouse_move(p.x, p.y),
        InputEvent::MouseWheel { delta } => app.on_mouse_wheel(*delta),
        InputEvent::Focused(_) => {}
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.load(event_loop) {
            log::error!("startup failed: {e:#}");
            self.failure = Some(e);
            self.request_exit(event_loop);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(entry) = self.entry.as_ref() else { return };

        if self.pacer.poll(Instant::now()) {
            entry.with_window(|w| w.request_redraw());
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.pacer.deadline()));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(entry) = self.entry.as_mut() else { return };

        if let Some(ev) = translate_window_event(&event) {
            entry.with_input_mut(|input| input.apply_event(&ev));
            dispatch_input(&mut self.app, &ev);
        }

        let control = match &event {
            WindowEvent::CloseRequested => AppControl::Exit,

            WindowEvent::Resized(new_size) => {
                self.resize(*new_size);
                AppControl::Continue
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = entry.with_window(|w| w.inner_size());
                self.resize(new_size);
                AppControl::Continue
            }

            WindowEvent::RedrawRequested => self.redraw(),

            _ => AppControl::Continue,
        };

        if control == AppControl::Exit {
            self.request_exit(event_loop);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}
