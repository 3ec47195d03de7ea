//! Interactive Mandelbrot / Julia explorer.
//!
//! Escape switches between the Mandelbrot and Julia sets, P arms the Julia
//! seed for keyboard picking, A/D/W/S pan, the wheel zooms, Space resets the
//! view and H writes a screenshot.

mod app;
mod config;
mod frame_context;
mod input_mapper;
mod scene;
mod status;
mod view;

use fractal_engine::device::GpuInit;
use fractal_engine::logging::{init_logging, LoggingConfig};
use fractal_engine::window::Runtime;

use crate::app::ExplorerApp;
use crate::config::ExplorerConfig;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = ExplorerConfig::from_env();
    log::debug!("{config:?}");

    Runtime::run(config.runtime(), GpuInit::default(), ExplorerApp::new(config))
}
