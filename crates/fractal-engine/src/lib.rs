//! Fractal engine crate.
//!
//! Owns the platform + GPU runtime pieces used by the explorer: the window
//! loop, the wgpu device, input translation, frame pacing, shader programs
//! and frame capture.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
