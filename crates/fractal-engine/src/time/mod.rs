//! Time subsystem.
//!
//! Frame timing and pacing without coupling to the runtime:
//! - `FrameClock` measures the wall-clock delta between rendered frames
//! - `FixedStep` turns those deltas into a whole number of fixed update ticks
//! - `Pacer` schedules redraws at a target frequency

mod fixed_step;
mod frame_clock;

pub use fixed_step::{FixedStep, Pacer};
pub use frame_clock::{FrameClock, FrameTime};
