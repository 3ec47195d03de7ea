//! Coordinate types shared by the runtime, renderers and the application.
//!
//! Canonical CPU space is physical pixels, origin top-left, +X right, +Y down.
//! This matches cursor events and the drawable size reported on resize.

mod vec2;
mod viewport;

pub use vec2::Vec2;
pub use viewport::Viewport;
