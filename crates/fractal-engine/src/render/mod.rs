//! GPU rendering subsystem.
//!
//! A [`ShaderProgram`] links a vertex and a fragment stage into one pipeline
//! with a single named uniform block; [`QuadMesh`] is the full-viewport
//! geometry it is drawn over. [`capture`] reads finished frames back to the
//! CPU.
//!
//! Convention: the quad is specified directly in NDC; shaders receive the
//! drawable size in physical pixels through a uniform.

pub mod capture;
mod ctx;
mod mesh;
mod program;
mod uniform;

pub use capture::{CapturedImage, ChannelOrder, OffscreenTarget, ScreenshotWriter};
pub use ctx::{RenderCtx, RenderTarget};
pub use mesh::{QuadMesh, QuadVertex, QUAD_INDICES, QUAD_VERTICES};
pub use program::{ShaderCompileError, ShaderProgram, ShaderStage};
pub use uniform::{UniformBlock, UniformKind, UniformLayout, UniformLocation, UniformValue};
