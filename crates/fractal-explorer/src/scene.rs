//! GPU resources of the explorer: the fractal program and the quad it is
//! drawn over.

use anyhow::{Context, Result};

use fractal_engine::render::{
    QuadMesh, RenderCtx, RenderTarget, ShaderProgram, UniformLocation, UniformValue,
};

use crate::config::ShaderSources;
use crate::frame_context::FrameContext;
use crate::view::ViewState;

pub const UNIFORM_CENTER: &str = "complexLocation";
pub const UNIFORM_ZOOM: &str = "zoom";
pub const UNIFORM_WINDOW_SIZE: &str = "windowSize";
pub const UNIFORM_MANDELBROT: &str = "mandelbrot";

/// The per-frame uniforms, in the order [`frame_uniforms`] produces them.
pub const UNIFORM_NAMES: [&str; 4] = [UNIFORM_CENTER, UNIFORM_ZOOM, UNIFORM_WINDOW_SIZE, UNIFORM_MANDELBROT];

/// Values written to the shader each frame, in [`UNIFORM_NAMES`] order.
pub fn frame_uniforms(view: &ViewState, frame: &FrameContext) -> [UniformValue; 4] {
    [
        view.center.to_array().into(),
        view.zoom().into(),
        frame.viewport().to_array().into(),
        view.mode.shader_flag().into(),
    ]
}

/// Uniform handles in [`UNIFORM_NAMES`] order, resolved once when the
/// program is created.
#[derive(Debug, Copy, Clone)]
struct Uniforms([Option<UniformLocation>; 4]);

impl Uniforms {
    fn resolve(program: &ShaderProgram) -> Self {
        Self(UNIFORM_NAMES.map(|name| {
            let loc = program.uniform_location(name);
            if loc.is_none() {
                log::warn!("shader does not declare uniform `{name}`; writes to it are ignored");
            }
            loc
        }))
    }
}

/// Owns the program and mesh; both are released when the scene is dropped.
pub struct FractalScene {
    program: ShaderProgram,
    mesh: QuadMesh,
    uniforms: Uniforms,
}

impl FractalScene {
    pub fn new(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        sources: &ShaderSources,
    ) -> Result<Self> {
        let program = ShaderProgram::create(
            device,
            target_format,
            &[QuadMesh::vertex_layout()],
            &sources.vertex,
            &sources.fragment,
        )
        .context("failed to build the fractal shader program")?;

        let uniforms = Uniforms::resolve(&program);
        let mesh = QuadMesh::new(device);

        Ok(Self {
            program,
            mesh,
            uniforms,
        })
    }

    /// Stages the four per-frame uniforms.
    pub fn update_uniforms(&mut self, view: &ViewState, frame: &FrameContext) {
        for (loc, value) in self.uniforms.0.into_iter().zip(frame_uniforms(view, frame)) {
            self.program.set_uniform(loc, value);
        }
    }

    /// Draws the quad over the whole target, keeping its cleared contents
    /// as the base.
    pub fn draw(&mut self, rctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let mut pass = target.begin_pass("fractal pass");
        self.program.bind(rctx.queue, &mut pass);
        self.mesh.draw(&mut pass);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExplorerConfig;
    use crate::view::Complex;
    use fractal_engine::render::{UniformBlock, UniformKind, UniformLayout};

    fn bundled_layout() -> UniformLayout {
        let src = ExplorerConfig::default().load_shader_sources().unwrap();
        ShaderProgram::check(&src.vertex, &src.fragment)
            .unwrap()
            .expect("fragment stage declares a uniform block")
    }

    /// Stages one frame into a block laid out like the bundled shader's.
    fn staged(view: &ViewState, frame: &FrameContext) -> Vec<u8> {
        let mut block = UniformBlock::new(bundled_layout());
        for (name, value) in UNIFORM_NAMES.into_iter().zip(frame_uniforms(view, frame)) {
            assert!(block.set(block.location(name), value), "`{name}` not written");
        }
        block.take_dirty().unwrap().to_vec()
    }

    fn f32_at(bytes: &[u8], offset: usize) -> f32 {
        f32::from_ne_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn i32_at(bytes: &[u8], offset: usize) -> i32 {
        i32::from_ne_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn frame(width: u32, height: u32) -> FrameContext {
        let mut f = FrameContext::default();
        f.resize(width, height);
        f
    }

    #[test]
    fn bundled_shaders_declare_the_uniform_contract() {
        let layout = bundled_layout();

        assert_eq!((layout.group, layout.binding), (0, 0));

        let kind = |name: &str| layout.location(name).map(|l| l.kind);
        assert_eq!(kind(UNIFORM_CENTER), Some(UniformKind::Vec2F32));
        assert_eq!(kind(UNIFORM_ZOOM), Some(UniformKind::F32));
        assert_eq!(kind(UNIFORM_WINDOW_SIZE), Some(UniformKind::Vec2F32));
        assert_eq!(kind(UNIFORM_MANDELBROT), Some(UniformKind::I32));
    }

    #[test]
    fn mandelbrot_frame_lands_at_block_offsets() {
        let mut view = ViewState::default();
        view.center = Complex::new(-0.75, 0.1);
        view.scale_zoom(4.0);

        let bytes = staged(&view, &frame(1024, 600));

        assert_eq!((f32_at(&bytes, 0), f32_at(&bytes, 4)), (-0.75, 0.1));
        assert_eq!(f32_at(&bytes, 8), 4.0);
        assert_eq!((f32_at(&bytes, 16), f32_at(&bytes, 20)), (1024.0, 600.0));
        assert_eq!(i32_at(&bytes, 24), 1);
    }

    #[test]
    fn julia_frame_clears_the_mode_flag_and_keeps_the_seed() {
        let mut view = ViewState::default();
        view.toggle_mode();
        view.center = Complex::new(0.285, -0.01);

        let bytes = staged(&view, &frame(640, 480));

        assert_eq!((f32_at(&bytes, 0), f32_at(&bytes, 4)), (0.285, -0.01));
        assert_eq!(f32_at(&bytes, 8), 1.0);
        assert_eq!((f32_at(&bytes, 16), f32_at(&bytes, 20)), (640.0, 480.0));
        assert_eq!(i32_at(&bytes, 24), 0);
    }
}
