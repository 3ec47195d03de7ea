use std::fmt;

use wgpu::naga;

use super::uniform::{UniformBlock, UniformLayout, UniformLocation, UniformValue};

/// Which step of program creation failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    /// Combining the two stages into one program.
    Link,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
            ShaderStage::Link => f.write_str("link"),
        }
    }
}

/// A shader program that could not be built, with the diagnostic log of the
/// failing stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderCompileError {
    pub stage: ShaderStage,
    pub log: String,
}

impl ShaderCompileError {
    fn new(stage: ShaderStage, log: impl Into<String>) -> Self {
        Self { stage, log: log.into() }
    }
}

impl fmt::Display for ShaderCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            ShaderStage::Link => write!(f, "shader program failed to link:\n{}", self.log),
            stage => write!(f, "{stage} shader failed to compile:\n{}", self.log),
        }
    }
}

impl std::error::Error for ShaderCompileError {}

/// A stage that parsed and validated on the CPU.
struct CheckedStage {
    module: naga::Module,
    entry_point: String,
}

/// Parses and validates one stage and locates its entry point.
fn check_stage(stage: ShaderStage, source: &str) -> Result<CheckedStage, ShaderCompileError> {
    let naga_stage = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
        ShaderStage::Link => {
            return Err(ShaderCompileError::new(stage, "link is not a source stage"));
        }
    };

    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| ShaderCompileError::new(stage, e.emit_to_string(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| ShaderCompileError::new(stage, e.emit_to_string(source)))?;

    let entry_point = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == naga_stage)
        .map(|ep| ep.name.clone())
        .ok_or_else(|| ShaderCompileError::new(stage, format!("no @{stage} entry point declared")))?;

    Ok(CheckedStage { module, entry_point })
}

/// Combines the uniform blocks of both stages into the one the program binds.
fn link_uniforms(
    vertex: &naga::Module,
    fragment: &naga::Module,
) -> Result<Option<(UniformLayout, wgpu::ShaderStages)>, ShaderCompileError> {
    let reflect = |stage, module| {
        UniformLayout::reflect(module).map_err(|log| ShaderCompileError::new(stage, log))
    };
    let vs = reflect(ShaderStage::Vertex, vertex)?;
    let fs = reflect(ShaderStage::Fragment, fragment)?;

    let linked = match (vs, fs) {
        (None, None) => None,
        (Some(v), None) => Some((v, wgpu::ShaderStages::VERTEX)),
        (None, Some(f)) => Some((f, wgpu::ShaderStages::FRAGMENT)),
        (Some(v), Some(f)) => {
            if v != f {
                return Err(ShaderCompileError::new(
                    ShaderStage::Link,
                    format!(
                        "uniform block differs between stages (vertex @group({}) @binding({}), fragment @group({}) @binding({}))",
                        v.group, v.binding, f.group, f.binding
                    ),
                ));
            }
            Some((f, wgpu::ShaderStages::VERTEX_FRAGMENT))
        }
    };

    if let Some((layout, _)) = &linked {
        if layout.group != 0 {
            return Err(ShaderCompileError::new(
                ShaderStage::Link,
                format!("uniform block must be in @group(0), found @group({})", layout.group),
            ));
        }
    }

    Ok(linked)
}

struct CheckedProgram {
    vertex_entry: String,
    fragment_entry: String,
    uniforms: Option<(UniformLayout, wgpu::ShaderStages)>,
}

fn check_program(vertex_source: &str, fragment_source: &str) -> Result<CheckedProgram, ShaderCompileError> {
    let vertex = check_stage(ShaderStage::Vertex, vertex_source)?;
    let fragment = check_stage(ShaderStage::Fragment, fragment_source)?;
    let uniforms = link_uniforms(&vertex.module, &fragment.module)?;

    Ok(CheckedProgram {
        vertex_entry: vertex.entry_point,
        fragment_entry: fragment.entry_point,
        uniforms,
    })
}

/// Formats the driver-side compilation messages of a stage.
///
/// Returns the log text and whether it contained an error.
fn compilation_log(info: &wgpu::CompilationInfo) -> (String, bool) {
    let mut log = String::new();
    let mut has_error = false;

    for msg in &info.messages {
        let kind = match msg.message_type {
            wgpu::CompilationMessageType::Error => {
                has_error = true;
                "error"
            }
            wgpu::CompilationMessageType::Warning => "warning",
            wgpu::CompilationMessageType::Info => "info",
        };
        match &msg.location {
            Some(loc) => log.push_str(&format!(
                "{kind} at {}:{}: {}\n",
                loc.line_number, loc.line_position, msg.message
            )),
            None => log.push_str(&format!("{kind}: {}\n", msg.message)),
        }
    }

    (log, has_error)
}

fn create_stage_module(
    device: &wgpu::Device,
    stage: ShaderStage,
    source: &str,
) -> Result<wgpu::ShaderModule, ShaderCompileError> {
    let label = format!("fractal {stage} stage");
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let info = pollster::block_on(module.get_compilation_info());
    let (log, has_error) = compilation_log(&info);
    if has_error {
        return Err(ShaderCompileError::new(stage, log));
    }
    if !log.is_empty() {
        log::warn!("{stage} shader diagnostics:\n{log}");
    }

    Ok(module)
}

struct BoundUniforms {
    block: UniformBlock,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// A vertex + fragment shader pair linked into one render pipeline.
///
/// Uniforms are addressed by name through [`uniform_location`]; writes are
/// staged on the CPU and uploaded when the program is bound.
///
/// [`uniform_location`]: ShaderProgram::uniform_location
pub struct ShaderProgram {
    pipeline: wgpu::RenderPipeline,
    uniforms: Option<BoundUniforms>,
    warned_kind_mismatch: bool,
}

impl ShaderProgram {
    /// Compiles both WGSL stages and links them into a pipeline that renders
    /// into `target_format`.
    ///
    /// Each stage is parsed and validated before the device sees it, so a
    /// broken shader surfaces as a `ShaderCompileError` carrying the stage's
    /// log instead of a device error. Non-fatal diagnostics are logged as
    /// warnings.
    pub fn create(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        vertex_buffers: &[wgpu::VertexBufferLayout<'_>],
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderCompileError> {
        let CheckedProgram {
            vertex_entry,
            fragment_entry,
            uniforms: linked,
        } = check_program(vertex_source, fragment_source)?;

        let vertex_module = create_stage_module(device, ShaderStage::Vertex, vertex_source)?;
        let fragment_module = create_stage_module(device, ShaderStage::Fragment, fragment_source)?;

        let uniform_parts = linked.map(|(layout, visibility)| {
            let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("fractal uniforms bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: layout.binding,
                    visibility,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(layout.size as u64),
                    },
                    count: None,
                }],
            });
            (layout, bind_group_layout)
        });

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> =
            uniform_parts.iter().map(|(_, bgl)| bgl).collect();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("fractal pipeline layout"),
            bind_group_layouts: &bind_group_layouts,
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("fractal pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some(&vertex_entry),
                compilation_options: Default::default(),
                buffers: vertex_buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some(&fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        // Stage modules only exist to build the pipeline.
        drop(vertex_module);
        drop(fragment_module);

        let uniforms = uniform_parts.map(|(layout, bind_group_layout)| {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("fractal uniforms ubo"),
                size: layout.size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("fractal uniforms bind group"),
                layout: &bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: layout.binding,
                    resource: buffer.as_entire_binding(),
                }],
            });

            log::debug!(
                "uniform block: {} bytes, fields [{}]",
                layout.size,
                layout
                    .fields
                    .iter()
                    .map(|f| format!("{}@{}", f.name, f.location.offset))
                    .collect::<Vec<_>>()
                    .join(", ")
            );

            BoundUniforms {
                block: UniformBlock::new(layout),
                buffer,
                bind_group,
            }
        });

        Ok(Self {
            pipeline,
            uniforms,
            warned_kind_mismatch: false,
        })
    }

    /// Compiles and links both stages on the CPU only, without a device.
    ///
    /// Returns the uniform layout a program built from these sources would
    /// expose.
    pub fn check(vertex_source: &str, fragment_source: &str) -> Result<Option<UniformLayout>, ShaderCompileError> {
        Ok(check_program(vertex_source, fragment_source)?.uniforms.map(|(layout, _)| layout))
    }

    /// Looks up a uniform by name. `None` means the program has no such
    /// uniform; writing to it is a no-op.
    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.as_ref()?.block.location(name)
    }

    /// Stages a uniform write for the next [`bind`](Self::bind).
    pub fn set_uniform(&mut self, location: Option<UniformLocation>, value: impl Into<UniformValue>) {
        let Some(uniforms) = self.uniforms.as_mut() else { return };
        let value = value.into();

        let mismatched = location.is_some_and(|loc| loc.kind != value.kind());
        if mismatched && !self.warned_kind_mismatch {
            log::debug!("uniform write with mismatched kind {:?} ignored", value.kind());
            self.warned_kind_mismatch = true;
        }

        uniforms.block.set(location, value);
    }

    /// Makes this program the active one on `pass`, uploading staged uniforms.
    pub fn bind(&mut self, queue: &wgpu::Queue, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);

        if let Some(uniforms) = self.uniforms.as_mut() {
            if let Some(bytes) = uniforms.block.take_dirty() {
                queue.write_buffer(&uniforms.buffer, 0, bytes);
            }
            pass.set_bind_group(0, &uniforms.bind_group, &[]);
        }
    }
}
