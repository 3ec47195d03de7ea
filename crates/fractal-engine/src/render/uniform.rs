//! Named uniforms of a shader program.
//!
//! The uniform block is discovered by reflecting the parsed WGSL module, so
//! host code addresses uniforms by the names the shader declares instead of
//! mirroring the struct layout by hand.

use wgpu::naga;

/// Value kinds supported in a uniform block.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformKind {
    F32,
    I32,
    U32,
    Vec2F32,
}

impl UniformKind {
    /// Size in bytes inside the block.
    pub fn size(self) -> u32 {
        match self {
            UniformKind::Vec2F32 => 8,
            UniformKind::F32 | UniformKind::I32 | UniformKind::U32 => 4,
        }
    }

    fn from_naga(inner: &naga::TypeInner) -> Option<Self> {
        use naga::{Scalar, ScalarKind, TypeInner, VectorSize};

        match *inner {
            TypeInner::Scalar(Scalar { kind, width: 4 }) => match kind {
                ScalarKind::Float => Some(UniformKind::F32),
                ScalarKind::Sint => Some(UniformKind::I32),
                ScalarKind::Uint => Some(UniformKind::U32),
                _ => None,
            },
            TypeInner::Vector {
                size: VectorSize::Bi,
                scalar: Scalar { kind: ScalarKind::Float, width: 4 },
            } => Some(UniformKind::Vec2F32),
            _ => None,
        }
    }
}

/// A host-side uniform value.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    F32(f32),
    I32(i32),
    U32(u32),
    Vec2F32([f32; 2]),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::F32(_) => UniformKind::F32,
            UniformValue::I32(_) => UniformKind::I32,
            UniformValue::U32(_) => UniformKind::U32,
            UniformValue::Vec2F32(_) => UniformKind::Vec2F32,
        }
    }

    fn write_to(&self, dst: &mut [u8]) {
        match self {
            UniformValue::F32(v) => dst.copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::I32(v) => dst.copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::U32(v) => dst.copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec2F32(v) => dst.copy_from_slice(bytemuck::cast_slice(v)),
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::F32(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::I32(v)
    }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self {
        UniformValue::U32(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2F32(v)
    }
}

/// Shader booleans travel as `i32` 0/1.
impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        UniformValue::I32(v as i32)
    }
}

/// Resolved handle to one uniform. Stable for the lifetime of the program.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformLocation {
    pub offset: u32,
    pub kind: UniformKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformField {
    pub name: String,
    pub location: UniformLocation,
}

/// Layout of the single uniform block a program binds.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformLayout {
    pub group: u32,
    pub binding: u32,
    /// Block size in bytes, rounded up to 16.
    pub size: u32,
    pub fields: Vec<UniformField>,
}

impl UniformLayout {
    /// Reflects the uniform block declared by `module`.
    ///
    /// A `var<uniform>` of struct type yields one field per supported member;
    /// a scalar or `vec2<f32>` uniform yields a single field named after the
    /// variable. Members of other types keep their bytes in the block but are
    /// not addressable. Returns `Ok(None)` when the module declares no uniform,
    /// and an error message when it declares more than one block.
    pub fn reflect(module: &naga::Module) -> Result<Option<Self>, String> {
        let mut found: Option<Self> = None;

        for (_, var) in module.global_variables.iter() {
            if var.space != naga::AddressSpace::Uniform {
                continue;
            }
            let Some(binding) = var.binding.as_ref() else { continue };

            if let Some(existing) = &found {
                return Err(format!(
                    "only one uniform block is supported; found @group({}) @binding({}) and @group({}) @binding({})",
                    existing.group, existing.binding, binding.group, binding.binding
                ));
            }

            let ty = &module.types[var.ty];
            let (fields, span) = match &ty.inner {
                naga::TypeInner::Struct { members, span } => {
                    let fields = members
                        .iter()
                        .filter_map(|m| {
                            let name = m.name.clone()?;
                            let Some(kind) = UniformKind::from_naga(&module.types[m.ty].inner) else {
                                log::debug!("uniform member `{name}` has an unsupported type; not addressable");
                                return None;
                            };
                            Some(UniformField {
                                name,
                                location: UniformLocation { offset: m.offset, kind },
                            })
                        })
                        .collect();
                    (fields, *span)
                }
                other => {
                    let name = var.name.clone().unwrap_or_default();
                    let kind = UniformKind::from_naga(other)
                        .ok_or_else(|| format!("uniform `{name}` has an unsupported type"))?;
                    let field = UniformField {
                        name,
                        location: UniformLocation { offset: 0, kind },
                    };
                    (vec![field], kind.size())
                }
            };

            found = Some(Self {
                group: binding.group,
                binding: binding.binding,
                size: round_up_16(span),
                fields,
            });
        }

        Ok(found)
    }

    pub fn location(&self, name: &str) -> Option<UniformLocation> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.location)
    }
}

fn round_up_16(n: u32) -> u32 {
    n.max(1).div_ceil(16) * 16
}

/// CPU staging copy of a uniform block.
///
/// Writes land here and are uploaded in one `write_buffer` when the program is
/// bound, and only if something changed since the last upload.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    layout: UniformLayout,
    staging: Vec<u8>,
    dirty: bool,
}

impl UniformBlock {
    pub fn new(layout: UniformLayout) -> Self {
        let staging = vec![0; layout.size as usize];
        Self {
            layout,
            staging,
            dirty: true,
        }
    }

    pub fn location(&self, name: &str) -> Option<UniformLocation> {
        self.layout.location(name)
    }

    /// Writes `value` at `location`.
    ///
    /// A missing location is a silent no-op. Returns `false` when nothing was
    /// written (missing location or mismatched kind).
    pub fn set(&mut self, location: Option<UniformLocation>, value: UniformValue) -> bool {
        let Some(loc) = location else { return false };
        if loc.kind != value.kind() {
            return false;
        }

        let start = loc.offset as usize;
        let end = start + loc.kind.size() as usize;
        let Some(dst) = self.staging.get_mut(start..end) else { return false };

        value.write_to(dst);
        self.dirty = true;
        true
    }

    /// Returns the staged bytes if they changed since the last call.
    pub fn take_dirty(&mut self) -> Option<&[u8]> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(&self.staging)
    }
}
