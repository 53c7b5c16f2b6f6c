//! Parses and validates the WGSL program with naga, then checks it against the binding contract
//! the host relies on.

use naga::{AddressSpace, Binding, Scalar, TypeInner, VectorSize};

use crate::{
    error::{Error, Result},
    shaders::{EntryPoint, ShaderStage},
    uniforms::{GpuUniforms, UNIFORM_BINDING, UNIFORM_GROUP},
    vert_buf::{VertexLayout, COLOR_LOCATION, POSITION_LOCATION},
};

/// A parsed and validated WGSL module.
pub struct ShaderModule {
    module: naga::Module,
}

impl ShaderModule {
    pub fn parse(source: &str) -> Result<Self> {
        let module = naga::front::wgsl::parse_str(source)
            .map_err(|e| Error::ShaderParse(e.emit_to_string(source)))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| Error::ShaderValidation(e.to_string()))?;

        log::debug!(
            "parsed shader module with {} entry points",
            module.entry_points.len()
        );
        Ok(ShaderModule { module })
    }

    pub fn reflect(&self) -> Reflection {
        let module = &self.module;

        let entry_points = module
            .entry_points
            .iter()
            .filter_map(|ep| {
                let stage = match ep.stage {
                    naga::ShaderStage::Vertex => ShaderStage::Vertex,
                    naga::ShaderStage::Fragment => ShaderStage::Fragment,
                    _ => return None,
                };

                let mut inputs = Vec::new();
                for arg in &ep.function.arguments {
                    collect_locations(module, arg.ty, arg.binding.as_ref(), &mut inputs);
                }
                let mut outputs = Vec::new();
                if let Some(result) = &ep.function.result {
                    collect_locations(module, result.ty, result.binding.as_ref(), &mut outputs);
                }

                Some(EntryPointInfo {
                    name: ep.name.clone(),
                    stage,
                    inputs,
                    outputs,
                })
            })
            .collect();

        let uniforms = module
            .global_variables
            .iter()
            .filter(|(_, var)| var.space == AddressSpace::Uniform)
            .filter_map(|(_, var)| {
                let binding = var.binding.as_ref()?;
                let ty = &module.types[var.ty];
                let (size, mat4_offsets) = match &ty.inner {
                    TypeInner::Struct { members, span } => {
                        let offsets = members
                            .iter()
                            .filter(|member| is_mat4x4_f32(&module.types[member.ty].inner))
                            .map(|member| member.offset)
                            .collect();
                        (*span, offsets)
                    }
                    inner => (inner.size(module.to_ctx()), Vec::new()),
                };
                Some(UniformInfo {
                    name: var.name.clone(),
                    group: binding.group,
                    binding: binding.binding,
                    size,
                    mat4_offsets,
                })
            })
            .collect();

        Reflection {
            entry_points,
            uniforms,
        }
    }
}

fn is_mat4x4_f32(inner: &TypeInner) -> bool {
    matches!(
        inner,
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar: Scalar::F32,
        }
    )
}

fn components(inner: &TypeInner) -> u32 {
    match inner {
        TypeInner::Scalar(_) => 1,
        TypeInner::Vector { size, .. } => *size as u32,
        _ => 0,
    }
}

/// User-defined IO either sits on the argument/result itself or on the members of a struct.
fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut Vec<Location>,
) {
    let inner = &module.types[ty].inner;
    match (binding, inner) {
        (Some(Binding::Location { location, .. }), _) => out.push(Location {
            location: *location,
            components: components(inner),
        }),
        (Some(Binding::BuiltIn(_)), _) => {}
        (None, TypeInner::Struct { members, .. }) => {
            for member in members {
                collect_locations(module, member.ty, member.binding.as_ref(), out);
            }
        }
        (None, _) => {}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub location: u32,
    pub components: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPointInfo {
    pub name: String,
    pub stage: ShaderStage,
    pub inputs: Vec<Location>,
    pub outputs: Vec<Location>,
}

impl EntryPointInfo {
    pub fn input(&self, location: u32) -> Option<Location> {
        self.inputs.iter().copied().find(|l| l.location == location)
    }

    pub fn output(&self, location: u32) -> Option<Location> {
        self.outputs.iter().copied().find(|l| l.location == location)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformInfo {
    pub name: Option<String>,
    pub group: u32,
    pub binding: u32,
    pub size: u32,
    /// Byte offsets of the `mat4x4<f32>` members, if the uniform is a struct.
    pub mat4_offsets: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reflection {
    pub entry_points: Vec<EntryPointInfo>,
    pub uniforms: Vec<UniformInfo>,
}

impl Reflection {
    pub fn entry_point(&self, entry: EntryPoint) -> Option<&EntryPointInfo> {
        self.entry_points
            .iter()
            .find(|ep| ep.name == entry.name() && ep.stage == entry.stage())
    }

    pub fn uniform(&self, group: u32, binding: u32) -> Option<&UniformInfo> {
        self.uniforms
            .iter()
            .find(|u| u.group == group && u.binding == binding)
    }

    /// Checks that the module agrees with what the host binds for `layout`.
    pub fn check_contract(&self, layout: VertexLayout) -> Result<()> {
        let uniform = self.uniform(UNIFORM_GROUP, UNIFORM_BINDING).ok_or_else(|| {
            contract(format!(
                "no uniform buffer at group {UNIFORM_GROUP}, binding {UNIFORM_BINDING}"
            ))
        })?;
        if uniform.size as usize != GpuUniforms::SIZE {
            return Err(contract(format!(
                "uniform buffer is {} bytes, expected {}",
                uniform.size,
                GpuUniforms::SIZE
            )));
        }
        let offsets: Vec<usize> = uniform.mat4_offsets.iter().map(|&o| o as usize).collect();
        if offsets != GpuUniforms::MATRIX_OFFSETS {
            return Err(contract(format!(
                "uniform matrices at offsets {offsets:?}, expected {:?}",
                GpuUniforms::MATRIX_OFFSETS
            )));
        }

        for entry in EntryPoint::ALL {
            if self.entry_point(entry).is_none() {
                return Err(contract(format!(
                    "missing {:?} entry point `{entry}`",
                    entry.stage()
                )));
            }
        }

        if let Some(ep) = self.entry_point(EntryPoint::Vertex) {
            let attributes = [(POSITION_LOCATION, "position"), (COLOR_LOCATION, "color")];
            for (location, attribute) in attributes {
                let found = ep.input(location).ok_or_else(|| {
                    contract(format!("`{}` has no input at location {location}", ep.name))
                })?;
                if found.components as usize != layout.components() {
                    return Err(contract(format!(
                        "{attribute} at location {location} has {} components, {layout} layout binds {}",
                        found.components,
                        layout.format()
                    )));
                }
            }
        }

        if let Some(ep) = self.entry_point(EntryPoint::VertexFromIndex) {
            if !ep.inputs.is_empty() {
                return Err(contract(format!(
                    "`{}` must not read vertex attributes",
                    ep.name
                )));
            }
        }

        if let Some(ep) = self.entry_point(EntryPoint::Fragment) {
            match ep.output(0) {
                Some(Location { components: 4, .. }) => {}
                _ => {
                    return Err(contract(format!(
                        "`{}` must write a vec4<f32> to location 0",
                        ep.name
                    )))
                }
            }
        }

        Ok(())
    }

    /// Checks that `vertex` writes every location `fragment` reads, which a GPU host requires
    /// before it links the two stages into one pipeline.
    pub fn check_linkage(&self, vertex: EntryPoint) -> Result<()> {
        let missing = |entry: EntryPoint| contract(format!("missing entry point `{entry}`"));
        let vs = self.entry_point(vertex).ok_or_else(|| missing(vertex))?;
        let fs = self
            .entry_point(EntryPoint::Fragment)
            .ok_or_else(|| missing(EntryPoint::Fragment))?;

        for input in &fs.inputs {
            match vs.output(input.location) {
                Some(out) if out.components == input.components => {}
                Some(out) => {
                    return Err(contract(format!(
                        "`{}` writes {} components to location {}, `{}` reads {}",
                        vs.name, out.components, input.location, fs.name, input.components
                    )))
                }
                None => {
                    return Err(contract(format!(
                        "`{}` reads location {} but `{}` never writes it; \
                         only the CPU pipeline runs this pair, feeding opaque white",
                        fs.name, input.location, vs.name
                    )))
                }
            }
        }
        Ok(())
    }
}

fn contract(message: String) -> Error {
    Error::Contract(message)
}
