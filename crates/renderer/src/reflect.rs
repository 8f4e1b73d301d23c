//! GLSL stage parsing and uniform reflection through naga.
//!
//! Both backends compile a stage by running the naga GLSL frontend and
//! validator over it; the resulting uniform block layouts are what linking
//! reconciles and what uniform lookups resolve against.

use std::collections::HashMap;
use std::fmt;

use wgpu::naga::front::glsl;
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};
use wgpu::naga::{self, AddressSpace, Binding, ScalarKind, TypeInner, VectorSize};

use crate::types::StageKind;

const ENTRY_POINT: &str = "main";

/// Shape of a uniform block member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformMember {
    pub name: String,
    pub offset: u32,
    pub kind: UniformKind,
}

/// A `layout(set = ..., binding = ...) uniform Block { ... }` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlock {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    /// Byte size of the block, rounded up to 16.
    pub size: u64,
    pub members: Vec<UniformMember>,
}

/// Where a named uniform lives once a program is linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    pub binding: u32,
    pub offset: u64,
    pub kind: UniformKind,
}

/// Scalar or vector type carried across a stage interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaryingType {
    pub scalar: ScalarKind,
    pub width: u8,
    pub components: u8,
}

impl VaryingType {
    pub const VEC2: VaryingType = VaryingType {
        scalar: ScalarKind::Float,
        width: 4,
        components: 2,
    };
}

impl fmt::Display for VaryingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (scalar, prefix) = match (self.scalar, self.width) {
            (ScalarKind::Float, 8) => ("double", "d"),
            (ScalarKind::Float, _) => ("float", ""),
            (ScalarKind::Sint, _) => ("int", "i"),
            (ScalarKind::Uint, _) => ("uint", "u"),
            (ScalarKind::Bool, _) => ("bool", "b"),
            _ => ("abstract", "?"),
        };
        if self.components == 1 {
            f.write_str(scalar)
        } else {
            write!(f, "{prefix}vec{}", self.components)
        }
    }
}

/// A `layout(location = N)` input or output of a stage entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Varying {
    pub name: String,
    pub location: u32,
    /// `None` for types that are neither scalars nor vectors.
    pub ty: Option<VaryingType>,
}

impl Varying {
    fn describe_type(&self) -> String {
        self.ty
            .map(|ty| ty.to_string())
            .unwrap_or_else(|| "an unsupported type".to_string())
    }
}

/// Everything linking needs to know about one compiled stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReflection {
    pub kind: StageKind,
    pub blocks: Vec<UniformBlock>,
    pub inputs: Vec<Varying>,
    pub outputs: Vec<Varying>,
}

/// Uniform interface of a linked program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkedUniforms {
    pub blocks: Vec<UniformBlock>,
    pub slots: HashMap<String, UniformSlot>,
}

impl LinkedUniforms {
    pub fn slot(&self, name: &str) -> Option<UniformSlot> {
        self.slots.get(name).copied()
    }
}

/// Parses and validates one GLSL stage, returning its reflection or the
/// formatted diagnostics.
pub fn parse_stage(kind: StageKind, source: &str) -> Result<StageReflection, String> {
    let mut frontend = glsl::Frontend::default();
    let options = glsl::Options::from(kind.naga_stage());
    let module = frontend
        .parse(&options, source)
        .map_err(|errors| errors.emit_to_string(source))?;

    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
    validator
        .validate(&module)
        .map_err(|error| error.emit_to_string(source))?;

    let Some(entry) = module
        .entry_points
        .iter()
        .find(|entry| entry.stage == kind.naga_stage() && entry.name == ENTRY_POINT)
    else {
        return Err(format!("{kind} shader has no `{ENTRY_POINT}` entry point"));
    };

    let mut inputs = Vec::new();
    for argument in &entry.function.arguments {
        collect_varyings(
            &module,
            argument.name.as_deref(),
            argument.ty,
            argument.binding.as_ref(),
            &mut inputs,
        );
    }
    let mut outputs = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_varyings(&module, None, result.ty, result.binding.as_ref(), &mut outputs);
    }

    Ok(StageReflection {
        kind,
        blocks: uniform_blocks(&module),
        inputs,
        outputs,
    })
}

/// Flattens entry point arguments and results into location-bound varyings.
/// Built-ins are skipped; unbound structs are walked member by member.
fn collect_varyings(
    module: &naga::Module,
    name: Option<&str>,
    ty: naga::Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut Vec<Varying>,
) {
    let inner = &module.types[ty].inner;
    match binding {
        Some(Binding::Location { location, .. }) => out.push(Varying {
            name: name
                .map(str::to_string)
                .unwrap_or_else(|| format!("location {location}")),
            location: *location,
            ty: varying_type(inner),
        }),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = inner {
                for member in members {
                    collect_varyings(
                        module,
                        member.name.as_deref(),
                        member.ty,
                        member.binding.as_ref(),
                        out,
                    );
                }
            }
        }
    }
}

fn varying_type(inner: &TypeInner) -> Option<VaryingType> {
    let (scalar, components) = match *inner {
        TypeInner::Scalar(scalar) => (scalar, 1),
        TypeInner::Vector { size, scalar } => (
            scalar,
            match size {
                VectorSize::Bi => 2,
                VectorSize::Tri => 3,
                VectorSize::Quad => 4,
            },
        ),
        _ => return None,
    };
    Some(VaryingType {
        scalar: scalar.kind,
        width: scalar.width,
        components,
    })
}

fn uniform_blocks(module: &naga::Module) -> Vec<UniformBlock> {
    let mut blocks = Vec::new();
    for (_, var) in module.global_variables.iter() {
        if var.space != AddressSpace::Uniform {
            continue;
        }
        let Some(binding) = var.binding.as_ref() else {
            continue;
        };
        let ty = &module.types[var.ty];
        let TypeInner::Struct { members, span } = &ty.inner else {
            continue;
        };

        let name = var
            .name
            .clone()
            .or_else(|| ty.name.clone())
            .unwrap_or_else(|| format!("block{}", binding.binding));
        let members = members
            .iter()
            .filter_map(|member| {
                Some(UniformMember {
                    name: member.name.clone()?,
                    offset: member.offset,
                    kind: uniform_kind(&module.types[member.ty].inner),
                })
            })
            .collect();

        blocks.push(UniformBlock {
            name,
            group: binding.group,
            binding: binding.binding,
            size: u64::from(*span).max(16).next_multiple_of(16),
            members,
        });
    }
    blocks
}

fn uniform_kind(inner: &TypeInner) -> UniformKind {
    match inner {
        TypeInner::Scalar(scalar) if scalar.kind == ScalarKind::Float && scalar.width == 4 => {
            UniformKind::Float
        }
        TypeInner::Vector { size, scalar }
            if scalar.kind == ScalarKind::Float && scalar.width == 4 =>
        {
            match size {
                VectorSize::Bi => UniformKind::Vec2,
                VectorSize::Tri => UniformKind::Vec3,
                VectorSize::Quad => UniformKind::Vec4,
            }
        }
        _ => UniformKind::Other,
    }
}

/// Reconciles the stages attached to a program.
///
/// Requires exactly one vertex and one fragment stage, uniform blocks in set
/// 0, identical layouts for a binding declared by both stages, and unique
/// uniform names across blocks. The vertex stage may only read a `vec2` at
/// location 0, and every fragment input needs a vertex output of the same
/// type at the same location.
pub fn link_stages<'a, I>(stages: I) -> Result<LinkedUniforms, String>
where
    I: IntoIterator<Item = &'a StageReflection>,
{
    let stages: Vec<&StageReflection> = stages.into_iter().collect();
    let mut blocks: Vec<UniformBlock> = Vec::new();

    for stage in &stages {
        for block in &stage.blocks {
            if block.group != 0 {
                return Err(format!(
                    "uniform block `{}` uses set {}; only set 0 is supported",
                    block.name, block.group
                ));
            }
            match blocks.iter().find(|existing| existing.binding == block.binding) {
                Some(existing) if existing.members != block.members => {
                    return Err(format!(
                        "uniform block at binding {} is declared differently by `{}` and `{}`",
                        block.binding, existing.name, block.name
                    ));
                }
                Some(_) => {}
                None => blocks.push(block.clone()),
            }
        }
    }

    let vertex: Vec<&StageReflection> = stages
        .iter()
        .copied()
        .filter(|stage| stage.kind == StageKind::Vertex)
        .collect();
    let fragment: Vec<&StageReflection> = stages
        .iter()
        .copied()
        .filter(|stage| stage.kind == StageKind::Fragment)
        .collect();
    let ([vertex], [fragment]) = (vertex.as_slice(), fragment.as_slice()) else {
        return Err(format!(
            "program needs exactly one vertex and one fragment stage (got {} vertex, {} fragment)",
            vertex.len(),
            fragment.len()
        ));
    };
    check_vertex_inputs(vertex)?;
    check_stage_interface(vertex, fragment)?;

    let mut slots = HashMap::new();
    for block in &blocks {
        for member in &block.members {
            let slot = UniformSlot {
                binding: block.binding,
                offset: u64::from(member.offset),
                kind: member.kind,
            };
            if slots.insert(member.name.clone(), slot).is_some() {
                return Err(format!(
                    "uniform `{}` is declared in more than one block",
                    member.name
                ));
            }
        }
    }

    blocks.sort_by_key(|block| block.binding);
    Ok(LinkedUniforms { blocks, slots })
}

fn check_vertex_inputs(vertex: &StageReflection) -> Result<(), String> {
    for input in &vertex.inputs {
        if input.location != 0 {
            return Err(format!(
                "vertex input `{}` uses location {}; only location 0 is supplied",
                input.name, input.location
            ));
        }
        if input.ty != Some(VaryingType::VEC2) {
            return Err(format!(
                "vertex input `{}` at location 0 is {}; expected vec2",
                input.name,
                input.describe_type()
            ));
        }
    }
    Ok(())
}

fn check_stage_interface(vertex: &StageReflection, fragment: &StageReflection) -> Result<(), String> {
    for input in &fragment.inputs {
        let Some(output) = vertex.outputs.iter().find(|output| output.location == input.location) else {
            return Err(format!(
                "fragment input `{}` at location {} has no matching vertex output",
                input.name, input.location
            ));
        };
        if output.ty != input.ty {
            return Err(format!(
                "fragment input `{}` at location {} is {} but vertex output `{}` is {}",
                input.name,
                input.location,
                input.describe_type(),
                output.name,
                output.describe_type()
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "#version 450
layout(location = 0) in vec2 position;

void main() {
    gl_Position = vec4(position, 0.0, 1.0);
}
";

    const FRAGMENT: &str = "#version 450
layout(location = 0) out vec4 color;

layout(std140, set = 0, binding = 0) uniform ViewParams {
    vec2 screenSize;
    vec4 objectColor;
};

void main() {
    color = objectColor * vec4(gl_FragCoord.xy / screenSize, 1.0, 1.0);
}
";

    #[test]
    fn reflects_uniform_block_members() {
        let stage = parse_stage(StageKind::Fragment, FRAGMENT).unwrap();
        assert_eq!(stage.blocks.len(), 1);
        let block = &stage.blocks[0];
        assert_eq!((block.group, block.binding), (0, 0));
        assert_eq!(block.size % 16, 0);
        let names: Vec<_> = block.members.iter().map(|m| (m.name.as_str(), m.kind)).collect();
        assert_eq!(
            names,
            vec![("screenSize", UniformKind::Vec2), ("objectColor", UniformKind::Vec4)]
        );
    }

    #[test]
    fn syntax_errors_are_reported() {
        let err = parse_stage(StageKind::Vertex, "#version 450\nvoid main() { gl_Position = ; }\n")
            .unwrap_err();
        assert!(!err.trim().is_empty());
    }

    #[test]
    fn links_vertex_and_fragment() {
        let vs = parse_stage(StageKind::Vertex, VERTEX).unwrap();
        let fs = parse_stage(StageKind::Fragment, FRAGMENT).unwrap();
        let linked = link_stages([&vs, &fs]).unwrap();
        let size = linked.slot("screenSize").unwrap();
        let color = linked.slot("objectColor").unwrap();
        assert_eq!(size.kind, UniformKind::Vec2);
        assert_eq!(color.kind, UniformKind::Vec4);
        assert_eq!(size.offset, 0);
        assert_eq!(color.offset % 16, 0);
        assert!(linked.slot("missing").is_none());
    }

    #[test]
    fn link_requires_both_stages() {
        let vs = parse_stage(StageKind::Vertex, VERTEX).unwrap();
        let err = link_stages([&vs]).unwrap_err();
        assert!(err.contains("exactly one vertex and one fragment"));
    }

    const TINTED_VERTEX: &str = "#version 450
layout(location = 0) in vec2 position;
layout(location = 0) out vec3 tint;

void main() {
    tint = vec3(position, 0.5);
    gl_Position = vec4(position, 0.0, 1.0);
}
";

    const TINTED_FRAGMENT: &str = "#version 450
layout(location = 0) in vec3 tint;
layout(location = 0) out vec4 color;

void main() {
    color = vec4(tint, 1.0);
}
";

    #[test]
    fn reflects_entry_point_interface() {
        let vs = parse_stage(StageKind::Vertex, TINTED_VERTEX).unwrap();
        let locations: Vec<_> = vs.inputs.iter().map(|v| (v.location, v.ty)).collect();
        assert_eq!(locations, vec![(0, Some(VaryingType::VEC2))]);
        let outputs: Vec<_> = vs.outputs.iter().map(|v| v.location).collect();
        assert_eq!(outputs, vec![0]);
        assert_eq!(vs.outputs[0].ty.map(|ty| ty.to_string()).as_deref(), Some("vec3"));
    }

    #[test]
    fn matching_varyings_link() {
        let vs = parse_stage(StageKind::Vertex, TINTED_VERTEX).unwrap();
        let fs = parse_stage(StageKind::Fragment, TINTED_FRAGMENT).unwrap();
        assert!(link_stages([&vs, &fs]).unwrap().blocks.is_empty());
    }

    #[test]
    fn fragment_input_without_vertex_output_fails_to_link() {
        let vs = parse_stage(StageKind::Vertex, VERTEX).unwrap();
        let fs = parse_stage(StageKind::Fragment, TINTED_FRAGMENT).unwrap();
        let err = link_stages([&vs, &fs]).unwrap_err();
        assert!(err.contains("no matching vertex output"), "{err}");
    }

    #[test]
    fn mistyped_varying_fails_to_link() {
        let widened = TINTED_VERTEX
            .replace("vec3 tint", "vec4 tint")
            .replace("vec3(position, 0.5)", "vec4(position, 0.5, 1.0)");
        let vs = parse_stage(StageKind::Vertex, &widened).unwrap();
        let fs = parse_stage(StageKind::Fragment, TINTED_FRAGMENT).unwrap();
        let err = link_stages([&vs, &fs]).unwrap_err();
        assert!(err.contains("is vec3 but vertex output"), "{err}");
        assert!(err.ends_with("vec4"), "{err}");
    }

    #[test]
    fn vertex_input_must_be_vec2_at_location_zero() {
        let fs = parse_stage(StageKind::Fragment, FRAGMENT).unwrap();

        let wide = VERTEX
            .replace("in vec2 position", "in vec3 position")
            .replace("vec4(position, 0.0, 1.0)", "vec4(position, 1.0)");
        let vs = parse_stage(StageKind::Vertex, &wide).unwrap();
        let err = link_stages([&vs, &fs]).unwrap_err();
        assert!(err.contains("expected vec2"), "{err}");

        let moved = VERTEX.replace("location = 0", "location = 1");
        let vs = parse_stage(StageKind::Vertex, &moved).unwrap();
        let err = link_stages([&vs, &fs]).unwrap_err();
        assert!(err.contains("uses location 1"), "{err}");
    }

    #[test]
    fn conflicting_block_layouts_fail_to_link() {
        let fs = parse_stage(StageKind::Fragment, FRAGMENT).unwrap();
        let mut vs = parse_stage(StageKind::Vertex, VERTEX).unwrap();
        let mut other = fs.blocks[0].clone();
        other.name = "Other".into();
        other.members.reverse();
        vs.blocks.push(other);

        let err = link_stages([&vs, &fs]).unwrap_err();
        assert!(err.contains("binding 0"));
    }
}
