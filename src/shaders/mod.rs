//! CPU implementations of the shader entry points. Each function mirrors the WGSL entry point of the
//! same name in [`wgsl`].

use std::fmt;

use crate::{
    uniforms::Uniforms,
    vec::{Mat4x4, Vec4},
    vert_buf::VertexInput,
    FragmentInput, FragmentShader, VertexShader,
};

pub mod wgsl;

/// `vertex`: transforms the homogenized position by `projection * view * model` and passes the
/// color through, promoted to four components.
#[inline]
pub fn vertex<V: VertexInput>(uniforms: &Uniforms, input: V) -> FragmentInput {
    TransformShader::new(uniforms).exec(input)
}

/// `fragment`: returns the interpolated color unchanged.
#[inline]
pub fn fragment(input: FragmentInput) -> Vec4 {
    FlatColor.exec(input)
}

/// `vertex_from_index`: clip-space corners of a fixed triangle, `(-1, -1)`, `(0, 1)`, `(1, -1)`
/// for indices 0, 1 and 2. Larger indices follow the same formula.
#[inline]
pub fn vertex_from_index(index: u32) -> Vec4 {
    IndexTriangle.exec(index)
}

pub struct TransformShader {
    transform: Mat4x4,
}

impl TransformShader {
    pub fn new(uniforms: &Uniforms) -> Self {
        TransformShader {
            transform: uniforms.model_view_projection(),
        }
    }
}

impl<V: VertexInput> VertexShader<V> for TransformShader {
    type Output = FragmentInput;

    #[inline]
    fn exec(&self, vertex: V) -> FragmentInput {
        let vertex = vertex.homogenize();
        FragmentInput {
            position: self.transform * vertex.position,
            color: vertex.color,
        }
    }
}

pub struct IndexTriangle;

impl VertexShader<u32> for IndexTriangle {
    type Output = Vec4;

    #[inline]
    fn exec(&self, index: u32) -> Vec4 {
        let x = (index as i32).wrapping_sub(1);
        let y = (index & 1) as i32 * 2 - 1;
        Vec4::from([x as f32, y as f32, 0., 1.])
    }
}

pub struct FlatColor;

impl FragmentShader for FlatColor {
    #[inline]
    fn exec(&self, input: FragmentInput) -> Vec4 {
        input.color
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Entry points the host can select when it builds a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    Vertex,
    VertexFromIndex,
    Fragment,
}

impl EntryPoint {
    pub const ALL: [EntryPoint; 3] = [
        EntryPoint::Vertex,
        EntryPoint::VertexFromIndex,
        EntryPoint::Fragment,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EntryPoint::Vertex => "vertex",
            EntryPoint::VertexFromIndex => "vertex_from_index",
            EntryPoint::Fragment => "fragment",
        }
    }

    pub fn stage(self) -> ShaderStage {
        match self {
            EntryPoint::Vertex | EntryPoint::VertexFromIndex => ShaderStage::Vertex,
            EntryPoint::Fragment => ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
