//! CPU model, binding contract and WGSL sources of a model/view/projection transform shader that
//! rasterizes flat-colored triangles.

pub mod camera;
pub mod config;
pub mod error;
pub mod math;
pub mod pipeline;
pub mod prim3d;
pub mod reflect;
pub mod shaders;
pub mod target;
pub mod uniforms;
pub mod vec;
pub mod vert_buf;

pub use error::{Error, Result};

use vec::Vec4;

/// Record handed from the vertex stage to the fragment stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FragmentInput {
    /// The position builtin: clip space out of the vertex stage, framebuffer coordinates (pixel
    /// center, depth, `1 / w`) into the fragment stage, which never reads it.
    pub position: Vec4,
    pub color: Vec4,
}

pub trait VertexShader<Vert> {
    type Output;

    fn exec(&self, vertex: Vert) -> Self::Output;
}

pub trait FragmentShader {
    fn exec(&self, input: FragmentInput) -> Vec4;
}

/// Groups consecutive vertices into triangles, as a triangle list topology does. Trailing
/// vertices that do not form a full triangle are ignored.
pub fn triangles_iter<V>(vert: &[V]) -> impl Iterator<Item = [&V; 3]> + '_ {
    vert.chunks_exact(3).map(|tri| [&tri[0], &tri[1], &tri[2]])
}
