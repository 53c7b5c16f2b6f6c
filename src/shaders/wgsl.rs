//! WGSL sources of both shader variants. Both expose `vertex`, `vertex_from_index` and `fragment`.

use crate::vert_buf::VertexLayout;

/// Variant with `vec4<f32>` position and color attributes.
pub const HOMOGENEOUS: &str = include_str!("homogeneous.wgsl");

/// Variant with `vec3<f32>` position and color attributes.
pub const BARE: &str = include_str!("bare.wgsl");

pub fn source(layout: VertexLayout) -> &'static str {
    match layout {
        VertexLayout::Homogeneous => HOMOGENEOUS,
        VertexLayout::Bare => BARE,
    }
}
