use std::{fmt, iter::IntoIterator, vec::Vec as AllocVec};

use serde::Deserialize;

use crate::{
    error::{Error, Result},
    vec::{Vec3, Vec4},
};

pub const POSITION_LOCATION: u32 = 0;
pub const COLOR_LOCATION: u32 = 1;

/// Which of the two shader variants a vertex buffer is laid out for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VertexLayout {
    /// `vec4<f32>` position and color.
    #[default]
    Homogeneous,
    /// `vec3<f32>` position and color, homogenized by the vertex stage.
    Bare,
}

impl VertexLayout {
    pub fn components(self) -> usize {
        match self {
            VertexLayout::Homogeneous => 4,
            VertexLayout::Bare => 3,
        }
    }

    /// Byte stride of one attribute in its own buffer.
    pub fn stride(self) -> usize {
        self.components() * std::mem::size_of::<f32>()
    }

    /// Name of the vertex format as the host API spells it.
    pub fn format(self) -> &'static str {
        match self {
            VertexLayout::Homogeneous => "Float32x4",
            VertexLayout::Bare => "Float32x3",
        }
    }
}

impl fmt::Display for VertexLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VertexLayout::Homogeneous => f.write_str("homogeneous"),
            VertexLayout::Bare => f.write_str("bare"),
        }
    }
}

/// A vertex attribute that can be read from packed `f32`s.
pub trait Attribute: Copy + Send + Sync {
    const COMPONENTS: usize;

    /// `floats` must hold exactly [`Attribute::COMPONENTS`] values.
    fn from_floats(floats: &[f32]) -> Self;

    fn to_floats(self, out: &mut AllocVec<f32>);
}

impl Attribute for Vec3 {
    const COMPONENTS: usize = 3;

    fn from_floats(floats: &[f32]) -> Self {
        Vec3::from([floats[0], floats[1], floats[2]])
    }

    fn to_floats(self, out: &mut AllocVec<f32>) {
        out.extend_from_slice(&self.to_array());
    }
}

impl Attribute for Vec4 {
    const COMPONENTS: usize = 4;

    fn from_floats(floats: &[f32]) -> Self {
        Vec4::from([floats[0], floats[1], floats[2], floats[3]])
    }

    fn to_floats(self, out: &mut AllocVec<f32>) {
        out.extend_from_slice(&self.to_array());
    }
}

/// Per-vertex input of the `vertex` entry point.
pub trait VertexInput: Copy + Send + Sync {
    type Position: Attribute;
    type Color: Attribute;

    const LAYOUT: VertexLayout;

    fn new(position: Self::Position, color: Self::Color) -> Self;

    fn into_parts(self) -> (Self::Position, Self::Color);

    /// The equivalent homogeneous vertex: `w = 1` for positions, `alpha = 1` for colors.
    fn homogenize(self) -> Vertex4;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex4 {
    pub position: Vec4,
    pub color: Vec4,
}

impl VertexInput for Vertex4 {
    type Position = Vec4;
    type Color = Vec4;

    const LAYOUT: VertexLayout = VertexLayout::Homogeneous;

    fn new(position: Vec4, color: Vec4) -> Self {
        Vertex4 { position, color }
    }

    fn into_parts(self) -> (Vec4, Vec4) {
        (self.position, self.color)
    }

    #[inline(always)]
    fn homogenize(self) -> Vertex4 {
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex3 {
    pub position: Vec3,
    pub color: Vec3,
}

impl VertexInput for Vertex3 {
    type Position = Vec3;
    type Color = Vec3;

    const LAYOUT: VertexLayout = VertexLayout::Bare;

    fn new(position: Vec3, color: Vec3) -> Self {
        Vertex3 { position, color }
    }

    fn into_parts(self) -> (Vec3, Vec3) {
        (self.position, self.color)
    }

    #[inline(always)]
    fn homogenize(self) -> Vertex4 {
        Vertex4 {
            position: self.position.extend(1.),
            color: self.color.extend(1.),
        }
    }
}

/// Random access to the vertices of a draw.
pub trait VertexBuf: Sync {
    type Vertex: VertexInput;

    fn index(&self, index: usize) -> Self::Vertex;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Positions and colors in two separate buffers, the way they are bound at locations 0 and 1.
///
/// INVARIANT: The length of all fields is the same
pub struct VertBuf<V: VertexInput = Vertex4> {
    positions: AllocVec<V::Position>,
    colors: AllocVec<V::Color>,
}

impl<V: VertexInput> VertBuf<V> {
    pub fn new() -> Self {
        VertBuf {
            positions: AllocVec::new(),
            colors: AllocVec::new(),
        }
    }

    pub fn with_capacity(cap: usize) -> Self {
        VertBuf {
            positions: AllocVec::with_capacity(cap),
            colors: AllocVec::with_capacity(cap),
        }
    }

    pub fn push(&mut self, position: V::Position, color: V::Color) {
        self.positions.push(position);
        self.colors.push(color);
    }

    pub fn positions(&self) -> &[V::Position] {
        &self.positions
    }

    pub fn colors(&self) -> &[V::Color] {
        &self.colors
    }

    /// Decodes two packed little-endian `f32` buffers, as they would be uploaded to the GPU.
    pub fn from_bytes(positions: &[u8], colors: &[u8]) -> Result<Self> {
        let positions = decode_attribute::<V::Position>(positions)?;
        let colors = decode_attribute::<V::Color>(colors)?;
        if positions.len() != colors.len() {
            return Err(Error::VertexCount {
                positions: positions.len(),
                colors: colors.len(),
            });
        }
        Ok(VertBuf { positions, colors })
    }

    /// Encodes the buffers back into `(positions, colors)` bytes.
    pub fn to_bytes(&self) -> (AllocVec<u8>, AllocVec<u8>) {
        (encode_attribute(&self.positions), encode_attribute(&self.colors))
    }
}

fn decode_attribute<A: Attribute>(bytes: &[u8]) -> Result<AllocVec<A>> {
    let stride = A::COMPONENTS * std::mem::size_of::<f32>();
    if bytes.len() % stride != 0 {
        return Err(Error::VertexStride {
            len: bytes.len(),
            stride,
        });
    }
    let floats: AllocVec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok(floats.chunks_exact(A::COMPONENTS).map(A::from_floats).collect())
}

fn encode_attribute<A: Attribute>(attrs: &[A]) -> AllocVec<u8> {
    let mut floats = AllocVec::with_capacity(attrs.len() * A::COMPONENTS);
    for attr in attrs {
        attr.to_floats(&mut floats);
    }
    floats.iter().flat_map(|f| f.to_le_bytes()).collect()
}

impl<V: VertexInput> Default for VertBuf<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: VertexInput> Clone for VertBuf<V> {
    fn clone(&self) -> Self {
        VertBuf {
            positions: self.positions.clone(),
            colors: self.colors.clone(),
        }
    }
}

impl<V: VertexInput> VertexBuf for VertBuf<V> {
    type Vertex = V;

    #[inline(always)]
    fn index(&self, index: usize) -> V {
        V::new(self.positions[index], self.colors[index])
    }

    fn len(&self) -> usize {
        debug_assert_eq!(self.positions.len(), self.colors.len());
        self.positions.len()
    }
}

impl<V: VertexInput> FromIterator<V> for VertBuf<V> {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        let mut vert_buf = VertBuf::new();
        vert_buf.extend(iter);
        vert_buf
    }
}

impl<V: VertexInput> std::iter::Extend<V> for VertBuf<V> {
    fn extend<T: IntoIterator<Item = V>>(&mut self, iter: T) {
        for vertex in iter {
            let (position, color) = vertex.into_parts();
            self.push(position, color)
        }
    }
}
