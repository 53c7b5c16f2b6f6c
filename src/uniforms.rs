//! The uniform block bound at group 0, binding 0.

use bytemuck::{Pod, Zeroable};

use crate::{
    error::{Error, Result},
    vec::Mat4x4,
};

pub const UNIFORM_GROUP: u32 = 0;
pub const UNIFORM_BINDING: u32 = 0;

/// Model, view and projection matrices, read by every vertex invocation of a draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Uniforms {
    pub model: Mat4x4,
    pub view: Mat4x4,
    pub projection: Mat4x4,
}

impl Uniforms {
    pub fn new(model: Mat4x4, view: Mat4x4, projection: Mat4x4) -> Self {
        Uniforms {
            model,
            view,
            projection,
        }
    }

    pub fn identity() -> Self {
        Uniforms::new(Mat4x4::identity(), Mat4x4::identity(), Mat4x4::identity())
    }

    /// `projection * view * model`, associated the same way the shader evaluates it.
    pub fn model_view_projection(&self) -> Mat4x4 {
        self.projection * self.view * self.model
    }

    pub fn to_gpu(&self) -> GpuUniforms {
        GpuUniforms {
            model: self.model.to_cols_array(),
            view: self.view.to_cols_array(),
            projection: self.projection.to_cols_array(),
        }
    }
}

impl Default for Uniforms {
    fn default() -> Self {
        Uniforms::identity()
    }
}

/// Byte-exact layout of the uniform buffer: three column-major `mat4x4<f32>` at offsets 0, 64
/// and 128.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

const _: () = assert!(std::mem::size_of::<GpuUniforms>() == GpuUniforms::SIZE);

impl GpuUniforms {
    pub const SIZE: usize = 192;
    pub const MATRIX_OFFSETS: [usize; 3] = [0, 64, 128];

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Decodes a uniform buffer. The slice does not need to be aligned.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(Error::UniformSize {
                expected: Self::SIZE,
                actual: bytes.len(),
            });
        }
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    pub fn to_uniforms(&self) -> Uniforms {
        Uniforms {
            model: Mat4x4::from_cols_array(self.model),
            view: Mat4x4::from_cols_array(self.view),
            projection: Mat4x4::from_cols_array(self.projection),
        }
    }
}

impl From<Uniforms> for GpuUniforms {
    fn from(uniforms: Uniforms) -> Self {
        uniforms.to_gpu()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec::Vec3;

    #[test]
    fn layout_is_three_matrices_in_declaration_order() {
        let uniforms = Uniforms::new(
            Vec3::from([1., 2., 3.]).to_translation(),
            Mat4x4::identity() * 2.,
            Vec3::from([4., 5., 6.]).to_scale(),
        );
        let gpu = uniforms.to_gpu();
        let floats: &[f32] = bytemuck::cast_slice(gpu.as_bytes());

        assert_eq!(gpu.as_bytes().len(), 192);
        // model translation lives in the fourth column, i.e. floats 12..16
        assert_eq!(&floats[12..16], &[1., 2., 3., 1.]);
        assert_eq!(floats[GpuUniforms::MATRIX_OFFSETS[1] / 4], 2.);
        assert_eq!(floats[GpuUniforms::MATRIX_OFFSETS[2] / 4 + 5], 5.);
    }

    #[test]
    fn decoding_restores_the_matrices() {
        let uniforms = Uniforms::new(
            Mat4x4::rotation_y(0.3),
            Vec3::from([0., 0., -4.]).to_translation(),
            Mat4x4::rotation_z(1.1),
        );
        let mut bytes = vec![0u8; 1];
        bytes.extend_from_slice(uniforms.to_gpu().as_bytes());

        // misaligned on purpose
        let decoded = GpuUniforms::from_bytes(&bytes[1..]).unwrap();
        assert_eq!(decoded.to_uniforms(), uniforms);
    }

    #[test]
    fn decoding_rejects_wrong_sizes() {
        let err = GpuUniforms::from_bytes(&[0u8; 128]).unwrap_err();
        assert!(matches!(
            err,
            Error::UniformSize {
                expected: 192,
                actual: 128
            }
        ));
    }
}
