use crate::shaders::EntryPoint;

/// Errors raised while setting up a draw on the host side. Shader invocations themselves never fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("uniform buffer must be {expected} bytes, got {actual}")]
    UniformSize { expected: usize, actual: usize },

    #[error("vertex buffer of {len} bytes is not a multiple of the {stride} byte stride")]
    VertexStride { len: usize, stride: usize },

    #[error("position buffer holds {positions} vertices but color buffer holds {colors}")]
    VertexCount { positions: usize, colors: usize },

    #[error("attribute `{attribute}` expects {expected} components, got {actual}")]
    AttributeComponents {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("WGSL parse error: {0}")]
    ShaderParse(String),

    #[error("WGSL validation error: {0}")]
    ShaderValidation(String),

    #[error("binding contract violated: {0}")]
    Contract(String),

    #[error("pipeline is configured with entry point `{configured}` but the draw requires `{required}`")]
    EntryMismatch {
        configured: EntryPoint,
        required: EntryPoint,
    },

    #[error("failed to write image")]
    Image(#[from] image::ImageError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
