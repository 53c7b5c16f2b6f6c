use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::{
    camera::{perspective, OrbitCamera},
    error::Error,
    math::Size,
    pipeline::{PipelineConfig, VertexEntry},
    uniforms::Uniforms,
    vec::{Mat4x4, Vec4},
    vert_buf::{Attribute, VertBuf, VertexInput, VertexLayout},
};

/// A single draw call described in TOML.
#[derive(Clone, Debug, Deserialize)]
pub struct DrawConfig {
    pub rendering: RenderingConfig,
    #[serde(default)]
    pub shader: ShaderConfig,
    #[serde(default)]
    pub uniforms: UniformsConfig,
    #[serde(default)]
    pub camera: Option<CameraConfig>,
    #[serde(default)]
    pub vertices: Vec<VertexConfig>,
}

impl DrawConfig {
    pub fn load_toml(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read file {path:?}"))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse draw description {path:?}"))?;
        Ok(config)
    }

    pub fn aspect_ratio(&self) -> f32 {
        Size::new(self.rendering.width, self.rendering.height).aspect_ratio()
    }

    /// Uniforms for the draw. A `[camera]` section replaces `view` and `projection`.
    pub fn uniforms(&self) -> Uniforms {
        let UniformsConfig {
            model,
            view,
            projection,
        } = self.uniforms;
        let model = model.map_or_else(Mat4x4::identity, cols_to_mat);

        match &self.camera {
            Some(camera) => {
                if view.is_some() || projection.is_some() {
                    log::warn!("[camera] overrides the view and projection given in [uniforms]");
                }
                Uniforms::new(model, camera.view(), camera.projection(self.aspect_ratio()))
            }
            None => Uniforms::new(
                model,
                view.map_or_else(Mat4x4::identity, cols_to_mat),
                projection.map_or_else(Mat4x4::identity, cols_to_mat),
            ),
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            vertex_entry: self.shader.entry,
            culling: self.rendering.culling_mode,
            depth_test: self.rendering.depth_test,
        }
    }

    /// Builds the vertex buffers, checking every attribute against the variant's component count.
    pub fn vert_buf<V: VertexInput>(&self) -> crate::Result<VertBuf<V>> {
        let mut vert_buf = VertBuf::with_capacity(self.vertices.len());
        for vertex in &self.vertices {
            let position = attribute::<V::Position>("position", &vertex.position)?;
            let color = attribute::<V::Color>("color", &vertex.color)?;
            vert_buf.push(position, color);
        }
        Ok(vert_buf)
    }
}

fn attribute<A: Attribute>(name: &'static str, floats: &[f32]) -> crate::Result<A> {
    if floats.len() != A::COMPONENTS {
        return Err(Error::AttributeComponents {
            attribute: name,
            expected: A::COMPONENTS,
            actual: floats.len(),
        });
    }
    Ok(A::from_floats(floats))
}

fn cols_to_mat(cols: [f32; 16]) -> Mat4x4 {
    Mat4x4::from_cols_array([
        [cols[0], cols[1], cols[2], cols[3]],
        [cols[4], cols[5], cols[6], cols[7]],
        [cols[8], cols[9], cols[10], cols[11]],
        [cols[12], cols[13], cols[14], cols[15]],
    ])
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct RenderingConfig {
    pub width: usize,
    pub height: usize,
    #[serde(
        default = "RenderingConfig::default_clear_color",
        deserialize_with = "RenderingConfig::deserialize_clear_color",
        rename = "clear-color"
    )]
    pub clear_color: Vec4,
    #[serde(default, rename = "cull-mode")]
    pub culling_mode: CullingMode,
    #[serde(default = "RenderingConfig::default_depth_test", rename = "depth-test")]
    pub depth_test: bool,
}

impl RenderingConfig {
    /// Linear, like every color the pipeline handles.
    pub fn default_clear_color() -> Vec4 {
        Vec4::from([0.01, 0.01, 0.01, 1.])
    }

    fn default_depth_test() -> bool {
        true
    }

    /// Parses `"#rrggbb"` as an sRGB color and returns it in linear space.
    fn deserialize_clear_color<'de, D: serde::Deserializer<'de>>(deser: D) -> Result<Vec4, D::Error> {
        use serde::de::Error;

        let hex_color = String::deserialize(deser)?;
        let digits = hex_color
            .strip_prefix('#')
            .filter(|digits| digits.len() == 6)
            .ok_or_else(|| D::Error::custom(format!("expected \"#rrggbb\", got {hex_color:?}")))?;
        let rgb = u32::from_str_radix(digits, 16).map_err(D::Error::custom)?;

        let [_, r, g, b] = rgb.to_be_bytes();
        let [r, g, b] = [r, g, b].map(crate::target::srgb8_to_linear);
        Ok(Vec4::from([r, g, b, 1.]))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
pub enum CullingMode {
    #[serde(rename = "front-face")]
    FrontFace,
    #[serde(rename = "back-face")]
    #[default]
    BackFace,
    #[serde(rename = "disabled")]
    Disabled,
}

impl CullingMode {
    pub fn enumerate() -> impl Iterator<Item = Self> {
        [CullingMode::Disabled, CullingMode::BackFace, CullingMode::FrontFace].into_iter()
    }
}

impl std::fmt::Display for CullingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct ShaderConfig {
    #[serde(default)]
    pub variant: VertexLayout,
    #[serde(default)]
    pub entry: VertexEntry,
    #[serde(default = "ShaderConfig::default_index_count", rename = "index-count")]
    pub index_count: u32,
}

impl ShaderConfig {
    fn default_index_count() -> u32 {
        3
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        ShaderConfig {
            variant: VertexLayout::default(),
            entry: VertexEntry::default(),
            index_count: Self::default_index_count(),
        }
    }
}

/// Matrices as 16 floats in column-major order. Missing matrices are the identity.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct UniformsConfig {
    #[serde(default)]
    pub model: Option<[f32; 16]>,
    #[serde(default)]
    pub view: Option<[f32; 16]>,
    #[serde(default)]
    pub projection: Option<[f32; 16]>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "CameraConfig::default_yaw")]
    pub yaw: f32,
    #[serde(default = "CameraConfig::default_pitch")]
    pub pitch: f32,
    #[serde(default = "CameraConfig::default_radius")]
    pub radius: f32,
    /// Vertical field of view in degrees
    #[serde(default = "CameraConfig::default_fovy")]
    pub fovy: f32,
    #[serde(default = "CameraConfig::default_near")]
    pub near: f32,
    #[serde(default = "CameraConfig::default_far")]
    pub far: f32,
}

impl CameraConfig {
    pub fn view(&self) -> Mat4x4 {
        OrbitCamera {
            yaw: self.yaw,
            pitch: self.pitch,
            radius: self.radius,
        }
        .matrix()
    }

    pub fn projection(&self, aspect_ratio: f32) -> Mat4x4 {
        perspective(self.fovy, aspect_ratio, self.near, self.far)
    }

    fn default_yaw() -> f32 {
        OrbitCamera::default().yaw
    }

    fn default_pitch() -> f32 {
        OrbitCamera::default().pitch
    }

    fn default_radius() -> f32 {
        OrbitCamera::default().radius
    }

    fn default_fovy() -> f32 {
        60.
    }

    fn default_near() -> f32 {
        0.1
    }

    fn default_far() -> f32 {
        100.
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct VertexConfig {
    pub position: Vec<f32>,
    pub color: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vert_buf::{Vertex3, Vertex4};

    const MINIMAL: &str = r#"
        [rendering]
        width = 64
        height = 32
    "#;

    #[test]
    fn optional_sections_have_defaults() {
        let config: DrawConfig = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.rendering.clear_color.to_array(), [0.01, 0.01, 0.01, 1.]);
        assert_eq!(config.rendering.culling_mode, CullingMode::BackFace);
        assert!(config.rendering.depth_test);
        assert_eq!(config.shader.variant, VertexLayout::Homogeneous);
        assert_eq!(config.shader.entry, VertexEntry::Vertex);
        assert_eq!(config.shader.index_count, 3);
        assert!(config.camera.is_none());
        assert!(config.vertices.is_empty());

        let uniforms = config.uniforms();
        assert_eq!(uniforms, Uniforms::identity());
        assert_eq!(config.pipeline_config(), PipelineConfig::default());
        assert_eq!(config.aspect_ratio(), 2.);
    }

    #[test]
    fn full_description_parses() {
        let config: DrawConfig = toml::from_str(
            r##"
            [rendering]
            width = 16
            height = 16
            clear-color = "#ffffff"
            cull-mode = "disabled"
            depth-test = false

            [shader]
            variant = "bare"
            entry = "vertex_from_index"
            index-count = 6

            [uniforms]
            model = [1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 2, 3, 4, 1]

            [[vertices]]
            position = [0, 0, 0]
            color = [1, 0, 0]
            "##,
        )
        .unwrap();

        let white = config.rendering.clear_color.to_array();
        assert!(white.iter().all(|&c| (c - 1.).abs() < 1e-6), "{white:?}");
        assert_eq!(config.rendering.culling_mode, CullingMode::Disabled);
        assert_eq!(config.shader.variant, VertexLayout::Bare);
        assert_eq!(config.shader.index_count, 6);

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.vertex_entry, VertexEntry::VertexFromIndex);
        assert!(!pipeline.depth_test);

        // translation lives in the last column
        let model = config.uniforms().model;
        assert_eq!(model[(0, 3)], 2.);
        assert_eq!(model[(1, 3)], 3.);
        assert_eq!(model[(2, 3)], 4.);
    }

    #[test]
    fn clear_color_is_decoded_from_srgb() {
        let config: DrawConfig = toml::from_str(
            r##"
            [rendering]
            width = 1
            height = 1
            clear-color = "#000000"
            "##,
        )
        .unwrap();
        assert_eq!(config.rendering.clear_color.to_array(), [0., 0., 0., 1.]);

        for bad in ["000000", "#00000", "#gg0000"] {
            let source = format!("[rendering]\nwidth = 1\nheight = 1\nclear-color = \"{bad}\"\n");
            assert!(toml::from_str::<DrawConfig>(&source).is_err(), "{bad}");
        }
    }

    #[test]
    fn camera_overrides_view_and_projection() {
        let config: DrawConfig = toml::from_str(
            r#"
            [rendering]
            width = 30
            height = 20

            [uniforms]
            view = [2, 0, 0, 0, 0, 2, 0, 0, 0, 0, 2, 0, 0, 0, 0, 1]

            [camera]
            radius = 6.0
            "#,
        )
        .unwrap();
        let camera = config.camera.unwrap();
        assert_eq!(camera.yaw, 1.0);
        assert_eq!(camera.fovy, 60.);

        let uniforms = config.uniforms();
        assert_eq!(uniforms.view, camera.view());
        assert_eq!(uniforms.projection, perspective(60., 1.5, 0.1, 100.));
    }

    #[test]
    fn vertices_must_match_the_variant() {
        let config: DrawConfig = toml::from_str(
            r#"
            [rendering]
            width = 1
            height = 1

            [[vertices]]
            position = [0, 0, 0]
            color = [1, 0, 0]

            [[vertices]]
            position = [1, 0, 0]
            color = [0, 1, 0]
            "#,
        )
        .unwrap();

        let bare = config.vert_buf::<Vertex3>().unwrap();
        assert_eq!(bare.positions().len(), 2);
        assert_eq!(bare.colors()[1].to_array(), [0., 1., 0.]);

        let err = config.vert_buf::<Vertex4>().err().unwrap();
        assert!(matches!(
            err,
            Error::AttributeComponents {
                attribute: "position",
                expected: 4,
                actual: 3,
            }
        ));
    }
}
