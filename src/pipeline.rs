use rayon::prelude::*;
use serde::Deserialize;

use crate::{
    config::CullingMode,
    error::{Error, Result},
    prim3d::{self, RasterState},
    shaders::{EntryPoint, FlatColor, IndexTriangle, TransformShader},
    target::RenderTarget,
    uniforms::Uniforms,
    vec::{Vec2, Vec4},
    vert_buf::VertexBuf,
    FragmentInput, VertexShader,
};

/// Which of the two mutually exclusive vertex stages the pipeline runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum VertexEntry {
    /// `vertex`, fed from the vertex buffers.
    #[default]
    #[serde(rename = "vertex")]
    Vertex,
    /// `vertex_from_index`, fed only the built-in vertex index.
    #[serde(rename = "vertex_from_index")]
    VertexFromIndex,
}

impl VertexEntry {
    pub fn entry_point(self) -> EntryPoint {
        match self {
            VertexEntry::Vertex => EntryPoint::Vertex,
            VertexEntry::VertexFromIndex => EntryPoint::VertexFromIndex,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub vertex_entry: VertexEntry,
    pub culling: CullingMode,
    pub depth_test: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            vertex_entry: VertexEntry::Vertex,
            culling: CullingMode::BackFace,
            depth_test: true,
        }
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    metrics: Metrics,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline {
            config,
            metrics: Metrics::new(),
        }
    }

    pub fn with_culling(&mut self, culling: CullingMode) -> &mut Self {
        self.config.culling = culling;
        self
    }

    pub fn with_depth_test(&mut self, depth_test: bool) -> &mut Self {
        self.config.depth_test = depth_test;
        self
    }

    pub fn config(&self) -> PipelineConfig {
        self.config
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    fn require(&self, entry: VertexEntry) -> Result<()> {
        if self.config.vertex_entry != entry {
            return Err(Error::EntryMismatch {
                configured: self.config.vertex_entry.entry_point(),
                required: entry.entry_point(),
            });
        }
        Ok(())
    }

    /// Runs `vertex` over every vertex of `vert_buf`.
    pub fn process_vertices<B: VertexBuf>(
        &mut self,
        uniforms: &Uniforms,
        vert_buf: &B,
    ) -> Result<ProcessedVertices<'_>> {
        self.require(VertexEntry::Vertex)?;

        let start = std::time::Instant::now();
        let vert_shader = TransformShader::new(uniforms);
        let vertices = (0..vert_buf.len())
            .into_par_iter()
            .map(|i| vert_shader.exec(vert_buf.index(i)))
            .collect();
        log::debug!("process vertices: {:?}", start.elapsed());

        Ok(ProcessedVertices {
            pipeline: self,
            vertices,
        })
    }

    /// Runs `vertex_from_index` for the indices `0..count`. The stage outputs no color, so the
    /// fragment stage sees opaque white.
    pub fn process_indices(&mut self, count: u32) -> Result<ProcessedVertices<'_>> {
        self.require(VertexEntry::VertexFromIndex)?;

        let start = std::time::Instant::now();
        let vertices = (0..count)
            .into_par_iter()
            .map(|index| FragmentInput {
                position: IndexTriangle.exec(index),
                color: Vec4::one(),
            })
            .collect();
        log::debug!("process indices: {:?}", start.elapsed());

        Ok(ProcessedVertices {
            pipeline: self,
            vertices,
        })
    }
}

/// Output of the vertex stage for one draw, ready to be rasterized.
pub struct ProcessedVertices<'a> {
    pipeline: &'a mut Pipeline,
    vertices: Vec<FragmentInput>,
}

impl<'a> ProcessedVertices<'a> {
    pub fn vertices(&self) -> &[FragmentInput] {
        &self.vertices
    }

    fn raster_state(&self) -> RasterState {
        RasterState {
            culling: self.pipeline.config.culling,
            depth_test: self.pipeline.config.depth_test,
        }
    }

    /// Assembles the vertices into a triangle list and shades it into `target` with `fragment`.
    pub fn draw(&mut self, target: &mut RenderTarget) {
        let start = std::time::Instant::now();
        let state = self.raster_state();
        prim3d::draw_triangles(
            &self.vertices,
            &FlatColor,
            target,
            state,
            &mut self.pipeline.metrics,
        );
        log::debug!("draw triangles: {:?}", start.elapsed());
    }

    /// The color `fragment` would produce at `ndc`, if any triangle covers it.
    pub fn sample(&self, ndc: Vec2) -> Option<Vec4> {
        prim3d::sample(&self.vertices, &FlatColor, ndc, self.raster_state())
    }

    pub fn metrics(&self) -> Metrics {
        self.pipeline.metrics
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metrics {
    pub triangles_drawn: usize,
    /// Triangles rejected by face culling, whichever face is culled.
    pub backfaces_culled: usize,
    /// Triangles entirely outside the clip volume.
    pub clipped: usize,
    pub fragments_shaded: usize,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics::default()
    }
}

impl std::fmt::Display for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let &Metrics {
            triangles_drawn,
            backfaces_culled,
            clipped,
            fragments_shaded,
        } = self;
        writeln!(f, "render metrics:")?;
        writeln!(f, "\ttriangles drawn: {triangles_drawn}")?;
        writeln!(f, "\tbackfaces culled: {backfaces_culled}")?;
        writeln!(f, "\toutside clip volume: {clipped}")?;
        writeln!(f, "\tfragments shaded: {fragments_shaded}")?;
        if triangles_drawn > 0 {
            let mean = fragments_shaded as f64 / triangles_drawn as f64;
            writeln!(f, "\tmean fragments per triangle: {mean:.2}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vert_buf::{VertBuf, Vertex4, VertexInput};

    fn red_triangle() -> VertBuf<Vertex4> {
        let red = Vec4::from([1., 0., 0., 1.]);
        [[-1., -1., 0.5, 1.], [1., -1., 0.5, 1.], [0., 1., 0.5, 1.]]
            .into_iter()
            .map(|p| Vertex4::new(Vec4::from(p), red))
            .collect()
    }

    #[test]
    fn entry_point_must_match_the_draw() {
        let mut pipeline = Pipeline::new(PipelineConfig::default());
        let err = pipeline.process_indices(3).err().unwrap();
        assert!(matches!(
            err,
            Error::EntryMismatch {
                configured: EntryPoint::Vertex,
                required: EntryPoint::VertexFromIndex,
            }
        ));

        let mut pipeline = Pipeline::new(PipelineConfig {
            vertex_entry: VertexEntry::VertexFromIndex,
            ..Default::default()
        });
        let err = pipeline
            .process_vertices(&Uniforms::identity(), &red_triangle())
            .err()
            .unwrap();
        assert!(matches!(err, Error::EntryMismatch { .. }));
    }

    #[test]
    fn index_draw_is_white() {
        let mut pipeline = Pipeline::new(PipelineConfig {
            vertex_entry: VertexEntry::VertexFromIndex,
            culling: CullingMode::Disabled,
            depth_test: true,
        });
        let processed = pipeline.process_indices(3).unwrap();
        assert_eq!(processed.vertices().len(), 3);
        assert_eq!(processed.vertices()[1].position.to_array(), [0., 1., 0., 1.]);
        assert_eq!(
            processed.sample(Vec2::from([0., 0.])).map(Vec4::to_array),
            Some([1.; 4])
        );
    }

    #[test]
    fn metrics_accumulate_across_draws() {
        let mut pipeline = Pipeline::new(PipelineConfig::default());
        let mut target = RenderTarget::new(8, 8);
        let vert_buf = red_triangle();

        for _ in 0..2 {
            let mut processed = pipeline
                .process_vertices(&Uniforms::identity(), &vert_buf)
                .unwrap();
            processed.draw(&mut target);
        }
        let metrics = pipeline.metrics();
        assert_eq!(metrics.triangles_drawn, 2);
        // the second draw has the same depth and passes the LessEqual test
        assert_eq!(metrics.fragments_shaded % 2, 0);
        assert!(metrics.fragments_shaded > 0);

        let summary = metrics.to_string();
        assert!(summary.contains("triangles drawn: 2"), "{summary}");
    }

    #[test]
    fn depth_is_untouched_without_depth_test() {
        let mut pipeline = Pipeline::new(PipelineConfig::default());
        pipeline
            .with_culling(CullingMode::Disabled)
            .with_depth_test(false);
        assert_eq!(
            pipeline.config(),
            PipelineConfig {
                vertex_entry: VertexEntry::Vertex,
                culling: CullingMode::Disabled,
                depth_test: false,
            }
        );

        let mut target = RenderTarget::new(8, 8);
        let mut processed = pipeline
            .process_vertices(&Uniforms::identity(), &red_triangle())
            .unwrap();
        processed.draw(&mut target);

        assert_eq!(target[(4, 4)].to_array(), [1., 0., 0., 1.]);
        assert!(target.depth().iter().all(|&d| d == RenderTarget::DEPTH_CLEAR));
    }
}
