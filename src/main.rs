use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;

use transform_shader::{
    config::DrawConfig,
    pipeline::{Pipeline, VertexEntry},
    reflect::ShaderModule,
    shaders::wgsl,
    target::RenderTarget,
    vert_buf::{VertexLayout, Vertex3, Vertex4},
};

const USAGE: &str = "usage: transform-shader <draw.toml> [output.png]";

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config_path = PathBuf::from(args.next().context(USAGE)?);
    let output_path = args.next().map_or_else(|| PathBuf::from("out.png"), PathBuf::from);

    let config = DrawConfig::load_toml(&config_path)?;
    let layout = config.shader.variant;

    let module = ShaderModule::parse(wgsl::source(layout))
        .with_context(|| format!("{layout} shader failed to compile"))?;
    let reflection = module.reflect();
    reflection.check_contract(layout)?;
    log::info!("{layout} shader satisfies the binding contract");
    if let Err(err) = reflection.check_linkage(config.shader.entry.entry_point()) {
        log::warn!("{err}");
    }

    let mut target = RenderTarget::new(config.rendering.width, config.rendering.height);
    target.clear(config.rendering.clear_color);

    let start = Instant::now();
    let mut pipeline = Pipeline::new(config.pipeline_config());
    let uniforms = config.uniforms();
    let mut processed = match (config.shader.entry, layout) {
        (VertexEntry::Vertex, VertexLayout::Homogeneous) => {
            let vert_buf = config.vert_buf::<Vertex4>()?;
            pipeline.process_vertices(&uniforms, &vert_buf)?
        }
        (VertexEntry::Vertex, VertexLayout::Bare) => {
            let vert_buf = config.vert_buf::<Vertex3>()?;
            pipeline.process_vertices(&uniforms, &vert_buf)?
        }
        (VertexEntry::VertexFromIndex, _) => {
            if !config.vertices.is_empty() {
                let count = config.vertices.len();
                log::warn!("vertex_from_index ignores the {count} configured vertices");
            }
            pipeline.process_indices(config.shader.index_count)?
        }
    };
    processed.draw(&mut target);
    log::info!("rendered in {:?}", start.elapsed());
    log::info!("{}", processed.metrics());

    target
        .save_png(&output_path)
        .with_context(|| format!("failed to save {output_path:?}"))?;
    log::info!("wrote {output_path:?}");
    Ok(())
}
