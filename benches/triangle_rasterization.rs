use criterion::{black_box, criterion_group, criterion_main, Criterion};

use transform_shader::{
    config::{CullingMode, DrawConfig},
    pipeline::Pipeline,
    target::RenderTarget,
    vert_buf::Vertex3,
};

fn triangle_rasterization(c: &mut Criterion) {
    const WIDTH: usize = 720;
    const HEIGHT: usize = 720;

    let mut group = c.benchmark_group("Triangle rasterization");

    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/scenes/cube.toml");
    let config = DrawConfig::load_toml(path).unwrap();
    let vert_buf = config.vert_buf::<Vertex3>().unwrap();
    let uniforms = config.uniforms();
    let clear_color = config.rendering.clear_color;

    let mut target = RenderTarget::new(WIDTH, HEIGHT);

    group.bench_function("process_vertices", |b| {
        let mut pipeline = Pipeline::new(config.pipeline_config());
        b.iter(|| {
            let processed = pipeline.process_vertices(&uniforms, &vert_buf).unwrap();
            black_box(processed.vertices());
        })
    });

    for culling in CullingMode::enumerate() {
        group.bench_function(format!("draw_cube/{culling}"), |b| {
            let mut pipeline = Pipeline::new(config.pipeline_config());
            pipeline.with_culling(culling);
            b.iter(|| {
                target.clear(clear_color);
                let mut processed = pipeline.process_vertices(&uniforms, &vert_buf).unwrap();
                processed.draw(&mut target);
                black_box(target.color());
            })
        });
    }

    target.save_png("bench.png").unwrap();

    group.finish();
}

criterion_group!(benches, triangle_rasterization);
criterion_main!(benches);
