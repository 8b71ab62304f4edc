use criterion::{criterion_group, criterion_main, Criterion};
use glifo::lyon::math::point;
use glifo::{DrawSession, RasterBackend, Rasterizer};

fn draw_curved_shape(raster: &mut Rasterizer) {
    let mut pen = DrawSession::new(raster);
    pen.move_to(point(32.0, 2.0));
    pen.cubic_to(point(60.0, 2.0), point(62.0, 30.0), point(62.0, 32.0));
    pen.cubic_to(point(62.0, 60.0), point(34.0, 62.0), point(32.0, 62.0));
    pen.cubic_to(point(4.0, 62.0), point(2.0, 34.0), point(2.0, 32.0));
    pen.cubic_to(point(2.0, 4.0), point(30.0, 2.0), point(32.0, 2.0));
    pen.close_path();
}

fn rasterizer_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("rasterizer");

    group.bench_function("analytic_64px", |b| {
        let mut raster = Rasterizer::new();
        b.iter(|| {
            draw_curved_shape(&mut raster);
            let image = raster.render();
            std::hint::black_box(image.alpha_at(32, 32));
            raster.recycle_image(image);
        })
    });

    group.bench_function("multisample_64px", |b| {
        let mut raster = Rasterizer::new();
        raster.set_backend(RasterBackend::Multisample);
        b.iter(|| {
            draw_curved_shape(&mut raster);
            let image = raster.render();
            std::hint::black_box(image.alpha_at(32, 32));
            raster.recycle_image(image);
        })
    });

    group.finish();
}

criterion_group!(benches, rasterizer_benchmarks);
criterion_main!(benches);
