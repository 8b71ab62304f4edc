//! Rasterizer invariants, checked with raw draw callbacks and the
//! synthetic test font.

use glifo::lyon::math::point;
use glifo::{DrawSession, PixelFormat, RasterBackend, RasterExtents, Rasterizer, Transform};
use glifo_test_scenes::font::{DIAMOND_GLYPH, SQUARE_GLYPH};
use glifo_test_scenes::TestFont;

fn draw_rect(raster: &mut Rasterizer, x0: f32, y0: f32, x1: f32, y1: f32) {
    let mut pen = DrawSession::new(raster);
    pen.move_to(point(x0, y0));
    pen.line_to(point(x1, y0));
    pen.line_to(point(x1, y1));
    pen.line_to(point(x0, y1));
    pen.close_path();
}

/// Same rectangle with the opposite winding direction.
fn draw_rect_reversed(raster: &mut Rasterizer, x0: f32, y0: f32, x1: f32, y1: f32) {
    let mut pen = DrawSession::new(raster);
    pen.move_to(point(x0, y0));
    pen.line_to(point(x0, y1));
    pen.line_to(point(x1, y1));
    pen.line_to(point(x1, y0));
    pen.close_path();
}

#[test]
fn rectangle_geometry() {
    let mut raster = Rasterizer::new();
    draw_rect(&mut raster, 2.0, 2.0, 30.0, 30.0);

    let image = raster.render();
    let ext = image.extents();
    assert_eq!(ext.x_origin, 2);
    assert_eq!(ext.y_origin, 2);
    assert_eq!(ext.width, 28);
    assert_eq!(ext.height, 28);
    assert!(ext.stride >= ext.width);
    assert_eq!(image.buffer().len(), (ext.stride * ext.height) as usize);

    // Center: fully inside.
    assert_eq!(image.alpha_at(16, 16), 255);

    // Well outside the box.
    assert_eq!(image.alpha_at(0, 0), 0);
    assert_eq!(image.alpha_at(31, 31), 0);

    // Left-most and right-most pixel columns are fully inside because
    // integer box edges align with pixel boundaries.
    assert_eq!(image.alpha_at(2, 16), 255);
    assert_eq!(image.alpha_at(29, 16), 255);

    // One pixel beyond the right edge is outside the image.
    assert_eq!(image.alpha_at(30, 16), 0);
}

#[test]
fn empty_render_after_render() {
    let mut raster = Rasterizer::new();
    draw_rect(&mut raster, 2.0, 2.0, 30.0, 30.0);
    let _ = raster.render();

    // render() cleared the accumulated edges: a second render with no
    // new geometry produces a valid 0×0 image.
    let image = raster.render();
    assert_eq!(image.extents().width, 0);
    assert_eq!(image.extents().height, 0);
    assert!(image.buffer().is_empty());
}

#[test]
fn render_keeps_format_and_transform() {
    let mut raster = Rasterizer::new();
    raster.set_format(PixelFormat::Bgra32);
    let transform = Transform::new(2.0, 0.0, 0.0, 2.0, 1.0, 1.0);
    raster.set_transform(transform);
    draw_rect(&mut raster, 0.0, 0.0, 4.0, 4.0);
    let _ = raster.render();

    assert_eq!(raster.format(), PixelFormat::Bgra32);
    assert_eq!(raster.transform(), transform);
}

#[test]
fn accumulate_disjoint_shapes() {
    let mut raster = Rasterizer::new();
    draw_rect(&mut raster, 0.0, 0.0, 10.0, 10.0);
    draw_rect(&mut raster, 20.0, 0.0, 30.0, 10.0);

    let image = raster.render();
    assert_eq!(image.alpha_at(5, 5), 255);
    assert_eq!(image.alpha_at(25, 5), 255);
    assert_eq!(image.alpha_at(15, 5), 0);
}

#[test]
fn subpixel_edge_coverage() {
    let mut raster = Rasterizer::new();
    draw_rect(&mut raster, 2.5, 2.0, 30.0, 30.0);

    let image = raster.render();

    // The pixel straddling the left edge gets partial coverage.
    let v = image.alpha_at(2, 16);
    assert!(v > 0 && v < 255, "expected partial coverage, got {v}");

    // The next column is fully inside.
    assert_eq!(image.alpha_at(3, 16), 255);
}

#[test]
fn winding_cancellation() {
    let mut raster = Rasterizer::new();
    draw_rect(&mut raster, 0.0, 0.0, 10.0, 10.0);
    draw_rect_reversed(&mut raster, 0.0, 0.0, 10.0, 10.0);

    let image = raster.render();
    assert!(
        image.buffer().iter().all(|&b| b == 0),
        "opposite windings must cancel to an all-zero image"
    );
}

#[test]
fn scale_transform() {
    let mut raster = Rasterizer::new();
    raster.set_transform(Transform::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0));
    draw_rect(&mut raster, 0.0, 0.0, 10.0, 10.0);

    let image = raster.render();
    let ext = image.extents();
    assert_eq!((ext.x_origin, ext.y_origin), (0, 0));
    assert_eq!((ext.width, ext.height), (20, 20));
    assert_eq!(image.alpha_at(10, 10), 255);

    // Scaling by 2 quadruples the covered pixel count exactly for an
    // integer-aligned box.
    let covered = image
        .buffer()
        .iter()
        .filter(|&&b| b == 255)
        .count();
    assert_eq!(covered, 400);
}

#[test]
fn auto_extents_are_tight() {
    let mut raster = Rasterizer::new();
    draw_rect(&mut raster, 1.5, 1.5, 8.5, 8.5);

    let image = raster.render();
    let ext = image.extents();
    assert_eq!((ext.x_origin, ext.y_origin), (1, 1));
    assert_eq!((ext.width, ext.height), (8, 8));

    // No fully-transparent border row or column.
    let stride = ext.stride as usize;
    let w = ext.width as usize;
    let h = ext.height as usize;
    let buf = image.buffer();
    let row_nonzero = |row: usize| buf[row * stride..row * stride + w].iter().any(|&b| b != 0);
    let col_nonzero = |col: usize| (0..h).any(|row| buf[row * stride + col] != 0);
    assert!(row_nonzero(0));
    assert!(row_nonzero(h - 1));
    assert!(col_nonzero(0));
    assert!(col_nonzero(w - 1));
}

#[test]
fn fixed_extents_override() {
    let mut raster = Rasterizer::new();
    raster.set_extents(RasterExtents::new(0, 0, 16, 16));
    draw_rect(&mut raster, 2.0, 2.0, 6.0, 6.0);

    let image = raster.render();
    let ext = image.extents();
    assert_eq!((ext.width, ext.height), (16, 16));
    assert_eq!(ext.stride, 16);
    assert_eq!(image.alpha_at(4, 4), 255);
    assert_eq!(image.alpha_at(10, 10), 0);
}

#[test]
fn backend_parity_on_interior_and_exterior() {
    let render_with = |backend: RasterBackend| {
        let mut raster = Rasterizer::new();
        raster.set_backend(backend);
        raster.set_extents(RasterExtents::new(0, 0, 12, 12));
        draw_rect(&mut raster, 2.0, 2.0, 10.0, 10.0);
        raster.render()
    };

    let analytic = render_with(RasterBackend::Analytic);
    let multisample = render_with(RasterBackend::Multisample);

    for y in 0..12 {
        for x in 0..12 {
            let a = analytic.alpha_at(x, y);
            let m = multisample.alpha_at(x, y);
            let interior = (2..10).contains(&x) && (2..10).contains(&y);
            if interior {
                assert_eq!(a, 255, "analytic interior at ({x},{y})");
                assert_eq!(m, 255, "multisample interior at ({x},{y})");
            } else {
                assert_eq!(a, 0, "analytic exterior at ({x},{y})");
                assert_eq!(m, 0, "multisample exterior at ({x},{y})");
            }
        }
    }
}

#[test]
fn backend_parity_on_curves_is_close() {
    let font = TestFont::new();
    let render_with = |backend: RasterBackend| {
        let mut raster = Rasterizer::new();
        raster.set_backend(backend);
        raster.set_extents(RasterExtents::new(0, 0, 10, 10));
        assert!(raster.draw_glyph(&font, DIAMOND_GLYPH));
        raster.render()
    };

    let analytic = render_with(RasterBackend::Analytic);
    let multisample = render_with(RasterBackend::Multisample);

    for y in 0..10 {
        for x in 0..10 {
            let a = analytic.alpha_at(x, y) as i32;
            let m = multisample.alpha_at(x, y) as i32;
            // Eight samples quantize coverage to ~32-step levels.
            assert!(
                (a - m).abs() <= 40,
                "backends disagree at ({x},{y}): analytic {a}, multisample {m}"
            );
        }
    }
}

#[test]
fn bgra32_output_expands_coverage() {
    let mut raster = Rasterizer::new();
    raster.set_format(PixelFormat::Bgra32);
    draw_rect(&mut raster, 0.0, 0.0, 4.0, 4.0);

    let image = raster.render();
    let ext = image.extents();
    assert_eq!(ext.stride, ext.width * 4);
    // Interior coverage expands to premultiplied white.
    assert_eq!(&image.buffer()[..4], &[255, 255, 255, 255]);
}

#[test]
fn recycled_image_keeps_rendering_correct() {
    let mut raster = Rasterizer::new();
    draw_rect(&mut raster, 0.0, 0.0, 10.0, 10.0);
    let first = raster.render();
    assert_eq!(first.alpha_at(5, 5), 255);

    raster.recycle_image(first);
    draw_rect(&mut raster, 0.0, 0.0, 4.0, 4.0);
    let second = raster.render();
    assert_eq!(second.extents().width, 4);
    assert_eq!(second.alpha_at(2, 2), 255);
    assert_eq!(second.alpha_at(3, 3), 255);
}

#[test]
fn image_user_data_is_typed_and_not_cloned() {
    let mut raster = Rasterizer::new();
    draw_rect(&mut raster, 0.0, 0.0, 4.0, 4.0);
    let mut image = raster.render();

    image.set_user_data(Box::new(42u32));
    assert_eq!(image.user_data().and_then(|d| d.downcast_ref::<u32>()), Some(&42));
    assert_eq!(image.user_data().and_then(|d| d.downcast_ref::<String>()), None);

    // Cloning copies pixels, not the attached data.
    let copy = image.clone();
    assert!(copy.user_data().is_none());
    assert_eq!(copy.buffer(), image.buffer());
}

#[test]
fn glyph_outline_through_provider() {
    let font = TestFont::new();
    let mut raster = Rasterizer::new();
    assert!(raster.draw_glyph(&font, SQUARE_GLYPH));

    let image = raster.render();
    assert_eq!(image.extents().width, 10);
    assert_eq!(image.alpha_at(5, 5), 255);

    // Unknown glyphs report no outline and leave no geometry behind.
    assert!(!raster.draw_glyph(&font, 999));
    let empty = raster.render();
    assert_eq!(empty.extents().width, 0);
}
