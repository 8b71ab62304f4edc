//! Paint engine scenarios over the synthetic test font.

use glifo::lyon::math::point;
use glifo::{
    Color, ColorStop, CompositeMode, Extend, PaintFuncs, Painter, RasterExtents, SimpleColorLine,
};
use glifo_test_scenes::font::{
    FOREGROUND_GLYPH, GRADIENT_GLYPH, GROUP_GLYPH, IMAGE_GLYPH, LAYERED_GLYPH,
};
use glifo_test_scenes::{check_pixels, PixelExpectation, TestFont};

fn assert_pixels(image: &glifo::Image, expectations: &[PixelExpectation]) {
    let failures = check_pixels(image, expectations);
    if !failures.is_empty() {
        panic!(
            "{} pixel expectation(s) failed:\n{}",
            failures.len(),
            failures.join("\n"),
        );
    }
}

#[test]
fn layered_glyph_paints_clipped_solid() {
    let font = TestFont::new();
    let mut painter = Painter::new();

    let image = painter
        .paint_glyph(&font, LAYERED_GLYPH, 0, Color::BLACK)
        .expect("glyph has extents");

    assert_eq!(image.extents().width, 10);
    assert_pixels(
        &image,
        &[
            PixelExpectation::opaque(0, 0, 255, 0, 0, "corner"),
            PixelExpectation::opaque(5, 5, 255, 0, 0, "center"),
            PixelExpectation::opaque(9, 9, 255, 0, 0, "far corner"),
        ],
    );
}

#[test]
fn group_composed_with_src_overwrites_parent() {
    let font = TestFont::new();
    let mut painter = Painter::new();

    let image = painter
        .paint_glyph(&font, GROUP_GLYPH, 0, Color::BLACK)
        .expect("glyph has extents");

    assert_pixels(
        &image,
        &[
            PixelExpectation::opaque(2, 2, 0, 255, 0, "green interior"),
            PixelExpectation::opaque(7, 7, 0, 255, 0, "green interior 2"),
        ],
    );
}

#[test]
fn clip_rectangle_bounds_painting() {
    let mut painter = Painter::new();
    painter.set_extents(RasterExtents::new(0, 0, 10, 10));

    painter.push_clip_rectangle(2.0, 2.0, 6.0, 6.0);
    painter.color(false, Color::rgb(255, 0, 0));
    painter.pop_clip();

    // A later paint in a different clip must not disturb the red
    // region.
    painter.push_clip_rectangle(0.0, 0.0, 2.0, 2.0);
    painter.color(false, Color::rgb(0, 255, 0));
    painter.pop_clip();

    let image = painter.render().expect("extents set");
    assert_pixels(
        &image,
        &[
            PixelExpectation::opaque(3, 3, 255, 0, 0, "red region"),
            PixelExpectation::opaque(5, 5, 255, 0, 0, "red region edge"),
            PixelExpectation::opaque(1, 1, 0, 255, 0, "green region"),
            PixelExpectation::transparent(7, 7, "outside both clips"),
            PixelExpectation::transparent(6, 3, "right of red clip"),
        ],
    );
}

#[test]
fn linear_gradient_produces_monotonic_ramp() {
    let font = TestFont::new();
    let mut painter = Painter::new();

    let image = painter
        .paint_glyph(&font, GRADIENT_GLYPH, 0, Color::BLACK)
        .expect("glyph has extents");

    let ext = image.extents();
    let mut previous = -1i32;
    for x in 0..ext.width as i32 {
        let offset = (5 * ext.stride + x as u32 * 4) as usize;
        let blue = image.buffer()[offset] as i32;
        let green = image.buffer()[offset + 1] as i32;
        let red = image.buffer()[offset + 2] as i32;
        assert_eq!(blue, green);
        assert_eq!(green, red);
        assert!(blue > previous, "ramp must increase: {blue} after {previous} at x={x}");
        previous = blue;
    }

    // Sampled at pixel centers: t = (x + 0.5) / 10.
    let mid = (5 * ext.stride + 4 * 4) as usize;
    let value = image.buffer()[mid] as i32;
    assert!((value - 115).abs() <= 3, "midpoint sample off: {value}");
}

#[test]
fn foreground_color_is_substituted() {
    let font = TestFont::new();
    let mut painter = Painter::new();

    let image = painter
        .paint_glyph(&font, FOREGROUND_GLYPH, 0, Color::rgb(255, 0, 0))
        .expect("glyph has extents");

    assert_pixels(&image, &[PixelExpectation::opaque(5, 5, 255, 0, 0, "foreground red")]);
}

#[test]
fn image_paint_samples_nearest_texel() {
    let font = TestFont::new();
    let mut painter = Painter::new();

    let image = painter
        .paint_glyph(&font, IMAGE_GLYPH, 0, Color::BLACK)
        .expect("glyph has extents");

    // The 2×2 source tile is anchored bottom-left in glyph space, so
    // its top row lands at the bottom of the identity-transformed
    // output.
    assert_pixels(
        &image,
        &[
            PixelExpectation::opaque(2, 2, 0, 255, 0, "bottom-left texel"),
            PixelExpectation::opaque(7, 2, 255, 255, 255, "bottom-right texel"),
            PixelExpectation::opaque(2, 7, 255, 0, 0, "top-left texel"),
            PixelExpectation::opaque(7, 7, 0, 0, 255, "top-right texel"),
        ],
    );
}

#[test]
fn radial_and_sweep_gradients_paint() {
    let line = SimpleColorLine::new(
        vec![
            ColorStop::new(0.0, Color::rgb(255, 0, 0)),
            ColorStop::new(1.0, Color::rgb(0, 0, 255)),
        ],
        Extend::Pad,
    );

    let mut painter = Painter::new();
    painter.set_extents(RasterExtents::new(0, 0, 10, 10));
    painter.push_clip_rectangle(0.0, 0.0, 10.0, 10.0);
    painter.radial_gradient(&line, point(5.0, 5.0), 0.0, point(5.0, 5.0), 5.0);
    painter.pop_clip();
    let radial = painter.render().expect("extents set");

    // Near the center t ≈ 0 (red); at the corner t > 1 pads to blue.
    let center = radial.buffer()[(5 * radial.extents().stride + 5 * 4) as usize + 2];
    assert!(center > 200, "center should be red-dominant, got {center}");
    assert_pixels(&radial, &[PixelExpectation::opaque(0, 0, 0, 0, 255, "corner pads to blue")]);

    let mut painter = Painter::new();
    painter.set_extents(RasterExtents::new(0, 0, 10, 10));
    painter.push_clip_rectangle(0.0, 0.0, 10.0, 10.0);
    painter.sweep_gradient(&line, point(5.0, 5.0), 0.0, 2.0 * std::f32::consts::PI);
    painter.pop_clip();
    let sweep = painter.render().expect("extents set");

    // Just right of center the angle is near the seam at 0: red.
    let offset = (5 * sweep.extents().stride + 9 * 4) as usize;
    let red = sweep.buffer()[offset + 2];
    let blue = sweep.buffer()[offset];
    assert!(red > blue, "near-seam pixel should be red-dominant ({red} vs {blue})");
}

#[test]
fn unbalanced_groups_are_released_at_render() {
    let mut painter = Painter::new();
    painter.set_extents(RasterExtents::new(0, 0, 4, 4));

    painter.push_group();
    painter.push_group();
    painter.push_clip_rectangle(0.0, 0.0, 4.0, 4.0);
    painter.color(false, Color::rgb(0, 0, 255));
    painter.pop_clip();
    // Neither group is popped; render must still produce the root and
    // reclaim the extras.
    let image = painter.render().expect("extents set");
    assert_eq!(image.extents().width, 4);

    // The painter remains usable afterwards.
    painter.set_extents(RasterExtents::new(0, 0, 4, 4));
    painter.push_clip_rectangle(0.0, 0.0, 4.0, 4.0);
    painter.color(false, Color::rgb(255, 0, 0));
    painter.pop_clip();
    let image = painter.render().expect("extents set");
    assert_pixels(&image, &[PixelExpectation::opaque(1, 1, 255, 0, 0, "after imbalance")]);
}

#[test]
fn render_without_extents_returns_none() {
    let mut painter = Painter::new();
    painter.push_clip_rectangle(0.0, 0.0, 4.0, 4.0);
    painter.color(false, Color::rgb(255, 0, 0));
    painter.pop_clip();
    assert!(painter.render().is_none());
}

#[test]
fn pop_group_modes_compose() {
    // DestOut with an opaque group erases the parent.
    let mut painter = Painter::new();
    painter.set_extents(RasterExtents::new(0, 0, 4, 4));
    painter.push_clip_rectangle(0.0, 0.0, 4.0, 4.0);
    painter.color(false, Color::rgb(255, 0, 0));

    painter.push_group();
    painter.color(false, Color::rgb(0, 255, 0));
    painter.pop_group(CompositeMode::DestOut);
    painter.pop_clip();

    let image = painter.render().expect("extents set");
    assert_pixels(&image, &[PixelExpectation::transparent(2, 2, "erased by DestOut")]);
}
