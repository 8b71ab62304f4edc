//! SVG emitter scenarios: outline dedup, paint serialization, color
//! glyph memoization.

use glifo::lyon::math::point;
use glifo::{
    Color, ColorStop, CompositeMode, Extend, ExtentsMode, PaintFuncs, SimpleColorLine, SvgDraw,
    SvgPaint, Transform, VectorExtents,
};
use glifo_test_scenes::font::{LAYERED_GLYPH, SQUARE_GLYPH, SVG_IMAGE_GLYPH};
use glifo_test_scenes::TestFont;

fn render_text(blob: glifo::Blob) -> String {
    String::from_utf8(blob.as_bytes().to_vec()).expect("emitters write UTF-8")
}

#[test]
fn repeated_glyphs_share_one_defs_path() {
    let font = TestFont::new();
    let mut draw = SvgDraw::new();

    assert!(draw.draw_glyph(&font, SQUARE_GLYPH, 0.0, 0.0, ExtentsMode::Expand));
    assert!(draw.draw_glyph(&font, SQUARE_GLYPH, 20.0, 0.0, ExtentsMode::Expand));

    let text = render_text(draw.render().expect("extents established"));
    assert_eq!(text.matches("<path id=\"p1\"").count(), 1);
    assert_eq!(text.matches("<use href=\"#p1\"").count(), 2);
    assert!(text.contains("<defs>"));
}

#[test]
fn flat_mode_inlines_paths() {
    let font = TestFont::new();
    let mut draw = SvgDraw::new();
    draw.set_flat(true);

    assert!(draw.draw_glyph(&font, SQUARE_GLYPH, 0.0, 0.0, ExtentsMode::Expand));
    assert!(draw.draw_glyph(&font, SQUARE_GLYPH, 20.0, 0.0, ExtentsMode::Expand));

    let text = render_text(draw.render().expect("extents established"));
    assert_eq!(text.matches("<path d=").count(), 2);
    assert!(!text.contains("<use"));
    assert!(!text.contains("<defs>"));
}

#[test]
fn view_box_follows_extents() {
    let font = TestFont::new();
    let mut draw = SvgDraw::new();
    draw.set_extents(Some(&VectorExtents::new(0.0, 0.0, 10.0, 10.0)));
    assert!(draw.draw_glyph(&font, SQUARE_GLYPH, 0.0, 0.0, ExtentsMode::Keep));

    let text = render_text(draw.render().expect("extents set"));
    assert!(text.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 10 10\""));
    assert!(text.contains("width=\"10\" height=\"10\""));
    assert!(text.ends_with("</svg>\n"));
}

#[test]
fn render_without_extents_is_none_and_state_clears() {
    let font = TestFont::new();
    let mut draw = SvgDraw::new();
    assert!(draw.render().is_none());

    assert!(draw.draw_glyph(&font, SQUARE_GLYPH, 0.0, 0.0, ExtentsMode::Expand));
    let first = render_text(draw.render().expect("extents established"));
    assert!(first.contains("<path id=\"p1\""));

    // The defined-glyph set was cleared with the document: the next
    // document re-emits the def.
    assert!(draw.draw_glyph(&font, SQUARE_GLYPH, 0.0, 0.0, ExtentsMode::Expand));
    let second = render_text(draw.render().expect("extents established"));
    assert!(second.contains("<path id=\"p1\""));
}

#[test]
fn recycled_blob_buffer_is_reused_safely() {
    let font = TestFont::new();
    let mut draw = SvgDraw::new();

    assert!(draw.draw_glyph(&font, SQUARE_GLYPH, 0.0, 0.0, ExtentsMode::Expand));
    let blob = draw.render().expect("extents established");
    let first = render_text(blob.clone());

    draw.recycle_blob(blob);
    assert!(draw.draw_glyph(&font, SQUARE_GLYPH, 0.0, 0.0, ExtentsMode::Expand));
    let second = render_text(draw.render().expect("extents established"));
    assert_eq!(first, second);
}

#[test]
fn foreground_stop_color_is_substituted() {
    let mut paint = SvgPaint::new();
    paint.set_extents(Some(&VectorExtents::new(0.0, 0.0, 10.0, 10.0)));
    paint.set_foreground(Color::rgba(255, 0, 0, 255));

    let line = SimpleColorLine::new(
        vec![ColorStop::foreground(0.0, 255), ColorStop::new(1.0, Color::rgb(0, 0, 255))],
        Extend::Pad,
    );
    paint.linear_gradient(&line, point(0.0, 0.0), point(10.0, 0.0), point(0.0, 1.0));

    let text = render_text(paint.render().expect("extents set"));
    assert!(text.contains("stop-color=\"rgb(255,0,0)\""), "missing substituted stop: {text}");
    assert!(text.contains("<linearGradient id=\"gr0\""));
    assert!(text.contains("spreadMethod=\"pad\""));
    assert!(text.contains("fill=\"url(#gr0)\""));
}

#[test]
fn blendable_group_gets_css_mix_blend_mode() {
    let mut paint = SvgPaint::new();
    paint.set_extents(Some(&VectorExtents::new(0.0, 0.0, 10.0, 10.0)));

    paint.push_group();
    paint.color(false, Color::rgb(0, 128, 0));
    paint.pop_group(CompositeMode::Multiply);

    paint.push_group();
    paint.color(false, Color::rgb(0, 0, 128));
    paint.pop_group(CompositeMode::SrcIn);

    let text = render_text(paint.render().expect("extents set"));
    assert!(text.contains("<g style=\"mix-blend-mode:multiply\">"));
    // SrcIn has no CSS equivalent; the group inlines plainly.
    assert!(!text.contains("mix-blend-mode:src"));
}

#[test]
fn identity_transform_groups_are_elided() {
    let mut paint = SvgPaint::new();
    paint.set_extents(Some(&VectorExtents::new(0.0, 0.0, 10.0, 10.0)));

    paint.push_transform(Transform::IDENTITY);
    paint.color(false, Color::rgb(255, 0, 0));
    paint.pop_transform();

    paint.push_transform(Transform::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0));
    paint.color(false, Color::rgb(0, 255, 0));
    paint.pop_transform();

    let text = render_text(paint.render().expect("extents set"));
    assert_eq!(text.matches("<g transform=\"matrix(").count(), 1);
    assert!(text.contains("matrix(2,0,0,2,0,0)"));
    // The single scale group was closed.
    assert_eq!(text.matches("</g>").count(), 1);
}

#[test]
fn clip_glyph_emits_clip_path_defs() {
    let font = TestFont::new();
    let mut paint = SvgPaint::new();
    paint.set_extents(Some(&VectorExtents::new(0.0, 0.0, 10.0, 10.0)));

    paint.push_clip_glyph(SQUARE_GLYPH, &font);
    paint.color(false, Color::rgb(255, 0, 0));
    paint.pop_clip();
    // Re-clipping to the same glyph reuses both defs.
    paint.push_clip_glyph(SQUARE_GLYPH, &font);
    paint.color(false, Color::rgb(0, 255, 0));
    paint.pop_clip();

    let text = render_text(paint.render().expect("extents set"));
    assert_eq!(text.matches("<path id=\"p1\"").count(), 1);
    assert_eq!(text.matches("<clipPath id=\"clip-g1\"").count(), 1);
    assert_eq!(text.matches("<g clip-path=\"url(#clip-g1)\">").count(), 2);
}

#[test]
fn color_glyphs_are_memoized_per_key() {
    let font = TestFont::new();
    let mut paint = SvgPaint::new();
    paint.set_extents(Some(&VectorExtents::new(0.0, 0.0, 40.0, 10.0)));

    assert!(paint.paint_glyph(&font, LAYERED_GLYPH, 0.0, 0.0, ExtentsMode::Keep, 0, Color::BLACK));
    assert!(paint.paint_glyph(&font, LAYERED_GLYPH, 20.0, 0.0, ExtentsMode::Keep, 0, Color::BLACK));

    let text = render_text(paint.render().expect("extents set"));
    assert_eq!(text.matches("<g id=\"cg0\">").count(), 1);
    assert_eq!(text.matches("<use href=\"#cg0\"").count(), 2);
}

#[test]
fn different_foregrounds_are_distinct_cache_entries() {
    let font = TestFont::new();
    let mut paint = SvgPaint::new();
    paint.set_extents(Some(&VectorExtents::new(0.0, 0.0, 40.0, 10.0)));

    assert!(paint.paint_glyph(
        &font,
        LAYERED_GLYPH,
        0.0,
        0.0,
        ExtentsMode::Keep,
        0,
        Color::rgb(255, 0, 0)
    ));
    assert!(paint.paint_glyph(
        &font,
        LAYERED_GLYPH,
        20.0,
        0.0,
        ExtentsMode::Keep,
        0,
        Color::rgb(0, 0, 255)
    ));

    let text = render_text(paint.render().expect("extents set"));
    assert!(text.contains("<g id=\"cg0\">"));
    assert!(text.contains("<g id=\"cg1\">"));
}

#[test]
fn embedded_svg_image_is_subset_and_prefixed() {
    let font = TestFont::new();
    let mut paint = SvgPaint::new();
    paint.set_extents(Some(&VectorExtents::new(0.0, 0.0, 10.0, 10.0)));

    assert!(paint.paint_glyph(
        &font,
        SVG_IMAGE_GLYPH,
        0.0,
        0.0,
        ExtentsMode::Keep,
        0,
        Color::BLACK
    ));

    let text = render_text(paint.render().expect("extents set"));
    // The gradient dependency was pulled into defs under a fresh
    // prefix, and the glyph subtree references it.
    assert_eq!(text.matches("<linearGradient id=\"hbimg0_g\"").count(), 1);
    assert!(text.contains("url(#hbimg0_g)"));
    assert!(text.contains("id=\"hbimg0_glyph7\""));
    // An image-like color glyph is placed translate-only.
    assert!(text.contains("<use href=\"#cg0\" transform=\"translate("));
}

#[test]
fn paint_glyph_flat_mode_skips_memoization() {
    let font = TestFont::new();
    let mut paint = SvgPaint::new();
    paint.set_flat(true);
    paint.set_extents(Some(&VectorExtents::new(0.0, 0.0, 40.0, 10.0)));

    assert!(paint.paint_glyph(&font, LAYERED_GLYPH, 0.0, 0.0, ExtentsMode::Keep, 0, Color::BLACK));
    assert!(paint.paint_glyph(&font, LAYERED_GLYPH, 20.0, 0.0, ExtentsMode::Keep, 0, Color::BLACK));

    let text = render_text(paint.render().expect("extents set"));
    assert!(!text.contains("<use href=\"#cg"));
    assert_eq!(text.matches("<g clip-path=\"url(#clip-g1)\">").count(), 2);
}
