//! A synthetic glyph provider with known outlines and paint programs.
//!
//! Outline glyph ids are small; color glyph ids start at 10 so a test
//! can mix both. All geometry lives on a 10×10 grid with an identity
//! base transform in mind.

use glifo::lyon::math::point;
use glifo::{
    Blob, Color, ColorStop, DrawSession, Extend, GlyphExtents, GlyphProvider, PaintFuncs,
    PaintImageFormat, SimpleColorLine,
};

/// Square outline covering `(0,0)–(10,10)`.
pub const SQUARE_GLYPH: u32 = 1;
/// Square outline covering `(20,0)–(30,10)`.
pub const OFFSET_SQUARE_GLYPH: u32 = 2;
/// Diamond drawn with quadratic curves, inscribed in `(0,0)–(10,10)`.
pub const DIAMOND_GLYPH: u32 = 3;
/// Color glyph: embedded-SVG image paint (document id `glyph7`).
pub const SVG_IMAGE_GLYPH: u32 = 7;
/// Color glyph: solid red clipped to [`SQUARE_GLYPH`].
pub const LAYERED_GLYPH: u32 = 10;
/// Color glyph: green painted through a group composed with `Src`.
pub const GROUP_GLYPH: u32 = 11;
/// Color glyph: black→white linear gradient across `(0,0)–(10,0)`.
pub const GRADIENT_GLYPH: u32 = 12;
/// Color glyph: a single foreground-substituted solid layer.
pub const FOREGROUND_GLYPH: u32 = 13;
/// Color glyph: 2×2 BGRA image paint stretched over the square.
pub const IMAGE_GLYPH: u32 = 14;

pub struct TestFont {
    bgra_tile: Blob,
    svg_doc: Blob,
}

impl Default for TestFont {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFont {
    pub fn new() -> Self {
        // 2×2 premultiplied BGRA tile: top row red, blue; bottom row
        // green, white.
        let pixels: [u32; 4] = [0xFFFF_0000, 0xFF00_00FF, 0xFF00_FF00, 0xFFFF_FFFF];
        let bgra_tile = Blob::new(bytemuck::cast_slice(&pixels).to_vec());

        let svg_doc = Blob::from_str(concat!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\">",
            "<defs><linearGradient id=\"g\">",
            "<stop offset=\"0\" stop-color=\"red\"/>",
            "<stop offset=\"1\" stop-color=\"blue\"/>",
            "</linearGradient></defs>",
            "<g id=\"glyph7\" fill=\"url(#g)\">",
            "<rect x=\"0\" y=\"0\" width=\"10\" height=\"10\"/>",
            "</g>",
            "<g id=\"glyph8\"><rect x=\"0\" y=\"0\" width=\"4\" height=\"4\"/></g>",
            "</svg>",
        ));

        Self { bgra_tile, svg_doc }
    }

    /// The embedded multi-glyph SVG document (covers glyphs 7 and 8).
    pub fn svg_document(&self) -> &Blob {
        &self.svg_doc
    }

    pub fn bgra_tile(&self) -> &Blob {
        &self.bgra_tile
    }
}

fn rect(session: &mut DrawSession<'_>, x0: f32, y0: f32, x1: f32, y1: f32) {
    session.move_to(point(x0, y0));
    session.line_to(point(x1, y0));
    session.line_to(point(x1, y1));
    session.line_to(point(x0, y1));
    session.close_path();
}

impl GlyphProvider for TestFont {
    fn draw_glyph(&self, glyph: u32, session: &mut DrawSession<'_>) -> bool {
        match glyph {
            SQUARE_GLYPH => {
                rect(session, 0.0, 0.0, 10.0, 10.0);
                true
            }
            OFFSET_SQUARE_GLYPH => {
                rect(session, 20.0, 0.0, 30.0, 10.0);
                true
            }
            DIAMOND_GLYPH => {
                session.move_to(point(5.0, 0.0));
                session.quadratic_to(point(8.0, 2.0), point(10.0, 5.0));
                session.quadratic_to(point(8.0, 8.0), point(5.0, 10.0));
                session.quadratic_to(point(2.0, 8.0), point(0.0, 5.0));
                session.quadratic_to(point(2.0, 2.0), point(5.0, 0.0));
                session.close_path();
                true
            }
            _ => false,
        }
    }

    fn paint_glyph(
        &self,
        glyph: u32,
        funcs: &mut dyn PaintFuncs,
        _palette: u32,
        _foreground: Color,
    ) -> bool {
        match glyph {
            LAYERED_GLYPH => {
                funcs.push_clip_glyph(SQUARE_GLYPH, self);
                funcs.color(false, Color::rgb(255, 0, 0));
                funcs.pop_clip();
                true
            }
            GROUP_GLYPH => {
                funcs.push_clip_glyph(SQUARE_GLYPH, self);
                funcs.push_group();
                funcs.color(false, Color::rgb(0, 255, 0));
                funcs.pop_group(glifo::CompositeMode::Src);
                funcs.pop_clip();
                true
            }
            GRADIENT_GLYPH => {
                let line = SimpleColorLine::new(
                    vec![
                        ColorStop::new(0.0, Color::rgb(0, 0, 0)),
                        ColorStop::new(1.0, Color::rgb(255, 255, 255)),
                    ],
                    Extend::Pad,
                );
                funcs.push_clip_rectangle(0.0, 0.0, 10.0, 10.0);
                funcs.linear_gradient(&line, point(0.0, 0.0), point(10.0, 0.0), point(0.0, 1.0));
                funcs.pop_clip();
                true
            }
            FOREGROUND_GLYPH => {
                funcs.push_clip_glyph(SQUARE_GLYPH, self);
                funcs.color(true, Color::rgba(0, 0, 0, 255));
                funcs.pop_clip();
                true
            }
            IMAGE_GLYPH => funcs.image(
                &self.bgra_tile,
                2,
                2,
                PaintImageFormat::Bgra,
                0.0,
                Some(&GlyphExtents { x_bearing: 0.0, y_bearing: 0.0, width: 10.0, height: 10.0 }),
            ),
            SVG_IMAGE_GLYPH => funcs.image(
                &self.svg_doc,
                10,
                10,
                PaintImageFormat::Svg,
                0.0,
                None,
            ),
            _ => false,
        }
    }

    fn glyph_extents(&self, glyph: u32) -> Option<GlyphExtents> {
        match glyph {
            SQUARE_GLYPH | DIAMOND_GLYPH | LAYERED_GLYPH | GROUP_GLYPH | GRADIENT_GLYPH
            | FOREGROUND_GLYPH | IMAGE_GLYPH | SVG_IMAGE_GLYPH => {
                Some(GlyphExtents { x_bearing: 0.0, y_bearing: 0.0, width: 10.0, height: 10.0 })
            }
            OFFSET_SQUARE_GLYPH => {
                Some(GlyphExtents { x_bearing: 20.0, y_bearing: 0.0, width: 10.0, height: 10.0 })
            }
            _ => None,
        }
    }
}
