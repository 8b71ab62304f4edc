//! The color-paint protocol.
//!
//! Color glyph descriptions reach the paint engine and the SVG paint
//! emitter as a stream of [`PaintFuncs`] callbacks driven by the host's
//! font-paint implementation. Every `push_*` must be balanced by its
//! matching `pop_*` before the host returns.

use lyon::math::Point;

use crate::blob::Blob;
use crate::color::Color;
use crate::compose::CompositeMode;
use crate::draw::DrawSession;
use crate::geometry::{GlyphExtents, Transform};

/// Gradient behavior outside the `t ∈ [0, 1]` stop range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extend {
    #[default]
    Pad,
    Repeat,
    Reflect,
}

/// One gradient color stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    /// When set, `color`'s RGB is replaced by the configured foreground
    /// color; the stop alpha is multiplied by the foreground alpha.
    pub is_foreground: bool,
    pub color: Color,
}

impl ColorStop {
    pub fn new(offset: f32, color: Color) -> Self {
        Self { offset, is_foreground: false, color }
    }

    pub fn foreground(offset: f32, alpha: u8) -> Self {
        Self {
            offset,
            is_foreground: true,
            color: Color::rgba(0, 0, 0, alpha),
        }
    }
}

/// Host-supplied gradient color line.
pub trait ColorLine {
    fn stops(&self) -> &[ColorStop];
    fn extend(&self) -> Extend;
}

/// A color line backed by a slice of stops; the common case for hosts
/// and tests.
#[derive(Debug, Clone)]
pub struct SimpleColorLine {
    pub stops: Vec<ColorStop>,
    pub extend: Extend,
}

impl SimpleColorLine {
    pub fn new(stops: Vec<ColorStop>, extend: Extend) -> Self {
        Self { stops, extend }
    }
}

impl ColorLine for SimpleColorLine {
    fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    fn extend(&self) -> Extend {
        self.extend
    }
}

/// Payload format of an image paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintImageFormat {
    /// Raw premultiplied BGRA32 pixels, `width * height * 4` bytes.
    Bgra,
    /// An SVG document covering one or more glyphs.
    Svg,
}

/// The host side of glyph rendering: sources glyph outlines and color
/// paint programs.
///
/// Shaping, font parsing and variation interpolation live entirely on
/// the host side of this trait.
pub trait GlyphProvider {
    /// Draws the outline of `glyph` through the session pen. Returns
    /// `false` when the glyph has no outline.
    fn draw_glyph(&self, glyph: u32, session: &mut DrawSession<'_>) -> bool;

    /// Replays the color paint program of `glyph` into `funcs`. Returns
    /// `false` when the glyph has no color description.
    fn paint_glyph(
        &self,
        glyph: u32,
        funcs: &mut dyn PaintFuncs,
        palette: u32,
        foreground: Color,
    ) -> bool {
        let _ = (glyph, funcs, palette, foreground);
        false
    }

    /// Glyph-space bounding box, when known.
    fn glyph_extents(&self, glyph: u32) -> Option<GlyphExtents> {
        let _ = glyph;
        None
    }
}

/// Receiver of color-paint callbacks.
///
/// Implemented by [`Painter`](crate::Painter) and
/// [`SvgPaint`](crate::SvgPaint). Operations that the original paint
/// sources may leave unimplemented carry defaults.
pub trait PaintFuncs {
    fn push_transform(&mut self, transform: Transform);

    fn pop_transform(&mut self);

    /// Gives the sink a chance to handle a nested color glyph itself.
    /// Returning `false` asks the host to recurse into the glyph's
    /// paint program instead.
    fn color_glyph(&mut self, glyph: u32, font: &dyn GlyphProvider) -> bool {
        let _ = (glyph, font);
        false
    }

    fn push_clip_glyph(&mut self, glyph: u32, font: &dyn GlyphProvider);

    fn push_clip_rectangle(&mut self, xmin: f32, ymin: f32, xmax: f32, ymax: f32);

    fn pop_clip(&mut self);

    fn color(&mut self, is_foreground: bool, color: Color);

    /// Paints a raster or SVG image. Returns `false` when the payload
    /// format is not supported by this sink.
    fn image(
        &mut self,
        image: &Blob,
        width: u32,
        height: u32,
        format: PaintImageFormat,
        slant: f32,
        extents: Option<&GlyphExtents>,
    ) -> bool {
        let _ = (image, width, height, format, slant, extents);
        false
    }

    /// Linear gradient between the three-anchor form `(p0, p1, p2)`.
    fn linear_gradient(&mut self, color_line: &dyn ColorLine, p0: Point, p1: Point, p2: Point);

    fn radial_gradient(
        &mut self,
        color_line: &dyn ColorLine,
        c0: Point,
        r0: f32,
        c1: Point,
        r1: f32,
    );

    /// Sweep gradient around `center`; angles are radians.
    fn sweep_gradient(
        &mut self,
        color_line: &dyn ColorLine,
        center: Point,
        start_angle: f32,
        end_angle: f32,
    );

    fn push_group(&mut self);

    fn pop_group(&mut self, mode: CompositeMode);

    /// Resolves a custom palette entry. `None` defers to the host's
    /// palette data.
    fn custom_palette_color(&mut self, color_index: u32) -> Option<Color> {
        let _ = color_index;
        None
    }
}
