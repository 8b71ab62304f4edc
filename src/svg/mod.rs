//! SVG output: vector draw/paint serialization and embedded-SVG glyph
//! subsetting.
//!
//! The emitters build their documents out of plain `String` buffers;
//! the helpers here implement the shared numeric formatting rules
//! (caller-configurable precision, trailing-zero stripping, rounded-zero
//! threshold) and the instance-transform notation both emitters use.

use std::fmt::Write as _;

use lyon::math::Point;

use crate::color::Color;
use crate::draw::{DrawFuncs, DrawState};
use crate::geometry::{GlyphExtents, Transform, VectorExtents};

mod draw;
mod paint;
pub mod subset;

pub use draw::SvgDraw;
pub use paint::SvgPaint;
pub use subset::{SvgDocument, SvgDocumentStore};

/// Hard cap on configurable output precision.
pub(crate) const MAX_PRECISION: u32 = 12;

/// Appends a float with the given decimal precision, stripping trailing
/// zeros and a trailing decimal point. Values that would round to zero
/// are emitted as `0`; non-finite values degrade to `0`.
///
/// With `keep_nonzero`, the precision is escalated (up to the cap) until
/// a non-zero value survives rounding; matrix cells need this, since
/// rounding a small scale to zero would collapse the transform.
pub(crate) fn append_num(buf: &mut String, v: f32, precision: u32, keep_nonzero: bool) {
    let mut effective = precision.min(MAX_PRECISION);
    if keep_nonzero && v != 0.0 {
        while effective < MAX_PRECISION {
            let rounded_zero = 0.5 * 10f32.powi(-(effective as i32));
            if v.abs() >= rounded_zero {
                break;
            }
            effective += 1;
        }
    }

    let rounded_zero = 0.5 * 10f32.powi(-(effective as i32));
    let v = if v.abs() < rounded_zero { 0.0 } else { v };

    if !v.is_finite() {
        buf.push('0');
        return;
    }

    let formatted = format!("{:.*}", effective as usize, v);
    let trimmed = if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.')
    } else {
        formatted.as_str()
    };
    if trimmed.is_empty() || trimmed == "-" || trimmed == "-0" {
        buf.push('0');
    } else {
        buf.push_str(trimmed);
    }
}

/// Matrix cells get at least 7 digits so small scale factors survive.
pub(crate) fn scale_precision(precision: u32) -> u32 {
    precision.max(7)
}

/// Appends `fill="#RRGGBB"` plus a `fill-opacity` attribute when the
/// color is not opaque.
pub(crate) fn append_fill(buf: &mut String, color: Color) {
    let _ = write!(
        buf,
        "fill=\"#{:02X}{:02X}{:02X}\"",
        color.red(),
        color.green(),
        color.blue()
    );
    if color.alpha() != 255 {
        buf.push_str(" fill-opacity=\"");
        append_num(buf, color.alpha() as f32 / 255.0, 4, false);
        buf.push('"');
    }
}

/// Maps a point through the emitter transform and divides by the output
/// scale factors.
pub(crate) fn transform_point_scaled(
    transform: &Transform,
    x_scale_factor: f32,
    y_scale_factor: f32,
    p: Point,
) -> (f32, f32) {
    let t = transform.transform_point(p);
    let xs = if x_scale_factor > 0.0 { x_scale_factor } else { 1.0 };
    let ys = if y_scale_factor > 0.0 { y_scale_factor } else { 1.0 };
    (t.x / xs, t.y / ys)
}

/// Grows `extents` by the transformed glyph bounding box. Returns
/// `false` (leaving `extents` untouched) for an empty transformed box.
pub(crate) fn union_glyph_extents(
    transform: &Transform,
    x_scale_factor: f32,
    y_scale_factor: f32,
    glyph_extents: &GlyphExtents,
    extents: &mut VectorExtents,
    has_extents: &mut bool,
) -> bool {
    let x0 = glyph_extents.x_bearing;
    let y0 = glyph_extents.y_bearing;
    let x1 = x0 + glyph_extents.width;
    let y1 = y0 + glyph_extents.height;

    let corners = [
        lyon::math::point(x0, y0),
        lyon::math::point(x0, y1),
        lyon::math::point(x1, y0),
        lyon::math::point(x1, y1),
    ];

    let (mut tx_min, mut ty_min) =
        transform_point_scaled(transform, x_scale_factor, y_scale_factor, corners[0]);
    let (mut tx_max, mut ty_max) = (tx_min, ty_min);
    for corner in &corners[1..] {
        let (tx, ty) = transform_point_scaled(transform, x_scale_factor, y_scale_factor, *corner);
        tx_min = tx_min.min(tx);
        tx_max = tx_max.max(tx);
        ty_min = ty_min.min(ty);
        ty_max = ty_max.max(ty);
    }

    if tx_max <= tx_min || ty_max <= ty_min {
        return false;
    }

    let grown = VectorExtents::new(tx_min, ty_min, tx_max - tx_min, ty_max - ty_min);
    if *has_extents {
        *extents = extents.union(&grown);
    } else {
        *extents = grown;
        *has_extents = true;
    }
    true
}

/// Appends the placement transform of a glyph instance. A pure
/// translation becomes `translate(…) scale(sx,−sy)`; anything else
/// becomes the full y-flipped `matrix(…)`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn append_instance_transform(
    out: &mut String,
    precision: u32,
    x_scale_factor: f32,
    y_scale_factor: f32,
    xx: f32,
    yx: f32,
    xy: f32,
    yy: f32,
    tx: f32,
    ty: f32,
) {
    let sprec = scale_precision(precision);
    if xx == 1.0 && yx == 0.0 && xy == 0.0 && yy == 1.0 {
        let sx = 1.0 / x_scale_factor;
        let sy = 1.0 / y_scale_factor;
        out.push_str("translate(");
        append_num(out, tx / x_scale_factor, precision, false);
        out.push(',');
        append_num(out, ty / y_scale_factor, precision, false);
        out.push_str(") scale(");
        append_num(out, sx, sprec, true);
        out.push(',');
        append_num(out, -sy, sprec, true);
        out.push(')');
    } else {
        out.push_str("matrix(");
        append_num(out, xx / x_scale_factor, sprec, true);
        out.push(',');
        append_num(out, yx / y_scale_factor, sprec, true);
        out.push(',');
        append_num(out, -xy / x_scale_factor, sprec, true);
        out.push(',');
        append_num(out, -yy / y_scale_factor, sprec, true);
        out.push(',');
        append_num(out, tx / x_scale_factor, precision, false);
        out.push(',');
        append_num(out, ty / y_scale_factor, precision, false);
        out.push(')');
    }
}

/// Translate-only placement used for image-like color glyph instances.
pub(crate) fn append_image_instance_translate(
    out: &mut String,
    precision: u32,
    x_scale_factor: f32,
    y_scale_factor: f32,
    tx: f32,
    ty: f32,
) {
    out.push_str("translate(");
    append_num(out, tx / x_scale_factor, precision, false);
    out.push(',');
    append_num(out, ty / y_scale_factor, precision, false);
    out.push(')');
}

/// Draw sink that serializes an outline as SVG path data in raw glyph
/// coordinates, for `<defs>` entries that get placed by `<use>`
/// transforms.
pub(crate) struct SvgPathSink<'a> {
    pub path: &'a mut String,
    pub precision: u32,
}

impl SvgPathSink<'_> {
    fn xy(&mut self, p: Point) {
        append_num(self.path, p.x, self.precision, false);
        self.path.push(',');
        append_num(self.path, p.y, self.precision, false);
    }
}

impl DrawFuncs for SvgPathSink<'_> {
    fn move_to(&mut self, _st: &DrawState, to: Point) {
        self.path.push('M');
        self.xy(to);
    }

    fn line_to(&mut self, _st: &DrawState, to: Point) {
        self.path.push('L');
        self.xy(to);
    }

    fn quadratic_to(&mut self, _st: &DrawState, control: Point, to: Point) {
        self.path.push('Q');
        self.xy(control);
        self.path.push(' ');
        self.xy(to);
    }

    fn cubic_to(&mut self, _st: &DrawState, control1: Point, control2: Point, to: Point) {
        self.path.push('C');
        self.xy(control1);
        self.path.push(' ');
        self.xy(control2);
        self.path.push(' ');
        self.xy(to);
    }

    fn close_path(&mut self, _st: &DrawState) {
        self.path.push('Z');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: f32, precision: u32, keep_nonzero: bool) -> String {
        let mut s = String::new();
        append_num(&mut s, v, precision, keep_nonzero);
        s
    }

    #[test]
    fn trailing_zeros_are_stripped() {
        assert_eq!(num(1.5, 2, false), "1.5");
        assert_eq!(num(2.0, 2, false), "2");
        assert_eq!(num(0.25, 2, false), "0.25");
    }

    #[test]
    fn small_values_round_to_zero() {
        assert_eq!(num(0.004, 2, false), "0");
        assert_eq!(num(-0.0049, 2, false), "0");
        assert_eq!(num(0.006, 2, false), "0.01");
    }

    #[test]
    fn keep_nonzero_escalates_precision() {
        assert_eq!(num(0.0001, 2, true), "0.0001");
        assert_eq!(num(0.0001, 2, false), "0");
    }

    #[test]
    fn non_finite_degrades_to_zero() {
        assert_eq!(num(f32::NAN, 2, false), "0");
        assert_eq!(num(f32::INFINITY, 2, false), "0");
    }

    #[test]
    fn fill_attribute_includes_opacity_when_translucent() {
        let mut s = String::new();
        append_fill(&mut s, Color::rgba(255, 0, 0, 255));
        assert_eq!(s, "fill=\"#FF0000\"");

        let mut s = String::new();
        append_fill(&mut s, Color::rgba(0, 16, 255, 127));
        assert!(s.starts_with("fill=\"#0010FF\" fill-opacity=\""));
    }
}
