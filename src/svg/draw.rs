//! Vector draw serializer: glyph outlines to an SVG document.

use ahash::{HashSet, HashSetExt};
use lyon::math::Point;

use crate::blob::Blob;
use crate::draw::{DrawFuncs, DrawSession, DrawState};
use crate::geometry::{ExtentsMode, GlyphExtents, Transform, VectorExtents};
use crate::paint::GlyphProvider;

use super::{
    append_instance_transform, append_num, transform_point_scaled, union_glyph_extents,
    SvgPathSink, MAX_PRECISION,
};

/// Serializes glyph outlines into a resolution-independent SVG
/// document.
///
/// Each distinct glyph is emitted once as `<path id="p{gid}">` inside
/// `<defs>`; every placement becomes a `<use>` with an instance
/// transform. The `flat` mode disables the reuse and inlines a `<path>`
/// per placement instead.
///
/// The emitter also implements [`DrawFuncs`], so a host can stream raw
/// outline callbacks into it; [`render`](SvgDraw::render) then wraps the
/// collected path in the document skeleton.
pub struct SvgDraw {
    transform: Transform,
    x_scale_factor: f32,
    y_scale_factor: f32,
    extents: VectorExtents,
    has_extents: bool,
    precision: u32,
    flat: bool,

    defs: String,
    body: String,
    path: String,
    defined_glyphs: HashSet<u32>,

    /// Reclaimed output buffer from a recycled blob.
    recycled: Option<Vec<u8>>,
}

impl Default for SvgDraw {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgDraw {
    pub fn new() -> Self {
        Self {
            transform: Transform::IDENTITY,
            x_scale_factor: 1.0,
            y_scale_factor: 1.0,
            extents: VectorExtents::default(),
            has_extents: false,
            precision: 2,
            flat: false,
            defs: String::new(),
            body: String::new(),
            path: String::new(),
            defined_glyphs: HashSet::new(),
            recycled: None,
        }
    }

    /// Sets the affine transform used when placing glyphs.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Sets additional per-axis output scale factors; emitted
    /// coordinates are divided by them.
    pub fn set_scale_factor(&mut self, x_scale_factor: f32, y_scale_factor: f32) {
        self.x_scale_factor = if x_scale_factor > 0.0 { x_scale_factor } else { 1.0 };
        self.y_scale_factor = if y_scale_factor > 0.0 { y_scale_factor } else { 1.0 };
    }

    pub fn scale_factor(&self) -> (f32, f32) {
        (self.x_scale_factor, self.y_scale_factor)
    }

    /// Grows the output extents by `extents`; `None` clears them.
    /// Extents become the document's `viewBox`.
    pub fn set_extents(&mut self, extents: Option<&VectorExtents>) {
        let Some(extents) = extents else {
            self.extents = VectorExtents::default();
            self.has_extents = false;
            return;
        };
        if !(extents.width > 0.0 && extents.height > 0.0) {
            return;
        }
        if self.has_extents {
            self.extents = self.extents.union(extents);
        } else {
            self.extents = *extents;
            self.has_extents = true;
        }
    }

    pub fn extents(&self) -> Option<VectorExtents> {
        self.has_extents.then_some(self.extents)
    }

    /// Grows the output extents by a glyph bounding box transformed
    /// through the current transform.
    pub fn set_glyph_extents(&mut self, glyph_extents: &GlyphExtents) -> bool {
        let mut has = self.has_extents;
        let ret = union_glyph_extents(
            &self.transform,
            self.x_scale_factor,
            self.y_scale_factor,
            glyph_extents,
            &mut self.extents,
            &mut has,
        );
        self.has_extents = has;
        ret
    }

    /// Disables `<defs>`/`<use>` sharing, inlining a `<path>` per glyph
    /// placement.
    pub fn set_flat(&mut self, flat: bool) {
        self.flat = flat;
    }

    /// Sets the numeric output precision (decimal digits, capped at 12).
    pub fn set_precision(&mut self, precision: u32) {
        self.precision = precision.min(MAX_PRECISION);
    }

    /// Places `glyph` at the pen position. With
    /// [`ExtentsMode::Expand`], the output extents grow by the glyph's
    /// transformed bounding box. Returns `false` when the glyph has no
    /// outline.
    pub fn draw_glyph(
        &mut self,
        font: &dyn GlyphProvider,
        glyph: u32,
        pen_x: f32,
        pen_y: f32,
        extents_mode: ExtentsMode,
    ) -> bool {
        let t = self.transform;
        let tx = t.x0 + t.xx * pen_x + t.xy * pen_y;
        let ty = t.y0 + t.yx * pen_x + t.yy * pen_y;

        if extents_mode == ExtentsMode::Expand {
            if let Some(ge) = font.glyph_extents(glyph) {
                // Glyph boxes are y-up; flip the cross terms so the
                // transformed box lands in output space.
                let extents_transform = Transform::new(t.xx, t.yx, -t.xy, -t.yy, tx, ty);
                let mut has = self.has_extents;
                union_glyph_extents(
                    &extents_transform,
                    self.x_scale_factor,
                    self.y_scale_factor,
                    &ge,
                    &mut self.extents,
                    &mut has,
                );
                self.has_extents = has;
            }
        }

        if self.flat {
            self.path.clear();
            let outlined = {
                let mut sink = SvgPathSink { path: &mut self.path, precision: self.precision };
                let mut session = DrawSession::new(&mut sink);
                font.draw_glyph(glyph, &mut session)
            };
            if !outlined || self.path.is_empty() {
                return false;
            }

            self.body.push_str("<path d=\"");
            self.body.push_str(&self.path);
            self.body.push_str("\" transform=\"");
            append_instance_transform(
                &mut self.body,
                self.precision,
                self.x_scale_factor,
                self.y_scale_factor,
                t.xx,
                t.yx,
                t.xy,
                t.yy,
                tx,
                ty,
            );
            self.body.push_str("\"/>\n");
            return true;
        }

        if !self.defined_glyphs.contains(&glyph) {
            self.path.clear();
            let outlined = {
                let mut sink = SvgPathSink { path: &mut self.path, precision: self.precision };
                let mut session = DrawSession::new(&mut sink);
                font.draw_glyph(glyph, &mut session)
            };
            if !outlined || self.path.is_empty() {
                return false;
            }
            self.defs.push_str("<path id=\"p");
            push_unsigned(&mut self.defs, glyph);
            self.defs.push_str("\" d=\"");
            self.defs.push_str(&self.path);
            self.defs.push_str("\"/>\n");
            self.defined_glyphs.insert(glyph);
        }

        self.body.push_str("<use href=\"#p");
        push_unsigned(&mut self.body, glyph);
        self.body.push_str("\" transform=\"");
        append_instance_transform(
            &mut self.body,
            self.precision,
            self.x_scale_factor,
            self.y_scale_factor,
            t.xx,
            t.yx,
            t.xy,
            t.yy,
            tx,
            ty,
        );
        self.body.push_str("\"/>\n");
        true
    }

    /// Emits the collected document. Returns `None` when no extents
    /// have been established. Afterwards the per-document state
    /// (buffers, defined-glyph set, extents) is cleared; the transform
    /// and formatting configuration stay.
    pub fn render(&mut self) -> Option<Blob> {
        if !self.has_extents {
            return None;
        }

        let mut out = self
            .recycled
            .take()
            .map(|buffer| {
                let mut s = String::from_utf8(buffer).unwrap_or_default();
                s.clear();
                s
            })
            .unwrap_or_default();
        out.reserve(self.defs.len() + self.body.len().max(self.path.len()) + 256);

        out.push_str("<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"");
        append_num(&mut out, self.extents.x, self.precision, false);
        out.push(' ');
        append_num(&mut out, self.extents.y, self.precision, false);
        out.push(' ');
        append_num(&mut out, self.extents.width, self.precision, false);
        out.push(' ');
        append_num(&mut out, self.extents.height, self.precision, false);
        out.push_str("\" width=\"");
        append_num(&mut out, self.extents.width, self.precision, false);
        out.push_str("\" height=\"");
        append_num(&mut out, self.extents.height, self.precision, false);
        out.push_str("\">\n");

        if !self.defs.is_empty() {
            out.push_str("<defs>\n");
            out.push_str(&self.defs);
            out.push_str("</defs>\n");
        }

        if !self.body.is_empty() {
            out.push_str(&self.body);
        } else if !self.path.is_empty() {
            // Raw-callback mode: a single transformed path was
            // collected directly through the draw protocol.
            out.push_str("<path d=\"");
            out.push_str(&self.path);
            out.push_str("\"/>\n");
        }

        out.push_str("</svg>\n");

        let blob = Blob::new(out.into_bytes());

        self.path.clear();
        self.defs.clear();
        self.body.clear();
        self.defined_glyphs.clear();
        self.has_extents = false;
        self.extents = VectorExtents::default();

        Some(blob)
    }

    /// Resets the emitter to its initial state.
    pub fn reset(&mut self) {
        self.transform = Transform::IDENTITY;
        self.x_scale_factor = 1.0;
        self.y_scale_factor = 1.0;
        self.extents = VectorExtents::default();
        self.has_extents = false;
        self.precision = 2;
        self.flat = false;
        self.defs.clear();
        self.body.clear();
        self.path.clear();
        self.defined_glyphs.clear();
    }

    /// Hands a rendered blob back so the next render reuses its
    /// allocation. Reclaiming succeeds only when the caller returned
    /// the last reference.
    pub fn recycle_blob(&mut self, blob: Blob) {
        if let Ok(buffer) = blob.try_into_bytes() {
            self.recycled = Some(buffer);
        }
    }

    fn append_xy(&mut self, p: Point) {
        let (tx, ty) =
            transform_point_scaled(&self.transform, self.x_scale_factor, self.y_scale_factor, p);
        append_num(&mut self.path, tx, self.precision, false);
        self.path.push(',');
        append_num(&mut self.path, ty, self.precision, false);
    }
}

pub(crate) fn push_unsigned(buf: &mut String, v: u32) {
    use std::fmt::Write as _;
    let _ = write!(buf, "{v}");
}

/// Raw-callback mode: outline commands stream straight into the path
/// buffer with the emitter transform applied.
impl DrawFuncs for SvgDraw {
    fn move_to(&mut self, _st: &DrawState, to: Point) {
        self.path.push('M');
        self.append_xy(to);
    }

    fn line_to(&mut self, _st: &DrawState, to: Point) {
        self.path.push('L');
        self.append_xy(to);
    }

    fn quadratic_to(&mut self, _st: &DrawState, control: Point, to: Point) {
        self.path.push('Q');
        self.append_xy(control);
        self.path.push(' ');
        self.append_xy(to);
    }

    fn cubic_to(&mut self, _st: &DrawState, control1: Point, control2: Point, to: Point) {
        self.path.push('C');
        self.append_xy(control1);
        self.path.push(' ');
        self.append_xy(control2);
        self.path.push(' ');
        self.append_xy(to);
    }

    fn close_path(&mut self, _st: &DrawState) {
        self.path.push('Z');
    }
}
