//! Vector paint serializer: color-glyph paint trees to an SVG document.

use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use lyon::math::Point;
use tracing::debug;

use crate::blob::Blob;
use crate::cache::DocumentCache;
use crate::color::Color;
use crate::compose::CompositeMode;
use crate::draw::DrawSession;
use crate::geometry::{ExtentsMode, GlyphExtents, Transform, VectorExtents};
use crate::paint::{ColorLine, ColorStop, Extend, GlyphProvider, PaintFuncs, PaintImageFormat};

use super::draw::push_unsigned;
use super::{
    append_fill, append_image_instance_translate, append_instance_transform, append_num,
    scale_precision, union_glyph_extents, SvgPathSink, MAX_PRECISION,
};

/// Transform groups deeper than this become no-ops that are popped
/// identically, bounding stack use.
const MAX_TRANSFORM_GROUP_DEPTH: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ColorGlyphKey {
    glyph: u32,
    palette: u32,
    foreground: Color,
}

#[derive(Debug, Clone, Copy)]
struct ColorGlyphEntry {
    def_id: u32,
    /// Image-like subtrees get translate-only instance placement.
    image_like: bool,
}

/// Serializes color-glyph paint callback streams into an SVG document.
///
/// Paint groups nest as text buffers on a group stack; blendable
/// `pop_group` modes become CSS `mix-blend-mode` wrappers. Each distinct
/// `(glyph, palette, foreground)` color glyph is painted once into
/// `<defs>` and instantiated with `<use>` afterwards. Embedded SVG image
/// paints are inlined through the glyph subsetter.
pub struct SvgPaint {
    transform: Transform,
    x_scale_factor: f32,
    y_scale_factor: f32,
    extents: VectorExtents,
    has_extents: bool,

    foreground: Color,
    palette: u32,
    precision: u32,
    flat: bool,

    defs: String,
    path: String,
    group_stack: Vec<String>,
    transform_group_open_mask: u64,
    transform_group_depth: u32,
    transform_group_overflow_depth: u32,

    clip_rect_counter: u32,
    gradient_counter: u32,
    color_glyph_counter: u32,
    svg_image_counter: u32,

    defined_outlines: HashSet<u32>,
    defined_clips: HashSet<u32>,
    defined_color_glyphs: HashMap<ColorGlyphKey, ColorGlyphEntry>,

    /// Parsed embedded-SVG documents keyed by blob id.
    documents: DocumentCache,

    current_svg_image_glyph: Option<u32>,
    current_color_glyph_has_svg_image: bool,

    recycled: Option<Vec<u8>>,
}

impl Default for SvgPaint {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgPaint {
    pub fn new() -> Self {
        Self {
            transform: Transform::IDENTITY,
            x_scale_factor: 1.0,
            y_scale_factor: 1.0,
            extents: VectorExtents::default(),
            has_extents: false,
            foreground: Color::BLACK,
            palette: 0,
            precision: 2,
            flat: false,
            defs: String::new(),
            path: String::new(),
            group_stack: Vec::new(),
            transform_group_open_mask: 0,
            transform_group_depth: 0,
            transform_group_overflow_depth: 0,
            clip_rect_counter: 0,
            gradient_counter: 0,
            color_glyph_counter: 0,
            svg_image_counter: 0,
            defined_outlines: HashSet::new(),
            defined_clips: HashSet::new(),
            defined_color_glyphs: HashMap::new(),
            documents: DocumentCache::new(),
            current_svg_image_glyph: None,
            current_color_glyph_has_svg_image: false,
            recycled: None,
        }
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn set_scale_factor(&mut self, x_scale_factor: f32, y_scale_factor: f32) {
        self.x_scale_factor = if x_scale_factor > 0.0 { x_scale_factor } else { 1.0 };
        self.y_scale_factor = if y_scale_factor > 0.0 { y_scale_factor } else { 1.0 };
    }

    /// Grows the output extents; `None` clears them.
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

    /// Sets the foreground color substituted for `is_foreground`
    /// colors and gradient stops.
    pub fn set_foreground(&mut self, foreground: Color) {
        self.foreground = foreground;
    }

    pub fn set_palette(&mut self, palette: u32) {
        self.palette = palette;
    }

    /// Disables color-glyph memoization, painting every instance
    /// inline.
    pub fn set_flat(&mut self, flat: bool) {
        self.flat = flat;
    }

    pub fn set_precision(&mut self, precision: u32) {
        self.precision = precision.min(MAX_PRECISION);
    }

    fn ensure_initialized(&mut self) {
        if self.group_stack.is_empty() {
            self.group_stack.push(String::new());
        }
    }

    fn current_body(&mut self) -> &mut String {
        self.ensure_initialized();
        let top = self.group_stack.len() - 1;
        &mut self.group_stack[top]
    }

    fn resolve_foreground(&self, is_foreground: bool, color: Color) -> Color {
        if is_foreground {
            let alpha =
                ((self.foreground.alpha() as u32 * color.alpha() as u32 + 127) / 255) as u8;
            self.foreground.with_alpha(alpha)
        } else {
            color
        }
    }

    fn sorted_stops(&self, color_line: &dyn ColorLine) -> Vec<ColorStop> {
        let mut stops: Vec<ColorStop> = color_line.stops().to_vec();
        for stop in &mut stops {
            stop.color = self.resolve_foreground(stop.is_foreground, stop.color);
            stop.is_foreground = false;
        }
        stops.sort_by(|a, b| a.offset.partial_cmp(&b.offset).unwrap_or(std::cmp::Ordering::Equal));
        stops
    }

    fn emit_color_stops(defs: &mut String, stops: &[ColorStop]) {
        for stop in stops {
            let c = stop.color;
            defs.push_str("<stop offset=\"");
            append_num(defs, stop.offset, 4, false);
            defs.push_str("\" stop-color=\"rgb(");
            push_unsigned(defs, c.red() as u32);
            defs.push(',');
            push_unsigned(defs, c.green() as u32);
            defs.push(',');
            push_unsigned(defs, c.blue() as u32);
            defs.push_str(")\"");
            if c.alpha() != 255 {
                defs.push_str(" stop-opacity=\"");
                append_num(defs, c.alpha() as f32 / 255.0, 4, false);
                defs.push('"');
            }
            defs.push_str("/>\n");
        }
    }

    fn extend_mode_str(extend: Extend) -> &'static str {
        match extend {
            Extend::Pad => "pad",
            Extend::Repeat => "repeat",
            Extend::Reflect => "reflect",
        }
    }

    /// CSS blend-mode name for composite modes that have one.
    fn composite_mode_css(mode: CompositeMode) -> Option<&'static str> {
        match mode {
            CompositeMode::SrcOver => Some("normal"),
            CompositeMode::Screen => Some("screen"),
            CompositeMode::Overlay => Some("overlay"),
            CompositeMode::Darken => Some("darken"),
            CompositeMode::Lighten => Some("lighten"),
            CompositeMode::ColorDodge => Some("color-dodge"),
            CompositeMode::ColorBurn => Some("color-burn"),
            CompositeMode::HardLight => Some("hard-light"),
            CompositeMode::SoftLight => Some("soft-light"),
            CompositeMode::Difference => Some("difference"),
            CompositeMode::Exclusion => Some("exclusion"),
            CompositeMode::Multiply => Some("multiply"),
            CompositeMode::HslHue => Some("hue"),
            CompositeMode::HslSaturation => Some("saturation"),
            CompositeMode::HslColor => Some("color"),
            CompositeMode::HslLuminosity => Some("luminosity"),
            _ => None,
        }
    }

    fn append_global_transform_prefix(&self, out: &mut String) {
        if self.global_transform_is_identity() {
            return;
        }
        let sprec = scale_precision(self.precision);
        out.push_str("<g transform=\"matrix(");
        append_num(out, self.transform.xx / self.x_scale_factor, sprec, true);
        out.push(',');
        append_num(out, self.transform.yx / self.y_scale_factor, sprec, true);
        out.push(',');
        append_num(out, self.transform.xy / self.x_scale_factor, sprec, true);
        out.push(',');
        append_num(out, self.transform.yy / self.y_scale_factor, sprec, true);
        out.push(',');
        append_num(out, self.transform.x0 / self.x_scale_factor, self.precision, false);
        out.push(',');
        append_num(out, self.transform.y0 / self.y_scale_factor, self.precision, false);
        out.push_str(")\">\n");
    }

    fn append_global_transform_suffix(&self, out: &mut String) {
        if !self.global_transform_is_identity() {
            out.push_str("</g>\n");
        }
    }

    fn global_transform_is_identity(&self) -> bool {
        self.transform.is_identity() && self.x_scale_factor == 1.0 && self.y_scale_factor == 1.0
    }

    /// Paints one color glyph at the pen position.
    ///
    /// The first placement of a `(glyph, palette, foreground)`
    /// combination paints the glyph into a `<defs>` group; subsequent
    /// placements reference it with `<use>`. Returns `false` when the
    /// glyph has no paintable description.
    #[allow(clippy::too_many_arguments)]
    pub fn paint_glyph(
        &mut self,
        font: &dyn GlyphProvider,
        glyph: u32,
        pen_x: f32,
        pen_y: f32,
        extents_mode: ExtentsMode,
        palette: u32,
        foreground: Color,
    ) -> bool {
        self.palette = palette;
        self.foreground = foreground;

        let t = self.transform;
        let tx = t.x0 + t.xx * pen_x + t.xy * pen_y;
        let ty = t.y0 + t.yx * pen_x + t.yy * pen_y;

        if extents_mode == ExtentsMode::Expand {
            if let Some(ge) = font.glyph_extents(glyph) {
                let extents_transform = Transform::new(t.xx, t.yx, -t.xy, -t.yy, tx, ty);
                let mut has = self.has_extents;
                let ret = union_glyph_extents(
                    &extents_transform,
                    self.x_scale_factor,
                    self.y_scale_factor,
                    &ge,
                    &mut self.extents,
                    &mut has,
                );
                self.has_extents = has;
                if !ret {
                    return false;
                }
            }
        }

        self.ensure_initialized();

        let key = ColorGlyphKey { glyph, palette, foreground };

        if !self.flat {
            if let Some(entry) = self.defined_color_glyphs.get(&key).copied() {
                let precision = self.precision;
                let (xsf, ysf) = (self.x_scale_factor, self.y_scale_factor);
                let body = self.current_body();
                body.push_str("<use href=\"#cg");
                push_unsigned(body, entry.def_id);
                body.push_str("\" transform=\"");
                if entry.image_like {
                    append_image_instance_translate(body, precision, xsf, ysf, tx, ty);
                } else {
                    append_instance_transform(
                        body, precision, xsf, ysf, t.xx, t.yx, t.xy, t.yy, tx, ty,
                    );
                }
                body.push_str("\"/>\n");
                return true;
            }

            // First encounter: paint into a capture group, move the
            // result into <defs>, then place a <use>.
            self.group_stack.push(String::new());
            self.current_color_glyph_has_svg_image = false;

            let old_gid = self.current_svg_image_glyph.replace(glyph);
            let ret = font.paint_glyph(glyph, self, palette, foreground);
            self.current_svg_image_glyph = old_gid;

            let captured = self.group_stack.pop().unwrap_or_default();
            if !ret || captured.is_empty() {
                return false;
            }

            let image_like =
                self.current_color_glyph_has_svg_image || captured.contains("<svg");

            let def_id = self.color_glyph_counter;
            self.color_glyph_counter += 1;
            self.defined_color_glyphs.insert(key, ColorGlyphEntry { def_id, image_like });

            self.defs.push_str("<g id=\"cg");
            push_unsigned(&mut self.defs, def_id);
            self.defs.push_str("\">\n");
            self.defs.push_str(&captured);
            self.defs.push_str("</g>\n");

            let precision = self.precision;
            let (xsf, ysf) = (self.x_scale_factor, self.y_scale_factor);
            let body = self.current_body();
            body.push_str("<use href=\"#cg");
            push_unsigned(body, def_id);
            body.push_str("\" transform=\"");
            if image_like {
                append_image_instance_translate(body, precision, xsf, ysf, tx, ty);
            } else {
                append_instance_transform(
                    body, precision, xsf, ysf, t.xx, t.yx, t.xy, t.yy, tx, ty,
                );
            }
            body.push_str("\"/>\n");
            return true;
        }

        // Flat mode: paint inline under a placement group.
        let precision = self.precision;
        let (xsf, ysf) = (self.x_scale_factor, self.y_scale_factor);
        {
            let body = self.current_body();
            body.push_str("<g transform=\"");
            append_instance_transform(body, precision, xsf, ysf, t.xx, t.yx, t.xy, t.yy, tx, ty);
            body.push_str("\">\n");
        }

        let old_gid = self.current_svg_image_glyph.replace(glyph);
        let ret = font.paint_glyph(glyph, self, palette, foreground);
        self.current_svg_image_glyph = old_gid;

        self.current_body().push_str("</g>\n");
        ret
    }

    /// Emits the collected document and resets the per-document state.
    /// Returns `None` when no extents have been established.
    pub fn render(&mut self) -> Option<Blob> {
        if !self.has_extents {
            self.reset_document_state();
            return None;
        }

        self.ensure_initialized();

        let mut out = self
            .recycled
            .take()
            .map(|buffer| {
                let mut s = String::from_utf8(buffer).unwrap_or_default();
                s.clear();
                s
            })
            .unwrap_or_default();
        out.reserve(self.defs.len() + self.group_stack[0].len() + 320);

        out.push_str(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" \
             xmlns:xlink=\"http://www.w3.org/1999/xlink\" viewBox=\"",
        );
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

        self.append_global_transform_prefix(&mut out);
        out.push_str(&self.group_stack[0]);
        self.append_global_transform_suffix(&mut out);

        out.push_str("</svg>\n");

        let blob = Blob::new(out.into_bytes());

        self.reset_document_state();

        Some(blob)
    }

    /// Resets the emitter to its initial state. The recycled output
    /// buffer and the parsed-document cache survive.
    pub fn reset(&mut self) {
        self.reset_document_state();
    }

    fn reset_document_state(&mut self) {
        self.transform = Transform::IDENTITY;
        self.x_scale_factor = 1.0;
        self.y_scale_factor = 1.0;
        self.extents = VectorExtents::default();
        self.has_extents = false;
        self.foreground = Color::BLACK;
        self.palette = 0;
        self.precision = 2;
        self.flat = false;
        self.defs.clear();
        self.path.clear();
        self.group_stack.clear();
        self.transform_group_open_mask = 0;
        self.transform_group_depth = 0;
        self.transform_group_overflow_depth = 0;
        self.clip_rect_counter = 0;
        self.gradient_counter = 0;
        self.color_glyph_counter = 0;
        self.svg_image_counter = 0;
        self.defined_outlines.clear();
        self.defined_clips.clear();
        self.defined_color_glyphs.clear();
        self.current_svg_image_glyph = None;
        self.current_color_glyph_has_svg_image = false;
    }

    /// Hands a rendered blob back so the next render reuses its
    /// allocation.
    pub fn recycle_blob(&mut self, blob: Blob) {
        if let Ok(buffer) = blob.try_into_bytes() {
            self.recycled = Some(buffer);
        }
    }
}

impl PaintFuncs for SvgPaint {
    fn push_transform(&mut self, transform: Transform) {
        self.ensure_initialized();

        if self.transform_group_overflow_depth > 0 {
            self.transform_group_overflow_depth += 1;
            return;
        }
        if self.transform_group_depth >= MAX_TRANSFORM_GROUP_DEPTH {
            self.transform_group_overflow_depth = 1;
            return;
        }

        let t = transform;
        let opened = !((t.xx - 1.0).abs() < 1e-6
            && t.yx.abs() < 1e-6
            && t.xy.abs() < 1e-6
            && (t.yy - 1.0).abs() < 1e-6
            && t.x0.abs() < 1e-6
            && t.y0.abs() < 1e-6);
        self.transform_group_open_mask =
            (self.transform_group_open_mask << 1) | u64::from(opened);
        self.transform_group_depth += 1;

        if !opened {
            return;
        }

        let sprec = scale_precision(self.precision);
        let precision = self.precision;
        let body = self.current_body();
        body.push_str("<g transform=\"matrix(");
        append_num(body, t.xx, sprec, true);
        body.push(',');
        append_num(body, t.yx, sprec, true);
        body.push(',');
        append_num(body, t.xy, sprec, true);
        body.push(',');
        append_num(body, t.yy, sprec, true);
        body.push(',');
        append_num(body, t.x0, precision, false);
        body.push(',');
        append_num(body, t.y0, precision, false);
        body.push_str(")\">\n");
    }

    fn pop_transform(&mut self) {
        self.ensure_initialized();
        if self.transform_group_overflow_depth > 0 {
            self.transform_group_overflow_depth -= 1;
            return;
        }
        if self.transform_group_depth == 0 {
            return;
        }
        self.transform_group_depth -= 1;
        let opened = self.transform_group_open_mask & 1 != 0;
        self.transform_group_open_mask >>= 1;
        if opened {
            self.current_body().push_str("</g>\n");
        }
    }

    fn color_glyph(&mut self, glyph: u32, font: &dyn GlyphProvider) -> bool {
        self.ensure_initialized();
        let palette = self.palette;
        let foreground = self.foreground;
        let old_gid = self.current_svg_image_glyph.replace(glyph);
        font.paint_glyph(glyph, self, palette, foreground);
        self.current_svg_image_glyph = old_gid;
        true
    }

    fn push_clip_glyph(&mut self, glyph: u32, font: &dyn GlyphProvider) {
        self.ensure_initialized();

        if !self.defined_outlines.contains(&glyph) {
            self.defined_outlines.insert(glyph);
            self.path.clear();
            {
                let mut sink = SvgPathSink { path: &mut self.path, precision: self.precision };
                let mut session = DrawSession::new(&mut sink);
                font.draw_glyph(glyph, &mut session);
            }
            self.defs.push_str("<path id=\"p");
            push_unsigned(&mut self.defs, glyph);
            self.defs.push_str("\" d=\"");
            self.defs.push_str(&self.path);
            self.defs.push_str("\"/>\n");
        }

        if !self.defined_clips.contains(&glyph) {
            self.defined_clips.insert(glyph);
            self.defs.push_str("<clipPath id=\"clip-g");
            push_unsigned(&mut self.defs, glyph);
            self.defs.push_str("\"><use href=\"#p");
            push_unsigned(&mut self.defs, glyph);
            self.defs.push_str("\"/></clipPath>\n");
        }

        let body = self.current_body();
        body.push_str("<g clip-path=\"url(#clip-g");
        push_unsigned(body, glyph);
        body.push_str(")\">\n");
    }

    fn push_clip_rectangle(&mut self, xmin: f32, ymin: f32, xmax: f32, ymax: f32) {
        self.ensure_initialized();

        let clip_id = self.clip_rect_counter;
        self.clip_rect_counter += 1;

        let precision = self.precision;
        self.defs.push_str("<clipPath id=\"c");
        push_unsigned(&mut self.defs, clip_id);
        self.defs.push_str("\"><rect x=\"");
        append_num(&mut self.defs, xmin, precision, false);
        self.defs.push_str("\" y=\"");
        append_num(&mut self.defs, ymin, precision, false);
        self.defs.push_str("\" width=\"");
        append_num(&mut self.defs, xmax - xmin, precision, false);
        self.defs.push_str("\" height=\"");
        append_num(&mut self.defs, ymax - ymin, precision, false);
        self.defs.push_str("\"/></clipPath>\n");

        let body = self.current_body();
        body.push_str("<g clip-path=\"url(#c");
        push_unsigned(body, clip_id);
        body.push_str(")\">\n");
    }

    fn pop_clip(&mut self) {
        self.current_body().push_str("</g>\n");
    }

    fn color(&mut self, is_foreground: bool, color: Color) {
        let c = self.resolve_foreground(is_foreground, color);
        let body = self.current_body();
        // A wash over the whole clip region; the enclosing clip paths
        // bound it.
        body.push_str("<rect x=\"-32767\" y=\"-32767\" width=\"65534\" height=\"65534\" ");
        append_fill(body, c);
        body.push_str("/>\n");
    }

    fn image(
        &mut self,
        image: &Blob,
        width: u32,
        height: u32,
        format: PaintImageFormat,
        _slant: f32,
        extents: Option<&GlyphExtents>,
    ) -> bool {
        self.ensure_initialized();

        // Only embedded SVG documents can be inlined into vector
        // output.
        if format != PaintImageFormat::Svg {
            return false;
        }
        let Some(glyph) = self.current_svg_image_glyph else {
            return false;
        };

        let doc = match self.documents.get(image.id()) {
            Some(doc) => doc,
            None => {
                let Some(parsed) = super::subset::SvgDocument::parse(image) else {
                    debug!(blob = image.id(), "embedded SVG document failed to parse");
                    return false;
                };
                let doc = std::sync::Arc::new(parsed);
                self.documents.insert(image.id(), doc.clone());
                doc
            }
        };

        self.current_color_glyph_has_svg_image = true;

        let mut subset_body = String::new();
        if !doc.subset_glyph(glyph, &mut self.svg_image_counter, &mut self.defs, &mut subset_body)
        {
            debug!(glyph, "embedded SVG document has no subtree for glyph");
            return false;
        }

        let precision = self.precision;
        let body = self.current_body();
        if let Some(extents) = extents {
            body.push_str("<g transform=\"translate(");
            append_num(body, extents.x_bearing, precision, false);
            body.push(',');
            append_num(body, extents.y_bearing, precision, false);
            body.push_str(") scale(");
            append_num(body, extents.width / width as f32, precision, false);
            body.push(',');
            append_num(body, extents.height / height as f32, precision, false);
            body.push_str(")\">\n");
        }

        body.push_str(&subset_body);
        body.push('\n');

        if extents.is_some() {
            body.push_str("</g>\n");
        }

        true
    }

    fn linear_gradient(&mut self, color_line: &dyn ColorLine, p0: Point, p1: Point, p2: Point) {
        self.ensure_initialized();

        let stops = self.sorted_stops(color_line);
        if stops.is_empty() {
            return;
        }

        let grad_id = self.gradient_counter;
        self.gradient_counter += 1;

        let precision = self.precision;
        self.defs.push_str("<linearGradient id=\"gr");
        push_unsigned(&mut self.defs, grad_id);
        self.defs.push_str("\" gradientUnits=\"userSpaceOnUse\" x1=\"");
        append_num(&mut self.defs, p0.x, precision, false);
        self.defs.push_str("\" y1=\"");
        append_num(&mut self.defs, p0.y, precision, false);
        self.defs.push_str("\" x2=\"");
        append_num(&mut self.defs, p1.x + (p1.x - p2.x), precision, false);
        self.defs.push_str("\" y2=\"");
        append_num(&mut self.defs, p1.y + (p1.y - p2.y), precision, false);
        self.defs.push_str("\" spreadMethod=\"");
        self.defs.push_str(Self::extend_mode_str(color_line.extend()));
        self.defs.push_str("\">\n");
        Self::emit_color_stops(&mut self.defs, &stops);
        self.defs.push_str("</linearGradient>\n");

        let body = self.current_body();
        body.push_str(
            "<rect x=\"-32767\" y=\"-32767\" width=\"65534\" height=\"65534\" fill=\"url(#gr",
        );
        push_unsigned(body, grad_id);
        body.push_str(")\"/>\n");
    }

    fn radial_gradient(
        &mut self,
        color_line: &dyn ColorLine,
        c0: Point,
        r0: f32,
        c1: Point,
        r1: f32,
    ) {
        self.ensure_initialized();

        let stops = self.sorted_stops(color_line);
        if stops.is_empty() {
            return;
        }

        let grad_id = self.gradient_counter;
        self.gradient_counter += 1;

        let precision = self.precision;
        self.defs.push_str("<radialGradient id=\"gr");
        push_unsigned(&mut self.defs, grad_id);
        self.defs.push_str("\" gradientUnits=\"userSpaceOnUse\" cx=\"");
        append_num(&mut self.defs, c1.x, precision, false);
        self.defs.push_str("\" cy=\"");
        append_num(&mut self.defs, c1.y, precision, false);
        self.defs.push_str("\" r=\"");
        append_num(&mut self.defs, r1, precision, false);
        self.defs.push_str("\" fx=\"");
        append_num(&mut self.defs, c0.x, precision, false);
        self.defs.push_str("\" fy=\"");
        append_num(&mut self.defs, c0.y, precision, false);
        if r0 > 0.0 {
            self.defs.push_str("\" fr=\"");
            append_num(&mut self.defs, r0, precision, false);
        }
        self.defs.push_str("\" spreadMethod=\"");
        self.defs.push_str(Self::extend_mode_str(color_line.extend()));
        self.defs.push_str("\">\n");
        Self::emit_color_stops(&mut self.defs, &stops);
        self.defs.push_str("</radialGradient>\n");

        let body = self.current_body();
        body.push_str(
            "<rect x=\"-32767\" y=\"-32767\" width=\"65534\" height=\"65534\" fill=\"url(#gr",
        );
        push_unsigned(body, grad_id);
        body.push_str(")\"/>\n");
    }

    fn sweep_gradient(
        &mut self,
        color_line: &dyn ColorLine,
        center: Point,
        start_angle: f32,
        end_angle: f32,
    ) {
        self.ensure_initialized();

        let stops = self.sorted_stops(color_line);
        if stops.is_empty() {
            return;
        }

        // SVG has no sweep gradient; approximate with a full disc in
        // the end-stop color.
        let c = if start_angle > end_angle {
            stops[0].color
        } else {
            stops[stops.len() - 1].color
        };

        let precision = self.precision;
        let body = self.current_body();
        body.push_str("<path d=\"M");
        append_num(body, center.x, precision, false);
        body.push(',');
        append_num(body, center.y, precision, false);
        body.push_str(" m-32767,0 a32767,32767 0 1,0 65534,0 a32767,32767 0 1,0 -65534,0\" ");
        append_fill(body, c);
        body.push_str("/>\n");
    }

    fn push_group(&mut self) {
        self.ensure_initialized();
        self.group_stack.push(String::new());
    }

    fn pop_group(&mut self, mode: CompositeMode) {
        self.ensure_initialized();
        if self.group_stack.len() < 2 {
            return;
        }
        let group = match self.group_stack.pop() {
            Some(group) => group,
            None => return,
        };
        let body = self.current_body();

        match Self::composite_mode_css(mode) {
            Some(blend) => {
                body.push_str("<g style=\"mix-blend-mode:");
                body.push_str(blend);
                body.push_str("\">\n");
                body.push_str(&group);
                body.push_str("</g>\n");
            }
            None => {
                // Porter-Duff modes without a CSS equivalent inline as
                // a plain group.
                body.push_str("<g>\n");
                body.push_str(&group);
                body.push_str("</g>\n");
            }
        }
    }
}
