//! The raster paint engine.
//!
//! A [`Painter`] consumes a color-paint callback stream and renders it
//! into a premultiplied BGRA32 [`Image`]. It owns the transform, clip
//! and surface stacks, a freelist of group surfaces, and an internal
//! [`Rasterizer`] used to turn glyph outlines into clip masks.
//!
//! State is initialized lazily by the first callback that needs it, so
//! hosts can drive the callbacks directly without a priming call.

use lyon::math::{point, Point};
use smallvec::SmallVec;
use tracing::warn;

use crate::blob::Blob;
use crate::clip::Clip;
use crate::color::Color;
use crate::compose::{
    alpha_mul, color_to_premul_pixel, composite_images, load_pixel, pack_pixel, src_over,
    store_pixel, CompositeMode,
};
use crate::draw::DrawSession;
use crate::geometry::{GlyphExtents, RasterExtents, Transform};
use crate::image::{Image, PixelFormat};
use crate::paint::{ColorLine, ColorStop, Extend, GlyphProvider, PaintFuncs, PaintImageFormat};
use crate::raster::Rasterizer;

/// Inline capacity for the gradient stop scratch.
const PREALLOCATED_COLOR_STOPS: usize = 16;

type StopBuf = SmallVec<[ColorStop; PREALLOCATED_COLOR_STOPS]>;

/// Renders color-paint callback streams into BGRA32 images.
///
/// # Examples
///
/// ```rust
/// use glifo::{Color, PaintFuncs, Painter, RasterExtents};
///
/// let mut painter = Painter::new();
/// painter.set_extents(RasterExtents::new(0, 0, 8, 8));
/// painter.push_clip_rectangle(0.0, 0.0, 8.0, 8.0);
/// painter.color(false, Color::rgb(255, 0, 0));
/// painter.pop_clip();
///
/// let image = painter.render().expect("extents were set");
/// assert_eq!(image.extents().width, 8);
/// // Premultiplied BGRA: solid red.
/// assert_eq!(&image.buffer()[..4], &[0, 0, 255, 255]);
/// ```
pub struct Painter {
    base_transform: Transform,
    fixed_extents: Option<RasterExtents>,
    foreground: Color,

    transform_stack: Vec<Transform>,
    clip_stack: Vec<Clip>,
    surface_stack: Vec<Image>,

    /// Freelist of released group-surface buffers.
    surface_cache: Vec<Vec<u8>>,

    /// Internal rasterizer for glyph clip masks.
    clip_rasterizer: Rasterizer,
}

impl Default for Painter {
    fn default() -> Self {
        Self::new()
    }
}

impl Painter {
    pub fn new() -> Self {
        Self {
            base_transform: Transform::IDENTITY,
            fixed_extents: None,
            foreground: Color::BLACK,
            transform_stack: Vec::new(),
            clip_stack: Vec::new(),
            surface_stack: Vec::new(),
            surface_cache: Vec::new(),
            clip_rasterizer: Rasterizer::new(),
        }
    }

    /// Sets the base transform mapping glyph space to pixel space.
    pub fn set_transform(&mut self, transform: Transform) {
        self.base_transform = transform;
    }

    /// Sets the output image extents. Call before painting each glyph.
    /// An unset or under-sized stride is normalized to `width * 4`.
    pub fn set_extents(&mut self, mut extents: RasterExtents) {
        if extents.stride < extents.width * 4 {
            extents.stride = extents.width * 4;
        }
        self.fixed_extents = Some(extents);
    }

    /// Transforms `glyph_extents` through the base transform and sets
    /// the resulting pixel box as the output extents. Returns `false`
    /// (and unsets the extents) when the transformed box is empty.
    pub fn set_glyph_extents(&mut self, glyph_extents: &GlyphExtents) -> bool {
        let x0 = glyph_extents.x_bearing;
        let y0 = glyph_extents.y_bearing;
        let x1 = glyph_extents.x_bearing + glyph_extents.width;
        let y1 = glyph_extents.y_bearing + glyph_extents.height;

        let corners = [
            point(x0.min(x1), y0.min(y1)),
            point(x0.min(x1), y0.max(y1)),
            point(x0.max(x1), y0.min(y1)),
            point(x0.max(x1), y0.max(y1)),
        ];

        let mut tx_min = f32::INFINITY;
        let mut tx_max = f32::NEG_INFINITY;
        let mut ty_min = f32::INFINITY;
        let mut ty_max = f32::NEG_INFINITY;
        for corner in corners {
            let p = self.base_transform.transform_point(corner);
            tx_min = tx_min.min(p.x);
            tx_max = tx_max.max(p.x);
            ty_min = ty_min.min(p.y);
            ty_max = ty_max.max(p.y);
        }

        let ex0 = tx_min.floor() as i32;
        let ey0 = ty_min.floor() as i32;
        let ex1 = tx_max.ceil() as i32;
        let ey1 = ty_max.ceil() as i32;

        if ex1 <= ex0 || ey1 <= ey0 {
            self.fixed_extents = None;
            return false;
        }

        self.set_extents(RasterExtents::new(ex0, ey0, (ex1 - ex0) as u32, (ey1 - ey0) as u32));
        true
    }

    /// Sets the foreground color substituted for `is_foreground` colors
    /// and gradient stops. The default is opaque black.
    pub fn set_foreground(&mut self, foreground: Color) {
        self.foreground = foreground;
    }

    pub fn foreground(&self) -> Color {
        self.foreground
    }

    /// Recycles `image` so subsequent group surfaces reuse its buffer.
    pub fn recycle_image(&mut self, image: Image) {
        self.surface_cache.push(image.into_buffer());
    }

    /// Paints one glyph: sets the foreground, derives extents from the
    /// host when none are configured, replays the glyph's paint program
    /// and renders the result.
    pub fn paint_glyph(
        &mut self,
        font: &dyn GlyphProvider,
        glyph: u32,
        palette: u32,
        foreground: Color,
    ) -> Option<Image> {
        self.foreground = foreground;
        if self.fixed_extents.is_none() {
            if let Some(extents) = font.glyph_extents(glyph) {
                self.set_glyph_extents(&extents);
            }
        }
        font.paint_glyph(glyph, self, palette, foreground);
        self.render()
    }

    /// Extracts the rendered image after the paint callbacks have
    /// completed. The surface stack is consumed; any surfaces left by
    /// unbalanced `push_group` calls are released. Returns `None` when
    /// no extents were configured or no callback ran.
    pub fn render(&mut self) -> Option<Image> {
        let had_extents = self.fixed_extents.is_some();

        let mut surfaces = std::mem::take(&mut self.surface_stack);
        let mut result = None;
        if !surfaces.is_empty() {
            if surfaces.len() > 1 {
                warn!(extra = surfaces.len() - 1, "surface stack unbalanced at render");
            }
            let mut it = surfaces.drain(..);
            result = it.next();
            for extra in it {
                self.surface_cache.push(extra.into_buffer());
            }
        }

        self.transform_stack.clear();
        self.clip_stack.clear();
        self.clip_rasterizer.reset();
        self.fixed_extents = None;

        if !had_extents {
            if let Some(root) = result {
                self.surface_cache.push(root.into_buffer());
            }
            return None;
        }

        result
    }

    /// Resets the painter to its initial state, dropping configuration
    /// and cached surfaces.
    pub fn reset(&mut self) {
        self.base_transform = Transform::IDENTITY;
        self.fixed_extents = None;
        self.foreground = Color::BLACK;
        self.transform_stack.clear();
        self.clip_stack.clear();
        self.surface_stack.clear();
        self.surface_cache.clear();
        self.clip_rasterizer.reset();
    }

    /* ── internals ─────────────────────────────────────────────────── */

    fn acquire_surface(&mut self) -> Image {
        let extents = self.fixed_extents.unwrap_or_default();
        Image::with_recycled(extents, PixelFormat::Bgra32, self.surface_cache.pop())
    }

    /// Lazy initialization: the first callback that needs state
    /// allocates the root surface and seeds the transform and clip
    /// stacks.
    fn ensure_initialized(&mut self) {
        if !self.surface_stack.is_empty() {
            return;
        }
        let root = self.acquire_surface();
        let (w, h) = (root.extents().width, root.extents().height);
        self.surface_stack.push(root);
        self.transform_stack.push(self.base_transform);
        self.clip_stack.push(Clip::full(w, h));
    }

    fn current_transform(&self) -> Transform {
        self.transform_stack.last().copied().unwrap_or(self.base_transform)
    }

    /// Resolves foreground stops and returns the stop scratch.
    fn resolve_stops(&self, color_line: &dyn ColorLine) -> StopBuf {
        let mut stops: StopBuf = color_line.stops().iter().copied().collect();
        for stop in &mut stops {
            if stop.is_foreground {
                let alpha =
                    ((self.foreground.alpha() as u32 * stop.color.alpha() as u32 + 127) / 255) as u8;
                stop.color = self.foreground.with_alpha(alpha);
            }
        }
        stops
    }
}

/* ── Color line evaluation ─────────────────────────────────────────── */

/// Sorts stops by offset and normalizes them into `[0, 1]`, returning
/// the original `(min, max)` offsets so geometry can be renormalized.
fn normalize_color_line(stops: &mut [ColorStop]) -> (f32, f32) {
    stops.sort_by(|a, b| a.offset.partial_cmp(&b.offset).unwrap_or(std::cmp::Ordering::Equal));

    let mn = stops.first().map(|s| s.offset).unwrap_or(0.0);
    let mx = stops.last().map(|s| s.offset).unwrap_or(0.0);
    if mn != mx {
        for stop in stops.iter_mut() {
            stop.offset = (stop.offset - mn) / (mx - mn);
        }
    }
    (mn, mx)
}

/// Evaluates the color line at `t`, interpolating in premultiplied
/// space. Returns a premultiplied BGRA32 pixel.
fn evaluate_color_line(stops: &[ColorStop], mut t: f32, extend: Extend) -> u32 {
    match extend {
        Extend::Pad => t = t.clamp(0.0, 1.0),
        Extend::Repeat => t -= t.floor(),
        Extend::Reflect => {
            if t < 0.0 {
                t = -t;
            }
            let period = t.floor();
            let frac = t - period;
            t = if (period as i64) & 1 == 1 { 1.0 - frac } else { frac };
        }
    }

    let last = stops.len() - 1;
    if last == 0 || t <= stops[0].offset {
        return color_to_premul_pixel(stops[0].color);
    }
    if t >= stops[last].offset {
        return color_to_premul_pixel(stops[last].color);
    }

    let mut i = 0;
    while i < last {
        if t < stops[i + 1].offset {
            break;
        }
        i += 1;
    }
    let i = i.min(last - 1);

    let range = stops[i + 1].offset - stops[i].offset;
    let k = if range > 0.0 { (t - stops[i].offset) / range } else { 0.0 };

    let c0 = stops[i].color;
    let c1 = stops[i + 1].color;

    let a0 = c0.alpha() as f32 / 255.0;
    let r0 = c0.red() as f32 / 255.0 * a0;
    let g0 = c0.green() as f32 / 255.0 * a0;
    let b0 = c0.blue() as f32 / 255.0 * a0;

    let a1 = c1.alpha() as f32 / 255.0;
    let r1 = c1.red() as f32 / 255.0 * a1;
    let g1 = c1.green() as f32 / 255.0 * a1;
    let b1 = c1.blue() as f32 / 255.0 * a1;

    let a = a0 + k * (a1 - a0);
    let r = r0 + k * (r1 - r0);
    let g = g0 + k * (g1 - g0);
    let b = b0 + k * (b1 - b0);

    pack_pixel(
        (b * 255.0 + 0.5) as u8,
        (g * 255.0 + 0.5) as u8,
        (r * 255.0 + 0.5) as u8,
        (a * 255.0 + 0.5) as u8,
    )
}

/// Reduces the three-anchor linear gradient form to a two-point axis by
/// projecting `p1` onto the axis perpendicular to `p2 − p0`.
fn reduce_anchors(p0: Point, p1: Point, p2: Point) -> (Point, Point) {
    let q2x = p2.x - p0.x;
    let q2y = p2.y - p0.y;
    let q1x = p1.x - p0.x;
    let q1y = p1.y - p0.y;

    let s = q2x * q2x + q2y * q2y;
    if s < 0.000001 {
        return (p0, p1);
    }
    let k = (q2x * q1x + q2y * q1y) / s;
    (p0, point(p1.x - k * q2x, p1.y - k * q2y))
}

/* ── Clipped pixel walker ──────────────────────────────────────────── */

/// Walks every pixel in the clip's bounding box, stepping the inverse
/// transform incrementally, and source-overs the pixels produced by
/// `src` (modulated by clip alpha when the clip is a mask).
///
/// `center_offset` is `0.5` when sampling at pixel centers (gradients)
/// and `0.0` when matching texel corners (images).
fn paint_clipped(
    surf: &mut Image,
    clip: &Clip,
    inv: &Transform,
    center_offset: f32,
    src: &mut dyn FnMut(f32, f32) -> Option<u32>,
) {
    if clip.bounds_empty() {
        return;
    }

    let ext = surf.extents();
    let stride = ext.stride as usize;
    let ox = ext.x_origin;
    let oy = ext.y_origin;
    let buf = surf.buffer_mut();

    for py in clip.min_y..clip.max_y {
        let row = &mut buf[py as usize * stride..];
        let mask_row = clip.mask_row(py);

        let fx = clip.min_x as f32 + ox as f32 + center_offset;
        let fy = py as f32 + oy as f32 + center_offset;
        let mut gx = inv.xx * fx + inv.xy * fy + inv.x0;
        let mut gy = inv.yx * fx + inv.yy * fy + inv.y0;

        for px in clip.min_x..clip.max_x {
            let clip_alpha = match mask_row {
                Some(mask) => mask[px as usize],
                None => 255,
            };
            if clip_alpha == 0 {
                gx += inv.xx;
                gy += inv.yx;
                continue;
            }

            if let Some(mut src_px) = src(gx, gy) {
                if clip_alpha != 255 {
                    src_px = alpha_mul(src_px, clip_alpha as u32);
                }
                let d = load_pixel(row, px as usize);
                store_pixel(row, px as usize, src_over(src_px, d));
            }

            gx += inv.xx;
            gy += inv.yx;
        }
    }
}

/* ── PaintFuncs implementation ─────────────────────────────────────── */

impl PaintFuncs for Painter {
    fn push_transform(&mut self, transform: Transform) {
        self.ensure_initialized();
        let composed = self.current_transform().then(&transform);
        self.transform_stack.push(composed);
    }

    fn pop_transform(&mut self) {
        // The base transform stays; unmatched pops are ignored.
        if self.transform_stack.len() > 1 {
            self.transform_stack.pop();
        }
    }

    fn push_clip_glyph(&mut self, glyph: u32, font: &dyn GlyphProvider) {
        self.ensure_initialized();

        let Some(surf_ext) = self.surface_stack.last().map(|s| s.extents()) else {
            return;
        };

        let transform = self.current_transform();
        self.clip_rasterizer.set_transform(transform);
        self.clip_rasterizer.set_format(PixelFormat::A8);

        {
            let mut session = DrawSession::new(&mut self.clip_rasterizer);
            font.draw_glyph(glyph, &mut session);
        }
        let mask = self.clip_rasterizer.render();

        let new_clip = match self.clip_stack.last() {
            Some(old) => old.intersect_mask_image(&mask, &surf_ext),
            None => Clip::empty(surf_ext.width, surf_ext.height),
        };
        self.clip_rasterizer.recycle_image(mask);
        self.clip_stack.push(new_clip);
    }

    fn push_clip_rectangle(&mut self, xmin: f32, ymin: f32, xmax: f32, ymax: f32) {
        self.ensure_initialized();

        let Some(surf_ext) = self.surface_stack.last().map(|s| s.extents()) else {
            return;
        };
        let w = surf_ext.width;
        let h = surf_ext.height;

        let transform = self.current_transform();

        // Transform the four corners to pixel space.
        let corners = [
            transform.transform_point(point(xmin, ymin)),
            transform.transform_point(point(xmax, ymin)),
            transform.transform_point(point(xmax, ymax)),
            transform.transform_point(point(xmin, ymax)),
        ];

        let mut fmin_x = corners[0].x;
        let mut fmin_y = corners[0].y;
        let mut fmax_x = corners[0].x;
        let mut fmax_y = corners[0].y;
        for c in &corners[1..] {
            fmin_x = fmin_x.min(c.x);
            fmin_y = fmin_y.min(c.y);
            fmax_x = fmax_x.max(c.x);
            fmax_y = fmax_y.max(c.y);
        }

        let px0 = (fmin_x.floor() as i32 - surf_ext.x_origin).max(0);
        let py0 = (fmin_y.floor() as i32 - surf_ext.y_origin).max(0);
        let px1 = (fmax_x.ceil() as i32 - surf_ext.x_origin).min(w as i32);
        let py1 = (fmax_y.ceil() as i32 - surf_ext.y_origin).min(h as i32);

        let Some(old) = self.clip_stack.last() else {
            return;
        };

        let new_clip = if transform.is_axis_aligned() && old.is_rect() {
            old.intersect_rect(px0, py0, px1, py1)
        } else {
            let qx = [
                corners[0].x - surf_ext.x_origin as f32,
                corners[1].x - surf_ext.x_origin as f32,
                corners[2].x - surf_ext.x_origin as f32,
                corners[3].x - surf_ext.x_origin as f32,
            ];
            let qy = [
                corners[0].y - surf_ext.y_origin as f32,
                corners[1].y - surf_ext.y_origin as f32,
                corners[2].y - surf_ext.y_origin as f32,
                corners[3].y - surf_ext.y_origin as f32,
            ];
            old.intersect_quad(qx, qy, px0, py0, px1, py1)
        };

        self.clip_stack.push(new_clip);
    }

    fn pop_clip(&mut self) {
        if self.clip_stack.len() > 1 {
            self.clip_stack.pop();
        }
    }

    fn push_group(&mut self) {
        self.ensure_initialized();
        let surface = self.acquire_surface();
        self.surface_stack.push(surface);
    }

    fn pop_group(&mut self, mode: CompositeMode) {
        if self.surface_stack.len() < 2 {
            return;
        }
        let src = match self.surface_stack.pop() {
            Some(src) => src,
            None => return,
        };
        if let Some(dst) = self.surface_stack.last_mut() {
            if let Err(err) = composite_images(dst, &src, mode) {
                warn!(%err, "group composition skipped");
            }
        }
        self.surface_cache.push(src.into_buffer());
    }

    fn color(&mut self, is_foreground: bool, color: Color) {
        self.ensure_initialized();

        let color = if is_foreground {
            let alpha =
                ((self.foreground.alpha() as u32 * color.alpha() as u32 + 127) / 255) as u8;
            self.foreground.with_alpha(alpha)
        } else {
            color
        };

        let premul = color_to_premul_pixel(color);
        let premul_alpha = (premul >> 24) as u8;
        if premul_alpha == 0 {
            return;
        }

        let Some(clip) = self.clip_stack.last() else {
            return;
        };
        if clip.bounds_empty() {
            return;
        }
        let Some(surf) = self.surface_stack.last_mut() else {
            return;
        };

        let stride = surf.extents().stride as usize;
        let buf = surf.buffer_mut();

        for py in clip.min_y..clip.max_y {
            let row = &mut buf[py as usize * stride..];
            match clip.mask_row(py) {
                None => {
                    if premul_alpha == 255 {
                        // Opaque fill: overwrite the whole run.
                        for px in clip.min_x..clip.max_x {
                            store_pixel(row, px as usize, premul);
                        }
                    } else {
                        for px in clip.min_x..clip.max_x {
                            let d = load_pixel(row, px as usize);
                            store_pixel(row, px as usize, src_over(premul, d));
                        }
                    }
                }
                Some(mask) => {
                    for px in clip.min_x..clip.max_x {
                        let clip_alpha = mask[px as usize];
                        if clip_alpha == 0 {
                            continue;
                        }
                        let d = load_pixel(row, px as usize);
                        let out = if clip_alpha == 255 {
                            if premul_alpha == 255 {
                                premul
                            } else {
                                src_over(premul, d)
                            }
                        } else {
                            src_over(alpha_mul(premul, clip_alpha as u32), d)
                        };
                        store_pixel(row, px as usize, out);
                    }
                }
            }
        }
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

        // Only raw premultiplied BGRA32 planes are handled here.
        if format != PaintImageFormat::Bgra {
            return false;
        }
        let Some(extents) = extents else {
            return false;
        };
        if width == 0 || height == 0 {
            return false;
        }

        let data = image.as_bytes();
        if data.len() < width as usize * height as usize * 4 {
            return false;
        }

        let Some(inv) = self.current_transform().inverse() else {
            return false;
        };

        // Image source rectangle in glyph space: bottom-left anchored,
        // with a negative y step.
        let img_x = extents.x_bearing;
        let img_y = extents.y_bearing + extents.height;
        let img_sx = extents.width / width as f32;
        let img_sy = -extents.height / height as f32;

        let Some(clip) = self.clip_stack.last() else {
            return false;
        };
        let Some(surf) = self.surface_stack.last_mut() else {
            return false;
        };

        paint_clipped(surf, clip, &inv, 0.0, &mut |gx, gy| {
            let ix = ((gx - img_x) / img_sx).floor() as i64;
            let iy = ((gy - img_y) / img_sy).floor() as i64;
            if ix < 0 || ix >= width as i64 || iy < 0 || iy >= height as i64 {
                return None;
            }
            let offset = (iy as usize * width as usize + ix as usize) * 4;
            Some(u32::from_le_bytes([
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ]))
        });

        true
    }

    fn linear_gradient(&mut self, color_line: &dyn ColorLine, p0: Point, p1: Point, p2: Point) {
        self.ensure_initialized();

        let mut stops = self.resolve_stops(color_line);
        if stops.is_empty() {
            return;
        }
        let (mn, mx) = normalize_color_line(&mut stops);
        let extend = color_line.extend();

        let (l0, l1) = reduce_anchors(p0, p1, p2);

        // Apply stop normalization to the axis endpoints.
        let g0 = point(l0.x + mn * (l1.x - l0.x), l0.y + mn * (l1.y - l0.y));
        let g1 = point(l0.x + mx * (l1.x - l0.x), l0.y + mx * (l1.y - l0.y));

        let Some(inv) = self.current_transform().inverse() else {
            return;
        };

        let dx = g1.x - g0.x;
        let dy = g1.y - g0.y;
        let denom = dx * dx + dy * dy;
        if denom < 1e-10 {
            return;
        }
        let inv_denom = 1.0 / denom;

        let Some(clip) = self.clip_stack.last() else {
            return;
        };
        let Some(surf) = self.surface_stack.last_mut() else {
            return;
        };

        paint_clipped(surf, clip, &inv, 0.5, &mut |gx, gy| {
            let t = ((gx - g0.x) * dx + (gy - g0.y) * dy) * inv_denom;
            Some(evaluate_color_line(&stops, t, extend))
        });
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

        let mut stops = self.resolve_stops(color_line);
        if stops.is_empty() {
            return;
        }
        let (mn, mx) = normalize_color_line(&mut stops);
        let extend = color_line.extend();

        // Apply stop normalization to the circle parameters.
        let n0 = point(c0.x + mn * (c1.x - c0.x), c0.y + mn * (c1.y - c0.y));
        let nr0 = r0 + mn * (r1 - r0);
        let n1 = point(c0.x + mx * (c1.x - c0.x), c0.y + mx * (c1.y - c0.y));
        let nr1 = r0 + mx * (r1 - r0);

        let Some(inv) = self.current_transform().inverse() else {
            return;
        };

        // |p − c0 − t(c1−c0)|² = (r0 + t(r1−r0))²  →  At² + Bt + C = 0
        let cdx = n1.x - n0.x;
        let cdy = n1.y - n0.y;
        let dr = nr1 - nr0;
        let a = cdx * cdx + cdy * cdy - dr * dr;

        let Some(clip) = self.clip_stack.last() else {
            return;
        };
        let Some(surf) = self.surface_stack.last_mut() else {
            return;
        };

        paint_clipped(surf, clip, &inv, 0.5, &mut |gx, gy| {
            let dpx = gx - n0.x;
            let dpy = gy - n0.y;
            let b = -2.0 * (dpx * cdx + dpy * cdy + nr0 * dr);
            let c = dpx * dpx + dpy * dpy - nr0 * nr0;

            let t = if a.abs() > 1e-10 {
                let disc = b * b - 4.0 * a * c;
                if disc < 0.0 {
                    return None;
                }
                let sq = disc.sqrt();
                // Prefer the root closer to the outer circle, falling
                // back when it samples a negative radius.
                let t1 = (-b + sq) / (2.0 * a);
                let t2 = (-b - sq) / (2.0 * a);
                if nr0 + t1 * dr >= 0.0 {
                    t1
                } else {
                    t2
                }
            } else {
                // Degenerate to linear: Bt + C = 0.
                if b.abs() < 1e-10 {
                    return None;
                }
                -c / b
            };

            Some(evaluate_color_line(&stops, t, extend))
        });
    }

    fn sweep_gradient(
        &mut self,
        color_line: &dyn ColorLine,
        center: Point,
        start_angle: f32,
        end_angle: f32,
    ) {
        self.ensure_initialized();

        let mut stops = self.resolve_stops(color_line);
        if stops.is_empty() {
            return;
        }
        let (mn, mx) = normalize_color_line(&mut stops);
        let extend = color_line.extend();

        // Apply stop normalization to the angle range.
        let a0 = start_angle + mn * (end_angle - start_angle);
        let a1 = start_angle + mx * (end_angle - start_angle);
        let angle_range = a1 - a0;
        if angle_range.abs() < 1e-10 {
            return;
        }
        let inv_angle_range = 1.0 / angle_range;

        let Some(inv) = self.current_transform().inverse() else {
            return;
        };

        let Some(clip) = self.clip_stack.last() else {
            return;
        };
        let Some(surf) = self.surface_stack.last_mut() else {
            return;
        };

        paint_clipped(surf, clip, &inv, 0.5, &mut |gx, gy| {
            let mut angle = (gy - center.y).atan2(gx - center.x);
            // Normalize to [0, 2π): the sweep seam sits at angle 0.
            if angle < 0.0 {
                angle += 2.0 * std::f32::consts::PI;
            }
            let t = (angle - a0) * inv_angle_range;
            Some(evaluate_color_line(&stops, t, extend))
        });
    }
}
