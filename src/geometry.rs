//! Affine transforms and extents types shared by the raster and vector
//! pipelines.

use lyon::math::{point, Point};

/// A 2×3 affine transform.
///
/// Maps `(x, y)` to `(xx·x + xy·y + x0, yx·x + yy·y + y0)`. The identity
/// transform is the initial state of every draw and paint object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub xx: f32,
    pub yx: f32,
    pub xy: f32,
    pub yy: f32,
    pub x0: f32,
    pub y0: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        xx: 1.0,
        yx: 0.0,
        xy: 0.0,
        yy: 1.0,
        x0: 0.0,
        y0: 0.0,
    };

    pub fn new(xx: f32, yx: f32, xy: f32, yy: f32, x0: f32, y0: f32) -> Self {
        Self { xx, yx, xy, yy, x0, y0 }
    }

    pub fn transform_point(&self, p: Point) -> Point {
        point(
            self.xx * p.x + self.xy * p.y + self.x0,
            self.yx * p.x + self.yy * p.y + self.y0,
        )
    }

    /// Composes `self` with `other` so that the result applies `other`
    /// first, then `self`.
    pub fn then(&self, other: &Transform) -> Transform {
        Transform {
            xx: self.xx * other.xx + self.xy * other.yx,
            yx: self.yx * other.xx + self.yy * other.yx,
            xy: self.xx * other.xy + self.xy * other.yy,
            yy: self.yx * other.xy + self.yy * other.yy,
            x0: self.xx * other.x0 + self.xy * other.y0 + self.x0,
            y0: self.yx * other.x0 + self.yy * other.y0 + self.y0,
        }
    }

    pub fn determinant(&self) -> f32 {
        self.xx * self.yy - self.xy * self.yx
    }

    /// Returns the inverse transform, or `None` when the transform is
    /// numerically degenerate (`|det| < 1e-10`).
    pub fn inverse(&self) -> Option<Transform> {
        let det = self.determinant();
        if det.abs() < 1e-10 {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(Transform {
            xx: self.yy * inv_det,
            yx: -self.yx * inv_det,
            xy: -self.xy * inv_det,
            yy: self.xx * inv_det,
            x0: (self.xy * self.y0 - self.yy * self.x0) * inv_det,
            y0: (self.yx * self.x0 - self.xx * self.y0) * inv_det,
        })
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// An axis-aligned transform has no shear or rotation components.
    pub fn is_axis_aligned(&self) -> bool {
        self.xy == 0.0 && self.yx == 0.0
    }
}

/// Pixel-buffer extents of a raster image.
///
/// `stride` of `0` means auto-compute on input; it is always filled on
/// output. The default stride is `width * 4` for BGRA32 and
/// `(width + 3) & !3` for A8 (rows padded to a 4-byte boundary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RasterExtents {
    pub x_origin: i32,
    pub y_origin: i32,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
}

impl RasterExtents {
    pub fn new(x_origin: i32, y_origin: i32, width: u32, height: u32) -> Self {
        Self { x_origin, y_origin, width, height, stride: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Float extents of a vector (SVG) document, forming the `viewBox`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VectorExtents {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl VectorExtents {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Smallest box containing both extents.
    pub fn union(&self, other: &VectorExtents) -> VectorExtents {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = (self.y + self.height).max(other.y + other.height);
        VectorExtents { x: x0, y: y0, width: x1 - x0, height: y1 - y0 }
    }
}

/// Glyph-space bounding box as reported by the host font.
///
/// `y_bearing` is the top of the box; `height` extends downwards in glyph
/// space, following the usual font convention.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphExtents {
    pub x_bearing: f32,
    pub y_bearing: f32,
    pub width: f32,
    pub height: f32,
}

/// How a glyph placement affects the output extents of an SVG emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtentsMode {
    /// Leave the configured extents untouched.
    Keep,
    /// Grow the extents by the transformed glyph bounding box.
    Expand,
}
