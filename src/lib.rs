//! # Glifo
//!
//! Glifo is a CPU glyph rendering library built in Rust. It turns glyph
//! outlines and color-glyph paint descriptions into antialiased pixel
//! buffers and resolution-independent SVG documents, with no GPU or
//! window-system dependency.
//!
//! ## Features
//!
//! - **Outline rasterization**: An exact area/coverage scanline
//!   rasterizer (with a tiled multi-sample alternative) produces 8-bit
//!   alpha images from contour-drawing callbacks.
//! - **Color glyph painting**: A paint engine executes transform, clip,
//!   group, color, gradient and image operations into premultiplied
//!   BGRA32 images, with the full Porter-Duff and PDF blend-mode set.
//! - **SVG output**: Draw and paint serializers emit compact SVG
//!   documents, deduplicating shared outlines and color glyphs through
//!   `<defs>`/`<use>`.
//! - **Embedded-SVG subsetting**: Multi-glyph SVG documents carried by
//!   color fonts are subset to exactly one glyph's subtree, with ids
//!   renamed per extraction to avoid collisions.
//!
//! Text shaping, font parsing and glyph sourcing stay on the host side:
//! the library consumes outlines through the [`DrawFuncs`] protocol and
//! color descriptions through the [`PaintFuncs`] protocol, with the
//! host's font wrapped in a [`GlyphProvider`].
//!
//! ## Getting started
//!
//! Rasterizing a simple closed contour:
//!
//! ```rust
//! use glifo::{DrawSession, Rasterizer};
//! use lyon::math::point;
//!
//! let mut raster = Rasterizer::new();
//! {
//!     let mut pen = DrawSession::new(&mut raster);
//!     pen.move_to(point(1.0, 1.0));
//!     pen.line_to(point(19.0, 1.0));
//!     pen.quadratic_to(point(19.0, 19.0), point(1.0, 19.0));
//!     pen.close_path();
//! }
//!
//! let image = raster.render();
//! let extents = image.extents();
//! assert_eq!((extents.width, extents.height), (18, 18));
//! assert_eq!(image.alpha_at(4, 4), 255);
//! ```
//!
//! The same contour stream fed into an [`SvgDraw`] yields an SVG
//! document instead; a [`Painter`] or [`SvgPaint`] does the equivalent
//! for color glyph paint trees.

pub use lyon;

mod blob;
mod cache;
mod clip;
mod color;
mod compose;
mod draw;
mod error;
mod flatten;
mod geometry;
mod image;
mod paint;
mod painter;
mod raster;
mod svg;

pub use blob::Blob;
pub use color::Color;
pub use compose::{composite_images, composite_images_clipped, composite_pixel, CompositeMode};
pub use draw::{DrawFuncs, DrawSession, DrawState};
pub use error::Error;
pub use geometry::{ExtentsMode, GlyphExtents, RasterExtents, Transform, VectorExtents};
pub use image::{Image, PixelFormat};
pub use paint::{
    ColorLine, ColorStop, Extend, GlyphProvider, PaintFuncs, PaintImageFormat, SimpleColorLine,
};
pub use painter::Painter;
pub use raster::{RasterBackend, Rasterizer};
pub use svg::{SvgDocument, SvgDocumentStore, SvgDraw, SvgPaint};
