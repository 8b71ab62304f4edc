//! The outline-drawing protocol.
//!
//! Glyph outlines reach the rasterizer and the SVG emitters through the
//! [`DrawFuncs`] trait. Hosts never call a sink directly: they drive a
//! [`DrawSession`], which owns the current point, closes an open sub-path
//! when a new one starts, and emits the closing `line_to` back to the
//! sub-path start before `close_path`. Sinks therefore see every segment
//! with an explicit starting point in [`DrawState`] and can treat
//! `move_to` and `close_path` as bookkeeping.

use lyon::math::Point;

/// Pen state carried alongside every outline callback.
#[derive(Debug, Clone, Copy)]
pub struct DrawState {
    /// Current pen position, i.e. the starting point of the incoming
    /// segment.
    pub current: Point,
    /// First point of the open sub-path.
    pub start: Point,
    /// Whether a sub-path is open.
    pub open: bool,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            current: lyon::math::point(0.0, 0.0),
            start: lyon::math::point(0.0, 0.0),
            open: false,
        }
    }
}

/// Receiver of outline-drawing callbacks.
///
/// Implemented by [`Rasterizer`](crate::Rasterizer) and
/// [`SvgDraw`](crate::SvgDraw). `move_to` and `close_path` default to
/// no-ops because the [`DrawSession`] already maintains the current point
/// and emits the closing line segment.
pub trait DrawFuncs {
    fn move_to(&mut self, st: &DrawState, to: Point) {
        let _ = (st, to);
    }

    fn line_to(&mut self, st: &DrawState, to: Point);

    fn quadratic_to(&mut self, st: &DrawState, control: Point, to: Point);

    fn cubic_to(&mut self, st: &DrawState, control1: Point, control2: Point, to: Point);

    fn close_path(&mut self, st: &DrawState) {
        let _ = st;
    }
}

/// Stateful pen over a [`DrawFuncs`] sink.
///
/// # Examples
///
/// ```rust
/// use glifo::{DrawSession, Rasterizer};
/// use lyon::math::point;
///
/// let mut raster = Rasterizer::new();
/// {
///     let mut pen = DrawSession::new(&mut raster);
///     pen.move_to(point(0.0, 0.0));
///     pen.line_to(point(10.0, 0.0));
///     pen.line_to(point(10.0, 10.0));
///     pen.line_to(point(0.0, 10.0));
///     pen.close_path();
/// }
/// let image = raster.render();
/// assert_eq!(image.extents().width, 10);
/// ```
pub struct DrawSession<'a> {
    sink: &'a mut dyn DrawFuncs,
    state: DrawState,
}

impl<'a> DrawSession<'a> {
    pub fn new(sink: &'a mut dyn DrawFuncs) -> Self {
        Self { sink, state: DrawState::default() }
    }

    pub fn move_to(&mut self, to: Point) {
        if self.state.open {
            self.close_path();
        }
        self.sink.move_to(&self.state, to);
        self.state.current = to;
        self.state.start = to;
        self.state.open = true;
    }

    pub fn line_to(&mut self, to: Point) {
        self.sink.line_to(&self.state, to);
        self.state.current = to;
    }

    pub fn quadratic_to(&mut self, control: Point, to: Point) {
        self.sink.quadratic_to(&self.state, control, to);
        self.state.current = to;
    }

    pub fn cubic_to(&mut self, control1: Point, control2: Point, to: Point) {
        self.sink.cubic_to(&self.state, control1, control2, to);
        self.state.current = to;
    }

    /// Closes the current sub-path. If the pen is not back at the
    /// sub-path start, the closing line segment is emitted first.
    pub fn close_path(&mut self) {
        if !self.state.open {
            return;
        }
        if self.state.current != self.state.start {
            let start = self.state.start;
            self.sink.line_to(&self.state, start);
            self.state.current = start;
        }
        self.sink.close_path(&self.state);
        self.state.open = false;
    }
}

impl Drop for DrawSession<'_> {
    fn drop(&mut self) {
        if self.state.open {
            self.close_path();
        }
    }
}
