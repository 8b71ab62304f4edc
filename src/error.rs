//! Error type for the fallible parts of the public API.
//!
//! Most operations in this crate follow a total, by-value failure model:
//! degenerate inputs are normalised and empty results are valid. The
//! handful of operations that can genuinely be misused report through
//! [`Error`].

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Compositing requires both images to have identical extents.
    #[error("source and destination extents do not match")]
    ExtentsMismatch,

    /// Compositing operates on premultiplied BGRA32 images only.
    #[error("image is not in BGRA32 format")]
    UnsupportedFormat,

    /// The stride is too small for the image width and format.
    #[error("stride {stride} is smaller than a pixel row ({minimum} bytes)")]
    InvalidStride { stride: u32, minimum: u32 },

    /// A caller-supplied pixel buffer does not match `stride * height`.
    #[error("pixel buffer holds {actual} bytes, extents require {expected}")]
    BufferSize { expected: usize, actual: usize },
}
