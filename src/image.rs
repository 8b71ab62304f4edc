//! Pixel images produced by the rasterizer and the paint engine.

use std::any::Any;

use crate::geometry::RasterExtents;

/// Pixel format of an [`Image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit unpremultiplied coverage, one byte per pixel.
    #[default]
    A8,
    /// 32-bit premultiplied color, little-endian `B G R A` byte order.
    Bgra32,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::A8 => 1,
            PixelFormat::Bgra32 => 4,
        }
    }

    /// Default row stride for a given width: `width * 4` for BGRA32,
    /// `width` rounded up to a 4-byte boundary for A8.
    pub fn default_stride(&self, width: u32) -> u32 {
        match self {
            PixelFormat::A8 => (width + 3) & !3,
            PixelFormat::Bgra32 => width * 4,
        }
    }
}

/// A rendered pixel buffer with extents and format.
///
/// Images are plain owned values; share one with `Arc<Image>` when several
/// owners need it. The buffer always holds exactly `stride * height`
/// bytes. Rasterizers and painters can take a spent image back through
/// their `recycle_image` operations to reuse its allocation.
pub struct Image {
    buffer: Vec<u8>,
    extents: RasterExtents,
    format: PixelFormat,
    user_data: Option<Box<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("extents", &self.extents)
            .field("format", &self.format)
            .field("buffer_len", &self.buffer.len())
            .finish()
    }
}

impl Clone for Image {
    /// Deep-copies the pixel buffer. User data is not cloned.
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
            extents: self.extents,
            format: self.format,
            user_data: None,
        }
    }
}

impl Image {
    /// Allocates a zero-filled image, filling in a default stride when
    /// the given extents carry `stride == 0`.
    ///
    /// An empty width or height yields a valid image with an empty
    /// buffer.
    pub fn new(mut extents: RasterExtents, format: PixelFormat) -> Self {
        if extents.stride == 0 {
            extents.stride = format.default_stride(extents.width);
        }
        let size = if extents.is_empty() {
            0
        } else {
            extents.stride as usize * extents.height as usize
        };
        Self { buffer: vec![0; size], extents, format, user_data: None }
    }

    /// Wraps a caller-supplied pixel buffer. The stride (auto-computed
    /// when `0`) must cover a pixel row and the buffer must hold
    /// exactly `stride * height` bytes.
    pub fn from_buffer(
        buffer: Vec<u8>,
        mut extents: RasterExtents,
        format: PixelFormat,
    ) -> Result<Self, crate::error::Error> {
        if extents.stride == 0 {
            extents.stride = format.default_stride(extents.width);
        }
        let minimum = extents.width * format.bytes_per_pixel();
        if extents.stride < minimum {
            return Err(crate::error::Error::InvalidStride { stride: extents.stride, minimum });
        }
        let expected = if extents.is_empty() {
            0
        } else {
            extents.stride as usize * extents.height as usize
        };
        if buffer.len() != expected {
            return Err(crate::error::Error::BufferSize { expected, actual: buffer.len() });
        }
        Ok(Self { buffer, extents, format, user_data: None })
    }

    /// Like [`Image::new`] but reuses `recycled` as the backing
    /// allocation when one is available.
    pub(crate) fn with_recycled(
        mut extents: RasterExtents,
        format: PixelFormat,
        recycled: Option<Vec<u8>>,
    ) -> Self {
        if extents.stride == 0 {
            extents.stride = format.default_stride(extents.width);
        }
        let size = if extents.is_empty() {
            0
        } else {
            extents.stride as usize * extents.height as usize
        };
        let mut buffer = recycled.unwrap_or_default();
        buffer.clear();
        buffer.resize(size, 0);
        Self { buffer, extents, format, user_data: None }
    }

    /// Consumes the image, returning its backing allocation for reuse.
    pub(crate) fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }

    /// The raw pixel buffer, `stride * height` bytes.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    pub fn extents(&self) -> RasterExtents {
        self.extents
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Reads one byte of an A8 image at pixel coordinates, returning `0`
    /// outside the image.
    pub fn alpha_at(&self, x: i32, y: i32) -> u8 {
        let col = x - self.extents.x_origin;
        let row = y - self.extents.y_origin;
        if col < 0 || row < 0 || col as u32 >= self.extents.width || row as u32 >= self.extents.height
        {
            return 0;
        }
        self.buffer[row as usize * self.extents.stride as usize + col as usize]
    }

    /// Attaches arbitrary user data to the image, replacing any previous
    /// value.
    pub fn set_user_data(&mut self, data: Box<dyn Any + Send + Sync>) {
        self.user_data = Some(data);
    }

    /// Fetches previously attached user data.
    pub fn user_data(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.user_data.as_deref()
    }
}
