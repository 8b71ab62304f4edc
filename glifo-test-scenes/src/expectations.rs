use glifo::{Image, PixelFormat};

/// A single pixel-color expectation to validate after rendering.
///
/// Coordinates are absolute pixel coordinates (the image's origin is
/// honored); expected channels are premultiplied BGRA.
pub struct PixelExpectation {
    pub x: i32,
    pub y: i32,
    pub expected_b: u8,
    pub expected_g: u8,
    pub expected_r: u8,
    pub expected_a: u8,
    /// Per-channel tolerance for comparison (default 2).
    pub tolerance: u8,
    /// Human-readable label for failure messages.
    pub label: &'static str,
}

impl PixelExpectation {
    pub fn new(x: i32, y: i32, b: u8, g: u8, r: u8, a: u8, label: &'static str) -> Self {
        Self {
            x,
            y,
            expected_b: b,
            expected_g: g,
            expected_r: r,
            expected_a: a,
            tolerance: 2,
            label,
        }
    }

    pub fn with_tolerance(mut self, tolerance: u8) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Convenience: expect a fully opaque color, given in RGB order.
    pub fn opaque(x: i32, y: i32, r: u8, g: u8, b: u8, label: &'static str) -> Self {
        Self::new(x, y, b, g, r, 255, label)
    }

    /// Convenience: expect a fully transparent pixel.
    pub fn transparent(x: i32, y: i32, label: &'static str) -> Self {
        Self::new(x, y, 0, 0, 0, 0, label)
    }
}

/// Validates pixel expectations against a rendered BGRA32 image.
///
/// Returns a list of human-readable failure descriptions. An empty list
/// means all expectations passed.
pub fn check_pixels(image: &Image, expectations: &[PixelExpectation]) -> Vec<String> {
    let mut failures = Vec::new();

    if image.format() != PixelFormat::Bgra32 {
        failures.push("image is not BGRA32".to_string());
        return failures;
    }

    let ext = image.extents();
    let buffer = image.buffer();

    for expectation in expectations {
        let col = expectation.x - ext.x_origin;
        let row = expectation.y - ext.y_origin;
        if col < 0 || row < 0 || col as u32 >= ext.width || row as u32 >= ext.height {
            failures.push(format!(
                "[{}] pixel ({},{}) is outside image {}×{} at ({},{})",
                expectation.label,
                expectation.x,
                expectation.y,
                ext.width,
                ext.height,
                ext.x_origin,
                ext.y_origin,
            ));
            continue;
        }

        let offset = row as usize * ext.stride as usize + col as usize * 4;
        let actual = &buffer[offset..offset + 4];
        let expected = [
            expectation.expected_b,
            expectation.expected_g,
            expectation.expected_r,
            expectation.expected_a,
        ];

        let tolerance = expectation.tolerance as i32;
        let matches = actual
            .iter()
            .zip(expected.iter())
            .all(|(&a, &e)| (a as i32 - e as i32).abs() <= tolerance);

        if !matches {
            failures.push(format!(
                "[{}] pixel ({},{}): expected BGRA {:?}, got {:?} (tolerance {})",
                expectation.label, expectation.x, expectation.y, expected, actual, tolerance,
            ));
        }
    }

    failures
}
