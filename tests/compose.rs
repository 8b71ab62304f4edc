//! Compositor laws over whole images and single pixels.

use glifo::{
    composite_images, composite_images_clipped, composite_pixel, CompositeMode, Error, Image,
    PixelFormat, RasterExtents,
};

fn bgra_image(width: u32, height: u32, pixels: &[u32]) -> Image {
    assert_eq!(pixels.len(), (width * height) as usize);
    let mut buffer = Vec::with_capacity(pixels.len() * 4);
    for px in pixels {
        buffer.extend_from_slice(&px.to_le_bytes());
    }
    Image::from_buffer(buffer, RasterExtents::new(0, 0, width, height), PixelFormat::Bgra32)
        .expect("valid test image")
}

fn pixel_at(image: &Image, x: u32, y: u32) -> u32 {
    let ext = image.extents();
    let offset = (y * ext.stride + x * 4) as usize;
    u32::from_le_bytes([
        image.buffer()[offset],
        image.buffer()[offset + 1],
        image.buffer()[offset + 2],
        image.buffer()[offset + 3],
    ])
}

const OPAQUE_RED: u32 = 0xFFFF_0000;
const OPAQUE_BLUE: u32 = 0xFF00_00FF;
const HALF_WHITE: u32 = 0x7F7F_7F7F;

#[test]
fn src_over_with_opaque_source_equals_src() {
    let src = bgra_image(2, 2, &[OPAQUE_RED, OPAQUE_BLUE, OPAQUE_RED, OPAQUE_BLUE]);

    let mut over = bgra_image(2, 2, &[HALF_WHITE; 4]);
    composite_images(&mut over, &src, CompositeMode::SrcOver).expect("compatible");

    let mut copy = bgra_image(2, 2, &[HALF_WHITE; 4]);
    composite_images(&mut copy, &src, CompositeMode::Src).expect("compatible");

    assert_eq!(over.buffer(), copy.buffer());
}

#[test]
fn clear_zeroes_and_is_idempotent() {
    let src = bgra_image(2, 1, &[OPAQUE_RED, OPAQUE_BLUE]);
    let mut dst = bgra_image(2, 1, &[HALF_WHITE, HALF_WHITE]);

    composite_images(&mut dst, &src, CompositeMode::Clear).expect("compatible");
    assert!(dst.buffer().iter().all(|&b| b == 0));

    composite_images(&mut dst, &src, CompositeMode::Clear).expect("compatible");
    assert!(dst.buffer().iter().all(|&b| b == 0));
}

#[test]
fn plus_saturates() {
    let src = bgra_image(1, 1, &[0xC0C0_C0C0]);
    let mut dst = bgra_image(1, 1, &[0xC0C0_C0C0]);

    composite_images(&mut dst, &src, CompositeMode::Plus).expect("compatible");
    assert_eq!(pixel_at(&dst, 0, 0), 0xFFFF_FFFF);
}

#[test]
fn dest_leaves_destination_untouched() {
    let src = bgra_image(1, 1, &[OPAQUE_RED]);
    let mut dst = bgra_image(1, 1, &[OPAQUE_BLUE]);
    composite_images(&mut dst, &src, CompositeMode::Dest).expect("compatible");
    assert_eq!(pixel_at(&dst, 0, 0), OPAQUE_BLUE);
}

#[test]
fn porter_duff_pixel_identities() {
    let s = OPAQUE_RED;
    let d = OPAQUE_BLUE;

    assert_eq!(composite_pixel(s, d, CompositeMode::Clear), 0);
    assert_eq!(composite_pixel(s, d, CompositeMode::Src), s);
    assert_eq!(composite_pixel(s, d, CompositeMode::Dest), d);
    // Both operands opaque: IN selects the operand, OUT erases it.
    assert_eq!(composite_pixel(s, d, CompositeMode::SrcIn), s);
    assert_eq!(composite_pixel(s, d, CompositeMode::DestIn), d);
    assert_eq!(composite_pixel(s, d, CompositeMode::SrcOut), 0);
    assert_eq!(composite_pixel(s, d, CompositeMode::DestOut), 0);
    assert_eq!(composite_pixel(s, d, CompositeMode::Xor), 0);

    // Against a transparent destination, ATOP keeps nothing of src.
    assert_eq!(composite_pixel(s, 0, CompositeMode::SrcAtop), 0);
    assert_eq!(composite_pixel(s, 0, CompositeMode::DestAtop), s);
}

#[test]
fn multiply_by_white_is_identity() {
    let white = 0xFFFF_FFFF;
    let d = OPAQUE_BLUE;
    assert_eq!(composite_pixel(white, d, CompositeMode::Multiply), d);
}

#[test]
fn screen_with_black_is_identity() {
    let black = 0xFF00_0000;
    let d = OPAQUE_RED;
    assert_eq!(composite_pixel(black, d, CompositeMode::Screen), d);
}

#[test]
fn hsl_luminosity_preserves_destination_color_for_gray_source() {
    // A gray source carries only luminosity; blending it onto a
    // saturated destination keeps alpha and changes brightness.
    let gray = 0xFF80_8080;
    let d = OPAQUE_RED;
    let out = composite_pixel(gray, d, CompositeMode::HslLuminosity);
    assert_eq!(out >> 24, 255);
    assert_ne!(out, d);
}

#[test]
fn extents_mismatch_is_reported() {
    let src = bgra_image(2, 1, &[OPAQUE_RED, OPAQUE_RED]);
    let mut dst = bgra_image(1, 1, &[OPAQUE_BLUE]);
    assert_eq!(
        composite_images(&mut dst, &src, CompositeMode::SrcOver),
        Err(Error::ExtentsMismatch)
    );
}

#[test]
fn a8_images_are_rejected() {
    let src = bgra_image(1, 1, &[OPAQUE_RED]);
    let mut dst = Image::new(RasterExtents::new(0, 0, 1, 1), PixelFormat::A8);
    assert_eq!(
        composite_images(&mut dst, &src, CompositeMode::SrcOver),
        Err(Error::UnsupportedFormat)
    );
}

#[test]
fn clipped_composition_honors_rect_and_mask() {
    let src = bgra_image(4, 1, &[OPAQUE_RED; 4]);
    let mut dst = bgra_image(4, 1, &[0; 4]);

    // Clip rectangle excludes the first and last column.
    composite_images_clipped(&mut dst, &src, CompositeMode::SrcOver, None, 1, 0, 3, 1)
        .expect("compatible");
    assert_eq!(pixel_at(&dst, 0, 0), 0);
    assert_eq!(pixel_at(&dst, 1, 0), OPAQUE_RED);
    assert_eq!(pixel_at(&dst, 2, 0), OPAQUE_RED);
    assert_eq!(pixel_at(&dst, 3, 0), 0);

    // A8 mask modulates the source.
    let mask = Image::from_buffer(
        vec![0, 255, 127, 0],
        RasterExtents::new(0, 0, 4, 1),
        PixelFormat::A8,
    )
    .expect("valid mask");
    let mut masked = bgra_image(4, 1, &[0; 4]);
    composite_images_clipped(&mut masked, &src, CompositeMode::SrcOver, Some(&mask), 0, 0, 4, 1)
        .expect("compatible");
    assert_eq!(pixel_at(&masked, 0, 0), 0);
    assert_eq!(pixel_at(&masked, 1, 0), OPAQUE_RED);
    let half = pixel_at(&masked, 2, 0);
    assert_eq!(half >> 24, 127);
    assert_eq!(pixel_at(&masked, 3, 0), 0);
}
