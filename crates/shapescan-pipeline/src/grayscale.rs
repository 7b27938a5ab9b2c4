//! Image decoding and grayscale conversion.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces the RGBA
//! working image plus a single-channel intensity map for edge detection.
//!
//! This is the first step in the pipeline: raw bytes in, `RgbaImage` out.

use image::{GrayImage, RgbaImage};

use crate::types::PipelineError;

/// Decode raw image bytes into an RGBA image.
///
/// Supports whatever formats the `image` crate was built with (PNG and
/// JPEG at minimum).
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
/// Returns [`PipelineError::EmptyImage`] if the decoded image has a zero
/// width or height.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?.to_rgba8();
    if img.width() == 0 || img.height() == 0 {
        return Err(PipelineError::EmptyImage);
    }
    Ok(img)
}

/// Convert an RGBA image to 8-bit intensity.
///
/// Uses the `image` crate's luma conversion (Rec. 709 weights
/// `0.2126*R + 0.7152*G + 0.0722*B`, truncated). Alpha is ignored.
#[must_use = "returns the grayscale image"]
pub fn to_grayscale(image: &RgbaImage) -> GrayImage {
    image::imageops::grayscale(image)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Helper: encode an RGBA image as a PNG byte buffer.
    fn encode_png(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    fn solid(r: u8, g: u8, b: u8) -> RgbaImage {
        RgbaImage::from_pixel(1, 1, image::Rgba([r, g, b, 255]))
    }

    #[test]
    fn empty_input_returns_error() {
        let result = decode(&[]);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn valid_png_decodes_with_original_pixels() {
        let img = RgbaImage::from_fn(17, 31, |x, y| {
            image::Rgba([(x * 10) as u8, (y * 5) as u8, 32, 255])
        });
        let decoded = decode(&encode_png(&img)).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn white_and_black_map_to_extremes() {
        assert_eq!(to_grayscale(&solid(255, 255, 255)).get_pixel(0, 0).0[0], 255);
        assert_eq!(to_grayscale(&solid(0, 0, 0)).get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn grayscale_uses_luma_weights() {
        // 0.2126 * 255 = 54.2, 0.7152 * 255 = 182.4, 0.0722 * 255 = 18.4
        assert_eq!(to_grayscale(&solid(255, 0, 0)).get_pixel(0, 0).0[0], 54);
        assert_eq!(to_grayscale(&solid(0, 255, 0)).get_pixel(0, 0).0[0], 182);
        assert_eq!(to_grayscale(&solid(0, 0, 255)).get_pixel(0, 0).0[0], 18);
    }

    #[test]
    fn grayscale_ignores_alpha() {
        let transparent = RgbaImage::from_pixel(1, 1, image::Rgba([90, 90, 90, 0]));
        assert_eq!(to_grayscale(&transparent).get_pixel(0, 0).0[0], 90);
    }

    #[test]
    fn grayscale_preserves_dimensions() {
        let img = RgbaImage::new(13, 29);
        let gray = to_grayscale(&img);
        assert_eq!(gray.dimensions(), (13, 29));
    }
}
