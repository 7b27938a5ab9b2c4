//! Optional Gaussian smoothing before edge detection.
//!
//! Wraps [`imageproc::filter::gaussian_blur_f32`]. [`imageproc::edges::canny`]
//! already smooths with sigma 1.4 (roughly a 5x5 kernel), so the default
//! pipeline skips this stage. A positive sigma adds blur for noisy
//! photographs at the cost of thin outlines.

use image::GrayImage;

/// Apply Gaussian blur to a grayscale image.
///
/// Non-positive and non-finite sigma values return the image unchanged,
/// since `imageproc` panics on anything but a positive sigma.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &GrayImage, sigma: f32) -> GrayImage {
    if !sigma.is_finite() || sigma <= 0.0 {
        return image.clone();
    }

    imageproc::filter::gaussian_blur_f32(image, sigma)
}
