//! Edge extraction: Canny edge detection followed by dilation.
//!
//! Wraps [`imageproc::edges::canny`], which smooths with its own sigma 1.4
//! Gaussian before taking gradients, and [`imageproc::morphology::dilate`]
//! to thicken the edges so that small breaks in an outline do not split
//! it into separate contours.
//! Both produce binary images where 255 marks an edge and 0 background.

use image::GrayImage;
use imageproc::distance_transform::Norm;

use crate::types::EdgeConfig;

/// Minimum allowed Canny threshold.
///
/// A low threshold of zero treats every pixel with any gradient as a
/// potential edge and lets hysteresis spread into the image border.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Detect edges using the Canny algorithm.
///
/// Returns a binary image: 255 for edge pixels, 0 for non-edge.
///
/// Both thresholds are clamped to a minimum of [`MIN_THRESHOLD`] and
/// `low_threshold` is clamped to be at most `high_threshold`.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let high = high_threshold.max(MIN_THRESHOLD);
    let low = low_threshold.max(MIN_THRESHOLD).min(high);
    imageproc::edges::canny(image, low, high)
}

/// Dilate a binary edge map with a 3x3 square structuring element.
///
/// Each pass sets a pixel to 255 when any of its eight neighbours is
/// set. Zero iterations return the map unchanged.
#[must_use = "returns the dilated edge map"]
pub fn dilate(edges: &GrayImage, iterations: u8) -> GrayImage {
    let mut out = edges.clone();
    for _ in 0..iterations {
        out = imageproc::morphology::dilate(&out, Norm::LInf, 1);
    }
    out
}

/// Optional pre-blur, detect and dilate: grayscale intensity in, closed
/// edge map out.
#[must_use = "returns the binary edge map"]
pub fn extract_edges(gray: &GrayImage, config: &EdgeConfig) -> GrayImage {
    let blurred = crate::blur::gaussian_blur(gray, config.blur_sigma);
    let edges = canny(&blurred, config.canny_low, config.canny_high);
    dilate(&edges, config.dilate_iterations)
}

/// Count edge pixels (value == 255) in a binary image.
#[must_use]
pub fn count_edge_pixels(image: &GrayImage) -> u64 {
    image
        .pixels()
        .map(|p| u64::from(u8::from(p.0[0] == 255)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 20x20 image with a sharp vertical boundary at x = 10.
    fn sharp_edge_image() -> GrayImage {
        GrayImage::from_fn(20, 20, |x, _y| {
            if x < 10 {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        })
    }

    #[test]
    fn blank_image_produces_no_edges() {
        let img = GrayImage::from_pixel(20, 20, image::Luma([128]));
        let edges = canny(&img, 50.0, 150.0);
        assert_eq!(edges.dimensions(), (20, 20));
        assert_eq!(count_edge_pixels(&edges), 0);
    }

    #[test]
    fn sharp_edge_detected() {
        let edges = canny(&sharp_edge_image(), 50.0, 150.0);
        assert!(count_edge_pixels(&edges) > 0);
    }

    #[test]
    fn zero_low_threshold_is_clamped_to_min() {
        let img = sharp_edge_image();
        assert_eq!(canny(&img, 0.0, 150.0), canny(&img, MIN_THRESHOLD, 150.0));
    }

    #[test]
    fn low_above_high_is_clamped() {
        let img = sharp_edge_image();
        assert_eq!(canny(&img, 200.0, 100.0), canny(&img, 100.0, 100.0));
    }

    #[test]
    fn dilate_grows_single_pixel_to_square() {
        let mut img = GrayImage::new(7, 7);
        img.put_pixel(3, 3, image::Luma([255]));
        let dilated = dilate(&img, 1);
        assert_eq!(count_edge_pixels(&dilated), 9);
        for y in 2..=4 {
            for x in 2..=4 {
                assert_eq!(dilated.get_pixel(x, y).0[0], 255, "({x},{y})");
            }
        }
        assert_eq!(dilated.get_pixel(1, 3).0[0], 0);
    }

    #[test]
    fn dilate_twice_grows_to_five_by_five() {
        let mut img = GrayImage::new(9, 9);
        img.put_pixel(4, 4, image::Luma([255]));
        assert_eq!(count_edge_pixels(&dilate(&img, 2)), 25);
    }

    #[test]
    fn zero_iterations_is_identity() {
        let mut img = GrayImage::new(5, 5);
        img.put_pixel(2, 2, image::Luma([255]));
        assert_eq!(dilate(&img, 0), img);
    }

    #[test]
    fn dilation_closes_one_pixel_gap() {
        // Two horizontal segments separated by a single missing pixel.
        let mut img = GrayImage::new(12, 5);
        for x in (1..6).chain(7..11) {
            img.put_pixel(x, 2, image::Luma([255]));
        }
        let dilated = dilate(&img, 1);
        assert_eq!(dilated.get_pixel(6, 2).0[0], 255);
    }

    #[test]
    fn extract_edges_on_uniform_image_is_empty() {
        let img = GrayImage::from_pixel(30, 30, image::Luma([200]));
        let edges = extract_edges(&img, &EdgeConfig::default());
        assert_eq!(count_edge_pixels(&edges), 0);
    }

    #[test]
    fn extract_edges_keeps_one_pixel_outlines() {
        // A single dark pixel ring, the thinnest outline a drawing has.
        let img = GrayImage::from_fn(80, 80, |x, y| {
            let on_ring = (20..=60).contains(&x)
                && (20..=60).contains(&y)
                && (x == 20 || x == 60 || y == 20 || y == 60);
            if on_ring {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        });
        let edges = extract_edges(&img, &EdgeConfig::default());
        assert_eq!(edges.get_pixel(40, 40).0[0], 0);
        let near = |c: u32| c - 4..=c + 4;
        assert!(near(20).any(|x| edges.get_pixel(x, 40).0[0] == 255));
        assert!(near(60).any(|x| edges.get_pixel(x, 40).0[0] == 255));
        assert!(near(20).any(|y| edges.get_pixel(40, y).0[0] == 255));
        assert!(near(60).any(|y| edges.get_pixel(40, y).0[0] == 255));
    }

    #[test]
    fn extract_edges_finds_filled_square_outline() {
        let img = GrayImage::from_fn(60, 60, |x, y| {
            if (20..40).contains(&x) && (20..40).contains(&y) {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        });
        let edges = extract_edges(&img, &EdgeConfig::default());
        // Interior and far background stay clear.
        assert_eq!(edges.get_pixel(30, 30).0[0], 0);
        assert_eq!(edges.get_pixel(5, 5).0[0], 0);
        // The outline is present along the left side.
        let left_band = (17..23).any(|x| edges.get_pixel(x, 30).0[0] == 255);
        assert!(left_band, "expected an edge near x=20");
    }
}
