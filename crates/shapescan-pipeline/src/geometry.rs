//! Planar measurements on boundaries: area, perimeter, bounding
//! rectangles and circularity.
//!
//! Area, perimeter and the minimum-area rectangle come from
//! [`imageproc::geometry`]; boundaries are converted to `imageproc`
//! points at the call. All functions treat their input as a closed
//! polygon (the last point connects back to the first).

use std::f64::consts::PI;

use imageproc::point::Point as PixelPoint;
use serde::{Deserialize, Serialize};

use crate::types::Point;

fn to_pixel_f64(points: &[Point]) -> Vec<PixelPoint<f64>> {
    points.iter().map(|p| PixelPoint::new(p.x, p.y)).collect()
}

/// Nearest pixel-grid point.
#[allow(clippy::cast_possible_truncation)]
fn to_pixel_i32(p: Point) -> PixelPoint<i32> {
    PixelPoint::new(p.x.round() as i32, p.y.round() as i32)
}

/// Enclosed area of a closed polygon (shoelace formula).
///
/// Returns the magnitude, so clockwise and counter-clockwise inputs
/// agree. Fewer than three points give zero.
#[must_use]
pub fn polygon_area(points: &[Point]) -> f64 {
    imageproc::geometry::contour_area(&to_pixel_f64(points))
}

/// Total edge length of a closed polygon, including the closing edge.
#[must_use]
pub fn closed_perimeter(points: &[Point]) -> f64 {
    imageproc::geometry::arc_length(&to_pixel_f64(points), true)
}

/// Roundness score `4π·area / perimeter²`.
///
/// 1.0 for a perfect circle, smaller for anything else. Zero when the
/// perimeter is zero.
#[must_use]
pub fn circularity(area: f64, perimeter: f64) -> f64 {
    if perimeter <= 0.0 {
        return 0.0;
    }
    4.0 * PI * area / (perimeter * perimeter)
}

/// A rectangle at arbitrary rotation, snapped to the pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotatedRect {
    /// The four corners, in order around the rectangle.
    pub corners: [Point; 4],
    /// Shorter side length.
    pub width: f64,
    /// Longer side length.
    pub height: f64,
}

impl RotatedRect {
    /// Area of the rectangle.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// `max(width, height) / min(width, height)`.
    ///
    /// `None` when either side is zero (degenerate rectangle).
    #[must_use]
    pub fn aspect_ratio(&self) -> Option<f64> {
        aspect_ratio(self.width, self.height)
    }
}

/// Smallest-area rectangle, at any rotation, enclosing `points`.
///
/// Points are rounded to the pixel grid and deduplicated before
/// [`imageproc::geometry::min_area_rect`] runs its hull and rotating
/// calipers. Returns `None` for empty input; one or two distinct points
/// give a rectangle with a zero side.
#[must_use]
pub fn min_area_rect(points: &[Point]) -> Option<RotatedRect> {
    let mut pixels: Vec<PixelPoint<i32>> = points.iter().map(|&p| to_pixel_i32(p)).collect();
    pixels.sort_unstable_by_key(|p| (p.x, p.y));
    pixels.dedup();
    if pixels.is_empty() {
        return None;
    }

    let corners = imageproc::geometry::min_area_rect(&pixels)
        .map(|c| Point::new(f64::from(c.x), f64::from(c.y)));

    // Of the three other corners, the farthest is diagonal to the first.
    let mut spans = [1, 2, 3].map(|i| corners[0].distance(corners[i]));
    spans.sort_unstable_by(f64::total_cmp);
    Some(RotatedRect {
        corners,
        width: spans[0],
        height: spans[1],
    })
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

/// Axis-aligned bounding box of `points`, or `None` when empty.
#[must_use]
pub fn bounding_box(points: &[Point]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    })
}

/// `max / min` of two side lengths; `None` if either is zero.
#[must_use]
pub fn aspect_ratio(width: f64, height: f64) -> Option<f64> {
    let (short, long) = if width < height {
        (width, height)
    } else {
        (height, width)
    };
    (short > 0.0).then(|| long / short)
}
