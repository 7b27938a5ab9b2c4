//! Shared types for the shapescan pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::annotate::AnnotateStyle;
use crate::classify::ClassifierConfig;
use crate::contour::ContourTracerKind;
use crate::summary::Summary;

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbaImage` so downstream crates can reference the
/// decoded and annotated images without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// A closed outline: an ordered point sequence whose last point connects
/// back to the first. The first point is not repeated at the end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boundary(Vec<Point>);

impl Boundary {
    /// Create a new boundary from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the boundary has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the boundary.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    ///
    /// For traced boundaries this is the topmost, then leftmost, pixel.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the boundary and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    /// Enclosed area (shoelace formula, magnitude).
    #[must_use]
    pub fn area(&self) -> f64 {
        crate::geometry::polygon_area(&self.0)
    }

    /// Length of the closed outline, including the closing edge.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        crate::geometry::closed_perimeter(&self.0)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// The label assigned to a detected outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShapeLabel {
    /// Three simplified vertices.
    Triangle,
    /// Four vertices with near-equal sides.
    Square,
    /// Four vertices, elongated.
    Rectangle,
    /// Five vertices.
    Pentagon,
    /// Six vertices.
    Hexagon,
    /// Many vertices and a high circularity score.
    Circle,
    /// Many vertices and a low circularity score.
    Irregular,
    /// Fewer than three vertices after simplification.
    Unknown,
}

impl ShapeLabel {
    /// Every label, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Triangle,
        Self::Square,
        Self::Rectangle,
        Self::Pentagon,
        Self::Hexagon,
        Self::Circle,
        Self::Irregular,
        Self::Unknown,
    ];

    /// Upper-case display name, as drawn on the annotated image.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Triangle => "TRIANGLE",
            Self::Square => "SQUARE",
            Self::Rectangle => "RECTANGLE",
            Self::Pentagon => "PENTAGON",
            Self::Hexagon => "HEXAGON",
            Self::Circle => "CIRCLE",
            Self::Irregular => "IRREGULAR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ShapeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Measurements for one classified outline.
///
/// `area` and `perimeter` always come from the traced boundary, never
/// from its simplified polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRecord {
    /// Assigned shape label.
    pub label: ShapeLabel,
    /// Enclosed area in square pixels.
    pub area: f64,
    /// Outline length in pixels.
    pub perimeter: f64,
    /// Vertex count of the simplified polygon.
    pub vertices: usize,
    /// First point of the traced boundary; labels are placed above it.
    pub anchor: Point,
}

/// A classified outline together with the geometry it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Label and measurements.
    pub record: ShapeRecord,
    /// The traced boundary.
    pub boundary: Boundary,
    /// The simplified polygon used for vertex counting.
    pub simplified: Boundary,
}

/// Edge extraction parameters.
///
/// # Canny threshold invariants
///
/// Both thresholds must be at least [`edge::MIN_THRESHOLD`](crate::edge::MIN_THRESHOLD)
/// and `canny_low` must not exceed `canny_high`. [`AnalysisConfig::validate`]
/// rejects violations; [`edge::canny`](crate::edge::canny) also clamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Extra Gaussian blur sigma applied before edge detection; zero
    /// disables it. Canny smooths with its own fixed sigma on top.
    pub blur_sigma: f32,
    /// Canny low (weak edge) threshold on the 8-bit intensity scale.
    pub canny_low: f32,
    /// Canny high (strong edge) threshold on the 8-bit intensity scale.
    pub canny_high: f32,
    /// Number of 3x3 dilation passes used to close gaps in the edge map.
    pub dilate_iterations: u8,
    /// Which contour tracing algorithm to use.
    pub contour_tracer: ContourTracerKind,
}

impl EdgeConfig {
    /// No pre-blur: the sigma 1.4 Gaussian inside
    /// [`imageproc::edges::canny`] is the only smoothing by default.
    pub const DEFAULT_BLUR_SIGMA: f32 = 0.0;
    /// Default Canny low threshold.
    pub const DEFAULT_CANNY_LOW: f32 = 50.0;
    /// Default Canny high threshold.
    pub const DEFAULT_CANNY_HIGH: f32 = 150.0;
    /// Default number of dilation passes.
    pub const DEFAULT_DILATE_ITERATIONS: u8 = 1;
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            blur_sigma: Self::DEFAULT_BLUR_SIGMA,
            canny_low: Self::DEFAULT_CANNY_LOW,
            canny_high: Self::DEFAULT_CANNY_HIGH,
            dilate_iterations: Self::DEFAULT_DILATE_ITERATIONS,
            contour_tracer: ContourTracerKind::default(),
        }
    }
}

/// Complete configuration for one analysis request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Edge extraction and contour tracing.
    pub edges: EdgeConfig,
    /// Filtering, simplification and classification thresholds.
    pub classifier: ClassifierConfig,
    /// Colors and sizes used when drawing the annotated image.
    pub annotate: AnnotateStyle,
}

impl AnalysisConfig {
    /// Check every parameter for values the pipeline cannot use.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first
    /// offending parameter.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let edges = &self.edges;
        if !edges.blur_sigma.is_finite() || edges.blur_sigma < 0.0 {
            return Err(invalid(format!(
                "blur_sigma must be finite and non-negative, got {}",
                edges.blur_sigma
            )));
        }
        if !(edges.canny_low.is_finite() && edges.canny_high.is_finite()) {
            return Err(invalid("canny thresholds must be finite".to_string()));
        }
        if edges.canny_low < crate::edge::MIN_THRESHOLD {
            return Err(invalid(format!(
                "canny_low must be at least {}, got {}",
                crate::edge::MIN_THRESHOLD,
                edges.canny_low
            )));
        }
        if edges.canny_low > edges.canny_high {
            return Err(invalid(format!(
                "canny_low ({}) must not exceed canny_high ({})",
                edges.canny_low, edges.canny_high
            )));
        }
        self.classifier.validate()?;
        self.annotate.validate()
    }
}

pub(crate) const fn invalid(message: String) -> PipelineError {
    PipelineError::InvalidConfig(message)
}

/// Output of one analysis request.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Classified outlines, in contour tracing order.
    pub detections: Vec<Detection>,
    /// Headline statistics over all records.
    pub summary: Summary,
    /// Copy of the input with outlines and labels drawn on it.
    pub annotated: RgbaImage,
    /// Dimensions of the source image in pixels.
    pub dimensions: Dimensions,
}

impl AnalysisResult {
    /// The measurement records, one per detection, in order.
    #[must_use]
    pub fn records(&self) -> Vec<ShapeRecord> {
        self.detections.iter().map(|d| d.record.clone()).collect()
    }

    /// Serializable view of the result without raster data.
    #[must_use]
    pub fn report(&self) -> AnalysisReport {
        AnalysisReport {
            dimensions: self.dimensions,
            records: self.records(),
            summary: self.summary,
        }
    }
}

/// Serializable measurements of one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Dimensions of the source image in pixels.
    pub dimensions: Dimensions,
    /// One row per classified outline.
    pub records: Vec<ShapeRecord>,
    /// Headline statistics.
    pub summary: Summary,
}

/// Errors that can occur during analysis.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The decoded image has a zero width or height.
    #[error("decoded image has no pixels")]
    EmptyImage,

    /// Analysis configuration is invalid.
    #[error("invalid analysis configuration: {0}")]
    InvalidConfig(String),
}
