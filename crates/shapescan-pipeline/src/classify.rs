//! Shape classification: boundary in, labelled measurement out.
//!
//! The decision procedure dispatches on the vertex count of the
//! simplified polygon first, and only looks at aspect ratio (four
//! vertices) or circularity (many vertices) when the count alone is not
//! enough. [`classify`] is the pure decision function; [`classify_boundary`]
//! wraps it with measurement, noise filtering and simplification.
//!
//! Two named presets exist because two rules for quadrilaterals are in
//! use:
//!
//! - [`ClassifierPreset::Strict`] measures the minimum-area rotated
//!   rectangle of the boundary and calls it a square when the long side
//!   is less than `max_square_aspect` times the short side. Five and six
//!   vertices are pentagons and hexagons; more vertices go through the
//!   circularity test.
//! - [`ClassifierPreset::Simple`] measures the axis-aligned bounding box
//!   of the simplified polygon and calls it a square when `width / height`
//!   is within `square_ratio_tolerance` of 1. Anything with more than four
//!   vertices is a circle.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geometry;
use crate::simplify::simplify_closed;
use crate::types::{Boundary, Detection, PipelineError, ShapeLabel, ShapeRecord, invalid};

/// Named classification rule sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierPreset {
    /// Rotated-rectangle aspect test, pentagon/hexagon, circularity test.
    #[default]
    Strict,
    /// Axis-aligned ratio band, every polygon above four vertices is a circle.
    Simple,
}

/// Filtering, simplification and classification thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Which rule set to apply.
    pub preset: ClassifierPreset,
    /// Boundaries enclosing less than this many square pixels are noise.
    pub min_area: f64,
    /// Simplification tolerance as a fraction of the boundary perimeter.
    pub epsilon_factor: f64,
    /// `Strict`: largest rotated-rectangle aspect ratio still called a square.
    pub max_square_aspect: f64,
    /// `Simple`: allowed deviation of `width / height` from 1 for a square.
    pub square_ratio_tolerance: f64,
    /// `Strict`: smallest circularity (exclusive) called a circle.
    pub circularity_threshold: f64,
}

impl ClassifierConfig {
    /// Default noise floor in square pixels.
    pub const DEFAULT_MIN_AREA: f64 = 500.0;
    /// Default simplification tolerance factor.
    pub const DEFAULT_EPSILON_FACTOR: f64 = 0.02;
    /// Default square aspect limit for the `Strict` preset.
    pub const DEFAULT_MAX_SQUARE_ASPECT: f64 = 1.15;
    /// Default square ratio band half-width for the `Simple` preset.
    pub const DEFAULT_SQUARE_RATIO_TOLERANCE: f64 = 0.05;
    /// Default circularity threshold.
    pub const DEFAULT_CIRCULARITY_THRESHOLD: f64 = 0.8;

    /// Default thresholds with the given rule set.
    #[must_use]
    pub fn preset(preset: ClassifierPreset) -> Self {
        Self {
            preset,
            ..Self::default()
        }
    }

    /// Check thresholds for values the classifier cannot use.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first
    /// offending field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.min_area.is_finite() || self.min_area < 0.0 {
            return Err(invalid(format!(
                "min_area must be finite and non-negative, got {}",
                self.min_area
            )));
        }
        if !(self.epsilon_factor > 0.0 && self.epsilon_factor < 1.0) {
            return Err(invalid(format!(
                "epsilon_factor must be in (0, 1), got {}",
                self.epsilon_factor
            )));
        }
        if !self.max_square_aspect.is_finite() || self.max_square_aspect < 1.0 {
            return Err(invalid(format!(
                "max_square_aspect must be at least 1, got {}",
                self.max_square_aspect
            )));
        }
        if !(self.square_ratio_tolerance >= 0.0 && self.square_ratio_tolerance < 1.0) {
            return Err(invalid(format!(
                "square_ratio_tolerance must be in [0, 1), got {}",
                self.square_ratio_tolerance
            )));
        }
        if !(self.circularity_threshold > 0.0 && self.circularity_threshold <= 1.0) {
            return Err(invalid(format!(
                "circularity_threshold must be in (0, 1], got {}",
                self.circularity_threshold
            )));
        }
        Ok(())
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            preset: ClassifierPreset::default(),
            min_area: Self::DEFAULT_MIN_AREA,
            epsilon_factor: Self::DEFAULT_EPSILON_FACTOR,
            max_square_aspect: Self::DEFAULT_MAX_SQUARE_ASPECT,
            square_ratio_tolerance: Self::DEFAULT_SQUARE_RATIO_TOLERANCE,
            circularity_threshold: Self::DEFAULT_CIRCULARITY_THRESHOLD,
        }
    }
}

/// Side lengths of the rectangle used by the quadrilateral test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    /// First side (rectangle width, or bounding box width).
    pub width: f64,
    /// Second side (rectangle height, or bounding box height).
    pub height: f64,
}

/// Geometric descriptors the decision procedure looks at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeMetrics {
    /// Boundary area.
    pub area: f64,
    /// Boundary perimeter.
    pub perimeter: f64,
    /// Simplified polygon vertex count.
    pub vertices: usize,
    /// Rectangle for the quadrilateral test, measured per preset.
    pub extent: Extent,
}

impl ShapeMetrics {
    /// `4π·area / perimeter²` of the boundary.
    #[must_use]
    pub fn circularity(&self) -> f64 {
        geometry::circularity(self.area, self.perimeter)
    }
}

/// Map descriptors to a label.
///
/// Returns `None` when a four-vertex shape has a zero-sized extent; such
/// boundaries are degenerate and produce no record.
#[must_use]
pub fn classify(metrics: &ShapeMetrics, config: &ClassifierConfig) -> Option<ShapeLabel> {
    let label = match (metrics.vertices, config.preset) {
        (0..=2, _) => ShapeLabel::Unknown,
        (3, _) => ShapeLabel::Triangle,
        (4, ClassifierPreset::Strict) => {
            let aspect = geometry::aspect_ratio(metrics.extent.width, metrics.extent.height)?;
            if aspect < config.max_square_aspect {
                ShapeLabel::Square
            } else {
                ShapeLabel::Rectangle
            }
        }
        (4, ClassifierPreset::Simple) => {
            if metrics.extent.width <= 0.0 || metrics.extent.height <= 0.0 {
                return None;
            }
            let ratio = metrics.extent.width / metrics.extent.height;
            if (ratio - 1.0).abs() <= config.square_ratio_tolerance {
                ShapeLabel::Square
            } else {
                ShapeLabel::Rectangle
            }
        }
        (_, ClassifierPreset::Simple) => ShapeLabel::Circle,
        (5, ClassifierPreset::Strict) => ShapeLabel::Pentagon,
        (6, ClassifierPreset::Strict) => ShapeLabel::Hexagon,
        (_, ClassifierPreset::Strict) => {
            if metrics.circularity() > config.circularity_threshold {
                ShapeLabel::Circle
            } else {
                ShapeLabel::Irregular
            }
        }
    };
    Some(label)
}

/// What happened to one traced boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryOutcome {
    /// Classified and kept.
    Detected(Detection),
    /// Enclosed less than the configured minimum area.
    BelowMinArea {
        /// The measured area.
        area: f64,
    },
    /// Zero perimeter, or a four-vertex shape with a zero-sized extent.
    Degenerate,
}

/// Measure, filter, simplify and classify one boundary.
#[must_use]
pub fn classify_boundary(boundary: &Boundary, config: &ClassifierConfig) -> BoundaryOutcome {
    let area = boundary.area();
    if area < config.min_area {
        return BoundaryOutcome::BelowMinArea { area };
    }

    let perimeter = boundary.perimeter();
    let Some(anchor) = boundary.first().copied() else {
        return BoundaryOutcome::Degenerate;
    };
    if perimeter <= 0.0 {
        return BoundaryOutcome::Degenerate;
    }

    let simplified = simplify_closed(boundary, config.epsilon_factor * perimeter);
    let metrics = ShapeMetrics {
        area,
        perimeter,
        vertices: simplified.len(),
        extent: measure_extent(boundary, &simplified, config.preset),
    };

    let Some(label) = classify(&metrics, config) else {
        debug!(
            "degenerate {}-vertex boundary at ({}, {}): extent {:?}",
            metrics.vertices, anchor.x, anchor.y, metrics.extent
        );
        return BoundaryOutcome::Degenerate;
    };

    debug!(
        "{label} at ({}, {}): area={area:.1} perimeter={perimeter:.1} vertices={} circularity={:.3}",
        anchor.x,
        anchor.y,
        metrics.vertices,
        metrics.circularity()
    );

    BoundaryOutcome::Detected(Detection {
        record: ShapeRecord {
            label,
            area,
            perimeter,
            vertices: metrics.vertices,
            anchor,
        },
        boundary: boundary.clone(),
        simplified,
    })
}

/// Detections kept from a batch of boundaries, with drop counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classified {
    /// Kept detections, in boundary order.
    pub detections: Vec<Detection>,
    /// Boundaries dropped by the area filter.
    pub below_min_area: usize,
    /// Boundaries dropped as degenerate.
    pub degenerate: usize,
}

/// Run [`classify_boundary`] over `boundaries`, preserving their order.
#[must_use]
pub fn classify_all(boundaries: &[Boundary], config: &ClassifierConfig) -> Classified {
    let mut out = Classified::default();
    for boundary in boundaries {
        match classify_boundary(boundary, config) {
            BoundaryOutcome::Detected(detection) => out.detections.push(detection),
            BoundaryOutcome::BelowMinArea { area } => {
                debug!(
                    "dropped boundary of {} points: area {area:.1} below {}",
                    boundary.len(),
                    config.min_area
                );
                out.below_min_area += 1;
            }
            BoundaryOutcome::Degenerate => out.degenerate += 1,
        }
    }
    out
}

/// Rectangle sides for the quadrilateral test.
fn measure_extent(boundary: &Boundary, simplified: &Boundary, preset: ClassifierPreset) -> Extent {
    match preset {
        ClassifierPreset::Strict => geometry::min_area_rect(boundary.points()).map_or(
            Extent {
                width: 0.0,
                height: 0.0,
            },
            |r| Extent {
                width: r.width,
                height: r.height,
            },
        ),
        ClassifierPreset::Simple => geometry::bounding_box(simplified.points()).map_or(
            Extent {
                width: 0.0,
                height: 0.0,
            },
            |b| Extent {
                width: b.width,
                height: b.height,
            },
        ),
    }
}
