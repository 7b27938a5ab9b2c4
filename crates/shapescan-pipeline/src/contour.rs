//! Contour finding: extract closed external boundaries from an edge map.
//!
//! This module defines the [`ContourTracer`] trait for pluggable contour
//! tracing algorithms and the [`ContourTracerKind`] enum for selecting
//! which algorithm to use from configuration.
//!
//! Only outermost borders are returned. Holes, and anything nested
//! inside a hole, are discarded: a ring-shaped edge band around a shape
//! yields exactly one boundary, its outer rim.

use image::GrayImage;
use imageproc::contours::BorderType;
use serde::{Deserialize, Serialize};

use crate::types::{Boundary, Point};

/// Selects which contour tracing algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContourTracerKind {
    /// Suzuki-Abe border following via `imageproc::contours::find_contours`,
    /// keeping top-level outer borders only.
    #[default]
    ExternalBorderFollowing,
}

/// Trait for contour tracing strategies.
///
/// Input: a binary edge map (non-zero pixels = edges, zero = background).
/// Output: closed boundaries in a stable, implementation-defined order.
pub trait ContourTracer {
    /// Trace boundaries in the given binary edge map.
    fn trace(&self, edges: &GrayImage) -> Vec<Boundary>;
}

impl ContourTracer for ContourTracerKind {
    fn trace(&self, edges: &GrayImage) -> Vec<Boundary> {
        match *self {
            Self::ExternalBorderFollowing => find_external_boundaries(edges),
        }
    }
}

/// Trace the outermost borders of every connected edge region.
///
/// Boundaries come back in raster order of their starting pixel (top to
/// bottom, then left to right). Borders with fewer than three points
/// enclose no area and are dropped. An empty edge map yields an empty
/// vector.
#[must_use]
pub fn find_external_boundaries(edges: &GrayImage) -> Vec<Boundary> {
    let contours: Vec<imageproc::contours::Contour<u32>> =
        imageproc::contours::find_contours(edges);

    contours
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter(|c| c.points.len() >= 3)
        .map(|c| {
            let points = c
                .points
                .into_iter()
                .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                .collect();
            Boundary::new(points)
        })
        .collect()
}
