//! Closed-polygon simplification using the Ramer-Douglas-Peucker algorithm.
//!
//! The classifier counts the vertices of a simplified boundary, so the
//! result must not depend on where the tracer happened to start. The
//! boundary is split at the point farthest from its start, both halves
//! are reduced recursively, and a final pass drops every vertex that
//! lies within tolerance of the chord joining its two neighbours. That
//! last pass removes the start point whenever it sits mid-edge.

use crate::types::{Boundary, Point};

/// Simplify a closed boundary within `tolerance` pixels.
///
/// A vertex survives only if its perpendicular distance from the line
/// through its simplified neighbours exceeds `tolerance`. Boundaries
/// with fewer than three points are returned unchanged. The result
/// never has fewer than two points unless the input did.
#[must_use = "returns the simplified polygon"]
pub fn simplify_closed(boundary: &Boundary, tolerance: f64) -> Boundary {
    let points = boundary.points();
    if points.len() < 3 {
        return boundary.clone();
    }

    // Split at the point farthest from the start.
    let start = points[0];
    let split = points
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|(_, a), (_, b)| start.distance_squared(**a).total_cmp(&start.distance_squared(**b)))
        .map_or(1, |(i, _)| i);

    // Close the loop so the second half can run back to the start.
    let closed: Vec<Point> = points.iter().chain(std::iter::once(&start)).copied().collect();
    let mut kept = vec![false; closed.len()];
    kept[0] = true;
    kept[split] = true;

    rdp_recurse(&closed, 0, split, tolerance, &mut kept);
    rdp_recurse(&closed, split, closed.len() - 1, tolerance, &mut kept);

    let vertices: Vec<Point> = points
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect();

    Boundary::new(prune_flat_vertices(vertices, tolerance))
}

/// Recursive step of the Ramer-Douglas-Peucker algorithm.
///
/// Finds the point between `start` and `end` that is farthest from the
/// line segment between them. If that distance exceeds `tolerance`, the
/// point is kept and both sub-segments are processed recursively.
fn rdp_recurse(points: &[Point], start: usize, end: usize, tolerance: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;

    for i in (start + 1)..end {
        let d = perpendicular_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > tolerance {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, tolerance, kept);
        rdp_recurse(points, max_idx, end, tolerance, kept);
    }
}

/// Repeatedly remove the flattest vertex of a closed polygon while its
/// distance from the chord between its neighbours is within `tolerance`.
fn prune_flat_vertices(mut vertices: Vec<Point>, tolerance: f64) -> Vec<Point> {
    while vertices.len() > 2 {
        let n = vertices.len();
        let flattest = (0..n)
            .map(|i| {
                let prev = vertices[(i + n - 1) % n];
                let next = vertices[(i + 1) % n];
                (i, perpendicular_distance(vertices[i], prev, next))
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b));

        match flattest {
            Some((i, d)) if d <= tolerance => {
                vertices.remove(i);
            }
            _ => break,
        }
    }
    vertices
}

/// Perpendicular distance from point `p` to the line defined by `a` and `b`.
///
/// Uses the formula: |cross(b-a, p-a)| / |b-a|.
/// When `a` and `b` coincide, returns the distance from `p` to `a`.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        // a and b are the same point.
        return p.distance(a);
    }

    // |cross product| / |line length|
    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}
