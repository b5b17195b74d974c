//! Flattening 3D parts into 2D cut profiles.

use nalgebra::{Point3, Vector3};
use stairworks_ir::{Outline, Part, Point2D};
use tracing::debug;

use crate::error::{NestError, Result};

/// Profile coordinates are rounded to this step (mm).
pub const PROFILE_PRECISION: f64 = 0.01;

const VERTEX_EPSILON: f64 = 1e-6;

/// Something that can flatten a part into a closed 2D outline.
pub trait ProfileExtractor: Sync {
    /// Outline of `part`, translated so its bounds start at the origin.
    fn extract(&self, part: &Part, part_index: usize) -> Result<Outline>;
}

/// Projects each part's traced outer wire onto the wire's own plane.
///
/// Inner wires are projected in the same frame and become cut-outs. Parts
/// without a wire fall back to their bounding box, flattened onto the plane
/// of its two largest extents.
#[derive(Debug, Clone, Copy, Default)]
pub struct WireProfileExtractor;

fn round_to_precision(v: f64) -> f64 {
    let r = (v / PROFILE_PRECISION).round() * PROFILE_PRECISION;
    // avoid "-0.00" in cut files
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

/// Plane normal of a (possibly non-convex) polygon by Newell's method.
fn newell_normal(ring: &[Point3<f64>]) -> Vector3<f64> {
    let mut n = Vector3::zeros();
    for (i, a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n
}

/// In-plane axes `(right, up)` for a plane with `normal`.
fn plane_frame(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    // reference direction least aligned with the normal
    let reference = if normal.z.abs() < 0.9 {
        Vector3::z()
    } else {
        Vector3::y()
    };
    let right = reference.cross(normal).normalize();
    let up = normal.cross(&right);
    (right, up)
}

fn unclosed(part: usize, reason: impl Into<String>) -> NestError {
    NestError::UnclosedProfile {
        part,
        reason: reason.into(),
    }
}

fn finish(points: Vec<Point2D>, holes: Vec<Vec<Point2D>>, part: &Part, part_index: usize) -> Outline {
    let label = format!("{}_{}", part.category, part_index + 1);
    let mut outline = holes
        .into_iter()
        .fold(
            Outline::new(points, part_index, part.category.clone(), label),
            Outline::with_hole,
        )
        .normalized();
    for p in outline.points.iter_mut().chain(outline.holes.iter_mut().flatten()) {
        p.x = round_to_precision(p.x);
        p.y = round_to_precision(p.y);
    }
    outline
}

/// Deduplicated vertex ring of a closed wire, without the closing vertex.
fn closed_ring(wire: &[[f64; 3]], part_index: usize, which: &str) -> Result<Vec<Point3<f64>>> {
    let mut ring: Vec<Point3<f64>> = Vec::with_capacity(wire.len());
    for &[x, y, z] in wire {
        let p = Point3::new(x, y, z);
        if ring.last().map_or(true, |last| (p - *last).norm() > VERTEX_EPSILON) {
            ring.push(p);
        }
    }

    let closed = ring.len() > 1
        && match (ring.first(), ring.last()) {
            (Some(first), Some(last)) => (*last - *first).norm() <= VERTEX_EPSILON,
            _ => false,
        };
    if !closed {
        return Err(unclosed(
            part_index,
            format!("{which} does not return to its start"),
        ));
    }
    ring.pop();
    if ring.len() < 3 {
        return Err(unclosed(
            part_index,
            format!("{which} has only {} distinct vertices", ring.len()),
        ));
    }
    Ok(ring)
}

impl WireProfileExtractor {
    fn from_wire(wire: &[[f64; 3]], part: &Part, part_index: usize) -> Result<Outline> {
        let ring = closed_ring(wire, part_index, "outer wire")?;

        let normal = newell_normal(&ring);
        if normal.norm() <= VERTEX_EPSILON {
            return Err(unclosed(part_index, "wire encloses no area"));
        }
        let normal = normal.normalize();
        let (right, up) = plane_frame(&normal);
        let origin = ring[0];

        let project = |p: &Point3<f64>| {
            let d = *p - origin;
            Point2D::new(d.dot(&right), d.dot(&up))
        };

        let points: Vec<Point2D> = ring.iter().map(project).collect();
        let mut holes = Vec::with_capacity(part.inner_wires.len());
        for (k, inner) in part.inner_wires.iter().enumerate() {
            let hole = closed_ring(inner, part_index, &format!("inner wire {k}"))?;
            holes.push(hole.iter().map(project).collect());
        }
        Ok(finish(points, holes, part, part_index))
    }

    fn from_bounding_box(part: &Part, part_index: usize) -> Outline {
        let size = part.bounding_box.size();
        let [long, mid, _] = part.bounding_box.axes_by_extent();
        let (w, h) = (size[long.index()], size[mid.index()]);
        let points = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(w, 0.0),
            Point2D::new(w, h),
            Point2D::new(0.0, h),
        ];
        finish(points, Vec::new(), part, part_index)
    }
}

impl ProfileExtractor for WireProfileExtractor {
    fn extract(&self, part: &Part, part_index: usize) -> Result<Outline> {
        let outline = match part.profile_wire.as_deref() {
            Some(wire) => Self::from_wire(wire, part, part_index)?,
            None => Self::from_bounding_box(part, part_index),
        };
        debug!(
            part = part_index,
            category = %part.category,
            vertices = outline.ring().len(),
            holes = outline.holes.len(),
            width = outline.width(),
            height = outline.height(),
            "Extracted profile"
        );
        Ok(outline)
    }
}
