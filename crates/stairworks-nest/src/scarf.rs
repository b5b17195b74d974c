//! Splitting over-length outlines into overlapping scarf-joint pieces.
//!
//! The outline is cut across its long axis into slabs. Consecutive slabs
//! share exactly `joint_overlap` of length, where the two pieces are glued.
//! Each piece is the outline clipped to its slab, so it keeps the original
//! cross-section. A straight scarf only works where that cross-section is a
//! single span of constant thickness across the joint; anything else is
//! reported as unsplittable. Cut-outs go with the piece that holds them and
//! must not cross a joint line.

use serde::{Deserialize, Serialize};
use stairworks_ir::{Outline, Point2D};
use tracing::debug;

use crate::error::{NestError, Result};

/// Scarf joint settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScarfSettings {
    /// Longest piece the stock allows (mm).
    pub max_length: f64,
    /// Length shared by consecutive pieces (mm).
    pub joint_overlap: f64,
    /// Allowed thickness difference across a joint (mm).
    pub tolerance: f64,
}

impl Default for ScarfSettings {
    fn default() -> Self {
        Self {
            max_length: 2440.0,
            joint_overlap: 100.0,
            tolerance: 0.05,
        }
    }
}

impl ScarfSettings {
    /// Settings for a given stock length and overlap, default tolerance.
    pub fn new(max_length: f64, joint_overlap: f64) -> Self {
        Self {
            max_length,
            joint_overlap,
            ..Default::default()
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(self.max_length > 0.0 && self.joint_overlap > 0.0 && self.tolerance >= 0.0) {
            return Err(NestError::InvalidSettings(format!(
                "scarf lengths must be positive (max_length {}, joint_overlap {}, tolerance {})",
                self.max_length, self.joint_overlap, self.tolerance
            )));
        }
        if self.joint_overlap >= self.max_length {
            return Err(NestError::InvalidSettings(format!(
                "joint overlap {} must be shorter than max length {}",
                self.joint_overlap, self.max_length
            )));
        }
        Ok(())
    }

    /// Distance between the starts of consecutive pieces.
    pub fn stride(&self) -> f64 {
        self.max_length - self.joint_overlap
    }
}

/// An outline cut into overlapping pieces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScarfSplit {
    /// Label of the outline before splitting.
    pub source_label: String,
    /// Overlap between consecutive pieces.
    pub joint_overlap: f64,
    /// Pieces along the long axis, first to last.
    pub pieces: Vec<Outline>,
    /// Long-axis extent of each piece.
    pub piece_lengths: Vec<f64>,
}

impl ScarfSplit {
    /// Long-axis length of the reassembled part.
    pub fn assembled_length(&self) -> f64 {
        let joints = self.pieces.len().saturating_sub(1) as f64;
        self.piece_lengths.iter().sum::<f64>() - joints * self.joint_overlap
    }
}

/// Result of [`split_outline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SplitOutcome {
    /// Short enough already.
    Whole(Outline),
    /// Cut into scarf pieces.
    Split(ScarfSplit),
}

impl SplitOutcome {
    /// The outline(s) to nest.
    pub fn into_outlines(self) -> Vec<Outline> {
        match self {
            SplitOutcome::Whole(outline) => vec![outline],
            SplitOutcome::Split(split) => split.pieces,
        }
    }

    /// Number of outlines to nest.
    pub fn len(&self) -> usize {
        match self {
            SplitOutcome::Whole(_) => 1,
            SplitOutcome::Split(split) => split.pieces.len(),
        }
    }

    /// Always false; an outcome holds at least one outline.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// `A`, `B`, ... `Z`, then `27`, `28`, ...
fn piece_suffix(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => (index + 1).to_string(),
    }
}

/// Ring with the long axis mapped to `x`.
fn to_long_axis(ring: &[Point2D], swap: bool) -> Vec<Point2D> {
    ring.iter()
        .map(|p| if swap { Point2D::new(p.y, p.x) } else { *p })
        .collect()
}

/// Sutherland-Hodgman clip of `ring` to `x >= boundary` (or `x <= boundary`).
fn clip_half_plane(ring: &[Point2D], boundary: f64, keep_above: bool) -> Vec<Point2D> {
    let inside = |p: &Point2D| if keep_above { p.x >= boundary } else { p.x <= boundary };
    let mut out = Vec::with_capacity(ring.len() + 2);
    for (i, current) in ring.iter().enumerate() {
        let previous = &ring[(i + ring.len() - 1) % ring.len()];
        let (cur_in, prev_in) = (inside(current), inside(previous));
        if cur_in != prev_in {
            let t = (boundary - previous.x) / (current.x - previous.x);
            out.push(Point2D::new(boundary, previous.y + t * (current.y - previous.y)));
        }
        if cur_in {
            out.push(*current);
        }
    }
    out
}

fn clip_slab(ring: &[Point2D], start: f64, end: f64) -> Vec<Point2D> {
    let lower = clip_half_plane(ring, start, true);
    if lower.is_empty() {
        return lower;
    }
    clip_half_plane(&lower, end, false)
}

/// `y` positions where the line `x = at` crosses the ring, unsorted.
fn crossings(ring: &[Point2D], at: f64, ys: &mut Vec<f64>) {
    for (i, a) in ring.iter().enumerate() {
        let b = &ring[(i + 1) % ring.len()];
        // half-open so a vertex on the line counts once
        if (a.x <= at) != (b.x <= at) {
            let t = (at - a.x) / (b.x - a.x);
            ys.push(a.y + t * (b.y - a.y));
        }
    }
}

/// Thickness of the single span the outline has at `x = at`, counting the
/// cut-outs as gaps.
fn span_thickness(ring: &[Point2D], holes: &[Vec<Point2D>], at: f64, label: &str) -> Result<f64> {
    let mut ys = Vec::new();
    crossings(ring, at, &mut ys);
    for hole in holes {
        crossings(hole, at, &mut ys);
    }
    ys.sort_by(f64::total_cmp);
    match ys.as_slice() {
        [low, high] => Ok(high - low),
        other => Err(NestError::UnsplittableGeometry {
            label: label.to_string(),
            reason: format!(
                "cross-section at {at:.1} has {} spans, expected one",
                other.len() / 2
            ),
        }),
    }
}

/// Split `outline` into scarf pieces if its long axis exceeds `max_length`.
///
/// The long axis is `x` unless the outline is taller than wide. Pieces start
/// every `max_length - joint_overlap`; all but the last are exactly
/// `max_length` long, so no piece exceeds the stock and consecutive pieces
/// overlap by exactly `joint_overlap`. When that would leave a last piece
/// shorter than two overlaps, the same number of pieces is spread to equal
/// lengths instead.
///
/// Cut-outs are clipped to each slab and carried on the piece.
///
/// # Errors
///
/// - [`NestError::InvalidSettings`] for out-of-range settings.
/// - [`NestError::UnsplittableGeometry`] if the cross-section at a joint is
///   not one span, or its thickness changes between the joint's two ends.
pub fn split_outline(outline: Outline, settings: &ScarfSettings) -> Result<SplitOutcome> {
    settings.validate()?;

    let bounds = outline.bounds();
    let swap = bounds.height() > bounds.width();
    let ring = to_long_axis(outline.ring(), swap);
    let holes: Vec<Vec<Point2D>> = outline
        .hole_rings()
        .map(|hole| to_long_axis(hole, swap))
        .collect();
    let (min_u, max_u) = if swap {
        (bounds.min_y, bounds.max_y)
    } else {
        (bounds.min_x, bounds.max_x)
    };
    let length = max_u - min_u;
    if length <= settings.max_length + settings.tolerance {
        return Ok(SplitOutcome::Whole(outline));
    }

    let overlap = settings.joint_overlap;
    let mut stride = settings.stride();
    let mut piece_length = settings.max_length;
    let count = ((length - overlap) / stride).ceil() as usize;
    let last = length - (count - 1) as f64 * stride;
    if count > 1 && last < 2.0 * overlap {
        // count * stride >= length - overlap, so this never exceeds max_length
        piece_length = (length + (count - 1) as f64 * overlap) / count as f64;
        stride = piece_length - overlap;
    }
    let slabs: Vec<(f64, f64)> = (0..count)
        .map(|k| {
            let start = min_u + k as f64 * stride;
            (start, (start + piece_length).min(max_u))
        })
        .collect();

    for pair in slabs.windows(2) {
        let (joint_start, joint_end) = (pair[1].0, pair[0].1);
        let near = span_thickness(&ring, &holes, joint_start, &outline.label)?;
        let far = span_thickness(&ring, &holes, joint_end, &outline.label)?;
        if (near - far).abs() > settings.tolerance {
            return Err(NestError::UnsplittableGeometry {
                label: outline.label.clone(),
                reason: format!(
                    "thickness changes across the joint ({near:.2} to {far:.2}); tapered or curved"
                ),
            });
        }
    }

    let mut pieces = Vec::with_capacity(count);
    let mut piece_lengths = Vec::with_capacity(count);
    for (k, &(start, end)) in slabs.iter().enumerate() {
        let clipped = clip_slab(&ring, start, end);
        if clipped.len() < 3 {
            return Err(NestError::UnsplittableGeometry {
                label: outline.label.clone(),
                reason: format!("piece {} is empty", piece_suffix(k)),
            });
        }
        let points = to_long_axis(&clipped, swap);
        let mut piece = Outline::new(
            points,
            outline.source_part,
            outline.category.clone(),
            format!("{}_{}", outline.label, piece_suffix(k)),
        )
        .with_stock(outline.stock.clone());
        for hole in &holes {
            let clipped = clip_slab(hole, start, end);
            if clipped.len() >= 3 {
                piece = piece.with_hole(to_long_axis(&clipped, swap));
            }
        }
        let mut piece = piece.normalized();
        piece.piece = Some(k);
        pieces.push(piece);
        piece_lengths.push(end - start);
    }

    debug!(
        label = %outline.label,
        length,
        pieces = pieces.len(),
        overlap,
        holes = holes.len(),
        "Split outline with scarf joints"
    );
    Ok(SplitOutcome::Split(ScarfSplit {
        source_label: outline.label,
        joint_overlap: overlap,
        pieces,
        piece_lengths,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bar(length: f64, thickness: f64) -> Outline {
        Outline::rectangle(length, thickness, 0, "stringers", "stringers_1")
    }

    fn split(outline: Outline, max: f64, overlap: f64) -> ScarfSplit {
        match split_outline(outline, &ScarfSettings::new(max, overlap)).unwrap() {
            SplitOutcome::Split(split) => split,
            SplitOutcome::Whole(o) => panic!("{} was not split", o.label),
        }
    }

    #[test]
    fn test_short_outline_stays_whole() {
        let outcome = split_outline(bar(2440.0, 300.0), &ScarfSettings::default()).unwrap();
        assert!(matches!(outcome, SplitOutcome::Whole(_)));
        assert_eq!(outcome.len(), 1);
    }

    #[test]
    fn test_5000_splits_into_three() {
        let split = split(bar(5000.0, 300.0), 2440.0, 100.0);

        assert_eq!(split.pieces.len(), 3);
        assert_relative_eq!(split.assembled_length(), 5000.0, epsilon = 1e-6);
        assert_relative_eq!(
            split.piece_lengths.iter().sum::<f64>() - 2.0 * 100.0,
            5000.0,
            epsilon = 1e-6
        );
        for (piece, len) in split.pieces.iter().zip(&split.piece_lengths) {
            assert!(*len <= 2440.0 + 1e-9);
            assert_relative_eq!(piece.width(), *len, epsilon = 1e-6);
            assert_relative_eq!(piece.height(), 300.0, epsilon = 1e-6);
        }
        let labels: Vec<&str> = split.pieces.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["stringers_1_A", "stringers_1_B", "stringers_1_C"]);
        assert_eq!(split.pieces[2].piece, Some(2));
    }

    #[test]
    fn test_3000_splits_into_two() {
        let split = split(bar(3000.0, 300.0), 2440.0, 100.0);
        assert_eq!(split.pieces.len(), 2);
        assert_relative_eq!(split.piece_lengths[0], 2440.0);
        assert_relative_eq!(split.piece_lengths[1], 660.0, epsilon = 1e-6);
    }

    #[test]
    fn test_short_remainder_is_spread_evenly() {
        // 2440 + 2440 would leave a 120 mm third piece
        let split = split(bar(4800.0, 300.0), 2440.0, 100.0);
        assert_eq!(split.pieces.len(), 3);
        for len in &split.piece_lengths {
            assert_relative_eq!(*len, 5000.0 / 3.0, epsilon = 1e-6);
        }
        assert_relative_eq!(split.assembled_length(), 4800.0, epsilon = 1e-6);
        assert_relative_eq!(split.pieces[2].width(), 5000.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_hole_stays_with_its_piece() {
        let outline = bar(3000.0, 300.0).with_hole(vec![
            Point2D::new(2700.0, 100.0),
            Point2D::new(2800.0, 100.0),
            Point2D::new(2800.0, 200.0),
            Point2D::new(2700.0, 200.0),
        ]);
        let split = split(outline, 2440.0, 100.0);

        assert!(split.pieces[0].holes.is_empty());
        let second = &split.pieces[1];
        assert_eq!(second.holes.len(), 1);
        // piece B starts at 2340
        let hole = stairworks_ir::Rect::enclosing(&second.holes[0]).unwrap();
        assert_relative_eq!(hole.min_x, 360.0, epsilon = 1e-6);
        assert_relative_eq!(hole.max_x, 460.0, epsilon = 1e-6);
        assert_relative_eq!(second.area(), 660.0 * 300.0 - 100.0 * 100.0, epsilon = 1e-6);
    }

    #[test]
    fn test_hole_across_joint_is_unsplittable() {
        let outline = bar(3000.0, 300.0).with_hole(vec![
            Point2D::new(2300.0, 100.0),
            Point2D::new(2400.0, 100.0),
            Point2D::new(2400.0, 200.0),
            Point2D::new(2300.0, 200.0),
        ]);
        let err = split_outline(outline, &ScarfSettings::default()).unwrap_err();
        assert!(matches!(err, NestError::UnsplittableGeometry { .. }));
        assert!(err.to_string().contains("2 spans"));
    }

    #[test]
    fn test_vertical_outline_splits_along_y() {
        let tall = Outline::rectangle(300.0, 3000.0, 4, "carriages", "carriages_1")
            .with_stock(Some("50mm_structural".into()));
        let split = split(tall, 2440.0, 100.0);
        assert_eq!(split.pieces.len(), 2);
        assert_relative_eq!(split.pieces[0].height(), 2440.0, epsilon = 1e-6);
        assert_relative_eq!(split.pieces[0].width(), 300.0, epsilon = 1e-6);
        assert_eq!(split.pieces[1].stock.as_deref(), Some("50mm_structural"));
        assert_eq!(split.pieces[1].source_part, 4);
    }

    #[test]
    fn test_parallelogram_keeps_cross_section() {
        // raked stringer: constant 300 thickness, sloped ends
        let outline = Outline::new(
            vec![
                Point2D::new(0.0, 0.0),
                Point2D::new(4000.0, 0.0),
                Point2D::new(4200.0, 300.0),
                Point2D::new(200.0, 300.0),
            ],
            0,
            "stringers",
            "stringers_1",
        );
        let split = split(outline, 2440.0, 100.0);
        assert_eq!(split.pieces.len(), 2);
        assert!(split.pieces.iter().all(|p| p.is_closed()));
    }

    #[test]
    fn test_tapered_outline_is_unsplittable() {
        let outline = Outline::new(
            vec![
                Point2D::new(0.0, 0.0),
                Point2D::new(5000.0, 0.0),
                Point2D::new(5000.0, 100.0),
                Point2D::new(0.0, 400.0),
            ],
            0,
            "stringers",
            "stringers_1",
        );
        assert!(matches!(
            split_outline(outline, &ScarfSettings::default()),
            Err(NestError::UnsplittableGeometry { .. })
        ));
    }

    #[test]
    fn test_notch_at_joint_is_unsplittable() {
        // U shape whose gap spans the first joint
        let outline = Outline::new(
            vec![
                Point2D::new(0.0, 0.0),
                Point2D::new(3000.0, 0.0),
                Point2D::new(3000.0, 300.0),
                Point2D::new(2000.0, 300.0),
                Point2D::new(2000.0, 200.0),
                Point2D::new(2600.0, 200.0),
                Point2D::new(2600.0, 100.0),
                Point2D::new(2000.0, 100.0),
                Point2D::new(2000.0, 50.0),
                Point2D::new(0.0, 50.0),
            ],
            0,
            "stringers",
            "stringers_1",
        );
        let err = split_outline(outline, &ScarfSettings::default()).unwrap_err();
        assert!(err.to_string().contains("spans"));
    }

    #[test]
    fn test_invalid_settings() {
        for settings in [
            ScarfSettings::new(2440.0, 2440.0),
            ScarfSettings::new(2440.0, 0.0),
            ScarfSettings::new(-1.0, 100.0),
        ] {
            assert!(matches!(
                split_outline(bar(5000.0, 300.0), &settings),
                Err(NestError::InvalidSettings(_))
            ));
        }
    }

    #[test]
    fn test_piece_suffix() {
        assert_eq!(piece_suffix(0), "A");
        assert_eq!(piece_suffix(25), "Z");
        assert_eq!(piece_suffix(26), "27");
    }
}
