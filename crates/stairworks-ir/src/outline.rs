//! Closed 2D part outlines for cut planning.

use serde::{Deserialize, Serialize};

/// A 2D point in sheet or profile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point2D {
    /// Create a new 2D point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Origin point (0, 0).
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Distance to another point.
    pub fn distance(&self, other: &Self) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned 2D rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum X coordinate.
    pub min_x: f64,
    /// Minimum Y coordinate.
    pub min_y: f64,
    /// Maximum X coordinate.
    pub max_x: f64,
    /// Maximum Y coordinate.
    pub max_y: f64,
}

impl Rect {
    /// Rectangle from origin corner and size.
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x + width,
            max_y: y + height,
        }
    }

    /// Smallest rectangle containing all points, or `None` for no points.
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a Point2D>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut rect = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in iter {
            rect.min_x = rect.min_x.min(p.x);
            rect.min_y = rect.min_y.min(p.y);
            rect.max_x = rect.max_x.max(p.x);
            rect.max_y = rect.max_y.max(p.y);
        }
        Some(rect)
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Area of the rectangle.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// True if the interiors intersect. Rectangles that only share an edge
    /// (within `tolerance`) do not overlap.
    pub fn overlaps(&self, other: &Rect, tolerance: f64) -> bool {
        self.min_x < other.max_x - tolerance
            && other.min_x < self.max_x - tolerance
            && self.min_y < other.max_y - tolerance
            && other.min_y < self.max_y - tolerance
    }

    /// True if `other` lies inside this rectangle (within `tolerance`).
    pub fn contains(&self, other: &Rect, tolerance: f64) -> bool {
        other.min_x >= self.min_x - tolerance
            && other.min_y >= self.min_y - tolerance
            && other.max_x <= self.max_x + tolerance
            && other.max_y <= self.max_y + tolerance
    }
}

/// Drop the repeated closing vertex of a closed ring, if present.
fn open_ring(points: &[Point2D]) -> &[Point2D] {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() >= 4 && first.distance(last) <= 1e-9 => {
            &points[..points.len() - 1]
        }
        _ => points,
    }
}

fn close_ring(points: &mut Vec<Point2D>) {
    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if points.len() == 1 || first.distance(&last) > 1e-9 {
            points.push(first);
        }
    }
}

fn ring_area(ring: &[Point2D]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        twice += a.x * b.y - b.x * a.y;
    }
    twice.abs() / 2.0
}

/// A part's flattened profile: a closed polyline whose last vertex repeats
/// the first, plus any closed cut-outs inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    /// Closed vertex ring (`points.first() == points.last()`).
    pub points: Vec<Point2D>,
    /// Index of the part this outline was derived from.
    pub source_part: usize,
    /// Category of the source part.
    pub category: String,
    /// Stock key the part is cut from, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<String>,
    /// Human-readable label, e.g. `stringers_2_B`.
    pub label: String,
    /// Scarf piece index when this outline is one piece of a split part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piece: Option<usize>,
    /// Inner cut-outs, each a closed ring in the same coordinates as `points`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<Point2D>>,
}

impl Outline {
    /// Create an outline, closing the ring if the last vertex does not
    /// already repeat the first.
    pub fn new(
        mut points: Vec<Point2D>,
        source_part: usize,
        category: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        close_ring(&mut points);
        Self {
            points,
            source_part,
            category: category.into(),
            stock: None,
            label: label.into(),
            piece: None,
            holes: Vec::new(),
        }
    }

    /// Axis-aligned rectangle outline with its corner at the origin.
    pub fn rectangle(
        width: f64,
        height: f64,
        source_part: usize,
        category: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        let points = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(width, 0.0),
            Point2D::new(width, height),
            Point2D::new(0.0, height),
        ];
        Self::new(points, source_part, category, label)
    }

    /// Add a cut-out, closing its ring if needed.
    pub fn with_hole(mut self, mut hole: Vec<Point2D>) -> Self {
        close_ring(&mut hole);
        self.holes.push(hole);
        self
    }

    /// Set the stock key.
    pub fn with_stock(mut self, stock: Option<String>) -> Self {
        self.stock = stock;
        self
    }

    /// True if the ring has at least three distinct vertices and ends where
    /// it starts.
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => self.points.len() >= 4 && first.distance(last) <= 1e-9,
            _ => false,
        }
    }

    /// The vertex ring without the repeated closing vertex.
    pub fn ring(&self) -> &[Point2D] {
        open_ring(&self.points)
    }

    /// Cut-out rings without their repeated closing vertex.
    pub fn hole_rings(&self) -> impl Iterator<Item = &[Point2D]> + '_ {
        self.holes.iter().map(|hole| open_ring(hole))
    }

    /// Bounding rectangle of the outline.
    pub fn bounds(&self) -> Rect {
        Rect::enclosing(&self.points).unwrap_or(Rect::from_origin_size(0.0, 0.0, 0.0, 0.0))
    }

    /// Bounding width.
    pub fn width(&self) -> f64 {
        self.bounds().width()
    }

    /// Bounding height.
    pub fn height(&self) -> f64 {
        self.bounds().height()
    }

    /// Material area: the outer ring minus the cut-outs (shoelace formula,
    /// orientation-independent).
    pub fn area(&self) -> f64 {
        let holes: f64 = self.hole_rings().map(ring_area).sum();
        (ring_area(self.ring()) - holes).max(0.0)
    }

    /// Copy translated so the bounding rectangle starts at the origin.
    pub fn normalized(&self) -> Self {
        let bounds = self.bounds();
        let mut out = self.clone();
        for p in out.points.iter_mut().chain(out.holes.iter_mut().flatten()) {
            p.x -= bounds.min_x;
            p.y -= bounds.min_y;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_closes_ring() {
        let outline = Outline::new(
            vec![
                Point2D::new(0.0, 0.0),
                Point2D::new(10.0, 0.0),
                Point2D::new(10.0, 5.0),
            ],
            0,
            "ribs",
            "ribs_1",
        );
        assert_eq!(outline.points.len(), 4);
        assert!(outline.is_closed());
        assert_eq!(outline.ring().len(), 3);
    }

    #[test]
    fn test_rectangle_bounds_and_area() {
        let outline = Outline::rectangle(3000.0, 300.0, 4, "stringers", "stringers_1");
        let bounds = outline.bounds();
        assert_relative_eq!(bounds.width(), 3000.0);
        assert_relative_eq!(bounds.height(), 300.0);
        assert_relative_eq!(outline.area(), 900_000.0);
    }

    #[test]
    fn test_normalized_moves_to_origin() {
        let outline = Outline::new(
            vec![
                Point2D::new(-5.0, 2.0),
                Point2D::new(5.0, 2.0),
                Point2D::new(5.0, 7.0),
                Point2D::new(-5.0, 7.0),
            ],
            0,
            "treads",
            "treads_1",
        )
        .normalized();
        let bounds = outline.bounds();
        assert_relative_eq!(bounds.min_x, 0.0);
        assert_relative_eq!(bounds.min_y, 0.0);
        assert_relative_eq!(bounds.max_x, 10.0);
    }

    #[test]
    fn test_holes_reduce_area_and_move_with_outline() {
        let outline = Outline::new(
            vec![
                Point2D::new(10.0, 10.0),
                Point2D::new(110.0, 10.0),
                Point2D::new(110.0, 60.0),
                Point2D::new(10.0, 60.0),
            ],
            0,
            "ribs",
            "ribs_1",
        )
        .with_hole(vec![
            Point2D::new(30.0, 20.0),
            Point2D::new(50.0, 20.0),
            Point2D::new(50.0, 40.0),
            Point2D::new(30.0, 40.0),
        ]);
        assert_eq!(outline.holes[0].len(), 5);
        assert_eq!(outline.hole_rings().next().unwrap().len(), 4);
        assert_relative_eq!(outline.area(), 5000.0 - 400.0);

        let moved = outline.normalized();
        assert_eq!(moved.holes[0][0], Point2D::new(20.0, 10.0));
        assert_relative_eq!(moved.area(), outline.area());
    }

    #[test]
    fn test_rect_overlap_edges_touching() {
        let a = Rect::from_origin_size(0.0, 0.0, 10.0, 10.0);
        let b = Rect::from_origin_size(10.0, 0.0, 10.0, 10.0);
        let c = Rect::from_origin_size(5.0, 5.0, 10.0, 10.0);
        assert!(!a.overlaps(&b, 1e-9));
        assert!(a.overlaps(&c, 1e-9));
        assert!(Rect::from_origin_size(0.0, 0.0, 20.0, 20.0).contains(&c, 1e-9));
    }
}
