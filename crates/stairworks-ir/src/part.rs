//! Parts as delivered by the solid modeler.

use serde::{Deserialize, Serialize};

/// A principal axis of the model coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// X axis.
    X,
    /// Y axis.
    Y,
    /// Z axis.
    Z,
}

impl Axis {
    /// Component index of this axis in a `[f64; 3]`.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// All three axes in X, Y, Z order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

/// Axis-aligned 3D bounding box (conventionally millimeters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: [f64; 3],
    /// Maximum corner.
    pub max: [f64; 3],
}

impl BoundingBox {
    /// Create a bounding box from two corners, normalizing their order.
    pub fn new(a: [f64; 3], b: [f64; 3]) -> Self {
        Self {
            min: [a[0].min(b[0]), a[1].min(b[1]), a[2].min(b[2])],
            max: [a[0].max(b[0]), a[1].max(b[1]), a[2].max(b[2])],
        }
    }

    /// Extent along each axis.
    pub fn size(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Center point.
    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        ]
    }

    /// Axis with the largest extent. Ties resolve to the earlier axis.
    pub fn longest_axis(&self) -> Axis {
        let size = self.size();
        let mut best = Axis::X;
        for axis in [Axis::Y, Axis::Z] {
            if size[axis.index()] > size[best.index()] {
                best = axis;
            }
        }
        best
    }

    /// Axes ordered by decreasing extent (stable for equal extents).
    pub fn axes_by_extent(&self) -> [Axis; 3] {
        let size = self.size();
        let mut axes = Axis::ALL;
        axes.sort_by(|a, b| size[b.index()].total_cmp(&size[a.index()]));
        axes
    }

    /// Volume of the box itself.
    pub fn volume(&self) -> f64 {
        let [x, y, z] = self.size();
        x * y * z
    }
}

/// An immutable solid part produced by the modeling engine.
///
/// `face_count` is the number of topological faces, which the flat glTF
/// export turns into exactly that many primitives, in the same order as the
/// parts were handed to the exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Category key (e.g. `"treads"`, `"stringers"`).
    pub category: String,
    /// Number of topological faces (= exported primitive count).
    pub face_count: usize,
    /// Axis-aligned bounds.
    pub bounding_box: BoundingBox,
    /// Solid volume in cubic model units.
    pub volume: f64,
    /// Ordered outer-wire vertices of the largest planar face, when the
    /// modeler traced one. Closed wires repeat the first vertex at the end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_wire: Option<Vec<[f64; 3]>>,
    /// Inner wires (cut-outs) of the same face, each closed like
    /// `profile_wire`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inner_wires: Vec<Vec<[f64; 3]>>,
}

impl Part {
    /// Create a part from modeler-reported attributes.
    pub fn new(
        category: impl Into<String>,
        face_count: usize,
        bounding_box: BoundingBox,
        volume: f64,
    ) -> Self {
        Self {
            category: category.into(),
            face_count,
            bounding_box,
            volume,
            profile_wire: None,
            inner_wires: Vec::new(),
        }
    }

    /// An axis-aligned block spanning two corners: six faces, volume from extents.
    pub fn cuboid(category: impl Into<String>, a: [f64; 3], b: [f64; 3]) -> Self {
        let bounding_box = BoundingBox::new(a, b);
        Self::new(category, 6, bounding_box, bounding_box.volume())
    }

    /// Attach a traced outer wire.
    pub fn with_profile_wire(mut self, wire: Vec<[f64; 3]>) -> Self {
        self.profile_wire = Some(wire);
        self
    }

    /// Attach a traced inner wire (a cut-out).
    pub fn with_inner_wire(mut self, wire: Vec<[f64; 3]>) -> Self {
        self.inner_wires.push(wire);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cuboid_part() {
        let part = Part::cuboid("treads", [900.0, 250.0, 20.0], [0.0, 0.0, 0.0]);
        assert_eq!(part.face_count, 6);
        assert_eq!(part.bounding_box.min, [0.0, 0.0, 0.0]);
        assert_relative_eq!(part.volume, 900.0 * 250.0 * 20.0);
        assert!(part.profile_wire.is_none());
    }

    #[test]
    fn test_longest_axis() {
        let bb = BoundingBox::new([0.0, 0.0, 0.0], [50.0, 3000.0, 300.0]);
        assert_eq!(bb.longest_axis(), Axis::Y);
        assert_eq!(bb.axes_by_extent(), [Axis::Y, Axis::Z, Axis::X]);

        let cube = BoundingBox::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        assert_eq!(cube.longest_axis(), Axis::X);
    }

    #[test]
    fn test_part_json_omits_missing_wire() {
        let part = Part::cuboid("risers", [0.0, 0.0, 0.0], [900.0, 20.0, 180.0]);
        let json = serde_json::to_string(&part).unwrap();
        assert!(!json.contains("profile_wire"));
        assert!(!json.contains("inner_wires"));
        let restored: Part = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, part);
    }

    #[test]
    fn test_inner_wires_deserialize() {
        let json = r#"{
            "category": "ribs",
            "face_count": 10,
            "bounding_box": {"min": [0, 0, 0], "max": [600, 18, 250]},
            "volume": 1.0,
            "inner_wires": [[[100, 0, 50], [200, 0, 50], [200, 0, 150], [100, 0, 50]]]
        }"#;
        let part: Part = serde_json::from_str(json).unwrap();
        assert_eq!(part.inner_wires.len(), 1);
        assert_eq!(part.inner_wires[0][1], [200.0, 0.0, 50.0]);
        assert!(part.profile_wire.is_none());
    }
}
