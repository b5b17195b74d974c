//! Part manifest: the ordered bookkeeping that aligns the flat primitive
//! array with part identity.
//!
//! The flat exporter knows nothing about parts; it emits primitives for each
//! face in the order the parts were handed to it. The manifest records that
//! same order with each part's face count, so the running prefix sum of face
//! counts is the only link between a primitive and its part. The manifest and
//! the exporter must therefore see the same ordered part sequence.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use stairworks_ir::{BoundingBox, Part};
use tracing::debug;

use crate::error::{Result, SceneError};

/// One part's row in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Index of the part in the input sequence (= scene node index).
    pub part_index: usize,
    /// Category of the part.
    pub category: String,
    /// Number of faces (= primitives) the part contributes.
    pub face_count: usize,
    /// Display name, `<category>_<n>` with `n` 1-based within the category.
    pub name: String,
    /// Solid volume reported by the modeler.
    pub volume: f64,
    /// Axis-aligned bounds reported by the modeler.
    pub bounding_box: BoundingBox,
}

/// Half-open range `[start, end)` into the flat primitive array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveRange {
    /// First primitive owned by the part.
    pub start: usize,
    /// One past the last primitive owned by the part.
    pub end: usize,
}

impl PrimitiveRange {
    /// Number of primitives in the range.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True if the range holds no primitives.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The range as a standard `Range`.
    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Ordered part manifest. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Manifest rows in part order.
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the manifest has no parts. A built manifest is never empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all face counts.
    pub fn total_primitives(&self) -> usize {
        self.entries.iter().map(|e| e.face_count).sum()
    }

    /// Primitive range of every part, from the running prefix sum of face counts.
    pub fn ranges(&self) -> Vec<PrimitiveRange> {
        let mut offset = 0;
        self.entries
            .iter()
            .map(|entry| {
                let range = PrimitiveRange {
                    start: offset,
                    end: offset + entry.face_count,
                };
                offset = range.end;
                range
            })
            .collect()
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.category.as_str()) {
                seen.push(&entry.category);
            }
        }
        seen
    }

    /// Each category with the range of manifest entries it covers.
    pub fn category_runs(&self) -> Vec<(&str, Range<usize>)> {
        let mut runs: Vec<(&str, Range<usize>)> = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            match runs.last_mut() {
                Some((category, range)) if *category == entry.category => range.end = i + 1,
                _ => runs.push((&entry.category, i..i + 1)),
            }
        }
        runs
    }
}

/// Build the manifest for an ordered, category-grouped part sequence.
///
/// Category grouping order and the order of parts within each category are
/// kept exactly as given.
///
/// # Errors
///
/// - [`SceneError::EmptyGeometry`] if `parts` is empty or no part has faces.
/// - [`SceneError::EmptyPart`] if some (but not all) parts have zero faces.
/// - [`SceneError::UngroupedCategory`] if a category reappears after another.
pub fn build_manifest(parts: &[Part]) -> Result<Manifest> {
    if parts.iter().all(|p| p.face_count == 0) {
        return Err(SceneError::EmptyGeometry);
    }

    let mut entries = Vec::with_capacity(parts.len());
    let mut closed: Vec<&str> = Vec::new();
    let mut current: Option<&str> = None;
    let mut ordinal = 0;

    for (index, part) in parts.iter().enumerate() {
        if part.face_count == 0 {
            return Err(SceneError::EmptyPart {
                index,
                category: part.category.clone(),
            });
        }

        if current != Some(part.category.as_str()) {
            if closed.contains(&part.category.as_str()) {
                return Err(SceneError::UngroupedCategory {
                    category: part.category.clone(),
                    index,
                });
            }
            if let Some(previous) = current {
                closed.push(previous);
            }
            current = Some(&part.category);
            ordinal = 0;
        }
        ordinal += 1;

        entries.push(ManifestEntry {
            part_index: index,
            category: part.category.clone(),
            face_count: part.face_count,
            name: format!("{}_{}", part.category, ordinal),
            volume: part.volume,
            bounding_box: part.bounding_box,
        });
    }

    let manifest = Manifest { entries };
    debug!(
        parts = manifest.len(),
        primitives = manifest.total_primitives(),
        "Built part manifest"
    );
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stairworks_ir::BoundingBox;

    fn part(category: &str, faces: usize) -> Part {
        Part::new(
            category,
            faces,
            BoundingBox::new([0.0; 3], [1.0; 3]),
            1.0,
        )
    }

    #[test]
    fn test_ranges_are_prefix_sums() {
        let parts = vec![part("treads", 6), part("treads", 6), part("risers", 4)];
        let manifest = build_manifest(&parts).unwrap();

        assert_eq!(manifest.len(), 3);
        assert_eq!(manifest.total_primitives(), 16);
        let ranges: Vec<_> = manifest.ranges().iter().map(|r| r.as_range()).collect();
        assert_eq!(ranges, vec![0..6, 6..12, 12..16]);
    }

    #[test]
    fn test_names_count_within_category() {
        let parts = vec![part("treads", 6), part("treads", 6), part("risers", 4)];
        let manifest = build_manifest(&parts).unwrap();
        let names: Vec<&str> = manifest.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["treads_1", "treads_2", "risers_1"]);
        assert_eq!(manifest.categories(), ["treads", "risers"]);
        assert_eq!(
            manifest.category_runs(),
            vec![("treads", 0..2), ("risers", 2..3)]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(build_manifest(&[]), Err(SceneError::EmptyGeometry)));
    }

    #[test]
    fn test_all_zero_faces_is_empty_geometry() {
        let parts = vec![part("ribs", 0), part("ribs", 0)];
        assert!(matches!(
            build_manifest(&parts),
            Err(SceneError::EmptyGeometry)
        ));
    }

    #[test]
    fn test_zero_face_part_is_rejected() {
        let parts = vec![part("ribs", 6), part("ribs", 0)];
        match build_manifest(&parts) {
            Err(SceneError::EmptyPart { index, category }) => {
                assert_eq!(index, 1);
                assert_eq!(category, "ribs");
            }
            other => panic!("expected EmptyPart, got {other:?}"),
        }
    }

    #[test]
    fn test_ungrouped_category_is_rejected() {
        let parts = vec![part("treads", 6), part("risers", 6), part("treads", 6)];
        assert!(matches!(
            build_manifest(&parts),
            Err(SceneError::UngroupedCategory { index: 2, .. })
        ));
    }
}
