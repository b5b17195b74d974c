//! Viewer-facing part tree, sent alongside the container.

use serde::{Deserialize, Serialize};
use stairworks_ir::StyleTable;

use crate::error::{Result, SceneError};
use crate::manifest::Manifest;

/// Bounds of one part as the viewer displays them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerBounds {
    /// Minimum corner.
    pub min: [f64; 3],
    /// Maximum corner.
    pub max: [f64; 3],
    /// Extent along each axis.
    pub size: [f64; 3],
}

/// One part in the viewer's object tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerPart {
    /// Display name, e.g. `treads_2`.
    pub name: String,
    /// Index of the `mesh_<i>` / `part_<i>` pair in the container.
    pub mesh_index: usize,
    /// Solid volume.
    pub volume: f64,
    /// Axis-aligned bounds.
    pub bbox: ViewerBounds,
}

/// A category group in the viewer's object tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerCategory {
    /// Category name.
    pub name: String,
    /// Display color.
    pub color: [f64; 3],
    /// Display opacity.
    pub opacity: f64,
    /// Parts in manifest order.
    pub parts: Vec<ViewerPart>,
}

/// Object tree for the viewer, grouped by category in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerManifest {
    /// Category groups.
    pub categories: Vec<ViewerCategory>,
}

impl ViewerManifest {
    /// Build the viewer tree from a manifest.
    pub fn from_manifest(manifest: &Manifest, styles: &StyleTable) -> Result<Self> {
        let mut categories = Vec::new();
        for (category, run) in manifest.category_runs() {
            let style = styles
                .style(category)
                .ok_or_else(|| SceneError::UnknownCategory(category.to_string()))?;
            let parts = manifest.entries()[run]
                .iter()
                .map(|entry| ViewerPart {
                    name: entry.name.clone(),
                    mesh_index: entry.part_index,
                    volume: entry.volume,
                    bbox: ViewerBounds {
                        min: entry.bounding_box.min,
                        max: entry.bounding_box.max,
                        size: entry.bounding_box.size(),
                    },
                })
                .collect();
            categories.push(ViewerCategory {
                name: category.to_string(),
                color: style.color,
                opacity: style.opacity,
                parts,
            });
        }
        Ok(Self { categories })
    }

    /// Number of parts across all categories.
    pub fn part_count(&self) -> usize {
        self.categories.iter().map(|c| c.parts.len()).sum()
    }
}
