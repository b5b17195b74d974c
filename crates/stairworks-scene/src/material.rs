//! Per-category materials.

use serde_json::json;
use stairworks_ir::StyleTable;
use tracing::debug;

use crate::document::{GltfMaterial, GltfPbr};
use crate::error::{Result, SceneError};
use crate::manifest::Manifest;

/// A render material, one per category present in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Category the material belongs to.
    pub name: String,
    /// Linear RGBA; alpha is the category opacity.
    pub base_color: [f64; 4],
    /// Metallic factor.
    pub metallic: f64,
    /// Roughness factor.
    pub roughness: f64,
    /// True iff opacity < 1.0.
    pub transparent: bool,
}

impl Material {
    /// glTF representation. Transparent materials blend, render both faces
    /// and ask the viewer not to write depth.
    pub fn to_gltf(&self) -> GltfMaterial {
        GltfMaterial {
            name: Some(self.name.clone()),
            pbr_metallic_roughness: GltfPbr {
                base_color_factor: self.base_color,
                metallic_factor: self.metallic,
                roughness_factor: self.roughness,
            },
            alpha_mode: self.transparent.then(|| "BLEND".to_string()),
            double_sided: self.transparent,
            extras: self.transparent.then(|| json!({ "depthWrite": false })),
        }
    }
}

/// Materials for a manifest plus the material index of every primitive and part.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialAssignment {
    /// Materials in first-seen category order.
    pub materials: Vec<Material>,
    /// Material index per primitive, aligned with the flat primitive array.
    pub primitive_materials: Vec<usize>,
    /// Material index per manifest entry.
    pub part_materials: Vec<usize>,
}

impl MaterialAssignment {
    /// Material index of a part.
    pub fn for_part(&self, part_index: usize) -> Option<usize> {
        self.part_materials.get(part_index).copied()
    }
}

/// Assign one material per category and tag every primitive with it.
///
/// # Errors
///
/// [`SceneError::UnknownCategory`] if a manifest category has no style.
pub fn assign_materials(manifest: &Manifest, styles: &StyleTable) -> Result<MaterialAssignment> {
    let categories = manifest.categories();
    let mut materials = Vec::with_capacity(categories.len());
    for category in &categories {
        let style = styles
            .style(category)
            .ok_or_else(|| SceneError::UnknownCategory(category.to_string()))?;
        let [r, g, b] = style.color;
        materials.push(Material {
            name: category.to_string(),
            base_color: [r, g, b, style.opacity],
            metallic: styles.metallic_for(style),
            roughness: styles.roughness_for(style),
            transparent: style.opacity < 1.0,
        });
    }

    let mut part_materials = Vec::with_capacity(manifest.len());
    let mut primitive_materials = Vec::with_capacity(manifest.total_primitives());
    for entry in manifest.entries() {
        // categories() was built from these same entries
        let index = categories
            .iter()
            .position(|c| *c == entry.category)
            .unwrap_or_default();
        part_materials.push(index);
        primitive_materials.extend(std::iter::repeat(index).take(entry.face_count));
    }

    debug!(
        materials = materials.len(),
        transparent = materials.iter().filter(|m| m.transparent).count(),
        "Assigned category materials"
    );
    Ok(MaterialAssignment {
        materials,
        primitive_materials,
        part_materials,
    })
}
