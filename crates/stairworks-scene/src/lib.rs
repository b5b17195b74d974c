#![warn(missing_docs)]

//! Per-part glTF scene reconstruction for stairworks.
//!
//! A flat exporter emits every face of every part as one primitive in a
//! single mesh. This crate rebuilds a scene graph with one `part_<i>` node
//! (owning `mesh_<i>`) per part, tags each primitive with its category
//! material and packs the result into a self-contained GLB container.
//!
//! # Example
//!
//! ```rust
//! use stairworks_ir::{Part, StyleTable};
//! use stairworks_scene::{build_scene, CuboidExporter};
//!
//! let parts = vec![Part::cuboid("stringers", [0.0; 3], [3500.0, 50.0, 300.0])];
//! let scene = build_scene(parts, &CuboidExporter::default(), &StyleTable::builtin()).unwrap();
//! assert_eq!(&scene.container[0..4], b"glTF");
//! ```

pub mod container;
pub mod document;
pub mod error;
pub mod export;
pub mod manifest;
pub mod material;
pub mod slicer;
#[cfg(feature = "gltf")]
pub mod verify;
pub mod viewer;

use stairworks_ir::{Part, StyleTable};
use tracing::info;

pub use container::{assemble_container, compose_scene, read_container, read_document};
pub use document::GltfDocument;
pub use error::{Result, SceneError};
pub use export::{CuboidExporter, FlatExport, FlatExporter};
pub use manifest::{build_manifest, Manifest, ManifestEntry, PrimitiveRange};
pub use material::{assign_materials, Material, MaterialAssignment};
pub use slicer::{mesh_name, node_name, slice_primitives, SceneNode};
#[cfg(feature = "gltf")]
pub use verify::{decode_base64, encode_base64, verify_container, ContainerSummary};
pub use viewer::ViewerManifest;

/// Everything the viewer needs for one staircase.
#[derive(Debug, Clone)]
pub struct SceneOutput {
    /// GLB container bytes.
    pub container: Vec<u8>,
    /// Manifest the container was sliced with.
    pub manifest: Manifest,
    /// Category/part tree for the viewer sidebar.
    pub viewer: ViewerManifest,
}

/// Export, slice, style and pack a staircase.
///
/// `parts` are stable-sorted into the style table's category order first,
/// so the manifest and the exporter see the same grouped sequence.
pub fn build_scene(
    parts: Vec<Part>,
    exporter: &impl FlatExporter,
    styles: &StyleTable,
) -> Result<SceneOutput> {
    let parts = styles.order_parts(parts);
    let manifest = build_manifest(&parts)?;
    info!(
        parts = manifest.len(),
        categories = manifest.categories().len(),
        primitives = manifest.total_primitives(),
        "Building scene"
    );

    let mut flat = exporter.export_flat(&parts)?;
    let primitives = flat.take_primitives();
    let nodes = slice_primitives(primitives, &manifest)?;
    let assignment = assign_materials(&manifest, styles)?;
    let document = compose_scene(flat.document, nodes, &assignment)?;
    let container = assemble_container(&document, &flat.binary)?;
    let viewer = ViewerManifest::from_manifest(&manifest, styles)?;

    info!(
        bytes = container.len(),
        materials = assignment.materials.len(),
        "Scene container ready"
    );
    Ok(SceneOutput {
        container,
        manifest,
        viewer,
    })
}
