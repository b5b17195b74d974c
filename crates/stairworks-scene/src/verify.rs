//! Container checks against an independent glTF parser, and the transport
//! encoding the viewer API uses.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{Result, SceneError};
use crate::slicer::{node_name, parse_part_name};

/// What a standard glTF loader sees in a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    /// Scene nodes.
    pub nodes: usize,
    /// Meshes.
    pub meshes: usize,
    /// Materials.
    pub materials: usize,
    /// Primitives across all meshes.
    pub primitives: usize,
    /// Bytes in the embedded binary chunk.
    pub blob_len: usize,
}

/// Load `glb` with the `gltf` crate and check the per-part naming contract:
/// node `i` is `part_<i>` and owns mesh `i`, named `mesh_<i>`.
///
/// # Errors
///
/// [`SceneError::InvalidContainer`] if the container fails to load or the
/// graph does not follow the naming contract.
pub fn verify_container(glb: &[u8]) -> Result<ContainerSummary> {
    let gltf = gltf::Gltf::from_slice(glb).map_err(|e| SceneError::InvalidContainer(e.to_string()))?;

    let mut primitives = 0;
    for node in gltf.nodes() {
        let expected = node_name(node.index());
        if node.name() != Some(expected.as_str()) {
            return Err(SceneError::InvalidContainer(format!(
                "node {} is named {:?}, expected {expected}",
                node.index(),
                node.name()
            )));
        }
        let mesh = node
            .mesh()
            .ok_or_else(|| SceneError::InvalidContainer(format!("{expected} has no mesh")))?;
        if mesh.index() != node.index() || mesh.name().and_then(parse_part_name) != Some(node.index()) {
            return Err(SceneError::InvalidContainer(format!(
                "{expected} references mesh {} ({:?})",
                mesh.index(),
                mesh.name()
            )));
        }
        primitives += mesh.primitives().len();
    }

    Ok(ContainerSummary {
        nodes: gltf.nodes().len(),
        meshes: gltf.meshes().len(),
        materials: gltf.materials().len(),
        primitives,
        blob_len: gltf.blob.as_ref().map_or(0, Vec::len),
    })
}

/// Standard base64 of a container, for JSON transport.
pub fn encode_base64(glb: &[u8]) -> String {
    STANDARD.encode(glb)
}

/// Inverse of [`encode_base64`].
pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| SceneError::InvalidContainer(format!("bad base64: {e}")))
}
