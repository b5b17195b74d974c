//! Per-part scene graph composition and GLB container serialization.

use std::collections::BTreeSet;

use tracing::debug;

use crate::document::{GltfDocument, GltfMesh, GltfNode, GltfPrimitive, GltfScene};
use crate::error::{Result, SceneError};
use crate::material::MaterialAssignment;
use crate::slicer::{mesh_name, node_name, parse_part_name, SceneNode};

/// `glTF` in little-endian ASCII.
pub const GLB_MAGIC: u32 = 0x4654_6C67;
/// GLB container version.
pub const GLB_VERSION: u32 = 2;
/// `JSON` chunk type.
pub const CHUNK_JSON: u32 = 0x4E4F_534A;
/// `BIN\0` chunk type.
pub const CHUNK_BIN: u32 = 0x004E_4942;

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

/// Replace the flat scene graph with one `part_<i>` node per part.
///
/// Each node gets its own `mesh_<i>` holding the part's primitives, each
/// primitive tagged with the part's category material. The default scene's
/// root list becomes `[0, 1, .., n-1]`; accessors, buffer views and buffers
/// are left as the exporter wrote them.
///
/// # Errors
///
/// [`SceneError::PrimitiveCountMismatch`] if the assignment does not cover
/// every node.
pub fn compose_scene(
    mut document: GltfDocument,
    nodes: Vec<SceneNode<GltfPrimitive>>,
    assignment: &MaterialAssignment,
) -> Result<GltfDocument> {
    if assignment.part_materials.len() != nodes.len() {
        return Err(SceneError::PrimitiveCountMismatch {
            expected: nodes.len(),
            actual: assignment.part_materials.len(),
        });
    }

    let mut meshes = Vec::with_capacity(nodes.len());
    let mut graph = Vec::with_capacity(nodes.len());
    for (position, node) in nodes.into_iter().enumerate() {
        let SceneNode {
            index, primitives, ..
        } = node;
        let material = assignment.part_materials[position];
        let primitives = primitives
            .into_iter()
            .map(|mut p| {
                p.material = Some(material);
                p
            })
            .collect();
        meshes.push(GltfMesh {
            name: Some(mesh_name(index)),
            primitives,
            ..Default::default()
        });
        graph.push(GltfNode {
            name: Some(node_name(index)),
            mesh: Some(position),
            ..Default::default()
        });
    }

    // Other scenes pointed into the flat graph, which no longer exists.
    let default_scene = document.default_scene();
    let mut scene = if default_scene < document.scenes.len() {
        document.scenes.swap_remove(default_scene)
    } else {
        GltfScene::default()
    };
    scene.nodes = (0..graph.len()).collect();
    document.scenes = vec![scene];
    document.scene = Some(0);
    document.meshes = meshes;
    document.nodes = graph;
    document.materials = assignment.materials.iter().map(|m| m.to_gltf()).collect();
    Ok(document)
}

/// Check that the default scene's roots are exactly the per-part nodes.
fn check_scene_graph(document: &GltfDocument) -> Result<()> {
    let roots = document
        .scenes
        .get(document.default_scene())
        .map(|s| s.nodes.as_slice())
        .unwrap_or_default();

    let mut seen = BTreeSet::new();
    for &root in roots {
        let node = document
            .nodes
            .get(root)
            .ok_or_else(|| SceneError::OrphanNode(format!("root {root} has no node")))?;
        let name = node.name.as_deref().unwrap_or_default();
        let part = parse_part_name(name)
            .filter(|_| name.starts_with("part_"))
            .ok_or_else(|| SceneError::OrphanNode(format!("root {root} ('{name}') is not a part node")))?;
        if !seen.insert(part) {
            return Err(SceneError::OrphanNode(format!("part_{part} is a root twice")));
        }
        if let Some(mesh) = node.mesh {
            if mesh >= document.meshes.len() {
                return Err(SceneError::OrphanNode(format!(
                    "part_{part} references missing mesh {mesh}"
                )));
            }
        }
    }

    for (index, node) in document.nodes.iter().enumerate() {
        let is_part = node
            .name
            .as_deref()
            .is_some_and(|n| n.starts_with("part_") && parse_part_name(n).is_some());
        if !is_part || !roots.contains(&index) {
            return Err(SceneError::OrphanNode(format!(
                "node {index} ('{}') is not reachable as a part root",
                node.name.as_deref().unwrap_or_default()
            )));
        }
    }
    Ok(())
}

fn padded(mut bytes: Vec<u8>, fill: u8) -> Vec<u8> {
    let len = bytes.len().next_multiple_of(4);
    bytes.resize(len, fill);
    bytes
}

fn chunk_len(len: usize) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| SceneError::InvalidContainer(format!("{len} bytes exceed the GLB size limit")))
}

/// Serialize a composed scene and its binary buffer into a GLB container.
///
/// Buffer descriptors lose their `uri` and report the in-memory length, so
/// the container is self-contained. The layout is
///
/// ```text
/// magic | version | totalLength
/// jsonLength | "JSON" | compact JSON, space padded to 4 bytes
/// binLength  | "BIN\0" | binary, zero padded to 4 bytes
/// ```
///
/// # Errors
///
/// - [`SceneError::OrphanNode`] if the root list is not exactly the part nodes.
/// - [`SceneError::EmptyBuffer`] if `binary` is empty but geometry is declared.
/// - [`SceneError::InvalidContainer`] if more than one buffer is declared.
pub fn assemble_container(document: &GltfDocument, binary: &[u8]) -> Result<Vec<u8>> {
    check_scene_graph(document)?;
    if binary.is_empty() && document.declares_geometry() {
        return Err(SceneError::EmptyBuffer);
    }

    // only buffer 0 can live in the BIN chunk
    if document.buffers.len() > 1 {
        return Err(SceneError::InvalidContainer(format!(
            "{} buffers declared, a GLB container embeds exactly one",
            document.buffers.len()
        )));
    }

    let mut document = document.clone();
    if let Some(buffer) = document.buffers.first_mut() {
        buffer.uri = None;
        buffer.byte_length = binary.len();
    }

    let json = padded(document.to_json_bytes()?, b' ');
    let bin = padded(binary.to_vec(), 0);
    let total = HEADER_LEN + CHUNK_HEADER_LEN + json.len() + CHUNK_HEADER_LEN + bin.len();

    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
    glb.extend_from_slice(&chunk_len(total)?.to_le_bytes());

    glb.extend_from_slice(&chunk_len(json.len())?.to_le_bytes());
    glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    glb.extend_from_slice(&json);

    glb.extend_from_slice(&chunk_len(bin.len())?.to_le_bytes());
    glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    glb.extend_from_slice(&bin);

    debug!(
        total_length = total,
        json_length = json.len(),
        bin_length = bin.len(),
        "Assembled GLB container"
    );
    Ok(glb)
}

/// Header fields and chunks of a GLB container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerChunks<'a> {
    /// Declared total length.
    pub total_length: u32,
    /// JSON chunk payload (with padding).
    pub json: &'a [u8],
    /// BIN chunk payload (with padding); empty if the chunk is absent.
    pub bin: &'a [u8],
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32> {
    bytes
        .get(at..at + 4)
        .and_then(|s| s.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| SceneError::InvalidContainer(format!("truncated at byte {at}")))
}

/// Split a GLB container into its chunks, checking the header.
pub fn read_container(bytes: &[u8]) -> Result<ContainerChunks<'_>> {
    if read_u32(bytes, 0)? != GLB_MAGIC {
        return Err(SceneError::InvalidContainer("bad magic".into()));
    }
    let version = read_u32(bytes, 4)?;
    if version != GLB_VERSION {
        return Err(SceneError::InvalidContainer(format!("unsupported version {version}")));
    }
    let total_length = read_u32(bytes, 8)?;
    if total_length as usize != bytes.len() {
        return Err(SceneError::InvalidContainer(format!(
            "header declares {total_length} bytes, container has {}",
            bytes.len()
        )));
    }

    let mut chunks: Vec<(u32, &[u8])> = Vec::new();
    let mut offset = HEADER_LEN;
    while offset < bytes.len() {
        let len = read_u32(bytes, offset)? as usize;
        let kind = read_u32(bytes, offset + 4)?;
        let start = offset + CHUNK_HEADER_LEN;
        let data = bytes
            .get(start..start + len)
            .ok_or_else(|| SceneError::InvalidContainer(format!("chunk at {offset} overruns")))?;
        chunks.push((kind, data));
        offset = start + len;
    }

    let json = match chunks.first() {
        Some((CHUNK_JSON, data)) => *data,
        _ => return Err(SceneError::InvalidContainer("first chunk is not JSON".into())),
    };
    let bin = chunks
        .iter()
        .find(|(kind, _)| *kind == CHUNK_BIN)
        .map(|(_, data)| *data)
        .unwrap_or_default();
    Ok(ContainerChunks {
        total_length,
        json,
        bin,
    })
}

/// Parse the JSON chunk of a GLB container back into a document.
pub fn read_document(bytes: &[u8]) -> Result<GltfDocument> {
    let chunks = read_container(bytes)?;
    Ok(serde_json::from_slice(chunks.json)?)
}
