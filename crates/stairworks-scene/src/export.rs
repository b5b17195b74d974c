//! Flat (part-agnostic) glTF export.
//!
//! A flat exporter turns an ordered part sequence into a single-mesh glTF
//! document: one primitive per topological face, emitted in part order, with
//! no record of which part a primitive came from. The assembler recovers
//! part identity from the manifest.

use serde_json::{json, Value};
use stairworks_ir::{Axis, BoundingBox, Part};
use tracing::debug;

use crate::document::{GltfBuffer, GltfDocument, GltfMesh, GltfNode, GltfPrimitive, GltfScene};
use crate::error::{Result, SceneError};

const FLOAT: u32 = 5126;
const UNSIGNED_INT: u32 = 5125;
const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;
const TRIANGLES: u32 = 4;

/// A flat glTF document and its binary buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatExport {
    /// glTF JSON; buffers may still carry an external `uri`.
    pub document: GltfDocument,
    /// Contents of buffer 0.
    pub binary: Vec<u8>,
}

impl FlatExport {
    /// The primitives of every mesh, concatenated in mesh order.
    pub fn take_primitives(&mut self) -> Vec<GltfPrimitive> {
        self.document
            .meshes
            .iter_mut()
            .flat_map(|mesh| std::mem::take(&mut mesh.primitives))
            .collect()
    }
}

/// Something that can export parts as one flat primitive array.
///
/// Implementations must emit exactly `part.face_count` primitives per part,
/// in the order the parts are given.
pub trait FlatExporter {
    /// Export `parts` as one flat document.
    fn export_flat(&self, parts: &[Part]) -> Result<FlatExport>;
}

/// Exports each part as its bounding box: six quads, one primitive per face.
#[derive(Debug, Clone)]
pub struct CuboidExporter {
    /// External buffer file name written into the flat document.
    pub buffer_uri: String,
}

impl Default for CuboidExporter {
    fn default() -> Self {
        Self {
            buffer_uri: "stairworks.bin".into(),
        }
    }
}

/// Corners of the box face perpendicular to `axis` on the `positive` or
/// negative side, counter-clockwise seen from outside.
fn face_corners(bbox: &BoundingBox, axis: Axis, positive: bool) -> [[f32; 3]; 4] {
    let a = axis.index();
    let u = (a + 1) % 3;
    let v = (a + 2) % 3;
    let plane = if positive { bbox.max[a] } else { bbox.min[a] };
    let mut uv = [(0, 0), (1, 0), (1, 1), (0, 1)];
    if !positive {
        uv.reverse();
    }
    uv.map(|(i, j)| {
        let mut p = [0.0f32; 3];
        p[a] = plane as f32;
        p[u] = (if i == 0 { bbox.min[u] } else { bbox.max[u] }) as f32;
        p[v] = (if j == 0 { bbox.min[v] } else { bbox.max[v] }) as f32;
        p
    })
}

fn accessor_bounds(positions: &[[f32; 3]]) -> (Value, Value) {
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for p in positions {
        for k in 0..3 {
            min[k] = min[k].min(p[k]);
            max[k] = max[k].max(p[k]);
        }
    }
    (json!(min), json!(max))
}

impl FlatExporter for CuboidExporter {
    fn export_flat(&self, parts: &[Part]) -> Result<FlatExport> {
        let mut positions: Vec<[f32; 3]> = Vec::with_capacity(parts.len() * 24);
        let mut normals: Vec<[f32; 3]> = Vec::with_capacity(parts.len() * 24);
        let mut indices: Vec<u32> = Vec::with_capacity(parts.len() * 36);

        for (i, part) in parts.iter().enumerate() {
            if part.face_count != 6 {
                return Err(SceneError::Export(format!(
                    "part {i} ({}) has {} faces; a box has 6",
                    part.category, part.face_count
                )));
            }
            for axis in Axis::ALL {
                for positive in [false, true] {
                    let base = u32::try_from(positions.len())
                        .map_err(|_| SceneError::Export("too many vertices".into()))?;
                    let mut normal = [0.0f32; 3];
                    normal[axis.index()] = if positive { 1.0 } else { -1.0 };
                    positions.extend(face_corners(&part.bounding_box, axis, positive));
                    normals.extend([normal; 4]);
                    indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
                }
            }
        }

        let mut binary = Vec::with_capacity((positions.len() * 2 * 12) + indices.len() * 4);
        for p in positions.iter().chain(normals.iter()) {
            for c in p {
                binary.extend_from_slice(&c.to_le_bytes());
            }
        }
        for index in &indices {
            binary.extend_from_slice(&index.to_le_bytes());
        }

        let vertex_bytes = positions.len() * 12;
        let index_bytes = indices.len() * 4;
        let face_count = indices.len() / 6;

        let (min, max) = accessor_bounds(&positions);
        let mut accessors = vec![
            json!({
                "bufferView": 0, "componentType": FLOAT, "count": positions.len(),
                "type": "VEC3", "min": min, "max": max
            }),
            json!({
                "bufferView": 1, "componentType": FLOAT, "count": normals.len(), "type": "VEC3"
            }),
        ];
        let mut primitives = Vec::with_capacity(face_count);
        for face in 0..face_count {
            primitives.push(GltfPrimitive {
                attributes: [("NORMAL".to_string(), 1), ("POSITION".to_string(), 0)].into(),
                indices: Some(accessors.len()),
                mode: Some(TRIANGLES),
                ..Default::default()
            });
            accessors.push(json!({
                "bufferView": 2, "byteOffset": face * 24, "componentType": UNSIGNED_INT,
                "count": 6, "type": "SCALAR"
            }));
        }

        let mut document = GltfDocument::new(concat!("stairworks ", env!("CARGO_PKG_VERSION")));
        document.scene = Some(0);
        document.scenes = vec![GltfScene {
            nodes: vec![0],
            ..Default::default()
        }];
        document.nodes = vec![GltfNode {
            name: Some("staircase".into()),
            mesh: Some(0),
            ..Default::default()
        }];
        document.meshes = vec![GltfMesh {
            name: Some("staircase".into()),
            primitives,
            ..Default::default()
        }];
        document.buffers = vec![GltfBuffer {
            uri: Some(self.buffer_uri.clone()),
            byte_length: binary.len(),
            ..Default::default()
        }];
        document.other.insert("accessors".into(), Value::Array(accessors));
        document.other.insert(
            "bufferViews".into(),
            json!([
                { "buffer": 0, "byteOffset": 0, "byteLength": vertex_bytes, "target": ARRAY_BUFFER },
                { "buffer": 0, "byteOffset": vertex_bytes, "byteLength": vertex_bytes, "target": ARRAY_BUFFER },
                { "buffer": 0, "byteOffset": vertex_bytes * 2, "byteLength": index_bytes, "target": ELEMENT_ARRAY_BUFFER }
            ]),
        );

        debug!(
            parts = parts.len(),
            primitives = face_count,
            bytes = binary.len(),
            "Exported flat cuboid scene"
        );
        Ok(FlatExport { document, binary })
    }
}
