//! Typed view of a glTF 2.0 JSON document.
//!
//! Only the parts the assembler rewrites are typed (scenes, nodes, meshes,
//! materials, buffers). Everything else the upstream exporter wrote
//! (accessors, buffer views, asset info, extensions) is carried through
//! untouched in the flattened `other` maps. Those maps are ordered, so the
//! same document always serializes to the same bytes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// A glTF scene (root node list).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GltfScene {
    /// Scene name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Root node indices.
    #[serde(default)]
    pub nodes: Vec<usize>,
    /// Unmodeled fields.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A glTF node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GltfNode {
    /// Node name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Mesh index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<usize>,
    /// Child node indices.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<usize>,
    /// Unmodeled fields (transforms, extras, ...).
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A drawable surface patch. The flat exporter emits one per topological face.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GltfPrimitive {
    /// Vertex attribute name → accessor index.
    pub attributes: BTreeMap<String, usize>,
    /// Index accessor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<usize>,
    /// Material index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<usize>,
    /// Topology mode (4 = triangles when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
    /// Unmodeled fields.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A glTF mesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GltfMesh {
    /// Mesh name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Primitives of the mesh.
    pub primitives: Vec<GltfPrimitive>,
    /// Unmodeled fields.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// PBR metallic-roughness block of a material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfPbr {
    /// Linear RGBA base color.
    pub base_color_factor: [f64; 4],
    /// Metallic factor.
    pub metallic_factor: f64,
    /// Roughness factor.
    pub roughness_factor: f64,
}

/// A glTF material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfMaterial {
    /// Material name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// PBR factors.
    pub pbr_metallic_roughness: GltfPbr,
    /// `OPAQUE`, `MASK` or `BLEND`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_mode: Option<String>,
    /// Render both faces.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub double_sided: bool,
    /// Application-specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
}

/// A glTF buffer descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfBuffer {
    /// External file reference; absent for the GLB-embedded buffer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Length of the buffer in bytes.
    pub byte_length: usize,
    /// Unmodeled fields.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A glTF 2.0 JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GltfDocument {
    /// Asset metadata (`version` is required by the format).
    pub asset: Value,
    /// Default scene index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<usize>,
    /// Scenes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<GltfScene>,
    /// Nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<GltfNode>,
    /// Meshes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meshes: Vec<GltfMesh>,
    /// Materials.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<GltfMaterial>,
    /// Buffers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffers: Vec<GltfBuffer>,
    /// Accessors, buffer views, extensions and anything else.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl GltfDocument {
    /// An empty document with a glTF 2.0 asset header.
    pub fn new(generator: &str) -> Self {
        Self {
            asset: serde_json::json!({ "version": "2.0", "generator": generator }),
            scene: None,
            scenes: Vec::new(),
            nodes: Vec::new(),
            meshes: Vec::new(),
            materials: Vec::new(),
            buffers: Vec::new(),
            other: Map::new(),
        }
    }

    /// Parse from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Compact JSON bytes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Index of the scene the viewer loads.
    pub fn default_scene(&self) -> usize {
        self.scene.unwrap_or(0)
    }

    /// Total number of primitives across all meshes.
    pub fn primitive_count(&self) -> usize {
        self.meshes.iter().map(|m| m.primitives.len()).sum()
    }

    /// Number of accessors.
    pub fn accessor_count(&self) -> usize {
        self.other
            .get("accessors")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// True if the document references any vertex data.
    pub fn declares_geometry(&self) -> bool {
        self.primitive_count() > 0 || self.accessor_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLAT: &str = r#"{
        "asset": {"version": "2.0", "generator": "occt"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"name": "Compound", "mesh": 0, "matrix": [1,0,0,0,0,0,-1,0,0,1,0,0,0,0,0,1]}],
        "meshes": [{"primitives": [
            {"attributes": {"POSITION": 0, "NORMAL": 1}, "indices": 2, "mode": 4},
            {"attributes": {"POSITION": 0, "NORMAL": 1}, "indices": 3, "mode": 4}
        ]}],
        "accessors": [{}, {}, {}, {}],
        "bufferViews": [{"buffer": 0, "byteLength": 8}],
        "buffers": [{"uri": "staircase.bin", "byteLength": 8}]
    }"#;

    #[test]
    fn test_parse_keeps_unmodeled_fields() {
        let doc = GltfDocument::from_json(FLAT).unwrap();
        assert_eq!(doc.primitive_count(), 2);
        assert_eq!(doc.accessor_count(), 4);
        assert!(doc.other.contains_key("bufferViews"));
        assert!(doc.nodes[0].other.contains_key("matrix"));
        assert_eq!(doc.buffers[0].uri.as_deref(), Some("staircase.bin"));
        assert!(doc.declares_geometry());
    }

    #[test]
    fn test_serialization_is_stable() {
        let doc = GltfDocument::from_json(FLAT).unwrap();
        let a = doc.to_json_bytes().unwrap();
        let b = GltfDocument::from_json(std::str::from_utf8(&a).unwrap())
            .unwrap()
            .to_json_bytes()
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_material_serializes_camel_case() {
        let material = GltfMaterial {
            name: Some("treads".into()),
            pbr_metallic_roughness: GltfPbr {
                base_color_factor: [0.72, 0.52, 0.3, 0.5],
                metallic_factor: 0.05,
                roughness_factor: 0.65,
            },
            alpha_mode: Some("BLEND".into()),
            double_sided: true,
            extras: None,
        };
        let json = serde_json::to_string(&material).unwrap();
        assert!(json.contains(r#""pbrMetallicRoughness""#));
        assert!(json.contains(r#""baseColorFactor""#));
        assert!(json.contains(r#""alphaMode":"BLEND""#));
        assert!(json.contains(r#""doubleSided":true"#));
        assert!(!json.contains("extras"));
    }
}
