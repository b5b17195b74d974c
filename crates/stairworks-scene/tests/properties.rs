//! Property-based tests for slicing, materials and container layout.
//!
//! Run with: cargo test -p stairworks-scene -- properties

use std::collections::BTreeMap;

use proptest::prelude::*;
use stairworks_ir::{BoundingBox, CategoryStyle, Part, StyleTable};
use stairworks_scene::{
    assemble_container, assign_materials, build_manifest, read_container, slice_primitives,
    SceneError,
};
use stairworks_scene::document::{GltfDocument, GltfMesh, GltfNode, GltfScene};

// =============================================================================
// Strategies
// =============================================================================

/// Grouped parts: up to four categories, each with one or more parts.
fn arb_parts() -> impl Strategy<Value = Vec<Part>> {
    prop::collection::vec(prop::collection::vec(1usize..12, 1..5), 1..5).prop_map(|groups| {
        let bbox = BoundingBox::new([0.0; 3], [1.0; 3]);
        groups
            .into_iter()
            .enumerate()
            .flat_map(|(c, faces)| {
                faces
                    .into_iter()
                    .map(move |n| Part::new(format!("cat{c}"), n, bbox, 1.0))
            })
            .collect()
    })
}

fn style_with_opacity(opacity: f64) -> StyleTable {
    let mut categories = BTreeMap::new();
    categories.insert(
        "cat0".to_string(),
        CategoryStyle {
            color: [0.5, 0.5, 0.5],
            opacity,
            metallic: None,
            roughness: None,
            stock: None,
            nestable: false,
        },
    );
    StyleTable {
        order: vec!["cat0".into()],
        categories,
        ..StyleTable::builtin()
    }
}

fn part_graph(parts: usize) -> GltfDocument {
    let mut doc = GltfDocument::new("proptest");
    doc.scenes = vec![GltfScene {
        nodes: (0..parts).collect(),
        ..Default::default()
    }];
    doc.nodes = (0..parts)
        .map(|i| GltfNode {
            name: Some(format!("part_{i}")),
            mesh: Some(i),
            ..Default::default()
        })
        .collect();
    doc.meshes = (0..parts)
        .map(|i| GltfMesh {
            name: Some(format!("mesh_{i}")),
            ..Default::default()
        })
        .collect();
    doc
}

// =============================================================================
// Property Tests: Slicing
// =============================================================================

proptest! {
    /// Slicing succeeds exactly when the face counts add up.
    #[test]
    fn slicing_succeeds_iff_counts_match(parts in arb_parts(), delta in -3i64..=3) {
        let manifest = build_manifest(&parts).unwrap();
        let total = manifest.total_primitives() as i64;
        let len = (total + delta).max(0) as usize;
        let result = slice_primitives((0..len).collect::<Vec<_>>(), &manifest);

        if len == manifest.total_primitives() {
            prop_assert_eq!(result.unwrap().len(), manifest.len());
        } else {
            let is_mismatch = matches!(result, Err(SceneError::PrimitiveCountMismatch { .. }));
            prop_assert!(is_mismatch);
        }
    }

    /// Concatenating node primitives reproduces the input exactly.
    #[test]
    fn slicing_round_trips(parts in arb_parts()) {
        let manifest = build_manifest(&parts).unwrap();
        let primitives: Vec<String> = (0..manifest.total_primitives())
            .map(|i| format!("face{i}"))
            .collect();
        let nodes = slice_primitives(primitives.clone(), &manifest).unwrap();

        for (node, entry) in nodes.iter().zip(manifest.entries()) {
            prop_assert_eq!(node.primitives.len(), entry.face_count);
            prop_assert_eq!(node.index, entry.part_index);
        }
        let joined: Vec<String> = nodes.into_iter().flat_map(|n| n.primitives).collect();
        prop_assert_eq!(joined, primitives);
    }
}

// =============================================================================
// Property Tests: Materials and container
// =============================================================================

proptest! {
    /// A material is transparent exactly when its opacity is below one.
    #[test]
    fn transparency_follows_opacity(opacity in 0.0..=1.0f64) {
        let parts = vec![Part::cuboid("cat0", [0.0; 3], [1.0; 3])];
        let manifest = build_manifest(&parts).unwrap();
        let assignment = assign_materials(&manifest, &style_with_opacity(opacity)).unwrap();
        prop_assert_eq!(assignment.materials[0].transparent, opacity < 1.0);
        prop_assert_eq!(assignment.materials[0].to_gltf().double_sided, opacity < 1.0);
    }

    /// The container is deterministic and its header length is its size.
    #[test]
    fn container_length_matches(parts in 1usize..20, binary in prop::collection::vec(any::<u8>(), 1..200)) {
        let doc = part_graph(parts);
        let a = assemble_container(&doc, &binary).unwrap();
        let b = assemble_container(&doc, &binary).unwrap();
        prop_assert_eq!(&a, &b);

        let chunks = read_container(&a).unwrap();
        prop_assert_eq!(chunks.total_length as usize, a.len());
        prop_assert_eq!(a.len() % 4, 0);
        prop_assert_eq!(&chunks.bin[..binary.len()], binary.as_slice());
    }
}
