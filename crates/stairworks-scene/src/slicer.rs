//! Remaps the flat primitive array back into per-part scene nodes.

use tracing::debug;

use crate::error::{Result, SceneError};
use crate::manifest::{Manifest, PrimitiveRange};

/// Name of the scene node for part `index`. The viewer recovers part identity
/// from this name alone.
pub fn node_name(index: usize) -> String {
    format!("part_{index}")
}

/// Name of the mesh owned by part `index`.
pub fn mesh_name(index: usize) -> String {
    format!("mesh_{index}")
}

/// Parse a `part_<index>` or `mesh_<index>` name back into the part index.
pub fn parse_part_name(name: &str) -> Option<usize> {
    name.strip_prefix("part_")
        .or_else(|| name.strip_prefix("mesh_"))
        .and_then(|digits| digits.parse().ok())
}

/// One part's node: exactly the primitives in its range, in their original
/// relative order.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode<P> {
    /// Part (and node) index.
    pub index: usize,
    /// Range this node was cut from.
    pub range: PrimitiveRange,
    /// Owned primitives.
    pub primitives: Vec<P>,
}

impl<P> SceneNode<P> {
    /// `part_<index>`.
    pub fn name(&self) -> String {
        node_name(self.index)
    }

    /// `mesh_<index>`.
    pub fn mesh_name(&self) -> String {
        mesh_name(self.index)
    }
}

/// Move each manifest entry's slice of `primitives` into its own node.
///
/// The count check runs before anything is moved: either every primitive
/// lands in exactly one node, or the call fails.
///
/// # Errors
///
/// [`SceneError::PrimitiveCountMismatch`] if the manifest's face counts do
/// not sum to `primitives.len()`.
pub fn slice_primitives<P>(primitives: Vec<P>, manifest: &Manifest) -> Result<Vec<SceneNode<P>>> {
    let expected = manifest.total_primitives();
    if expected != primitives.len() {
        return Err(SceneError::PrimitiveCountMismatch {
            expected,
            actual: primitives.len(),
        });
    }

    let mut remaining = primitives.into_iter();
    let nodes: Vec<SceneNode<P>> = manifest
        .entries()
        .iter()
        .zip(manifest.ranges())
        .map(|(entry, range)| SceneNode {
            index: entry.part_index,
            range,
            primitives: remaining.by_ref().take(range.len()).collect(),
        })
        .collect();

    debug!(nodes = nodes.len(), primitives = expected, "Sliced flat primitives");
    Ok(nodes)
}
