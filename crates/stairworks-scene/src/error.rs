//! Error types for scene assembly.

use thiserror::Error;

/// Errors that can occur while turning a flat export into a per-part container.
///
/// Every variant is fatal for the request: a partially assembled container
/// would attribute geometry to the wrong part.
#[derive(Error, Debug)]
pub enum SceneError {
    /// No parts, or no part has any faces.
    #[error("no geometry to export")]
    EmptyGeometry,

    /// A part with zero faces was handed over alongside real geometry.
    #[error("part {index} ({category}) has no faces")]
    EmptyPart {
        /// Position of the part in the input sequence.
        index: usize,
        /// Category of the part.
        category: String,
    },

    /// A category reappears after a different one; the input is not grouped.
    #[error("category '{category}' reappears at part {index}; parts must be grouped by category")]
    UngroupedCategory {
        /// Category that reappeared.
        category: String,
        /// Position of the offending part.
        index: usize,
    },

    /// The manifest's face counts do not add up to the exported primitive count.
    #[error("primitive count mismatch: manifest expects {expected}, export has {actual}")]
    PrimitiveCountMismatch {
        /// Sum of manifest face counts.
        expected: usize,
        /// Primitives present in the flat export.
        actual: usize,
    },

    /// A manifest category has no style entry.
    #[error("no style configured for category '{0}'")]
    UnknownCategory(String),

    /// The scene graph still references nodes or meshes outside the per-part graph.
    #[error("orphan scene reference: {0}")]
    OrphanNode(String),

    /// The binary buffer is empty but the scene declares geometry.
    #[error("binary buffer is empty but the scene declares geometry")]
    EmptyBuffer,

    /// The flat exporter failed.
    #[error("flat export failed: {0}")]
    Export(String),

    /// The scene document could not be (de)serialized.
    #[error("scene JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A container failed to parse back.
    #[error("invalid container: {0}")]
    InvalidContainer(String),
}

/// Result type for scene operations.
pub type Result<T> = std::result::Result<T, SceneError>;
