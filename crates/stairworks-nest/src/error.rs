//! Error types for cut planning.

use serde::Serializer;
use thiserror::Error;

/// Errors raised while flattening, splitting or nesting part outlines.
///
/// `UnclosedProfile`, `UnsplittableGeometry` and `OversizedPart` concern a
/// single part and are collected per item by the planner; the rest abort.
#[derive(Error, Debug)]
pub enum NestError {
    /// The traced profile is not a closed ring of at least three vertices.
    #[error("part {part}: profile is not closed ({reason})")]
    UnclosedProfile {
        /// Source part index.
        part: usize,
        /// What was wrong with the wire.
        reason: String,
    },

    /// The outline is too long for stock but cannot be scarf-split.
    #[error("outline '{label}' cannot be scarf-split: {reason}")]
    UnsplittableGeometry {
        /// Outline label.
        label: String,
        /// Why a straight scarf joint does not fit.
        reason: String,
    },

    /// The outline fits no sheet in any orientation.
    #[error("outline '{label}' ({width:.1} x {height:.1}) does not fit a {sheet_width:.0} x {sheet_height:.0} sheet")]
    OversizedPart {
        /// Outline label.
        label: String,
        /// Footprint width.
        width: f64,
        /// Footprint height.
        height: f64,
        /// Sheet width.
        sheet_width: f64,
        /// Sheet height.
        sheet_height: f64,
    },

    /// Splitter or nesting settings are out of range.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Writing a cut file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cut planning operations.
pub type Result<T> = std::result::Result<T, NestError>;

/// Serialize an error as its display message.
pub(crate) fn serialize_display<S: Serializer>(
    error: &NestError,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}
