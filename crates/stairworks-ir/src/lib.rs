#![warn(missing_docs)]

//! Shared data model for the stairworks pipeline.
//!
//! This crate holds the declarative types that cross crate boundaries:
//! the [`Part`] records handed over by the solid modeler, the 2D
//! [`Outline`] profiles consumed by nesting, and the read-only
//! [`StyleTable`] that maps part categories to render and stock settings.
//!
//! Nothing here performs geometry work. Scene assembly lives in
//! `stairworks-scene`, cut planning in `stairworks-nest`.

pub mod outline;
pub mod part;
pub mod style;

pub use outline::{Outline, Point2D, Rect};
pub use part::{Axis, BoundingBox, Part};
pub use style::{CategoryStyle, ConfigError, StockDef, StyleTable};
