#![warn(missing_docs)]

//! Cut planning for stairworks: flat profiles, scarf joints and sheet nesting.
//!
//! The pipeline per staircase:
//!
//! 1. [`ProfileExtractor`] flattens each sheet-cut part into an [`Outline`].
//! 2. [`split_outline`] cuts outlines longer than the stock into overlapping
//!    scarf-joint pieces.
//! 3. [`nest_outlines`] shelf-packs the outlines onto stock sheets.
//! 4. [`export_layout_dxf`] writes the layout for the CNC router.
//!
//! [`plan_cuts`] runs steps 1 to 3 over a whole part list.
//!
//! # Example
//!
//! ```rust
//! use stairworks_ir::{Part, StyleTable};
//! use stairworks_nest::{plan_cuts, CutSettings, WireProfileExtractor};
//!
//! let parts = vec![Part::cuboid("treads", [0.0; 3], [1000.0, 280.0, 20.0])];
//! let plan = plan_cuts(
//!     &parts,
//!     &StyleTable::builtin(),
//!     &CutSettings::default(),
//!     &WireProfileExtractor,
//! )
//! .unwrap();
//! assert_eq!(plan.sheet_count(), 1);
//! ```
//!
//! [`Outline`]: stairworks_ir::Outline

pub mod dxf;
pub mod error;
pub mod nesting;
pub mod plan;
pub mod profile;
pub mod scarf;

pub use dxf::{export_layout_dxf, write_layout_dxf};
pub use error::{NestError, Result};
pub use nesting::{
    nest_outlines, GroupBy, NestingResult, NestingSettings, Placement, Sheet, SheetSize,
    UnplacedOutline,
};
pub use plan::{plan_cuts, CutPlan, CutSettings, PartIssue, MIN_PROFILE_EXTENT};
pub use profile::{ProfileExtractor, WireProfileExtractor, PROFILE_PRECISION};
pub use scarf::{split_outline, ScarfSettings, ScarfSplit, SplitOutcome};
