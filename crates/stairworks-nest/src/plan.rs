//! Cut planning: parts in, nested sheet layout out.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use stairworks_ir::{Outline, Part, StyleTable};
use tracing::{info, warn};

use crate::error::{NestError, Result};
use crate::nesting::{nest_outlines, NestingResult, NestingSettings};
use crate::profile::ProfileExtractor;
use crate::scarf::{split_outline, ScarfSettings, ScarfSplit, SplitOutcome};

/// Profiles this thin (mm) in either direction are not cuttable parts.
pub const MIN_PROFILE_EXTENT: f64 = 1.0;

/// Settings for a whole cut planning run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CutSettings {
    /// Scarf joint settings.
    pub scarf: ScarfSettings,
    /// Sheet nesting settings.
    pub nesting: NestingSettings,
}

impl CutSettings {
    /// Check both setting groups.
    pub fn validate(&self) -> Result<()> {
        self.scarf.validate()?;
        self.nesting.validate()
    }
}

/// A part that needs a human to look at it.
#[derive(Debug, Serialize)]
pub struct PartIssue {
    /// Source part index.
    pub part_index: usize,
    /// Part label.
    pub label: String,
    /// What went wrong.
    #[serde(serialize_with = "crate::error::serialize_display")]
    pub error: NestError,
}

/// The complete cut plan for a staircase.
#[derive(Debug, Serialize)]
pub struct CutPlan {
    /// Outlines that went to nesting; placements index into this list.
    pub outlines: Vec<Outline>,
    /// Parts that were scarf-split.
    pub splits: Vec<ScarfSplit>,
    /// Over-length parts that could not be split; nested whole.
    pub flagged: Vec<PartIssue>,
    /// Parts whose profile could not be extracted; not nested.
    pub profile_failures: Vec<PartIssue>,
    /// Parts of categories that are not cut from sheet stock.
    pub skipped: Vec<usize>,
    /// Sheet layout.
    pub nesting: NestingResult,
}

impl CutPlan {
    /// Number of sheets used.
    pub fn sheet_count(&self) -> usize {
        self.nesting.sheets.len()
    }
}

enum Prepared {
    Nest {
        outlines: Vec<Outline>,
        split: Option<ScarfSplit>,
        flagged: Option<PartIssue>,
    },
    Failed(PartIssue),
}

/// `<category>_<n>` labels, `n` counting from 1 within each category.
fn part_labels(parts: &[Part]) -> Vec<String> {
    let mut seen: Vec<(&str, usize)> = Vec::new();
    parts
        .iter()
        .map(|part| {
            let n = match seen.iter_mut().find(|(c, _)| *c == part.category) {
                Some((_, n)) => {
                    *n += 1;
                    *n
                }
                None => {
                    seen.push((part.category.as_str(), 1));
                    1
                }
            };
            format!("{}_{n}", part.category)
        })
        .collect()
}

fn prepare(
    part: &Part,
    part_index: usize,
    label: &str,
    styles: &StyleTable,
    settings: &ScarfSettings,
    extractor: &impl ProfileExtractor,
) -> Prepared {
    let extracted = extractor.extract(part, part_index).and_then(|outline| {
        if outline.width() <= MIN_PROFILE_EXTENT || outline.height() <= MIN_PROFILE_EXTENT {
            return Err(NestError::UnclosedProfile {
                part: part_index,
                reason: format!(
                    "degenerate profile {:.2} x {:.2}",
                    outline.width(),
                    outline.height()
                ),
            });
        }
        Ok(outline)
    });
    let outline = match extracted {
        Ok(outline) => Outline {
            label: label.to_string(),
            stock: styles.stock_for(&part.category).map(str::to_string),
            ..outline
        },
        Err(error) => {
            return Prepared::Failed(PartIssue {
                part_index,
                label: label.to_string(),
                error,
            })
        }
    };

    match split_outline(outline.clone(), settings) {
        Ok(SplitOutcome::Whole(outline)) => Prepared::Nest {
            outlines: vec![outline],
            split: None,
            flagged: None,
        },
        Ok(SplitOutcome::Split(split)) => Prepared::Nest {
            outlines: split.pieces.clone(),
            split: Some(split),
            flagged: None,
        },
        Err(error) => Prepared::Nest {
            outlines: vec![outline],
            split: None,
            flagged: Some(PartIssue {
                part_index,
                label: label.to_string(),
                error,
            }),
        },
    }
}

/// Flatten, split and nest every sheet-cut part.
///
/// Parts of non-nestable categories are skipped. Profile extraction and
/// splitting run in parallel; results keep part order, so the plan is the
/// same for every run. Per-part failures are collected in the plan rather
/// than aborting it.
///
/// # Errors
///
/// [`NestError::InvalidSettings`] for out-of-range settings.
pub fn plan_cuts(
    parts: &[Part],
    styles: &StyleTable,
    settings: &CutSettings,
    extractor: &impl ProfileExtractor,
) -> Result<CutPlan> {
    settings.validate()?;
    let labels = part_labels(parts);

    let (nestable, skipped): (Vec<usize>, Vec<usize>) =
        (0..parts.len()).partition(|&i| styles.is_nestable(&parts[i].category));
    info!(
        parts = parts.len(),
        nestable = nestable.len(),
        skipped = skipped.len(),
        "Planning cuts"
    );

    let prepared: Vec<Prepared> = nestable
        .par_iter()
        .map(|&i| prepare(&parts[i], i, &labels[i], styles, &settings.scarf, extractor))
        .collect();

    let mut outlines = Vec::new();
    let mut splits = Vec::new();
    let mut flagged = Vec::new();
    let mut profile_failures = Vec::new();
    for item in prepared {
        match item {
            Prepared::Nest {
                outlines: pieces,
                split,
                flagged: issue,
            } => {
                outlines.extend(pieces);
                splits.extend(split);
                if let Some(issue) = issue {
                    warn!(label = %issue.label, "{}; nesting it whole", issue.error);
                    flagged.push(issue);
                }
            }
            Prepared::Failed(issue) => {
                warn!(label = %issue.label, "{}", issue.error);
                profile_failures.push(issue);
            }
        }
    }

    let nesting = nest_outlines(&outlines, &settings.nesting)?;
    info!(
        outlines = outlines.len(),
        splits = splits.len(),
        flagged = flagged.len(),
        sheets = nesting.sheets.len(),
        "Cut plan ready"
    );
    Ok(CutPlan {
        outlines,
        splits,
        flagged,
        profile_failures,
        skipped,
        nesting,
    })
}
