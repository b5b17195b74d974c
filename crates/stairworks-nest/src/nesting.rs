//! Greedy shelf nesting of outline bounding rectangles onto stock sheets.

use serde::{Deserialize, Serialize};
use stairworks_ir::{Outline, Point2D, Rect};
use tracing::{debug, info, warn};

use crate::error::{NestError, Result};

const FIT_EPSILON: f64 = 1e-9;

/// Stock sheet dimensions (mm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SheetSize {
    /// Width along X.
    pub width: f64,
    /// Height along Y.
    pub height: f64,
}

impl Default for SheetSize {
    fn default() -> Self {
        Self {
            width: 2440.0,
            height: 1220.0,
        }
    }
}

/// How outlines are separated onto their own sheet sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// Everything shares one sheet set.
    None,
    /// One sheet set per category.
    Category,
    /// One sheet set per stock material.
    #[default]
    Stock,
}

/// Nesting settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NestingSettings {
    /// Sheet dimensions.
    pub sheet: SheetSize,
    /// Minimum gap between neighbouring parts (kerf allowance).
    pub spacing: f64,
    /// Grouping key.
    pub group_by: GroupBy,
}

impl Default for NestingSettings {
    fn default() -> Self {
        Self {
            sheet: SheetSize::default(),
            spacing: 8.0,
            group_by: GroupBy::default(),
        }
    }
}

impl NestingSettings {
    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(self.sheet.width > 0.0 && self.sheet.height > 0.0) {
            return Err(NestError::InvalidSettings(format!(
                "sheet must have positive size, got {} x {}",
                self.sheet.width, self.sheet.height
            )));
        }
        if !(self.spacing >= 0.0) {
            return Err(NestError::InvalidSettings(format!(
                "spacing must not be negative, got {}",
                self.spacing
            )));
        }
        Ok(())
    }

    fn group_key(&self, outline: &Outline) -> Option<String> {
        match self.group_by {
            GroupBy::None => None,
            GroupBy::Category => Some(outline.category.clone()),
            GroupBy::Stock => Some(outline.stock.clone().unwrap_or_else(|| "unassigned".into())),
        }
    }
}

/// Where one outline sits on a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Index into the nested outline slice.
    pub outline_index: usize,
    /// Left edge of the placed bounding rectangle.
    pub x: f64,
    /// Bottom edge of the placed bounding rectangle.
    pub y: f64,
    /// Rotated 90° counter-clockwise.
    pub rotated: bool,
    /// Placed width (after rotation).
    pub width: f64,
    /// Placed height (after rotation).
    pub height: f64,
}

impl Placement {
    /// Placed bounding rectangle.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.x, self.y, self.width, self.height)
    }

    fn place_ring(&self, bounds: &Rect, ring: &[Point2D]) -> Vec<Point2D> {
        ring.iter()
            .map(|p| {
                let (lx, ly) = (p.x - bounds.min_x, p.y - bounds.min_y);
                if self.rotated {
                    Point2D::new(self.x + bounds.height() - ly, self.y + lx)
                } else {
                    Point2D::new(self.x + lx, self.y + ly)
                }
            })
            .collect()
    }

    /// The outline's vertices in sheet coordinates.
    pub fn placed_points(&self, outline: &Outline) -> Vec<Point2D> {
        self.place_ring(&outline.bounds(), &outline.points)
    }

    /// The outline's holes in sheet coordinates, moved with the outer ring.
    pub fn placed_holes(&self, outline: &Outline) -> Vec<Vec<Point2D>> {
        let bounds = outline.bounds();
        outline
            .holes
            .iter()
            .map(|hole| self.place_ring(&bounds, hole))
            .collect()
    }
}

/// One stock sheet and what is cut from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    /// Sheet number across the whole run.
    pub index: usize,
    /// Group (category or stock) the sheet belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Sheet width.
    pub width: f64,
    /// Sheet height.
    pub height: f64,
    /// Placements in placement order.
    pub placements: Vec<Placement>,
    /// Summed outline area of the placements.
    pub used_area: f64,
}

impl Sheet {
    /// Sheet area.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Fraction of the sheet covered by parts.
    pub fn efficiency(&self) -> f64 {
        self.used_area / self.area()
    }
}

/// An outline the engine could not place.
#[derive(Debug, Serialize)]
pub struct UnplacedOutline {
    /// Index into the nested outline slice.
    pub outline_index: usize,
    /// Outline label.
    pub label: String,
    /// Why it was not placed.
    #[serde(serialize_with = "crate::error::serialize_display")]
    pub error: NestError,
}

/// Sheets plus anything left over.
#[derive(Debug, Default, Serialize)]
pub struct NestingResult {
    /// Sheets, grouped in first-seen group order.
    pub sheets: Vec<Sheet>,
    /// Outlines that fit no sheet.
    pub unplaced: Vec<UnplacedOutline>,
}

impl NestingResult {
    /// Number of placements across all sheets.
    pub fn placement_count(&self) -> usize {
        self.sheets.iter().map(|s| s.placements.len()).sum()
    }

    /// Used area over total sheet area; zero without sheets.
    pub fn efficiency(&self) -> f64 {
        let area: f64 = self.sheets.iter().map(Sheet::area).sum();
        if area > 0.0 {
            self.sheets.iter().map(|s| s.used_area).sum::<f64>() / area
        } else {
            0.0
        }
    }

    /// Sheet and placement of an outline.
    pub fn placement_of(&self, outline_index: usize) -> Option<(&Sheet, &Placement)> {
        self.sheets.iter().find_map(|sheet| {
            sheet
                .placements
                .iter()
                .find(|p| p.outline_index == outline_index)
                .map(|p| (sheet, p))
        })
    }
}

struct Shelf {
    y: f64,
    height: f64,
    used_width: f64,
}

struct OpenSheet {
    sheet: Sheet,
    shelves: Vec<Shelf>,
    used_height: f64,
}

/// Footprint including the spacing gap, in both orientations.
#[derive(Clone, Copy)]
struct Item {
    index: usize,
    width: f64,
    height: f64,
}

impl Item {
    /// `(width, height, rotated)` for 0° then 90°.
    fn orientations(&self) -> [(f64, f64, bool); 2] {
        [(self.width, self.height, false), (self.height, self.width, true)]
    }
}

/// Orientation that fits `max_width` x `max_height` with the least leftover
/// width. Ties keep 0°.
fn best_orientation(item: &Item, max_width: f64, max_height: f64) -> Option<(f64, f64, bool)> {
    item.orientations()
        .into_iter()
        .filter(|&(w, h, _)| w <= max_width + FIT_EPSILON && h <= max_height + FIT_EPSILON)
        .fold(None, |best: Option<(f64, f64, bool)>, candidate| match best {
            Some(b) if max_width - b.0 <= max_width - candidate.0 => Some(b),
            _ => Some(candidate),
        })
}

struct Packer<'a> {
    outlines: &'a [Outline],
    settings: &'a NestingSettings,
    // sheet dimensions grown by one spacing so the last part in a row needs no gap
    width: f64,
    height: f64,
}

impl Packer<'_> {
    fn place(&self, open: &mut OpenSheet, item: &Item, shelf: usize, (w, h, rotated): (f64, f64, bool)) {
        let shelf = &mut open.shelves[shelf];
        let spacing = self.settings.spacing;
        open.sheet.placements.push(Placement {
            outline_index: item.index,
            x: shelf.used_width,
            y: shelf.y,
            rotated,
            width: w - spacing,
            height: h - spacing,
        });
        open.sheet.used_area += self.outlines[item.index].area();
        shelf.used_width += w;
    }

    fn open_shelf(&self, open: &mut OpenSheet, item: &Item) -> Option<(usize, (f64, f64, bool))> {
        let remaining = self.height - open.used_height;
        let orientation = best_orientation(item, self.width, remaining)?;
        open.shelves.push(Shelf {
            y: open.used_height,
            height: orientation.1,
            used_width: 0.0,
        });
        open.used_height += orientation.1;
        debug!(
            sheet = open.sheet.index,
            shelf = open.shelves.len() - 1,
            y = open.used_height - orientation.1,
            height = orientation.1,
            "Opened shelf"
        );
        Some((open.shelves.len() - 1, orientation))
    }

    fn pack_group(&self, group: Option<String>, mut items: Vec<Item>, first_sheet: usize) -> Vec<Sheet> {
        items.sort_by(|a, b| {
            b.height
                .total_cmp(&a.height)
                .then(b.width.total_cmp(&a.width))
                .then(self.outlines[a.index].source_part.cmp(&self.outlines[b.index].source_part))
                .then(a.index.cmp(&b.index))
        });

        let mut sheets: Vec<OpenSheet> = Vec::new();
        for item in &items {
            let existing = sheets.iter().enumerate().find_map(|(s, open)| {
                open.shelves.iter().enumerate().find_map(|(k, shelf)| {
                    best_orientation(item, self.width - shelf.used_width, shelf.height)
                        .map(|orientation| (s, k, orientation))
                })
            });
            if let Some((s, k, orientation)) = existing {
                self.place(&mut sheets[s], item, k, orientation);
                continue;
            }

            if let Some(current) = sheets.last_mut() {
                if let Some((k, orientation)) = self.open_shelf(current, item) {
                    self.place(current, item, k, orientation);
                    continue;
                }
            }

            let mut fresh = OpenSheet {
                sheet: Sheet {
                    index: first_sheet + sheets.len(),
                    group: group.clone(),
                    width: self.settings.sheet.width,
                    height: self.settings.sheet.height,
                    placements: Vec::new(),
                    used_area: 0.0,
                },
                shelves: Vec::new(),
                used_height: 0.0,
            };
            // callers only pass items that fit an empty sheet
            if let Some((k, orientation)) = self.open_shelf(&mut fresh, item) {
                self.place(&mut fresh, item, k, orientation);
            }
            sheets.push(fresh);
        }
        sheets.into_iter().map(|open| open.sheet).collect()
    }
}

/// Pack `outlines` onto sheets.
///
/// Outlines are grouped by `settings.group_by` in first-seen order; every
/// group gets its own sheets. Within a group rectangles are sorted by
/// decreasing height, then width, then source part, and shelf-packed: each
/// goes onto the first shelf (of any open sheet) with room, in the
/// orientation leaving the least shelf width; otherwise onto a new shelf on
/// the newest sheet, otherwise onto a new sheet.
///
/// An outline that fits no orientation of an empty sheet is reported in
/// [`NestingResult::unplaced`]; the rest of the run continues.
///
/// # Errors
///
/// [`NestError::InvalidSettings`] for a non-positive sheet or negative spacing.
pub fn nest_outlines(outlines: &[Outline], settings: &NestingSettings) -> Result<NestingResult> {
    settings.validate()?;
    let spacing = settings.spacing;
    let packer = Packer {
        outlines,
        settings,
        width: settings.sheet.width + spacing,
        height: settings.sheet.height + spacing,
    };

    let mut groups: Vec<(Option<String>, Vec<Item>)> = Vec::new();
    let mut unplaced = Vec::new();
    for (index, outline) in outlines.iter().enumerate() {
        let item = Item {
            index,
            width: outline.width() + spacing,
            height: outline.height() + spacing,
        };
        if best_orientation(&item, packer.width, packer.height).is_none() {
            let error = NestError::OversizedPart {
                label: outline.label.clone(),
                width: outline.width(),
                height: outline.height(),
                sheet_width: settings.sheet.width,
                sheet_height: settings.sheet.height,
            };
            warn!(label = %outline.label, "{error}");
            unplaced.push(UnplacedOutline {
                outline_index: index,
                label: outline.label.clone(),
                error,
            });
            continue;
        }

        let key = settings.group_key(outline);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, items)) => items.push(item),
            None => groups.push((key, vec![item])),
        }
    }

    let mut sheets = Vec::new();
    for (group, items) in groups {
        let packed = packer.pack_group(group, items, sheets.len());
        sheets.extend(packed);
    }

    let result = NestingResult { sheets, unplaced };
    info!(
        outlines = outlines.len(),
        sheets = result.sheets.len(),
        unplaced = result.unplaced.len(),
        efficiency = result.efficiency(),
        "Nested outlines"
    );
    Ok(result)
}
