//! Over-length stringer plus a small tread on one 2440 x 1220 sheet.

use approx::assert_relative_eq;
use stairworks_ir::{Outline, Part, Rect, StyleTable};
use stairworks_nest::{
    nest_outlines, plan_cuts, split_outline, write_layout_dxf, CutSettings, GroupBy,
    NestingSettings, ScarfSettings, SplitOutcome, WireProfileExtractor,
};

fn shared_sheets() -> NestingSettings {
    NestingSettings {
        group_by: GroupBy::None,
        ..Default::default()
    }
}

#[test]
fn long_outline_is_split_short_one_is_not() {
    let settings = ScarfSettings::new(2440.0, 100.0);
    let long = Outline::rectangle(3000.0, 300.0, 0, "stringers", "stringers_1");
    let short = Outline::rectangle(300.0, 300.0, 1, "treads", "treads_1");

    let long = split_outline(long, &settings).unwrap();
    let short = split_outline(short, &settings).unwrap();
    assert!(matches!(long, SplitOutcome::Split(_)));
    assert!(matches!(short, SplitOutcome::Whole(_)));

    let mut outlines = long.into_outlines();
    assert_eq!(outlines.len(), 2);
    outlines.extend(short.into_outlines());

    let result = nest_outlines(&outlines, &shared_sheets()).unwrap();
    assert!(result.unplaced.is_empty());
    assert_eq!(result.sheets.len(), 1);
    assert_eq!(result.placement_count(), 3);

    let sheet = &result.sheets[0];
    let bounds = Rect::from_origin_size(0.0, 0.0, sheet.width, sheet.height);
    for placement in &sheet.placements {
        assert!(bounds.contains(&placement.rect(), 1e-9));
    }
}

#[test]
fn unsplit_long_outline_does_not_fit() {
    let long = Outline::rectangle(3000.0, 300.0, 0, "stringers", "stringers_1");
    let result = nest_outlines(&[long], &shared_sheets()).unwrap();
    assert!(result.sheets.is_empty());
    assert_eq!(result.unplaced.len(), 1);
}

#[test]
fn planned_from_parts() {
    let parts = vec![
        Part::cuboid("stringers", [0.0; 3], [3000.0, 50.0, 300.0]),
        Part::cuboid("treads", [0.0; 3], [300.0, 300.0, 20.0]),
    ];
    let settings = CutSettings {
        nesting: shared_sheets(),
        ..Default::default()
    };
    let plan = plan_cuts(&parts, &StyleTable::builtin(), &settings, &WireProfileExtractor).unwrap();

    assert_eq!(plan.splits.len(), 1);
    assert_eq!(plan.splits[0].source_label, "stringers_1");
    assert_relative_eq!(plan.splits[0].assembled_length(), 3000.0, epsilon = 1e-6);
    assert!(plan.flagged.is_empty());
    assert!(plan.profile_failures.is_empty());

    let labels: Vec<&str> = plan.outlines.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, ["stringers_1_A", "stringers_1_B", "treads_1"]);
    assert_eq!(plan.outlines[0].stock.as_deref(), Some("50mm_structural"));
    assert_eq!(plan.sheet_count(), 1);
    assert!(plan.nesting.unplaced.is_empty());

    let mut dxf = Vec::new();
    write_layout_dxf(&mut dxf, &plan.outlines, &plan.nesting).unwrap();
    let dxf = String::from_utf8(dxf).unwrap();
    assert!(dxf.contains("stringers_1_B"));
    assert_eq!(dxf.matches("LWPOLYLINE").count(), 4);
}

#[test]
fn grouped_by_stock_uses_a_sheet_per_material() {
    let parts = vec![
        Part::cuboid("stringers", [0.0; 3], [3000.0, 50.0, 300.0]),
        Part::cuboid("treads", [0.0; 3], [300.0, 300.0, 20.0]),
    ];
    let plan = plan_cuts(
        &parts,
        &StyleTable::builtin(),
        &CutSettings::default(),
        &WireProfileExtractor,
    )
    .unwrap();

    assert_eq!(plan.sheet_count(), 2);
    let groups: Vec<Option<&str>> = plan
        .nesting
        .sheets
        .iter()
        .map(|s| s.group.as_deref())
        .collect();
    assert_eq!(groups, [Some("50mm_structural"), Some("20mm_timber")]);
}
