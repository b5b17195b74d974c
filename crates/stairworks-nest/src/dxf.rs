//! DXF export of nested sheet layouts for the CNC router.
//!
//! Writes DXF R12 with three layers:
//! - `SHEET_BORDER` - one rectangle per sheet
//! - `NESTED_CUTS` - every placed outline and each of its cut-outs as a
//!   closed polyline
//! - `LABELS` - the part label near the lower-left corner of each placement
//!
//! Sheets are stacked upwards with a fixed gap so one file holds the whole run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use stairworks_ir::{Outline, Point2D};
use tracing::debug;

use crate::error::Result;
use crate::nesting::NestingResult;

/// Layer for sheet outlines.
pub const LAYER_BORDER: &str = "SHEET_BORDER";
/// Layer for cut paths.
pub const LAYER_CUTS: &str = "NESTED_CUTS";
/// Layer for part labels.
pub const LAYER_LABELS: &str = "LABELS";

/// Vertical gap between stacked sheets (mm).
pub const SHEET_GAP: f64 = 100.0;

const LABEL_HEIGHT: f64 = 20.0;
const LABEL_INSET: f64 = 5.0;

fn write_header(writer: &mut impl Write) -> std::io::Result<()> {
    writeln!(writer, "0")?;
    writeln!(writer, "SECTION")?;
    writeln!(writer, "2")?;
    writeln!(writer, "HEADER")?;
    writeln!(writer, "9")?;
    writeln!(writer, "$ACADVER")?;
    writeln!(writer, "1")?;
    writeln!(writer, "AC1009")?; // DXF R12
    writeln!(writer, "9")?;
    writeln!(writer, "$INSUNITS")?;
    writeln!(writer, "70")?;
    writeln!(writer, "4")?; // Millimeters
    writeln!(writer, "0")?;
    writeln!(writer, "ENDSEC")?;
    Ok(())
}

fn write_layer_table(writer: &mut impl Write) -> std::io::Result<()> {
    writeln!(writer, "0")?;
    writeln!(writer, "SECTION")?;
    writeln!(writer, "2")?;
    writeln!(writer, "TABLES")?;
    writeln!(writer, "0")?;
    writeln!(writer, "TABLE")?;
    writeln!(writer, "2")?;
    writeln!(writer, "LAYER")?;
    writeln!(writer, "70")?;
    writeln!(writer, "3")?;
    // ACI colors: border grey, cuts white, labels red
    for (name, color) in [(LAYER_BORDER, 8), (LAYER_CUTS, 7), (LAYER_LABELS, 1)] {
        writeln!(writer, "0")?;
        writeln!(writer, "LAYER")?;
        writeln!(writer, "2")?;
        writeln!(writer, "{}", name)?;
        writeln!(writer, "70")?;
        writeln!(writer, "0")?;
        writeln!(writer, "62")?;
        writeln!(writer, "{}", color)?;
        writeln!(writer, "6")?;
        writeln!(writer, "CONTINUOUS")?;
    }
    writeln!(writer, "0")?;
    writeln!(writer, "ENDTAB")?;
    writeln!(writer, "0")?;
    writeln!(writer, "ENDSEC")?;
    Ok(())
}

fn write_polyline(writer: &mut impl Write, points: &[Point2D], layer: &str) -> std::io::Result<()> {
    // closed flag replaces the repeated closing vertex
    let ring = match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() > 1 && first.distance(last) <= 1e-9 => {
            &points[..points.len() - 1]
        }
        _ => points,
    };

    writeln!(writer, "0")?;
    writeln!(writer, "LWPOLYLINE")?;
    writeln!(writer, "8")?;
    writeln!(writer, "{}", layer)?;
    writeln!(writer, "90")?;
    writeln!(writer, "{}", ring.len())?;
    writeln!(writer, "70")?;
    writeln!(writer, "1")?; // Closed polyline
    for p in ring {
        writeln!(writer, "10")?;
        writeln!(writer, "{:.6}", p.x)?;
        writeln!(writer, "20")?;
        writeln!(writer, "{:.6}", p.y)?;
    }
    Ok(())
}

fn write_text(writer: &mut impl Write, at: Point2D, text: &str) -> std::io::Result<()> {
    writeln!(writer, "0")?;
    writeln!(writer, "TEXT")?;
    writeln!(writer, "8")?;
    writeln!(writer, "{}", LAYER_LABELS)?;
    writeln!(writer, "10")?;
    writeln!(writer, "{:.6}", at.x)?;
    writeln!(writer, "20")?;
    writeln!(writer, "{:.6}", at.y)?;
    writeln!(writer, "40")?;
    writeln!(writer, "{:.6}", LABEL_HEIGHT)?;
    writeln!(writer, "1")?;
    writeln!(writer, "{}", text)?;
    Ok(())
}

/// Y offset of sheet `position` in the stacked drawing.
pub fn sheet_offset(position: usize, sheet_height: f64) -> f64 {
    position as f64 * (sheet_height + SHEET_GAP)
}

/// Write the layout as DXF to `writer`.
///
/// `outlines` is the slice that was nested; placements index into it.
pub fn write_layout_dxf(
    writer: &mut impl Write,
    outlines: &[Outline],
    layout: &NestingResult,
) -> Result<()> {
    write_header(writer)?;
    write_layer_table(writer)?;

    writeln!(writer, "0")?;
    writeln!(writer, "SECTION")?;
    writeln!(writer, "2")?;
    writeln!(writer, "ENTITIES")?;

    for (position, sheet) in layout.sheets.iter().enumerate() {
        let offset = sheet_offset(position, sheet.height);
        let border = [
            Point2D::new(0.0, offset),
            Point2D::new(sheet.width, offset),
            Point2D::new(sheet.width, offset + sheet.height),
            Point2D::new(0.0, offset + sheet.height),
        ];
        write_polyline(writer, &border, LAYER_BORDER)?;

        for placement in &sheet.placements {
            let Some(outline) = outlines.get(placement.outline_index) else {
                continue;
            };
            let shift = |ring: Vec<Point2D>| -> Vec<Point2D> {
                ring.into_iter().map(|p| Point2D::new(p.x, p.y + offset)).collect()
            };
            write_polyline(writer, &shift(placement.placed_points(outline)), LAYER_CUTS)?;
            for hole in placement.placed_holes(outline) {
                write_polyline(writer, &shift(hole), LAYER_CUTS)?;
            }

            let anchor = Point2D::new(
                placement.x + LABEL_INSET,
                placement.y + LABEL_INSET + offset,
            );
            write_text(writer, anchor, &outline.label)?;
        }
    }

    writeln!(writer, "0")?;
    writeln!(writer, "ENDSEC")?;

    // End of file
    writeln!(writer, "0")?;
    writeln!(writer, "EOF")?;
    Ok(())
}

/// Write the layout as a DXF file.
pub fn export_layout_dxf(
    path: impl AsRef<Path>,
    outlines: &[Outline],
    layout: &NestingResult,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_layout_dxf(&mut writer, outlines, layout)?;
    writer.flush()?;
    debug!(path = %path.display(), sheets = layout.sheets.len(), "Wrote DXF layout");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nesting::{nest_outlines, NestingSettings};

    fn layout() -> (Vec<Outline>, NestingResult) {
        let outlines = vec![
            Outline::rectangle(2000.0, 1000.0, 0, "ribs", "ribs_1"),
            Outline::rectangle(2000.0, 1000.0, 1, "ribs", "ribs_2"),
        ];
        let result = nest_outlines(&outlines, &NestingSettings::default()).unwrap();
        (outlines, result)
    }

    fn render() -> String {
        let (outlines, result) = layout();
        let mut buf = Vec::new();
        write_layout_dxf(&mut buf, &outlines, &result).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_layers_and_entities() {
        let dxf = render();
        assert!(dxf.starts_with("0\nSECTION\n2\nHEADER\n"));
        assert!(dxf.ends_with("0\nEOF\n"));
        assert_eq!(dxf.matches("LWPOLYLINE").count(), 4);
        assert_eq!(dxf.matches("\nTEXT\n").count(), 2);
        assert!(dxf.contains("8\nNESTED_CUTS\n"));
        assert!(dxf.contains("8\nSHEET_BORDER\n"));
        assert!(dxf.contains("1\nribs_2\n"));
    }

    #[test]
    fn test_second_sheet_is_stacked() {
        let (_, result) = layout();
        assert_eq!(result.sheets.len(), 2);
        let dxf = render();
        // second sheet border starts at 1220 + 100
        assert!(dxf.contains("20\n1320.000000\n"));
        assert!(dxf.contains("20\n2540.000000\n"));
    }

    #[test]
    fn test_closed_ring_is_not_repeated() {
        let mut buf = Vec::new();
        let outline = Outline::rectangle(10.0, 5.0, 0, "ribs", "ribs_1");
        write_polyline(&mut buf, &outline.points, LAYER_CUTS).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("90\n4\n"));
    }

    #[test]
    fn test_holes_are_cut_on_their_sheet() {
        let outlines = vec![
            Outline::rectangle(2000.0, 1000.0, 0, "ribs", "ribs_1"),
            Outline::rectangle(2000.0, 1000.0, 1, "ribs", "ribs_2").with_hole(vec![
                Point2D::new(500.0, 400.0),
                Point2D::new(700.0, 400.0),
                Point2D::new(700.0, 450.0),
                Point2D::new(500.0, 450.0),
            ]),
        ];
        let result = nest_outlines(&outlines, &NestingSettings::default()).unwrap();
        let mut buf = Vec::new();
        write_layout_dxf(&mut buf, &outlines, &result).unwrap();
        let dxf = String::from_utf8(buf).unwrap();

        assert_eq!(dxf.matches("LWPOLYLINE").count(), 5);
        assert_eq!(dxf.matches("8\nNESTED_CUTS\n").count(), 3);
        // ribs_2 sits on the second sheet, shifted up by 1220 + 100
        assert!(dxf.contains("10\n500.000000\n20\n1720.000000\n"));
        assert!(dxf.contains("10\n700.000000\n20\n1770.000000\n"));
    }

    #[test]
    fn test_export_to_file() {
        let (outlines, result) = layout();
        let path = std::env::temp_dir().join(format!("stairworks-layout-{}.dxf", std::process::id()));
        export_layout_dxf(&path, &outlines, &result).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(written, render());
    }
}
