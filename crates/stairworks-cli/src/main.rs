//! stairworks CLI - staircase scene containers and CNC cut plans
//!
//! Reads a parts list exported by the solid modeler and either packs it into
//! a per-part GLB scene for the viewer or plans the sheet cutting for it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use stairworks_ir::{Part, StyleTable};
use stairworks_nest::{
    export_layout_dxf, plan_cuts, CutSettings, GroupBy, NestingSettings, ScarfSettings,
    SheetSize, WireProfileExtractor,
};
use stairworks_scene::{
    build_scene, decode_base64, encode_base64, read_container, read_document, verify_container,
    CuboidExporter,
};

#[derive(Parser)]
#[command(name = "stairworks")]
#[command(about = "Staircase scene assembly and cut planning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a per-part GLB scene container
    Scene {
        /// Parts list (JSON)
        parts: PathBuf,
        /// Output .glb file
        #[arg(short, long)]
        output: PathBuf,
        /// Category style table (TOML); built-in styles if omitted
        #[arg(long)]
        styles: Option<PathBuf>,
        /// Also write the viewer manifest (JSON)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Write the container as base64 text
        #[arg(long)]
        base64: bool,
    },
    /// Split and nest sheet-cut parts onto stock sheets
    Nest {
        /// Parts list (JSON)
        parts: PathBuf,
        /// Output cut plan (JSON)
        #[arg(short, long)]
        output: PathBuf,
        /// Also write the sheet layout as DXF
        #[arg(long)]
        dxf: Option<PathBuf>,
        /// Category style table (TOML); built-in styles if omitted
        #[arg(long)]
        styles: Option<PathBuf>,
        /// Sheet width (mm)
        #[arg(long, default_value_t = 2440.0)]
        sheet_width: f64,
        /// Sheet height (mm)
        #[arg(long, default_value_t = 1220.0)]
        sheet_height: f64,
        /// Longest piece the stock allows (mm)
        #[arg(long, default_value_t = 2440.0)]
        max_length: f64,
        /// Scarf joint overlap (mm)
        #[arg(long, default_value_t = 100.0)]
        overlap: f64,
        /// Gap between nested parts (mm)
        #[arg(long, default_value_t = 8.0)]
        spacing: f64,
        /// Sheet grouping
        #[arg(long, value_enum, default_value_t = GroupArg::Stock)]
        group_by: GroupArg,
    },
    /// Display information about a GLB container
    Info {
        /// Path to the .glb file (raw or base64)
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GroupArg {
    None,
    Category,
    Stock,
}

impl From<GroupArg> for GroupBy {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::None => GroupBy::None,
            GroupArg::Category => GroupBy::Category,
            GroupArg::Stock => GroupBy::Stock,
        }
    }
}

#[derive(Deserialize)]
struct PartsFile {
    parts: Vec<Part>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scene {
            parts,
            output,
            styles,
            manifest,
            base64,
        } => {
            build_scene_file(&parts, &output, styles.as_deref(), manifest.as_deref(), base64)?;
        }
        Commands::Nest {
            parts,
            output,
            dxf,
            styles,
            sheet_width,
            sheet_height,
            max_length,
            overlap,
            spacing,
            group_by,
        } => {
            let settings = CutSettings {
                scarf: ScarfSettings::new(max_length, overlap),
                nesting: NestingSettings {
                    sheet: SheetSize {
                        width: sheet_width,
                        height: sheet_height,
                    },
                    spacing,
                    group_by: group_by.into(),
                },
            };
            nest_file(&parts, &output, dxf.as_deref(), styles.as_deref(), &settings)?;
        }
        Commands::Info { file } => {
            show_info(&file)?;
        }
    }

    Ok(())
}

fn load_parts(path: &Path) -> Result<Vec<Part>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading parts list {}", path.display()))?;
    let file: PartsFile = serde_json::from_str(&json)
        .with_context(|| format!("parsing parts list {}", path.display()))?;
    info!(path = %path.display(), parts = file.parts.len(), "Loaded parts");
    Ok(file.parts)
}

fn load_styles(path: Option<&Path>) -> Result<StyleTable> {
    match path {
        Some(path) => StyleTable::load(path)
            .with_context(|| format!("loading style table {}", path.display())),
        None => Ok(StyleTable::builtin()),
    }
}

fn build_scene_file(
    parts: &Path,
    output: &Path,
    styles: Option<&Path>,
    manifest: Option<&Path>,
    base64: bool,
) -> Result<()> {
    let parts = load_parts(parts)?;
    let styles = load_styles(styles)?;
    let scene = build_scene(parts, &CuboidExporter::default(), &styles)?;

    if base64 {
        fs::write(output, encode_base64(&scene.container))?;
    } else {
        fs::write(output, &scene.container)?;
    }
    println!(
        "Wrote {} parts ({} bytes) to {}",
        scene.manifest.len(),
        scene.container.len(),
        output.display()
    );

    if let Some(path) = manifest {
        let json = serde_json::to_string_pretty(&scene.viewer)?;
        fs::write(path, json)?;
        println!("Wrote viewer manifest to {}", path.display());
    }
    Ok(())
}

fn nest_file(
    parts: &Path,
    output: &Path,
    dxf: Option<&Path>,
    styles: Option<&Path>,
    settings: &CutSettings,
) -> Result<()> {
    let parts = load_parts(parts)?;
    let styles = load_styles(styles)?;
    let plan = plan_cuts(&parts, &styles, settings, &WireProfileExtractor)?;

    fs::write(output, serde_json::to_string_pretty(&plan)?)?;
    println!(
        "Nested {} outlines onto {} sheet(s), {:.1}% used",
        plan.nesting.placement_count(),
        plan.sheet_count(),
        plan.nesting.efficiency() * 100.0
    );
    if !plan.splits.is_empty() {
        println!("  Scarf-split parts: {}", plan.splits.len());
    }
    for issue in plan.flagged.iter().chain(&plan.profile_failures) {
        println!("  Check {}: {}", issue.label, issue.error);
    }
    for unplaced in &plan.nesting.unplaced {
        println!("  Not placed {}: {}", unplaced.label, unplaced.error);
    }

    if let Some(path) = dxf {
        export_layout_dxf(path, &plan.outlines, &plan.nesting)?;
        println!("Wrote DXF layout to {}", path.display());
    }
    Ok(())
}

fn show_info(file: &Path) -> Result<()> {
    let raw = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let bytes = if raw.starts_with(b"glTF") {
        raw
    } else {
        let text = String::from_utf8(raw).context("not a GLB container or base64 text")?;
        decode_base64(&text)?
    };

    let chunks = read_container(&bytes)?;
    let document = read_document(&bytes)?;
    let summary = verify_container(&bytes)?;

    println!("GLB container: {}", file.display());
    println!("  Length: {} bytes", chunks.total_length);
    println!("  JSON chunk: {} bytes", chunks.json.len());
    println!("  BIN chunk: {} bytes", chunks.bin.len());
    println!("  Nodes: {}", summary.nodes);
    println!("  Meshes: {}", summary.meshes);
    println!("  Materials: {}", summary.materials);
    println!("  Primitives: {}", summary.primitives);

    if !document.nodes.is_empty() {
        println!("\nParts:");
        for node in &document.nodes {
            let name = node.name.as_deref().unwrap_or("unnamed");
            let mesh = node
                .mesh
                .and_then(|m| document.meshes.get(m))
                .map_or(0, |m| m.primitives.len());
            println!("  {}: {} primitive(s)", name, mesh);
        }
    }

    Ok(())
}
