//! omrgrid CLI: generate bubble sheets and read marked scans.

use clap::{Args, Parser, Subcommand};
use omrgrid::{
    draw_highlights, load_image, render_bubble_sheet, BatchSummary, BubbleRegistry, ScanConfig, Scanner,
    SheetJob, SheetLayout, SheetLayoutSpec, SheetMetadata,
};
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "omrgrid")]
#[command(about = "Generate fixed-layout answer bubble sheets and read marked scans")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay out a sheet and write its bubble registry.
    Layout(CliLayoutArgs),

    /// Read the answers of one aligned scan.
    Scan(CliScanArgs),

    /// Scan every sheet listed in a manifest.
    Batch(CliBatchArgs),

    /// Print a summary of a bubble registry.
    RegistryInfo {
        /// Path to the registry JSON.
        #[arg(long)]
        registry: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct CliLayoutArgs {
    /// Number of questions on the sheet.
    #[arg(long)]
    questions: Option<usize>,

    /// Sheet layout JSON; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Options per question (1..=8).
    #[arg(long)]
    options: Option<usize>,

    /// Number of question columns.
    #[arg(long)]
    columns: Option<usize>,

    /// Question rows per column.
    #[arg(long)]
    rows_per_column: Option<usize>,

    /// Bubble radius in pixels.
    #[arg(long)]
    bubble_radius: Option<i32>,

    /// Path to write the bubble registry (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Path to write a printable rendering of the blank sheet (PNG).
    #[arg(long)]
    render: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Args)]
struct CliScanConfigArgs {
    /// Scan configuration JSON; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Expected options per question.
    #[arg(long)]
    options: Option<usize>,

    /// Pixels with intensity below this value count as ink.
    #[arg(long)]
    dark_threshold: Option<u8>,

    /// Minimum winning fill ratio for a marked answer.
    #[arg(long)]
    mark_threshold: Option<f32>,

    /// Per-sheet wall-clock budget in milliseconds.
    #[arg(long)]
    time_budget_ms: Option<u64>,
}

#[derive(Debug, Clone, Args)]
struct CliScanArgs {
    /// Path to the aligned scan image.
    #[arg(long)]
    image: PathBuf,

    /// Path to the bubble registry written at layout time.
    #[arg(long)]
    registry: PathBuf,

    /// Path to write the scan output (JSON).
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    scan: CliScanConfigArgs,

    /// Sheet metadata entry `key=value`; repeatable. Values that parse as
    /// JSON keep their type, anything else is stored as a string.
    #[arg(long = "meta", value_name = "KEY=VALUE")]
    meta: Vec<String>,

    /// Path to write the scan with answered bubbles highlighted (PNG).
    #[arg(long)]
    annotated: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliBatchArgs {
    /// Batch manifest JSON.
    #[arg(long)]
    manifest: PathBuf,

    /// Path to write the batch summary (JSON).
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    scan: CliScanConfigArgs,
}

/// Batch manifest document.
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchManifest {
    /// Registry shared by every sheet without its own.
    #[serde(default)]
    registry: Option<PathBuf>,
    sheets: Vec<ManifestSheet>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestSheet {
    name: String,
    image: PathBuf,
    #[serde(default)]
    registry: Option<PathBuf>,
    #[serde(default)]
    metadata: SheetMetadata,
}

impl CliScanConfigArgs {
    fn build(&self) -> CliResult<ScanConfig> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::from_json_file(path)?,
            None => ScanConfig::default(),
        };
        if let Some(k) = self.options {
            config.options_per_question = k;
        }
        if let Some(t) = self.dark_threshold {
            config.fill.dark_threshold = t;
        }
        if let Some(t) = self.mark_threshold {
            config.mark_threshold = t;
        }
        if self.time_budget_ms.is_some() {
            config.time_budget_ms = self.time_budget_ms;
        }
        config.validate()?;
        Ok(config)
    }
}

impl CliLayoutArgs {
    fn build(&self) -> CliResult<SheetLayoutSpec> {
        let mut spec = match &self.config {
            Some(path) => SheetLayoutSpec::from_json_file(path)?,
            None => SheetLayoutSpec::default(),
        };
        if let Some(n) = self.questions {
            spec.question_count = n;
        }
        if let Some(k) = self.options {
            spec.options_per_question = k;
        }
        if let Some(c) = self.columns {
            spec.columns = c;
        }
        if let Some(r) = self.rows_per_column {
            spec.rows_per_column = r;
        }
        if let Some(r) = self.bubble_radius {
            spec.bubble_radius = r;
        }
        spec.validate()?;
        Ok(spec)
    }
}

fn parse_meta(entries: &[String]) -> CliResult<SheetMetadata> {
    let mut metadata = SheetMetadata::new();
    for entry in entries {
        let (key, raw) = entry.split_once('=').ok_or_else(|| -> CliError {
            format!("invalid --meta '{}': expected KEY=VALUE", entry).into()
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("invalid --meta '{}': empty key", entry).into());
        }
        let value = serde_json::from_str::<serde_json::Value>(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
        metadata.insert(key, value);
    }
    Ok(metadata)
}

/// Resolve `path` against the manifest directory unless it is absolute.
fn manifest_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_manifest(path: &Path) -> CliResult<Vec<SheetJob>> {
    let data = std::fs::read_to_string(path).map_err(|e| -> CliError {
        format!("Failed to read manifest {}: {}", path.display(), e).into()
    })?;
    let manifest: BatchManifest = serde_json::from_str(&data)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    manifest
        .sheets
        .into_iter()
        .map(|sheet| {
            let registry = sheet
                .registry
                .as_ref()
                .or(manifest.registry.as_ref())
                .ok_or_else(|| -> CliError {
                    format!(
                        "sheet '{}' has no registry and the manifest sets none",
                        sheet.name
                    )
                    .into()
                })?;
            Ok(SheetJob {
                registry: manifest_relative(base, registry),
                image: manifest_relative(base, &sheet.image),
                name: sheet.name,
                metadata: sheet.metadata,
            })
        })
        .collect()
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Layout(args) => run_layout(&args),
        Commands::Scan(args) => run_scan(&args),
        Commands::Batch(args) => run_batch(&args),
        Commands::RegistryInfo { registry } => run_registry_info(&registry),
    }
}

// ── layout ─────────────────────────────────────────────────────────────

fn run_layout(args: &CliLayoutArgs) -> CliResult<()> {
    let spec = args.build()?;
    let layout = SheetLayout::generate(&spec)?;

    for warning in &layout.warnings {
        tracing::warn!("[{}] {}", warning.code(), warning);
    }

    layout.registry().write_json_file(&args.out)?;
    tracing::info!(
        "Registry with {} bubbles ({} questions) written to {}",
        layout.bubbles.len(),
        layout.questions_placed,
        args.out.display()
    );

    if let Some(render_path) = &args.render {
        render_bubble_sheet(&layout).save(render_path)?;
        tracing::info!("Sheet rendering written to {}", render_path.display());
    }

    Ok(())
}

// ── scan ───────────────────────────────────────────────────────────────

fn run_scan(args: &CliScanArgs) -> CliResult<()> {
    let mut config = args.scan.build()?;
    config.collect_highlights = args.annotated.is_some();
    let scanner = Scanner::new(config)?;

    let registry = BubbleRegistry::from_json_file(&args.registry)?;
    tracing::info!(
        "Registry: {} bubbles in {} questions",
        registry.bubble_count(),
        registry.question_count()
    );

    let metadata = parse_meta(&args.meta)?;
    tracing::info!("Scanning {}", args.image.display());
    let image = load_image(&args.image)?;
    let scan = scanner.scan(&image.to_luma8(), &registry, metadata)?;

    for warning in &scan.warnings {
        tracing::warn!("[{}] {}", warning.code(), warning);
    }
    let answered = scan
        .output
        .answers
        .iter()
        .filter(|a| a.bubble_id.is_some())
        .count();
    tracing::info!(
        "{} of {} questions answered",
        answered,
        scan.output.answers.len()
    );

    let json = serde_json::to_string_pretty(&scan.output)?;
    std::fs::write(&args.out, &json)?;
    tracing::info!("Results written to {}", args.out.display());

    if let Some(annotated_path) = &args.annotated {
        let mut canvas = image.to_rgb8();
        draw_highlights(&mut canvas, &scan.highlights);
        canvas.save(annotated_path)?;
        tracing::info!("Annotated scan written to {}", annotated_path.display());
    }

    Ok(())
}

// ── batch ──────────────────────────────────────────────────────────────

fn run_batch(args: &CliBatchArgs) -> CliResult<()> {
    let scanner = Scanner::new(args.scan.build()?)?;
    let jobs = load_manifest(&args.manifest)?;

    let summary = BatchSummary::new(scanner.scan_batch(&jobs));
    tracing::info!(
        "Batch: {} passed, {} passed with warnings, {} failed",
        summary.passed,
        summary.passed_with_warnings,
        summary.failed
    );

    let json = serde_json::to_string_pretty(&summary)?;
    std::fs::write(&args.out, &json)?;
    tracing::info!("Batch summary written to {}", args.out.display());

    if summary.failed > 0 {
        return Err(format!("{} of {} sheets failed", summary.failed, jobs.len()).into());
    }
    Ok(())
}

// ── registry-info ──────────────────────────────────────────────────────

fn run_registry_info(path: &Path) -> CliResult<()> {
    let registry = BubbleRegistry::from_json_file(path)?;

    println!("bubble registry {}", path.display());
    println!("  bubbles:    {}", registry.bubble_count());
    println!("  questions:  {}", registry.question_count());

    let mut sizes = std::collections::BTreeMap::<usize, usize>::new();
    for group in registry.groups() {
        *sizes.entry(group.len()).or_default() += 1;
    }
    for (options, count) in &sizes {
        println!("  {} question(s) with {} option(s)", count, options);
    }

    if let (Some(first), Some(last)) = (
        registry.question_nums().next(),
        registry.question_nums().last(),
    ) {
        println!("  question range: {}..={}", first, last);
    }

    Ok(())
}
