//! The `aquamark export` command for batch watermarking.

use anyhow::Context;
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use aquamark_core::{
    Anchor, Color, Config, ExportFormat, ExportOptions, ExportSummary, Exporter, FileDiscovery,
    FontLibrary, PlacementSpec, ResizeSpec, TemplateRecord, WatermarkConfig, WatermarkScale,
};

/// Arguments for the `export` command.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Image files or directories to watermark
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory (must differ from every source directory)
    #[arg(short, long)]
    pub out: PathBuf,

    /// Start from a saved template, then apply any flags below on top
    #[arg(long)]
    pub template: Option<String>,

    /// Watermark text
    #[arg(short, long)]
    pub text: Option<String>,

    /// Font family name (matched against the fonts directory)
    #[arg(long)]
    pub font: Option<String>,

    /// Font size in points
    #[arg(long)]
    pub font_size: Option<f32>,

    /// Use the bold font variant
    #[arg(long)]
    pub bold: bool,

    /// Use the italic font variant
    #[arg(long)]
    pub italic: bool,

    /// Text color as "r,g,b" (e.g. "255,255,255")
    #[arg(long)]
    pub color: Option<String>,

    /// Text opacity 0-100
    #[arg(long)]
    pub opacity: Option<u8>,

    /// Draw a drop shadow behind the text
    #[arg(long)]
    pub shadow: bool,

    /// Draw a black outline around the text
    #[arg(long)]
    pub outline: bool,

    /// Image watermark file
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Image watermark width as a percentage of the canvas width
    #[arg(long)]
    pub image_percent: Option<u32>,

    /// Image watermark opacity 0-100
    #[arg(long)]
    pub image_opacity: Option<u8>,

    /// Anchor position (e.g. right_bottom, center, left_top)
    #[arg(long)]
    pub position: Option<String>,

    /// Custom placement as fractional "x,y" (e.g. "0.1,0.85"); overrides --position
    #[arg(long)]
    pub custom_pos: Option<String>,

    /// Resize output to a fixed width, preserving aspect ratio
    #[arg(long, conflicts_with_all = ["height", "percent"])]
    pub width: Option<u32>,

    /// Resize output to a fixed height, preserving aspect ratio
    #[arg(long, conflicts_with = "percent")]
    pub height: Option<u32>,

    /// Resize output to a percentage of the original size
    #[arg(long)]
    pub percent: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// JPEG quality 0-100
    #[arg(short, long)]
    pub quality: Option<u8>,

    /// Prefix for output file names (underscore-joined)
    #[arg(long)]
    pub prefix: Option<String>,

    /// Suffix for output file names
    #[arg(long)]
    pub suffix: Option<String>,

    /// Number of parallel workers
    #[arg(short, long)]
    pub parallel: Option<usize>,
}

/// Supported output formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Three-channel JPEG with explicit quality
    Jpeg,
    /// PNG with alpha preserved
    Png,
}

impl From<OutputFormat> for ExportFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Jpeg => ExportFormat::Jpeg,
            OutputFormat::Png => ExportFormat::Png,
        }
    }
}

/// Execute the export command.
pub async fn execute(args: ExportArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(parallel) = args.parallel {
        config.processing.parallel_workers = parallel;
    }

    let discovery = FileDiscovery::new(config.processing.clone());
    let files = discovery.discover_all(&args.inputs);
    if files.is_empty() {
        tracing::warn!("No supported image files found in {:?}", args.inputs);
        return Ok(());
    }
    tracing::info!("Found {} image(s) to watermark", files.len());

    let watermark = build_watermark(&args)?;
    if watermark.is_noop() {
        anyhow::bail!(
            "Nothing to apply: set --text, --image, or a --template with content.\n\n  \
             Hint: `aquamark export ./photos --out ./marked --text \"© 2026\"`"
        );
    }
    let options = build_options(&args, &config);

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("Cannot create output directory {:?}", args.out))?;

    let fonts_dir = config.fonts_dir();
    let fonts = if fonts_dir.is_dir() {
        Arc::new(FontLibrary::scan(&fonts_dir))
    } else {
        tracing::debug!("Fonts directory {:?} not found, using built-in font", fonts_dir);
        Arc::new(FontLibrary::empty())
    };

    let exporter = Arc::new(Exporter::new(&config, fonts));

    // Set up progress bar
    let total = files.len() as u64;
    let progress = create_progress_bar(total);
    let start_time = std::time::Instant::now();

    let progress_cb = progress.clone();
    let summary = exporter
        .export_batch(files, &watermark, &options, &args.out, move |path, err| {
            if let Some(err) = err {
                progress_cb.set_message(format!("failed: {}", path.display()));
                tracing::debug!("Export failed for {:?}: {}", path, err);
            }
            progress_cb.inc(1);
        })
        .await?;

    progress.finish_and_clear();

    let elapsed = start_time.elapsed();
    print_summary(&summary, elapsed);

    if summary.failed_count() > 0 {
        anyhow::bail!("{} image(s) failed to export", summary.failed_count());
    }
    Ok(())
}

/// Build the watermark configuration: template first, flags override.
fn build_watermark(args: &ExportArgs) -> anyhow::Result<WatermarkConfig> {
    let mut watermark = match &args.template {
        Some(name) => {
            let templates = aquamark_core::load_templates(&Config::templates_path())?;
            let record: &TemplateRecord = templates
                .get(name)
                .with_context(|| format!("Template '{}' not found", name))?;
            record.to_config()
        }
        None => WatermarkConfig::default(),
    };

    if let Some(text) = &args.text {
        watermark.text = text.clone();
    }
    if let Some(font) = &args.font {
        watermark.font_family = font.clone();
    }
    if let Some(size) = args.font_size {
        watermark.font_size = size;
    }
    if args.bold {
        watermark.bold = true;
    }
    if args.italic {
        watermark.italic = true;
    }
    if let Some(color) = &args.color {
        watermark.color = parse_color(color)?;
    }
    if let Some(opacity) = args.opacity {
        watermark.opacity = opacity.min(100);
    }
    if args.shadow {
        watermark.shadow = true;
    }
    if args.outline {
        watermark.outline = true;
    }
    if let Some(image) = &args.image {
        watermark.image_path = Some(image.clone());
    }
    if let Some(percent) = args.image_percent {
        watermark.image_scale = WatermarkScale::ScaleByPercent(percent);
    }
    if let Some(opacity) = args.image_opacity {
        watermark.image_opacity = opacity.min(100);
    }
    if let Some(position) = &args.position {
        watermark.placement = PlacementSpec::Anchor(Anchor::parse(position));
    }
    if let Some(custom) = &args.custom_pos {
        let (fx, fy) = parse_fraction_pair(custom)?;
        watermark.placement = PlacementSpec::Custom { fx, fy };
    }

    Ok(watermark)
}

/// Build export options from flags, falling back to configured defaults.
fn build_options(args: &ExportArgs, config: &Config) -> ExportOptions {
    let resize = if let Some(w) = args.width {
        ResizeSpec::FixedWidth(w)
    } else if let Some(h) = args.height {
        ResizeSpec::FixedHeight(h)
    } else if let Some(p) = args.percent {
        ResizeSpec::Percentage(p)
    } else {
        ResizeSpec::Original
    };

    ExportOptions {
        prefix: args.prefix.clone().unwrap_or_else(|| config.output.prefix.clone()),
        suffix: args.suffix.clone().unwrap_or_else(|| config.output.suffix.clone()),
        format: args
            .format
            .map(ExportFormat::from)
            .unwrap_or_else(|| ExportFormat::parse(&config.output.format)),
        quality: args.quality.unwrap_or(config.output.quality).min(100),
        resize,
    }
}

/// Parse "r,g,b" into a color.
fn parse_color(s: &str) -> anyhow::Result<Color> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        anyhow::bail!("Invalid color '{}': expected \"r,g,b\"", s);
    }
    let channel = |i: usize| -> anyhow::Result<u8> {
        parts[i]
            .parse()
            .with_context(|| format!("Invalid color channel '{}'", parts[i]))
    };
    Ok(Color::new(channel(0)?, channel(1)?, channel(2)?))
}

/// Parse "x,y" fractions in [0, 1].
fn parse_fraction_pair(s: &str) -> anyhow::Result<(f64, f64)> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        anyhow::bail!("Invalid position '{}': expected \"x,y\"", s);
    }
    let fx: f64 = parts[0]
        .parse()
        .with_context(|| format!("Invalid fraction '{}'", parts[0]))?;
    let fy: f64 = parts[1]
        .parse()
        .with_context(|| format!("Invalid fraction '{}'", parts[1]))?;
    if !(0.0..=1.0).contains(&fx) || !(0.0..=1.0).contains(&fy) {
        anyhow::bail!("Position fractions must be within [0, 1], got {},{}", fx, fy);
    }
    Ok((fx, fy))
}

/// Create a progress bar for batch exporting.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap()
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after batch exporting.
fn print_summary(summary: &ExportSummary, elapsed: std::time::Duration) {
    let total = summary.succeeded() + summary.failed_count();
    let rate = if elapsed.as_secs_f64() > 0.0 {
        summary.succeeded() as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Exported:     {:>8}", summary.succeeded());
    if summary.failed_count() > 0 {
        eprintln!("    Failed:       {:>8}", summary.failed_count());
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", total);
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");

    for (path, message) in &summary.failed {
        eprintln!("    {} - {}", path.display(), message);
    }
}
