//! shapescan: detect, classify and measure basic shapes in an image file.
//!
//! Reads an image, runs the shape detection pipeline, prints the
//! measurement table and headline metrics, and optionally writes the
//! annotated image, a CSV table, an SVG overlay, or a JSON report.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin shapescan -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use shapescan_pipeline::{
    AnalysisConfig, AnalysisResult, AnnotateStyle, ClassifierConfig, ClassifierPreset, Clock,
    EdgeConfig, ShapeTable,
};

/// Detect, classify and measure basic shapes in a raster image.
///
/// Finds the outlines of triangles, squares, rectangles, pentagons,
/// hexagons and circles, prints one row per shape with its area and
/// perimeter in pixels, and summarizes the result.
#[derive(Parser)]
#[command(name = "shapescan", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Write the annotated image to this path (format from extension).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the measurement table as CSV to this path.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write an SVG overlay of the detected outlines to this path.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Print the report as JSON instead of the text table.
    #[arg(long)]
    json: bool,

    /// Classification rule set.
    #[arg(long, value_enum, default_value_t = Preset::Strict)]
    preset: Preset,

    /// Ignore outlines enclosing fewer square pixels than this.
    #[arg(long, default_value_t = ClassifierConfig::DEFAULT_MIN_AREA)]
    min_area: f64,

    /// Largest rotated-rectangle aspect ratio still called a square (strict preset).
    #[arg(long, default_value_t = ClassifierConfig::DEFAULT_MAX_SQUARE_ASPECT)]
    aspect_threshold: f64,

    /// Allowed deviation of width/height from 1 for a square (simple preset).
    #[arg(long, default_value_t = ClassifierConfig::DEFAULT_SQUARE_RATIO_TOLERANCE)]
    square_tolerance: f64,

    /// Smallest circularity called a circle (strict preset).
    #[arg(long, default_value_t = ClassifierConfig::DEFAULT_CIRCULARITY_THRESHOLD)]
    circularity_threshold: f64,

    /// Simplification tolerance as a fraction of the outline perimeter.
    #[arg(long, default_value_t = ClassifierConfig::DEFAULT_EPSILON_FACTOR)]
    epsilon_factor: f64,

    /// Extra Gaussian blur sigma before Canny; 0 disables it.
    #[arg(long, default_value_t = EdgeConfig::DEFAULT_BLUR_SIGMA)]
    blur_sigma: f32,

    /// Canny low threshold.
    #[arg(long, default_value_t = EdgeConfig::DEFAULT_CANNY_LOW)]
    canny_low: f32,

    /// Canny high threshold.
    #[arg(long, default_value_t = EdgeConfig::DEFAULT_CANNY_HIGH)]
    canny_high: f32,

    /// Full analysis config as a JSON string.
    ///
    /// When provided, all other analysis parameter flags are ignored.
    /// Missing fields take their default values.
    #[arg(long)]
    config_json: Option<String>,

    /// Print per-stage timing and count diagnostics to stderr.
    #[arg(long)]
    diagnostics: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Classification rule set selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// Rotated-rectangle square test, pentagons, hexagons, circularity test.
    Strict,
    /// Axis-aligned square test; every polygon above four vertices is a circle.
    Simple,
}

impl From<Preset> for ClassifierPreset {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Strict => Self::Strict,
            Preset::Simple => Self::Simple,
        }
    }
}

/// Build an [`AnalysisConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.  Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<AnalysisConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(AnalysisConfig {
        edges: EdgeConfig {
            blur_sigma: cli.blur_sigma,
            canny_low: cli.canny_low,
            canny_high: cli.canny_high,
            ..EdgeConfig::default()
        },
        classifier: ClassifierConfig {
            preset: cli.preset.into(),
            min_area: cli.min_area,
            epsilon_factor: cli.epsilon_factor,
            max_square_aspect: cli.aspect_threshold,
            square_ratio_tolerance: cli.square_tolerance,
            circularity_threshold: cli.circularity_threshold,
        },
        annotate: AnnotateStyle::default(),
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        log::LevelFilter::Error
    } else if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();
    if cli.quiet && cli.verbose {
        warn!("Both --quiet and --verbose specified, using --quiet");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            error!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = config_from_cli(cli)?;

    let image_bytes = std::fs::read(&cli.image_path)
        .map_err(|e| format!("Error reading {}: {e}", cli.image_path.display()))?;
    info!(
        "Image: {} ({} bytes)",
        cli.image_path.display(),
        image_bytes.len()
    );

    let result = if cli.diagnostics {
        let (result, diagnostics) =
            shapescan_pipeline::analyze_with_diagnostics(&image_bytes, &config, &StdClock)
                .map_err(|e| format!("Analysis failed: {e}"))?;
        eprintln!("{}", diagnostics.report());
        result
    } else {
        shapescan_pipeline::analyze(&image_bytes, &config)
            .map_err(|e| format!("Analysis failed: {e}"))?
    };

    if cli.json {
        let json = shapescan_export::to_json(&result.report()).map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        print_table(&result);
    }

    if let Some(ref path) = cli.output {
        result
            .annotated
            .save(path)
            .map_err(|e| format!("Error writing annotated image to {}: {e}", path.display()))?;
        info!("Annotated image written to {}", path.display());
    }

    if let Some(ref path) = cli.csv {
        write_file(path, &shapescan_export::to_csv(&result.records()))?;
    }

    if let Some(ref path) = cli.svg {
        let title = cli
            .image_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("shapescan");
        let desc = serde_json::to_string(&config).unwrap_or_default();
        let metadata = shapescan_export::SvgMetadata {
            title: Some(title),
            description: Some(&desc),
        };
        let svg = shapescan_export::to_svg(&result.detections, result.dimensions, &metadata);
        write_file(path, &svg)?;
    }

    Ok(())
}

/// Print the measurement table followed by the three headline metrics.
fn print_table(result: &AnalysisResult) {
    let records = result.records();
    println!("{}", ShapeTable::new(&records));
    println!();
    println!("{}", result.summary);
}

fn write_file(path: &Path, contents: &str) -> Result<(), String> {
    std::fs::write(path, contents)
        .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
    info!("Wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
