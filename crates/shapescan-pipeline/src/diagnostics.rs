//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! [`analyze_with_diagnostics`] runs the same stages as
//! [`analyze`](crate::analyze) and records a [`StageDiagnostics`] for
//! each one. Timestamps come from a caller-supplied [`Clock`] so the
//! library never touches a platform time source itself.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::contour::ContourTracer;
use crate::types::{AnalysisConfig, AnalysisResult, Boundary, Dimensions, PipelineError};
use crate::{annotate, blur, classify, edge, grayscale, summary};

/// Source of monotonic timestamps.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Image decoding.
    pub decode: StageDiagnostics,
    /// Grayscale conversion.
    pub grayscale: StageDiagnostics,
    /// Gaussian blur.
    pub blur: StageDiagnostics,
    /// Canny edge detection.
    pub edge_detection: StageDiagnostics,
    /// Edge map dilation.
    pub dilation: StageDiagnostics,
    /// External boundary tracing.
    pub contour_tracing: StageDiagnostics,
    /// Area filter, simplification and labelling.
    pub classification: StageDiagnostics,
    /// Drawing outlines and labels.
    pub annotation: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics (counts, sizes, etc.).
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
        /// Total pixel count (`width * height`).
        pixel_count: u64,
    },
    /// Grayscale conversion metrics.
    Grayscale {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
    /// Gaussian blur metrics.
    Blur {
        /// Sigma value used for the blur kernel.
        sigma: f32,
    },
    /// Canny edge detection metrics.
    EdgeDetection {
        /// Low threshold as configured.
        low_threshold: f32,
        /// High threshold as configured.
        high_threshold: f32,
        /// Number of edge pixels (value == 255) in the output.
        edge_pixel_count: u64,
        /// Total pixel count for computing edge density.
        total_pixel_count: u64,
    },
    /// Dilation metrics.
    Dilation {
        /// Number of 3x3 passes.
        iterations: u8,
        /// Number of edge pixels after dilation.
        edge_pixel_count: u64,
    },
    /// Contour tracing metrics.
    ContourTracing {
        /// Number of external boundaries found.
        contour_count: usize,
        /// Total number of points across all boundaries.
        total_point_count: usize,
        /// Minimum points in any single boundary.
        min_contour_points: usize,
        /// Maximum points in any single boundary.
        max_contour_points: usize,
        /// Mean points per boundary.
        mean_contour_points: f64,
    },
    /// Classification metrics.
    Classification {
        /// Boundaries kept as records.
        kept: usize,
        /// Boundaries dropped by the area filter.
        below_min_area: usize,
        /// Boundaries dropped as degenerate.
        degenerate: usize,
    },
    /// Annotation metrics.
    Annotation {
        /// Outlines drawn.
        outlines: usize,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Number of external boundaries traced.
    pub contour_count: usize,
    /// Number of records produced.
    pub record_count: usize,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        let stages: [(&str, &StageDiagnostics); 8] = [
            ("Decode", &self.decode),
            ("Grayscale", &self.grayscale),
            ("Blur", &self.blur),
            ("Edge Detection", &self.edge_detection),
            ("Dilation", &self.dilation),
            ("Contour Tracing", &self.contour_tracing),
            ("Classification", &self.classification),
            ("Annotation", &self.annotation),
        ];

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Contours: {}  |  Records: {}",
            self.summary.contour_count, self.summary.record_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
            ..
        } => {
            format!("{input_bytes} bytes -> {width}x{height}")
        }
        StageMetrics::Grayscale { width, height } => format!("{width}x{height}"),
        StageMetrics::Blur { sigma } => format!("sigma={sigma:.2}"),
        StageMetrics::EdgeDetection {
            low_threshold,
            high_threshold,
            edge_pixel_count,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_pixel_count > 0 {
                *edge_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!(
                "low={low_threshold:.1} high={high_threshold:.1} edges={edge_pixel_count} ({density:.1}%)",
            )
        }
        StageMetrics::Dilation {
            iterations,
            edge_pixel_count,
        } => format!("x{iterations} edges_after={edge_pixel_count}"),
        StageMetrics::ContourTracing {
            contour_count,
            total_point_count,
            min_contour_points,
            max_contour_points,
            mean_contour_points,
        } => {
            format!(
                "{contour_count} contours, {total_point_count} pts (min={min_contour_points} max={max_contour_points} mean={mean_contour_points:.1})",
            )
        }
        StageMetrics::Classification {
            kept,
            below_min_area,
            degenerate,
        } => format!("kept={kept} small={below_min_area} degenerate={degenerate}"),
        StageMetrics::Annotation { outlines } => format!("{outlines} outlines"),
    }
}

/// Statistics for a set of boundaries.
struct ContourStats {
    total: usize,
    min: usize,
    max: usize,
    mean: f64,
}

fn contour_stats(boundaries: &[Boundary]) -> ContourStats {
    let total: usize = boundaries.iter().map(Boundary::len).sum();
    let min = boundaries.iter().map(Boundary::len).min().unwrap_or(0);
    let max = boundaries.iter().map(Boundary::len).max().unwrap_or(0);
    #[allow(clippy::cast_precision_loss)]
    let mean = if boundaries.is_empty() {
        0.0
    } else {
        total as f64 / boundaries.len() as f64
    };
    ContourStats {
        total,
        min,
        max,
        mean,
    }
}

/// Time `f` with `clock`, returning its output and the elapsed duration.
fn timed<C: Clock, T>(clock: &C, f: impl FnOnce() -> T) -> (T, Duration) {
    let start = clock.now();
    let out = f();
    (out, clock.elapsed(&start))
}

/// Run the analysis and collect per-stage diagnostics.
///
/// Produces the same [`AnalysisResult`] as [`analyze`](crate::analyze).
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if the config fails
/// validation, [`PipelineError::EmptyInput`] if `bytes` is empty, and
/// [`PipelineError::ImageDecode`] or [`PipelineError::EmptyImage`] if
/// the bytes do not decode to a non-empty image.
pub fn analyze_with_diagnostics<C: Clock>(
    bytes: &[u8],
    config: &AnalysisConfig,
    clock: &C,
) -> Result<(AnalysisResult, PipelineDiagnostics), PipelineError> {
    config.validate()?;
    let total_start = clock.now();

    let (decoded, decode_duration) = timed(clock, || grayscale::decode(bytes));
    let image = decoded?;
    let (width, height) = image.dimensions();
    let pixel_count = u64::from(width) * u64::from(height);
    let decode = StageDiagnostics {
        duration: decode_duration,
        metrics: StageMetrics::Decode {
            input_bytes: bytes.len(),
            width,
            height,
            pixel_count,
        },
    };

    let (gray, duration) = timed(clock, || grayscale::to_grayscale(&image));
    let grayscale = StageDiagnostics {
        duration,
        metrics: StageMetrics::Grayscale { width, height },
    };

    let edges_config = &config.edges;
    let (blurred, duration) = timed(clock, || {
        blur::gaussian_blur(&gray, edges_config.blur_sigma)
    });
    let blur = StageDiagnostics {
        duration,
        metrics: StageMetrics::Blur {
            sigma: edges_config.blur_sigma,
        },
    };

    let (canny, duration) = timed(clock, || {
        edge::canny(&blurred, edges_config.canny_low, edges_config.canny_high)
    });
    let edge_detection = StageDiagnostics {
        duration,
        metrics: StageMetrics::EdgeDetection {
            low_threshold: edges_config.canny_low,
            high_threshold: edges_config.canny_high,
            edge_pixel_count: edge::count_edge_pixels(&canny),
            total_pixel_count: pixel_count,
        },
    };

    let (dilated, duration) = timed(clock, || {
        edge::dilate(&canny, edges_config.dilate_iterations)
    });
    let dilation = StageDiagnostics {
        duration,
        metrics: StageMetrics::Dilation {
            iterations: edges_config.dilate_iterations,
            edge_pixel_count: edge::count_edge_pixels(&dilated),
        },
    };

    let (boundaries, duration) = timed(clock, || edges_config.contour_tracer.trace(&dilated));
    let stats = contour_stats(&boundaries);
    let contour_tracing = StageDiagnostics {
        duration,
        metrics: StageMetrics::ContourTracing {
            contour_count: boundaries.len(),
            total_point_count: stats.total,
            min_contour_points: stats.min,
            max_contour_points: stats.max,
            mean_contour_points: stats.mean,
        },
    };

    let (classified, duration) = timed(clock, || {
        classify::classify_all(&boundaries, &config.classifier)
    });
    let classification = StageDiagnostics {
        duration,
        metrics: StageMetrics::Classification {
            kept: classified.detections.len(),
            below_min_area: classified.below_min_area,
            degenerate: classified.degenerate,
        },
    };

    let detections = classified.detections;
    let (annotated, duration) = timed(clock, || {
        annotate::annotate(&image, &detections, &config.annotate)
    });
    let annotation = StageDiagnostics {
        duration,
        metrics: StageMetrics::Annotation {
            outlines: detections.len(),
        },
    };

    let records: Vec<_> = detections.iter().map(|d| d.record.clone()).collect();
    let result = AnalysisResult {
        summary: summary::summarize(&records),
        detections,
        annotated,
        dimensions: Dimensions { width, height },
    };

    let diagnostics = PipelineDiagnostics {
        decode,
        grayscale,
        blur,
        edge_detection,
        dilation,
        contour_tracing,
        classification,
        annotation,
        total_duration: clock.elapsed(&total_start),
        summary: PipelineSummary {
            image_width: width,
            image_height: height,
            pixel_count,
            contour_count: boundaries.len(),
            record_count: result.detections.len(),
        },
    };
    debug!(
        "analysis finished in {:.3}ms",
        duration_ms(diagnostics.total_duration)
    );

    Ok((result, diagnostics))
}
