//! shapescan-pipeline: Pure shape detection pipeline (sans-IO).
//!
//! Finds the outlines of simple geometric shapes in a raster image,
//! labels each one, and measures it:
//! decode -> grayscale -> blur -> Canny -> dilate -> external contours ->
//! area filter -> simplification -> classification -> annotation ->
//! summary.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and images and returns structured data. Reading and
//! writing files lives in the `shapescan` CLI; serializers live in
//! `shapescan-export`.

pub mod annotate;
pub mod blur;
pub mod classify;
pub mod contour;
pub mod diagnostics;
pub mod edge;
pub mod geometry;
pub mod glyphs;
pub mod grayscale;
pub mod simplify;
pub mod summary;
pub mod types;

use log::info;

pub use annotate::{AnnotateStyle, annotate};
pub use classify::{ClassifierConfig, ClassifierPreset, ShapeMetrics, classify};
pub use contour::{ContourTracer, ContourTracerKind};
pub use diagnostics::{Clock, PipelineDiagnostics, analyze_with_diagnostics};
pub use summary::{ShapeTable, Summary, summarize};
pub use types::{
    AnalysisConfig, AnalysisReport, AnalysisResult, Boundary, Detection, Dimensions, EdgeConfig,
    PipelineError, Point, RgbaImage, ShapeLabel, ShapeRecord,
};

/// Run the full analysis on encoded image bytes.
///
/// Takes raw image bytes (PNG, JPEG, BMP, WebP) and a configuration,
/// then produces an [`AnalysisResult`] holding one [`Detection`] per
/// kept outline, the [`Summary`] statistics, and an annotated copy of
/// the decoded image.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if the config fails validation.
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image cannot be decoded.
/// Returns [`PipelineError::EmptyImage`] if the decoded image has no pixels.
///
/// An image without any shapes is not an error: the result simply has
/// no detections.
pub fn analyze(image_bytes: &[u8], config: &AnalysisConfig) -> Result<AnalysisResult, PipelineError> {
    config.validate()?;
    let image = grayscale::decode(image_bytes)?;
    Ok(analyze_image(&image, config))
}

/// Run the analysis on an already decoded image.
///
/// `config` is used as given; call [`AnalysisConfig::validate`] first
/// when it comes from user input.
///
/// # Pipeline steps
///
/// 1. Grayscale conversion
/// 2. Gaussian blur, Canny edge detection, dilation
/// 3. External contour tracing
/// 4. Area filter, simplification, classification
/// 5. Annotation and summary
#[must_use]
pub fn analyze_image(image: &RgbaImage, config: &AnalysisConfig) -> AnalysisResult {
    let gray = grayscale::to_grayscale(image);
    let edges = edge::extract_edges(&gray, &config.edges);
    let boundaries = config.edges.contour_tracer.trace(&edges);
    let classified = classify::classify_all(&boundaries, &config.classifier);

    let annotated = annotate::annotate(image, &classified.detections, &config.annotate);
    let records: Vec<ShapeRecord> = classified
        .detections
        .iter()
        .map(|d| d.record.clone())
        .collect();
    let summary = summarize(&records);

    info!(
        "{} boundaries traced, {} shapes kept ({} below min area, {} degenerate), max area {:.1}",
        boundaries.len(),
        summary.count,
        classified.below_min_area,
        classified.degenerate,
        summary.max_area
    );

    AnalysisResult {
        detections: classified.detections,
        summary,
        annotated,
        dimensions: Dimensions {
            width: image.width(),
            height: image.height(),
        },
    }
}
