//! End-to-end runs of the analysis on synthetic scenes drawn in memory.
//!
//! Dark shapes on a white canvas. Edge extraction and dilation
//! put the traced outline a pixel or two outside the drawn fill, so
//! areas are compared with a relative tolerance.

#![allow(clippy::unwrap_used)]

use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_hollow_rect_mut,
    draw_polygon_mut,
};
use imageproc::point::Point as PixelPoint;
use imageproc::rect::Rect;
use shapescan_pipeline::{
    AnalysisConfig, ClassifierConfig, ClassifierPreset, ShapeLabel, analyze, analyze_image,
};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const INK: Rgba<u8> = Rgba([30, 30, 30, 255]);

fn canvas() -> RgbaImage {
    RgbaImage::from_pixel(400, 400, WHITE)
}

fn encode_png(img: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn within(actual: f64, expected: f64, relative: f64) -> bool {
    (actual - expected).abs() <= expected * relative
}

fn labels(img: &RgbaImage, config: &AnalysisConfig) -> Vec<ShapeLabel> {
    analyze_image(img, config)
        .detections
        .iter()
        .map(|d| d.record.label)
        .collect()
}

/// Square of side 150 in the upper right, circle of radius 80 in the
/// lower left; the two never touch.
fn square_and_circle() -> RgbaImage {
    let mut img = canvas();
    draw_filled_rect_mut(&mut img, Rect::at(215, 35).of_size(150, 150), INK);
    draw_filled_circle_mut(&mut img, (110, 290), 80, INK);
    img
}

fn regular_polygon(n: u32, cx: f64, cy: f64, r: f64) -> Vec<PixelPoint<i32>> {
    (0..n)
        .map(|i| {
            let theta = 2.0 * std::f64::consts::PI * f64::from(i) / f64::from(n);
            #[allow(clippy::cast_possible_truncation)]
            PixelPoint::new(
                (cx + r * theta.cos()).round() as i32,
                (cy + r * theta.sin()).round() as i32,
            )
        })
        .collect()
}

#[test]
fn square_and_circle_end_to_end() {
    let result = analyze(&encode_png(&square_and_circle()), &AnalysisConfig::default()).unwrap();

    assert_eq!(result.detections.len(), 2);
    let square = &result.detections[0].record;
    let circle = &result.detections[1].record;

    assert_eq!(square.label, ShapeLabel::Square);
    assert!(within(square.area, 22_500.0, 0.12), "square area {}", square.area);
    assert!(within(square.perimeter, 600.0, 0.12), "square perimeter {}", square.perimeter);

    assert_eq!(circle.label, ShapeLabel::Circle);
    assert!(within(circle.area, 20_106.0, 0.12), "circle area {}", circle.area);
    assert!(circle.vertices > 6);

    assert_eq!(result.summary.count, 2);
    assert_eq!(result.summary.distinct_labels, 2);
    assert!((result.summary.max_area - square.area).abs() < f64::EPSILON);
}

#[test]
fn thin_outlines_end_to_end() {
    let mut img = canvas();
    draw_hollow_rect_mut(&mut img, Rect::at(215, 35).of_size(150, 150), INK);
    draw_hollow_circle_mut(&mut img, (110, 290), 80, INK);

    let result = analyze(&encode_png(&img), &AnalysisConfig::default()).unwrap();
    let labels: Vec<_> = result.detections.iter().map(|d| d.record.label).collect();
    assert_eq!(labels, [ShapeLabel::Square, ShapeLabel::Circle]);
    assert!(within(result.detections[0].record.area, 22_500.0, 0.12));
    assert!(within(result.detections[1].record.area, 20_106.0, 0.12));
    assert_eq!(result.summary.count, 2);
    assert_eq!(result.summary.distinct_labels, 2);
}

#[test]
fn outlined_shapes_are_measured_by_their_outer_rim() {
    // Three pixel wide outlines; only the outer border of each is traced.
    let mut img = canvas();
    for (inset, side) in [(0, 150), (1, 148), (2, 146)] {
        draw_hollow_rect_mut(&mut img, Rect::at(215 + inset, 35 + inset).of_size(side, side), INK);
        draw_hollow_circle_mut(&mut img, (110, 290), 80 - inset, INK);
    }

    let result = analyze_image(&img, &AnalysisConfig::default());
    let labels: Vec<_> = result.detections.iter().map(|d| d.record.label).collect();
    assert_eq!(labels, [ShapeLabel::Square, ShapeLabel::Circle]);
    assert!(within(result.detections[0].record.area, 22_500.0, 0.12));
    assert!(within(result.detections[1].record.area, 20_106.0, 0.12));
}

#[test]
fn triangle_is_detected() {
    let mut img = canvas();
    draw_polygon_mut(
        &mut img,
        &[
            PixelPoint::new(200, 60),
            PixelPoint::new(340, 320),
            PixelPoint::new(60, 320),
        ],
        INK,
    );
    assert_eq!(labels(&img, &AnalysisConfig::default()), [ShapeLabel::Triangle]);
}

#[test]
fn mid_sized_shapes_keep_their_corners() {
    // Equilateral triangle of side 140 and a square of side 90. Much
    // smaller outlines round their corners by a sizeable fraction of
    // the simplification tolerance and gain vertices.
    let mut img = canvas();
    draw_polygon_mut(
        &mut img,
        &[
            PixelPoint::new(110, 60),
            PixelPoint::new(180, 181),
            PixelPoint::new(40, 181),
        ],
        INK,
    );
    draw_filled_rect_mut(&mut img, Rect::at(250, 250).of_size(90, 90), INK);
    assert_eq!(
        labels(&img, &AnalysisConfig::default()),
        [ShapeLabel::Triangle, ShapeLabel::Square]
    );
}

#[test]
fn wide_rectangle_is_detected() {
    let mut img = canvas();
    draw_filled_rect_mut(&mut img, Rect::at(60, 150).of_size(260, 100), INK);
    assert_eq!(labels(&img, &AnalysisConfig::default()), [ShapeLabel::Rectangle]);
}

#[test]
fn hexagon_depends_on_preset() {
    let mut img = canvas();
    draw_polygon_mut(&mut img, &regular_polygon(6, 200.0, 200.0, 110.0), INK);

    assert_eq!(labels(&img, &AnalysisConfig::default()), [ShapeLabel::Hexagon]);

    let simple = AnalysisConfig {
        classifier: ClassifierConfig::preset(ClassifierPreset::Simple),
        ..AnalysisConfig::default()
    };
    assert_eq!(labels(&img, &simple), [ShapeLabel::Circle]);
}

#[test]
fn small_blobs_are_ignored() {
    let mut img = canvas();
    draw_filled_rect_mut(&mut img, Rect::at(20, 20).of_size(8, 8), INK);
    draw_filled_circle_mut(&mut img, (300, 300), 5, INK);
    let result = analyze_image(&img, &AnalysisConfig::default());
    assert!(result.detections.is_empty());
    assert_eq!(result.summary.count, 0);
    assert!(result.summary.max_area.abs() < f64::EPSILON);
}

#[test]
fn blank_canvas_is_an_empty_success() {
    let result = analyze(&encode_png(&canvas()), &AnalysisConfig::default()).unwrap();
    assert!(result.detections.is_empty());
    assert_eq!(result.summary.distinct_labels, 0);
}

#[test]
fn analysis_is_deterministic() {
    let img = square_and_circle();
    let config = AnalysisConfig::default();
    let first = analyze_image(&img, &config);
    let second = analyze_image(&img, &config);
    assert_eq!(first.records(), second.records());
    assert_eq!(first.annotated, second.annotated);
}

#[test]
fn annotation_leaves_input_untouched() {
    let img = square_and_circle();
    let before = img.clone();
    let result = analyze_image(&img, &AnalysisConfig::default());

    assert_eq!(img, before);
    assert_eq!(result.annotated.dimensions(), img.dimensions());
    assert_ne!(result.annotated, img);
    // Corners far from both shapes and their labels are unchanged.
    assert_eq!(result.annotated.get_pixel(395, 395), img.get_pixel(395, 395));
    assert_eq!(result.annotated.get_pixel(5, 5), img.get_pixel(5, 5));
}
