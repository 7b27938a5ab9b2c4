//! SVG export serializer.
//!
//! Converts detections into an SVG overlay in pixel coordinates, using
//! the [`svg`] crate for document construction, XML escaping, and path
//! data formatting.
//!
//! Each detection becomes a closed `<path>` (`M`, `L` ... `z`) tracing
//! its boundary plus a `<text>` element carrying its label, positioned
//! above the boundary's first point like the raster annotation.
//!
//! Optional [`SvgMetadata`] embeds `<title>` and `<desc>` elements for
//! accessibility and to help file managers identify exported files.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Path, Title};
use svg::node::{Node, Text, Value};

use shapescan_pipeline::{Boundary, Detection, Dimensions};

/// Outline stroke color.
const OUTLINE_COLOR: &str = "#00ffff";
/// Label fill color.
const LABEL_COLOR: &str = "#ff00ff";
/// Distance from the label baseline up to the boundary's first point.
const LABEL_OFFSET: f64 = 8.0;
/// Label font size in pixels.
const LABEL_FONT_SIZE: u32 = 14;

/// Metadata to embed in the SVG document.
///
/// Both fields are optional.  When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    ///
    /// Typically the analysis configuration, so exported files are
    /// distinguishable.
    pub description: Option<&'a str>,
}

/// Build a closed SVG path `d` attribute string from a boundary.
///
/// Uses `M` for the first point, `L` for subsequent points and a final
/// `z`. Returns an empty string for boundaries with fewer than 2 points.
///
/// # Examples
///
/// ```
/// use shapescan_pipeline::{Boundary, Point};
/// use shapescan_export::build_path_data;
///
/// let boundary = Boundary::new(vec![
///     Point::new(10.0, 20.0),
///     Point::new(30.0, 20.0),
///     Point::new(30.0, 40.0),
/// ]);
/// let d = build_path_data(&boundary);
/// assert!(d.starts_with("M10,20 L30,20 L30,40"));
/// assert!(d.ends_with('z'));
/// ```
#[must_use]
pub fn build_path_data(boundary: &Boundary) -> String {
    let points = boundary.points();
    if points.len() < 2 {
        return String::new();
    }

    let first = &points[0];
    let mut data = Data::new().move_to((first.x, first.y));
    for p in &points[1..] {
        data = data.line_to((p.x, p.y));
    }
    String::from(Value::from(data.close()))
}

/// Serialize detections into an SVG document string.
///
/// The document uses the source image's pixel grid as its coordinate
/// space (`viewBox="0 0 width height"`), so it can be laid over the
/// image directly.
#[must_use]
pub fn to_svg(detections: &[Detection], dimensions: Dimensions, metadata: &SvgMetadata) -> String {
    let (w, h) = (dimensions.width, dimensions.height);
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    // Optional <title> element
    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    // Optional <desc> element
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    for detection in detections {
        let d = build_path_data(&detection.boundary);
        if d.is_empty() {
            continue;
        }

        let path = Path::new()
            .set("d", d)
            .set("fill", "none")
            .set("stroke", OUTLINE_COLOR)
            .set("stroke-width", 3);
        doc = doc.add(path);

        let anchor = detection.record.anchor;
        let mut label = Element::new("text");
        label.assign("x", anchor.x);
        label.assign("y", (anchor.y - LABEL_OFFSET).max(f64::from(LABEL_FONT_SIZE)));
        label.assign("fill", LABEL_COLOR);
        label.assign("font-family", "monospace");
        label.assign("font-size", LABEL_FONT_SIZE);
        label.append(Text::new(detection.record.label.as_str()));
        doc = doc.add(label);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

#[cfg(test)]
mod tests {
    use shapescan_pipeline::{Point, ShapeLabel, ShapeRecord};

    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    fn no_meta() -> SvgMetadata<'static> {
        SvgMetadata::default()
    }

    fn detection(label: ShapeLabel, points: Vec<Point>) -> Detection {
        let boundary = Boundary::new(points);
        Detection {
            record: ShapeRecord {
                label,
                area: boundary.area(),
                perimeter: boundary.perimeter(),
                vertices: boundary.len(),
                anchor: boundary.first().copied().unwrap_or(Point::new(0.0, 0.0)),
            },
            simplified: boundary.clone(),
            boundary,
        }
    }

    fn triangle() -> Detection {
        detection(
            ShapeLabel::Triangle,
            vec![
                Point::new(10.0, 40.0),
                Point::new(50.0, 40.0),
                Point::new(30.0, 80.0),
            ],
        )
    }

    // --- build_path_data ---

    #[test]
    fn build_path_data_empty_boundary() {
        assert_eq!(build_path_data(&Boundary::new(vec![])), "");
    }

    #[test]
    fn build_path_data_single_point() {
        let boundary = Boundary::new(vec![Point::new(5.0, 5.0)]);
        assert_eq!(build_path_data(&boundary), "");
    }

    #[test]
    fn build_path_data_is_closed() {
        let d = build_path_data(&triangle().boundary);
        assert!(d.starts_with("M10,40 L50,40 L30,80"), "{d}");
        assert!(d.ends_with('z'), "{d}");
    }

    #[test]
    fn build_path_data_fractional_coords() {
        let boundary = Boundary::new(vec![Point::new(12.5, 18.3), Point::new(14.0, 20.1)]);
        assert!(build_path_data(&boundary).starts_with("M12.5,18.3 L14,20.1"));
    }

    // --- Document structure ---

    #[test]
    fn empty_detections_produce_valid_svg_with_no_paths() {
        let svg = to_svg(&[], dims(100, 50), &no_meta());
        assert!(svg.contains(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(svg.contains(r#"width="100""#));
        assert!(svg.contains(r#"height="50""#));
        assert!(svg.contains(r#"viewBox="0 0 100 50""#));
        assert!(!svg.contains("<path"));
        assert!(!svg.contains("<text"));
    }

    #[test]
    fn each_detection_has_path_and_label() {
        let square = detection(
            ShapeLabel::Square,
            vec![
                Point::new(100.0, 100.0),
                Point::new(150.0, 100.0),
                Point::new(150.0, 150.0),
                Point::new(100.0, 150.0),
            ],
        );
        let svg = to_svg(&[triangle(), square], dims(200, 200), &no_meta());
        assert_eq!(svg.matches("<path").count(), 2);
        assert_eq!(svg.matches("<text").count(), 2);
        assert!(svg.contains("TRIANGLE"));
        assert!(svg.contains("SQUARE"));
        assert!(svg.contains(r#"fill="none""#));
        assert!(svg.contains(r##"stroke="#00ffff""##));
        assert!(svg.contains(r##"fill="#ff00ff""##));
        // The square's label sits 8 px above its first point.
        assert!(svg.contains(r#"y="92""#));
    }

    #[test]
    fn label_near_top_edge_stays_visible() {
        let svg = to_svg(
            &[detection(
                ShapeLabel::Triangle,
                vec![Point::new(5.0, 2.0), Point::new(50.0, 2.0), Point::new(20.0, 60.0)],
            )],
            dims(100, 100),
            &no_meta(),
        );
        assert!(svg.contains(r#"y="14""#));
    }

    #[test]
    fn degenerate_boundary_is_skipped() {
        let lonely = detection(ShapeLabel::Unknown, vec![Point::new(1.0, 1.0)]);
        let svg = to_svg(&[lonely], dims(10, 10), &no_meta());
        assert!(!svg.contains("<path"));
        assert!(!svg.contains("<text"));
    }

    // --- Metadata ---

    #[test]
    fn metadata_title_and_description() {
        let meta = SvgMetadata {
            title: Some("shapes"),
            description: Some("preset=strict & min_area=500"),
        };
        let svg = to_svg(&[], dims(10, 10), &meta);
        assert!(svg.contains("<title>shapes</title>"));
        assert!(svg.contains("<desc>"));
        assert!(svg.contains("preset=strict &amp; min_area=500"));
    }
}
