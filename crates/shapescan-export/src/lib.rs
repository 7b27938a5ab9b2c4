//! shapescan-export: Pure format serializers (sans-IO)
//!
//! Converts analysis results into output formats: a CSV measurement
//! table, an SVG overlay of the detected outlines, and a JSON report.
//! Every serializer returns a `String`; writing files is the caller's job.

pub mod csv;
pub mod json;
pub mod svg;

pub use csv::{CSV_HEADER, to_csv};
pub use json::{ExportError, to_json};
pub use svg::{SvgMetadata, build_path_data, to_svg};
