//! CSV export of the measurement table.
//!
//! One header line, then one line per record in detection order:
//! the upper-case label, the area in square pixels and the perimeter in
//! pixels, both with two decimals. Labels never contain commas or
//! quotes, so no field quoting is needed.

use std::fmt::Write;

use shapescan_pipeline::ShapeRecord;

/// Header line of the CSV table.
pub const CSV_HEADER: &str = "shape,area_px2,perimeter_px";

/// Serialize records into a CSV string terminated by a newline.
#[must_use]
pub fn to_csv(records: &[ShapeRecord]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + records.len() * 32);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for r in records {
        let _ = writeln!(out, "{},{:.2},{:.2}", r.label, r.area, r.perimeter);
    }
    out
}
