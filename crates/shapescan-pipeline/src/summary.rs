//! Aggregate statistics and the plain-text measurement table.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ShapeRecord;

/// Headline statistics over a set of records.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    /// Number of records.
    pub count: usize,
    /// Number of different labels among the records.
    pub distinct_labels: usize,
    /// Largest record area, or `0.0` when there are no records.
    pub max_area: f64,
}

/// Compute [`Summary`] statistics for `records`.
#[must_use]
pub fn summarize(records: &[ShapeRecord]) -> Summary {
    let distinct: BTreeSet<_> = records.iter().map(|r| r.label).collect();
    Summary {
        count: records.len(),
        distinct_labels: distinct.len(),
        max_area: records.iter().map(|r| r.area).fold(0.0, f64::max),
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "OBJECTS DETECTED: {}", self.count)?;
        writeln!(f, "SHAPE TYPES:      {}", self.distinct_labels)?;
        write!(f, "MAX AREA:         {:.2} px²", self.max_area)
    }
}

/// Column-aligned text rendering of a record set.
///
/// One header line followed by one row per record, areas and perimeters
/// with two decimals. An empty record set renders the header only.
#[derive(Debug, Clone, Copy)]
pub struct ShapeTable<'a> {
    records: &'a [ShapeRecord],
}

impl<'a> ShapeTable<'a> {
    /// Wrap `records` for display.
    #[must_use]
    pub const fn new(records: &'a [ShapeRecord]) -> Self {
        Self { records }
    }
}

impl fmt::Display for ShapeTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<10} {:>14} {:>15}", "SHAPE", "AREA (px²)", "PERIMETER (px)")?;
        for r in self.records {
            write!(f, "\n{:<10} {:>14.2} {:>15.2}", r.label, r.area, r.perimeter)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Point, ShapeLabel};

    fn record(label: ShapeLabel, area: f64) -> ShapeRecord {
        ShapeRecord {
            label,
            area,
            perimeter: 4.0 * area.sqrt(),
            vertices: 4,
            anchor: Point::new(0.0, 0.0),
        }
    }

    #[test]
    fn empty_records_summarize_to_zero() {
        let summary = summarize(&[]);
        assert_eq!(
            summary,
            Summary {
                count: 0,
                distinct_labels: 0,
                max_area: 0.0,
            }
        );
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn counts_and_distinct_labels() {
        let records = [
            record(ShapeLabel::Square, 900.0),
            record(ShapeLabel::Circle, 2500.0),
            record(ShapeLabel::Square, 1600.0),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.distinct_labels, 2);
        assert!((summary.max_area - 2500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_display_lists_three_metrics() {
        let text = summarize(&[record(ShapeLabel::Triangle, 1234.5)]).to_string();
        assert!(text.contains("OBJECTS DETECTED: 1"));
        assert!(text.contains("SHAPE TYPES:      1"));
        assert!(text.contains("MAX AREA:         1234.50 px²"));
    }

    #[test]
    fn table_has_header_and_one_row_per_record() {
        let records = [
            record(ShapeLabel::Square, 22500.0),
            record(ShapeLabel::Circle, 100.0),
        ];
        let text = ShapeTable::new(&records).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("SHAPE"));
        assert!(lines[1].starts_with("SQUARE"));
        assert!(lines[1].contains("22500.00"));
        assert!(lines[1].ends_with("600.00"));
        assert!(lines[2].starts_with("CIRCLE"));
        assert!(lines[2].contains("100.00"));
    }

    #[test]
    fn empty_table_is_header_only() {
        assert_eq!(ShapeTable::new(&[]).to_string().lines().count(), 1);
    }
}
