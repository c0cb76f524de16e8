//! Text and JSON presentation of aggregation results.

use crate::aggregator::{aggregate, AggregationResult};
use crate::geometry::GeometryCollection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileReport {
    pub file: String,
    pub counts: BTreeMap<String, usize>,
    pub distances: BTreeMap<String, f64>,
    /// `[min_lon, min_lat, max_lon, max_lat]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<[f64; 4]>,
}

impl FileReport {
    pub fn new(path: &Path, collection: &GeometryCollection) -> Self {
        let AggregationResult { counts, distances } = aggregate(collection);
        let extent = collection
            .bounding_rect()
            .map(|rect| [rect.min().x, rect.min().y, rect.max().x, rect.max().y]);
        FileReport {
            file: path.display().to_string(),
            counts,
            distances,
            extent,
        }
    }
}

fn write_table<V: std::fmt::Display>(
    writer: &mut dyn Write,
    title: &str,
    value_header: &str,
    rows: &[(&str, V)],
) -> std::io::Result<()> {
    let key_header = "Geometry Type";
    let key_width = rows
        .iter()
        .map(|(key, _)| key.len())
        .chain(std::iter::once(key_header.len()))
        .max()
        .unwrap_or(0);

    writeln!(writer, "{}", title)?;
    writeln!(writer, "{:<width$}  {}", key_header, value_header, width = key_width)?;
    writeln!(
        writer,
        "{}  {}",
        "-".repeat(key_width),
        "-".repeat(value_header.len())
    )?;
    for (key, value) in rows {
        writeln!(writer, "{:<width$}  {}", key, value, width = key_width)?;
    }
    Ok(())
}

pub fn render_summary(writer: &mut dyn Write, counts: &BTreeMap<String, usize>) -> std::io::Result<()> {
    let rows: Vec<(&str, usize)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    write_table(writer, "Summary", "Count", &rows)
}

pub fn render_detailed(writer: &mut dyn Write, distances: &BTreeMap<String, f64>) -> std::io::Result<()> {
    let rows: Vec<(&str, String)> = distances
        .iter()
        .map(|(k, v)| (k.as_str(), format!("{:.2}", v)))
        .collect();
    write_table(writer, "Detailed Information", "Total Length (km)", &rows)
}

/// Which parts of a report are printed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sections {
    pub summary: bool,
    pub detailed: bool,
    pub extent: bool,
}

impl Sections {
    /// With nothing selected, the two tables are shown.
    pub fn from_flags(summary: bool, detailed: bool, extent: bool) -> Self {
        if !summary && !detailed && !extent {
            return Sections {
                summary: true,
                detailed: true,
                extent: false,
            };
        }
        Sections {
            summary,
            detailed,
            extent,
        }
    }
}

pub fn render_report(
    writer: &mut dyn Write,
    report: &FileReport,
    sections: Sections,
) -> std::io::Result<()> {
    writeln!(writer, "== {}", report.file)?;
    if sections.extent {
        match report.extent {
            Some([min_lon, min_lat, max_lon, max_lat]) => writeln!(
                writer,
                "Extent: ({:.5}, {:.5}) to ({:.5}, {:.5})",
                min_lon, min_lat, max_lon, max_lat
            )?,
            None => writeln!(writer, "Extent: none")?,
        }
    }
    if sections.summary {
        writeln!(writer)?;
        render_summary(writer, &report.counts)?;
    }
    if sections.detailed {
        writeln!(writer)?;
        render_detailed(writer, &report.distances)?;
    }
    writeln!(writer)
}

pub fn write_json(writer: &mut dyn Write, reports: &[FileReport]) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, reports)
}
