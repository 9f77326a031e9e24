//! Output sinks.
//!
//! The pipelines hand a finalized row list to these adapters unchanged.
//! CSV is the reference sink; the webhook sender carries the one-shot
//! high-momentum alerts.

pub mod webhook;

pub use webhook::{AlertSender, DeliveryOutcome};

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Quote a CSV field when it contains separators, quotes, or newlines.
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render the header and rows as CSV text.
pub fn format_csv(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();

    let header_line: Vec<String> = header.iter().map(|h| escape_field(h)).collect();
    out.push_str(&header_line.join(","));
    out.push('\n');

    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| escape_field(c)).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }

    out
}

/// Write the finalized rows to a CSV file.
pub fn write_csv(path: &Path, header: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let content = format_csv(header, rows);
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write CSV to {}", path.display()))?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_field() {
        assert_eq!(escape_field("yoga mat"), "yoga mat");
    }

    #[test]
    fn test_escape_field_with_comma_and_quote() {
        assert_eq!(escape_field("mats, 6mm"), "\"mats, 6mm\"");
        assert_eq!(escape_field("6\" mat"), "\"6\"\" mat\"");
    }

    #[test]
    fn test_format_csv_layout() {
        let rows = vec![
            vec!["2024-01-01T00:00:00".to_string(), "yoga mat".to_string()],
            vec!["2024-01-01T00:00:01".to_string(), "mats, 6mm".to_string()],
        ];
        let csv = format_csv(&["Timestamp", "Keyword"], &rows);
        assert_eq!(
            csv,
            "Timestamp,Keyword\n2024-01-01T00:00:00,yoga mat\n2024-01-01T00:00:01,\"mats, 6mm\"\n"
        );
    }

    #[test]
    fn test_write_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let rows = vec![vec!["a".to_string(), "b".to_string()]];

        write_csv(&path, &["X", "Y"], &rows).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "X,Y\na,b\n");
    }
}
