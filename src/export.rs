//! Record export to JSON and CSV.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::SecondsFormat;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ExportError;
use crate::model::Record;

pub const CSV_HEADER: &str = "ID,URL,Title,Description,Image,Price,Verified,Created At";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    /// `csv` for a `.csv` path, JSON otherwise.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Json,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => f.write_str("json"),
            ExportFormat::Csv => f.write_str("csv"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format: {}", other)),
        }
    }
}

/// Pretty-printed JSON array.
pub fn to_json(records: &[Record]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// CSV with the fixed header row. Non-numeric fields are quoted, embedded quotes doubled.
pub fn to_csv(records: &[Record]) -> Result<String, ExportError> {
    let mut header = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(vec![]);
    header.write_record(CSV_HEADER.split(','))?;
    let buffer = header.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;

    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(buffer);
    for record in records {
        let id = record.id.to_string();
        let created_at = record.created_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        wtr.write_record([
            id.as_str(),
            record.url.as_str(),
            record.title.as_str(),
            record.description.as_str(),
            record.image.as_str(),
            record.price.as_str(),
            if record.verified { "Yes" } else { "No" },
            created_at.as_str(),
        ])?;
    }

    let data = wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8(data)?)
}

pub fn render(records: &[Record], format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => to_json(records),
        ExportFormat::Csv => to_csv(records),
    }
}

/// Write `records` to `path`. Without an explicit format it is taken from the extension.
pub fn export_records(
    records: &[Record],
    path: impl AsRef<Path>,
    format: Option<ExportFormat>,
) -> Result<ExportFormat, ExportError> {
    let path = path.as_ref();
    let format = format.unwrap_or_else(|| ExportFormat::from_path(path));
    std::fs::write(path, render(records, format)?)?;
    info!(path = %path.display(), %format, count = records.len(), "records exported");
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<Record> {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        vec![
            Record {
                id: 1,
                url: "https://example.com/1".to_string(),
                title: "Item with \"quotes\"".to_string(),
                description: "Soft, warm".to_string(),
                image: "image1.jpg".to_string(),
                price: "$10".to_string(),
                category: None,
                verified: true,
                created_at: created,
                updated_at: created,
            },
            Record {
                id: 2,
                url: "https://example.com/2".to_string(),
                title: "Item 2".to_string(),
                description: String::new(),
                image: String::new(),
                price: "$20".to_string(),
                category: Some("Hats".to_string()),
                verified: false,
                created_at: created,
                updated_at: created,
            },
        ]
    }

    #[test]
    fn test_csv_layout() {
        let csv = to_csv(&sample()).unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1]
            .starts_with(r#"1,"https://example.com/1","Item with ""quotes""","Soft, warm""#));
        assert!(lines[2].starts_with(r#"2,"https://example.com/2","Item 2","#));
    }

    #[test]
    fn test_csv_reads_back() {
        let csv = to_csv(&sample()).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());

        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers.join(","), CSV_HEADER);

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][2], "Item with \"quotes\"");
        assert_eq!(&rows[0][3], "Soft, warm");
        assert_eq!(&rows[0][6], "Yes");
        assert_eq!(&rows[0][7], "2024-01-01T00:00:00.000Z");
        assert_eq!(&rows[1][0], "2");
        assert_eq!(&rows[1][3], "");
        assert_eq!(&rows[1][6], "No");
    }

    #[test]
    fn test_json_is_pretty_and_parses_back() {
        let records = sample();
        let json = to_json(&records).unwrap();

        assert!(json.contains("\n  {"));
        let parsed: Vec<Record> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("out.CSV");
        let json_path = dir.path().join("out.txt");

        assert_eq!(export_records(&sample(), &csv_path, None).unwrap(), ExportFormat::Csv);
        assert_eq!(export_records(&sample(), &json_path, None).unwrap(), ExportFormat::Json);

        let written = std::fs::read_to_string(&csv_path).unwrap();
        assert!(written.starts_with(CSV_HEADER));
        let written = std::fs::read_to_string(&json_path).unwrap();
        assert!(written.starts_with('['));
    }

    #[test]
    fn test_explicit_format_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        export_records(&sample(), &path, Some(ExportFormat::Csv)).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("ID,URL"));
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");

        let err = export_records(&sample(), &path, None).unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
    }
}
