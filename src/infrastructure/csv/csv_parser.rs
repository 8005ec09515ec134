// ============================================================
// CSV PARSER
// ============================================================
// Parse CSV files into datasets with encoding detection

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::WINDOWS_1252;

use crate::domain::dataset::{Dataset, Record, RecordField};
use crate::domain::error::{AppError, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// CSV parser with encoding detection
pub struct CsvParser {
    /// Delimiter character (default: comma)
    delimiter: u8,

    /// Whether to trim whitespace from values
    trim: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: true,
        }
    }
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse CSV content from string
    pub fn parse_content(&self, content: &str) -> Result<Dataset> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .flexible(true) // Allow rows with different lengths
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .clone();
        let columns: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        if columns.iter().all(|c| c.is_empty()) {
            return Err(AppError::EmptyDataset("header row has no columns".to_string()));
        }

        let mut records = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;
            if record.iter().all(|value| value.is_empty()) {
                continue;
            }
            records.push(Self::parse_row(records.len(), &headers, &record));
        }

        Dataset::new(columns, records)
            .ok_or_else(|| AppError::EmptyDataset("no data rows".to_string()))
    }

    /// Read file as UTF-8, falling back to Windows-1252 for legacy exports
    fn read_with_encoding_detection(path: &Path) -> Result<String> {
        let buffer = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::SourceNotFound(path.display().to_string()),
            _ => AppError::IoError(format!("Failed to read {}: {}", path.display(), e)),
        })?;
        let bytes = buffer.strip_prefix(UTF8_BOM).unwrap_or(&buffer);

        match std::str::from_utf8(bytes) {
            Ok(content) => Ok(content.to_string()),
            Err(_) => {
                let (decoded, _, _) = WINDOWS_1252.decode(bytes);
                Ok(decoded.into_owned())
            }
        }
    }

    fn parse_row(index: usize, headers: &StringRecord, record: &StringRecord) -> Record {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| RecordField::new(header, record.get(idx).unwrap_or("")))
            .collect();
        Record::new(index, fields)
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe)
    pub fn detect_delimiter(content: &str) -> u8 {
        let candidates = [b',', b';', b'\t', b'|'];
        let sample_lines: Vec<_> = content.lines().take(10).collect();
        if sample_lines.is_empty() {
            return b',';
        }

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        for &delimiter in &candidates {
            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count())
                .collect();

            // Score by consistency (low standard deviation) and frequency
            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;
            let score = avg / (1.0 + variance.sqrt());

            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }

    /// Load a dataset from a file, detecting the delimiter.
    /// Missing file is `SourceNotFound`, no rows is `EmptyDataset` naming the path.
    pub fn parse_file_auto_detect(path: &Path) -> Result<Dataset> {
        let content = Self::read_with_encoding_detection(path)?;
        let delimiter = Self::detect_delimiter(&content);
        Self::default()
            .with_delimiter(delimiter)
            .parse_content(&content)
            .map_err(|err| match err {
                AppError::EmptyDataset(_) => {
                    AppError::EmptyDataset(format!("{} has no data rows", path.display()))
                }
                other => other,
            })
    }
}
