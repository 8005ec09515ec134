// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Dataset sources backed by CSV files

mod csv_parser;

pub use csv_parser::CsvParser;

use std::path::PathBuf;

use crate::domain::dataset::Dataset;
use crate::domain::error::{AppError, Result};

/// Anything that can produce the dataset for one pipeline run
pub trait DatasetSource {
    fn load(&self) -> Result<Dataset>;

    /// Human-readable locator for logs
    fn describe(&self) -> String;
}

/// Re-reads a CSV file on every load
pub struct CsvDatasetSource {
    path: PathBuf,
}

impl CsvDatasetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for CsvDatasetSource {
    fn load(&self) -> Result<Dataset> {
        CsvParser::parse_file_auto_detect(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fixed in-memory dataset
pub struct StaticDatasetSource {
    dataset: Option<Dataset>,
}

impl StaticDatasetSource {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset: Some(dataset),
        }
    }

    /// A source that always yields `EmptyDataset`.
    pub fn empty() -> Self {
        Self { dataset: None }
    }
}

impl DatasetSource for StaticDatasetSource {
    fn load(&self) -> Result<Dataset> {
        self.dataset
            .clone()
            .ok_or_else(|| AppError::EmptyDataset("in-memory source is empty".to_string()))
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
