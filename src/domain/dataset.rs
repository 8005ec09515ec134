// ============================================================
// DATASET TYPES
// ============================================================
// Records, datasets and sample windows. No I/O.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single named value in a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordField {
    /// Column name (header)
    pub name: String,

    /// Raw cell value
    pub value: String,
}

impl RecordField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One row of the dataset, fields kept in column order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Row index in the full dataset (0-based)
    pub index: usize,

    pub fields: Vec<RecordField>,
}

impl Record {
    pub fn new(index: usize, fields: Vec<RecordField>) -> Self {
        Self { index, fields }
    }

    /// Build a record from parallel column/value slices. Missing values become empty strings.
    pub fn from_values(index: usize, columns: &[String], values: &[&str]) -> Self {
        let fields = columns
            .iter()
            .enumerate()
            .map(|(idx, name)| RecordField::new(name.clone(), *values.get(idx).unwrap_or(&"")))
            .collect();
        Self { index, fields }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == column)
            .map(|f| f.value.as_str())
    }
}

/// Ordered, non-empty collection of records sharing one column set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    /// Returns `None` when there are no columns or no records.
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Option<Self> {
        if columns.is_empty() || records.is_empty() {
            return None;
        }
        Some(Self { columns, records })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Contiguous window over a dataset
#[derive(Debug, Clone, Copy)]
pub struct Sample<'a> {
    pub offset: usize,
    pub columns: &'a [String],
    pub records: &'a [Record],
}

impl<'a> Sample<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() || self.columns.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Identifier for each record: the `id_column` value when the column exists
    /// and is non-empty, otherwise the record's position in the full dataset.
    /// Ids are unique within the sample; a repeated column value makes every
    /// record fall back to its position.
    pub fn record_ids(&self, id_column: &str) -> Vec<String> {
        let positional =
            || -> Vec<String> { self.records.iter().map(|r| r.index.to_string()).collect() };
        if !self.columns.iter().any(|c| c == id_column) {
            return positional();
        }

        let ids: Vec<String> = self
            .records
            .iter()
            .map(|record| {
                record
                    .get(id_column)
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| record.index.to_string())
            })
            .collect();

        let mut seen = HashSet::with_capacity(ids.len());
        if ids.iter().all(|id| seen.insert(id.as_str())) {
            ids
        } else {
            positional()
        }
    }
}
