use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    SourceNotFound(String),
    EmptyDataset(String),
    BudgetExceeded {
        estimated: usize,
        ceiling: usize,
        suggested_rows: usize,
    },
    ServiceUnavailable(String),
    EmptyOutput,
    MalformedOutput {
        reason: String,
        raw: String,
    },
    SchemaRejected(String),
    ParseError(String),
    ValidationError(String),
    IoError(String),
    Internal(String),
}

impl AppError {
    /// Stable machine-readable tag for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::SourceNotFound(_) => "source_not_found",
            AppError::EmptyDataset(_) => "empty_dataset",
            AppError::BudgetExceeded { .. } => "budget_exceeded",
            AppError::ServiceUnavailable(_) => "service_unavailable",
            AppError::EmptyOutput => "empty_output",
            AppError::MalformedOutput { .. } => "malformed_output",
            AppError::SchemaRejected(_) => "schema_rejected",
            AppError::ParseError(_) => "parse_error",
            AppError::ValidationError(_) => "validation_error",
            AppError::IoError(_) => "io_error",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn malformed(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        AppError::MalformedOutput {
            reason: reason.into(),
            raw: raw.into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::SourceNotFound(msg) => write!(f, "Dataset source not found: {}", msg),
            AppError::EmptyDataset(msg) => write!(f, "Empty dataset: {}", msg),
            AppError::BudgetExceeded {
                estimated,
                ceiling,
                suggested_rows,
            } => write!(
                f,
                "Estimated prompt size of {} tokens exceeds the limit of {} tokens. Try a sample size of about {} rows.",
                estimated, ceiling, suggested_rows
            ),
            AppError::ServiceUnavailable(msg) => {
                write!(f, "Generation service error: {}", msg)
            }
            AppError::EmptyOutput => write!(f, "Generation service returned an empty response"),
            AppError::MalformedOutput { reason, raw } => {
                write!(f, "Malformed generation output: {} | raw_output={}", reason, raw)
            }
            AppError::SchemaRejected(msg) => {
                write!(f, "Generation service rejected the response schema: {}", msg)
            }
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::ParseError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
