//! Error types for loading, mapping and forecasting.

use std::path::PathBuf;

use thiserror::Error;

/// Broad category of an [`Error`], shown to the user alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    Validation,
    Model,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::Io => "I/O error",
            ErrorKind::Parse => "Parse error",
            ErrorKind::Validation => "Validation error",
            ErrorKind::Model => "Model error",
        };
        f.write_str(label)
    }
}

/// Errors raised by the data loader, column mapper and forecast runner.
#[derive(Debug, Error)]
pub enum Error {
    // === File System Errors ===
    /// Failed to open or read the input file.
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Parsing Errors ===
    /// CSV is structurally invalid (ragged rows, bad UTF-8, ...).
    #[error("failed to parse CSV {source_name}: {message}")]
    CsvParse { source_name: String, message: String },

    /// CSV has no header row.
    #[error("CSV {source_name} is empty")]
    EmptyCsv { source_name: String },

    /// A date cell could not be parsed as a timestamp.
    #[error("cannot parse '{value}' in column '{column}' (row {row}) as a date")]
    DateParse {
        column: String,
        row: usize,
        value: String,
    },

    /// A value cell could not be parsed as a number.
    #[error("cannot parse '{value}' in column '{column}' (row {row}) as a number")]
    ValueParse {
        column: String,
        row: usize,
        value: String,
    },

    // === Validation Errors ===
    /// Selected column is not part of the loaded table.
    #[error("column '{column}' not found (available: {available})")]
    ColumnNotFound { column: String, available: String },

    /// Date and value column must be different columns.
    #[error("date and value column are both '{column}'")]
    SameColumn { column: String },

    /// Not enough distinct timestamps to fit a model.
    #[error("need at least 2 distinct timestamps to fit, got {found}")]
    InsufficientData { found: usize },

    /// A forecast parameter is outside its allowed range.
    #[error("invalid {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// A step was requested before its input exists.
    #[error("{0}")]
    MissingInput(&'static str),

    // === Model Errors ===
    /// The forecasting model failed to fit or predict.
    #[error("{model} failed: {message}")]
    Model { model: &'static str, message: String },
}

impl Error {
    /// Category used for display and logging.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FileRead { .. } => ErrorKind::Io,
            Error::CsvParse { .. }
            | Error::EmptyCsv { .. }
            | Error::DateParse { .. }
            | Error::ValueParse { .. } => ErrorKind::Parse,
            Error::ColumnNotFound { .. }
            | Error::SameColumn { .. }
            | Error::InsufficientData { .. }
            | Error::InvalidConfig { .. }
            | Error::MissingInput(_) => ErrorKind::Validation,
            Error::Model { .. } => ErrorKind::Model,
        }
    }

    /// Message prefixed with the error kind, for the status bar.
    pub fn user_message(&self) -> String {
        format!("{}: {self}", self.kind())
    }
}

/// Result type for data and forecast operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ColumnNotFound {
            column: "sales".to_string(),
            available: "day, amount".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "column 'sales' not found (available: day, amount)"
        );
    }

    #[test]
    fn test_error_kinds() {
        let parse = Error::DateParse {
            column: "day".to_string(),
            row: 3,
            value: "yesterday".to_string(),
        };
        assert_eq!(parse.kind(), ErrorKind::Parse);
        assert_eq!(Error::InsufficientData { found: 1 }.kind(), ErrorKind::Validation);

        let model = Error::Model {
            model: "decomposable",
            message: "singular".to_string(),
        };
        assert_eq!(model.kind(), ErrorKind::Model);
    }

    #[test]
    fn test_user_message_has_kind_prefix() {
        let err = Error::SameColumn {
            column: "day".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "Validation error: date and value column are both 'day'"
        );
    }
}
