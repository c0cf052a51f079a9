use std::path::PathBuf;

use thiserror::Error;

use crate::metadata::ColumnType;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unable to read {path:?} as a table: {message}")]
    Format { path: PathBuf, message: String },

    #[error("Invalid directory {path:?}: {reason}")]
    Directory { path: PathBuf, reason: String },

    #[error("No files found to process")]
    Input,

    #[error("No data was successfully loaded and merged")]
    EmptyResult,

    #[error("Failed to parse '{value}' as a number")]
    Parse { value: String },

    #[error("Column '{name}' already exists in the table")]
    DuplicateColumn { name: String },

    #[error("Column '{name}' has {rows} row(s) but the table has {expected}")]
    RaggedColumn {
        name: String,
        rows: usize,
        expected: usize,
    },

    #[error("Column '{name}' not found in table")]
    MissingColumn { name: String },

    #[error("Type mismatch for join key '{key}': left {left} vs right {right}")]
    KeyTypeMismatch {
        key: String,
        left: ColumnType,
        right: ColumnType,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl PipelineError {
    pub fn format(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        PipelineError::Format {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
