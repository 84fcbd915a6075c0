// src/error.rs
use arrow::error::ArrowError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to read one of the input tables. Always fatal.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("table `{table}` has no column `{column}`")]
    MissingColumn { table: String, column: String },

    #[error("building arrow table: {0}")]
    Arrow(#[from] ArrowError),
}

/// A single cell that could not be interpreted. Recoverable: the value becomes missing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("row {row}: birth year `{value}` is not a usable year")]
    BirthYear { row: usize, value: String },

    #[error("row {row}: `{column}` value `{value}` is not a timestamp")]
    Timestamp {
        row: usize,
        column: String,
        value: String,
    },
}

/// Anything that aborts the whole run.
#[derive(Error, Debug)]
pub enum FatalPipelineError {
    #[error("{stage}: required column `{column}` is missing")]
    MissingColumn { stage: &'static str, column: String },

    #[error("column `{column}` is not {expected}")]
    UnexpectedType {
        column: String,
        expected: &'static str,
    },

    #[error("threshold `{name}` = {value} is out of range")]
    InvalidThreshold { name: &'static str, value: i64 },

    #[error(transparent)]
    Arrow(#[from] ArrowError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

pub type Result<T, E = FatalPipelineError> = std::result::Result<T, E>;
