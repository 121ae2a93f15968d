// crates/refval-core/src/error.rs

use std::path::PathBuf;

use thiserror::Error;

/// Failure to bring one of the input tables into memory. Always fatal for a run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path} as CSV: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: polars::error::PolarsError,
    },

    #[error("{path} did not contain any columns")]
    Empty { path: PathBuf },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Profiling report could not be written: {0}")]
    Report(#[from] rust_xlsxwriter::XlsxError),

    #[error("table {table} is missing required column {column}")]
    MissingColumn { table: String, column: String },
}

impl PipelineError {
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
