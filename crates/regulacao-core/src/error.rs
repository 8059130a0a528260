// crates/regulacao-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source file not found: {0}")]
    SourceNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, EtlError>;
