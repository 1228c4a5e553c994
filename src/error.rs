//! Error types for fuel_report

use thiserror::Error;

use crate::columns::Field;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field matched none of its aliases. `found` lists the headers
    /// that were actually present so the operator can see what went wrong.
    #[error("Missing required column for {field}: found columns [{}]", .found.join(", "))]
    MissingRequiredColumn { field: Field, found: Vec<String> },

    #[error("Invalid parameter {name}: {value} (must be a positive number)")]
    InvalidParameter { name: &'static str, value: String },

    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),

    #[error("Input file has no header row")]
    EmptyInput,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Authentication failed: unknown user id or wrong password")]
    AuthenticationFailed,
}

pub type Result<T> = std::result::Result<T, Error>;
