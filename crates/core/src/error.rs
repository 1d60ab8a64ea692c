//! Error types for presentation analysis.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while analyzing or generating a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// The input path does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// ZIP container error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// A part referenced by the package is absent.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// An embedded workbook could not be read.
    #[error("Workbook error: {0}")]
    WorkbookError(String),

    /// A deck definition cannot be rendered, e.g. a Gantt date that does not parse.
    #[error("Invalid deck definition: {0}")]
    InvalidDeck(String),

    /// The analysis could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error means the input file does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::FileNotFound(_) => true,
            Error::IoError(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
