//! Error types for curve building and catalog scanning.

use lib_touchstone::ParseError;
use thiserror::Error;

/// Errors that can occur while building curves or reading a catalog.
#[derive(Debug, Error)]
pub enum BeadError {
    /// A measurement file could not be parsed.
    #[error("Failed to parse '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: ParseError,
    },

    /// I/O error reading an archive.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Zip archive that cannot be read.
    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Archive member that does not exist.
    #[error("Member '{member}' not found in '{location}'")]
    MemberNotFound { location: String, member: String },

    /// Member-name pattern that does not compile.
    #[error("Invalid member pattern for vendor '{vendor}': {source}")]
    Pattern {
        vendor: String,
        #[source]
        source: regex::Error,
    },

    /// Input length mismatch.
    #[error("Input length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Catalog that references unknown vendors or lacks required data.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
}

impl BeadError {
    pub fn parse(name: impl Into<String>, source: ParseError) -> Self {
        Self::Parse {
            name: name.into(),
            source,
        }
    }
}

/// Result type for bead operations.
pub type BeadResult<T> = Result<T, BeadError>;
