//! Error types for Touchstone parsing.

use thiserror::Error;

/// Numerically undefined quantities met while decoding a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DomainError {
    /// `s11 == 1 + 0j`: the reflection-to-impedance transform divides by zero.
    #[error("unit-reflection: s11 = 1+0j has no finite input impedance")]
    UnitReflection,
}

/// Errors that can occur while parsing a Touchstone document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// I/O error reading the source.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Option line with the wrong number of tokens.
    #[error("Option line must have {expected} tokens, got {got}")]
    OptionTokenCount { expected: usize, got: usize },

    /// Data line that is neither 1-port (3 values) nor 2-port (9 values).
    #[error("Data line must have 3 (1-port) or 9 (2-port) values, got {0}")]
    DataValueCount(usize),

    /// Keyword not in the option table for its column.
    #[error("Unknown {field} keyword '{keyword}'")]
    UnknownKeyword { field: &'static str, keyword: String },

    /// Token that should be a number but is not.
    #[error("Invalid number for {field}: '{token}'")]
    InvalidNumber { field: &'static str, token: String },

    /// Data line found before any option line.
    #[error("Data line before the option line")]
    MissingOptionLine,

    /// Nom parsing error (internal).
    #[error("Parse error: {0}")]
    Nom(String),

    /// Sample whose derived quantities are undefined.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Any of the above, located in the source.
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        source: Box<ParseError>,
    },

    /// A previous parse failed and the source has already been closed.
    #[error("Source '{name}' was released after a failed parse")]
    SourceReleased { name: String },
}

impl ParseError {
    /// Attach a 1-based line number.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            located @ Self::AtLine { .. } => located,
            other => Self::AtLine {
                line,
                source: Box::new(other),
            },
        }
    }

    /// Line number, if the error was located.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::AtLine { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// The error without its location wrapper.
    pub fn root(&self) -> &ParseError {
        match self {
            Self::AtLine { source, .. } => source.root(),
            other => other,
        }
    }

    /// Malformed document content (option line, token counts, numbers).
    pub fn is_format_error(&self) -> bool {
        matches!(
            self.root(),
            Self::OptionTokenCount { .. }
                | Self::DataValueCount(_)
                | Self::UnknownKeyword { .. }
                | Self::InvalidNumber { .. }
                | Self::MissingOptionLine
                | Self::Nom(_)
        )
    }

    pub fn is_domain_error(&self) -> bool {
        matches!(self.root(), Self::Domain(_))
    }
}

/// Convert nom errors to our error type.
impl<'a> From<nom::Err<nom::error::Error<&'a str>>> for ParseError {
    fn from(err: nom::Err<nom::error::Error<&'a str>>) -> Self {
        match err {
            nom::Err::Incomplete(_) => ParseError::Nom("Incomplete input".to_string()),
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                let preview: String = e.input.chars().take(20).collect();
                ParseError::Nom(format!("{:?} at '{}'", e.code, preview))
            }
        }
    }
}
