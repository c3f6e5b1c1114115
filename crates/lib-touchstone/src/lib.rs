//! # lib-touchstone
//!
//! Touchstone S-parameter reader for the chip bead selector.
//!
//! This crate provides:
//! - `FormatHeader`: the decoded `#` option line
//! - `MeasurementPoint`: one frequency sample with its input/series impedance
//! - `TouchstoneDocument`: a lazily parsed, replayable sequence of samples
//! - `LineSource`: the capability a document reads from
//!
//! Option keywords and data lines are parsed with the `nom` parser
//! combinator library.

pub mod error;
pub mod header;
pub mod point;
pub mod source;
pub mod touchstone;

pub use error::{DomainError, ParseError};
pub use header::FormatHeader;
pub use point::MeasurementPoint;
pub use source::{LineSource, ReaderSource};
pub use touchstone::TouchstoneDocument;
