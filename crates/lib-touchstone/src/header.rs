//! Touchstone option line (`# MHZ S RI R 50`).
//!
//! Columns are fixed: frequency unit, parameter kind, value encoding,
//! reference marker, reference impedance. Keywords are matched against fixed
//! tables; anything else is a format error.

use crate::error::ParseError;
use lib_types::{
    sparams::{FrequencyUnit, ParameterKind, ReferenceMarker, ValueEncoding},
    units::Ohms,
    Complex64,
};
use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    combinator::{all_consuming, value},
    number::complete::double,
    IResult, Parser,
};
use std::fmt;

/// Number of tokens on an option line after the `#` marker.
pub const OPTION_TOKENS: usize = 5;

/// Decoded option line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormatHeader {
    /// Unit of the frequency column.
    pub unit: FrequencyUnit,

    /// Always `S`; other parameter kinds are rejected while decoding.
    pub parameter: ParameterKind,

    /// How value pairs are turned into complex numbers.
    pub encoding: ValueEncoding,

    /// Always `R`.
    pub reference: ReferenceMarker,

    /// System impedance used as Z0.
    pub reference_impedance: Ohms,
}

impl FormatHeader {
    /// Decode the whitespace-split tokens of an option line, marker removed.
    pub fn decode(tokens: &[&str]) -> Result<Self, ParseError> {
        let [unit, parameter, encoding, reference, impedance] = *tokens else {
            return Err(ParseError::OptionTokenCount {
                expected: OPTION_TOKENS,
                got: tokens.len(),
            });
        };

        Ok(Self {
            unit: keyword("frequency unit", unit, frequency_unit)?,
            parameter: keyword("parameter kind", parameter, parameter_kind)?,
            encoding: keyword("value encoding", encoding, value_encoding)?,
            reference: keyword("reference", reference, reference_marker)?,
            reference_impedance: Ohms(number("reference impedance", impedance)?),
        })
    }

    /// Decode a full option line such as `# GHz S MA R 50`.
    pub fn from_option_line(line: &str) -> Result<Self, ParseError> {
        let body = line.trim().trim_start_matches('#').to_uppercase();
        let tokens: Vec<&str> = body.split_whitespace().collect();
        Self::decode(&tokens)
    }

    /// Multiplier converting the file's frequency column to hertz.
    #[inline]
    pub fn frequency_scale(&self) -> f64 {
        self.unit.scale()
    }

    /// Convert one raw value pair to a complex S-parameter.
    #[inline]
    pub fn decode_value(&self, val1: f64, val2: f64) -> Complex64 {
        self.encoding.decode(val1, val2)
    }
}

impl fmt::Display for FormatHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "# {} S {} R {}",
            self.unit.keyword(),
            self.encoding.keyword(),
            self.reference_impedance.0
        )
    }
}

fn keyword<'a, T, F>(field: &'static str, token: &'a str, parser: F) -> Result<T, ParseError>
where
    F: Parser<&'a str, Output = T, Error = nom::error::Error<&'a str>>,
{
    all_consuming(parser)
        .parse(token)
        .map(|(_, v)| v)
        .map_err(|_| ParseError::UnknownKeyword {
            field,
            keyword: token.to_string(),
        })
}

fn number(field: &'static str, token: &str) -> Result<f64, ParseError> {
    all_consuming(double::<&str, nom::error::Error<&str>>)
        .parse(token)
        .map(|(_, v)| v)
        .map_err(|_| ParseError::InvalidNumber {
            field,
            token: token.to_string(),
        })
}

// ============================================================================
// Keyword tables (nom 8 compatible)
// ============================================================================

fn frequency_unit(input: &str) -> IResult<&str, FrequencyUnit> {
    alt((
        value(FrequencyUnit::Hz, tag_no_case("HZ")),
        value(FrequencyUnit::KHz, tag_no_case("KHZ")),
        value(FrequencyUnit::MHz, tag_no_case("MHZ")),
        value(FrequencyUnit::GHz, tag_no_case("GHZ")),
    ))
    .parse(input)
}

// Y, Z, H and G files exist but are not supported.
fn parameter_kind(input: &str) -> IResult<&str, ParameterKind> {
    value(ParameterKind::S, tag_no_case("S")).parse(input)
}

fn value_encoding(input: &str) -> IResult<&str, ValueEncoding> {
    alt((
        value(ValueEncoding::RI, tag_no_case("RI")),
        value(ValueEncoding::MA, tag_no_case("MA")),
        value(ValueEncoding::DB, tag_no_case("DB")),
    ))
    .parse(input)
}

fn reference_marker(input: &str) -> IResult<&str, ReferenceMarker> {
    value(ReferenceMarker::R, tag_no_case("R")).parse(input)
}
