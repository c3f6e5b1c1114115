//! One frequency sample of a Touchstone file and its derived impedances.

use crate::error::{DomainError, ParseError};
use crate::header::FormatHeader;
use lib_types::{
    sparams::SParameterSet,
    units::{Henries, Hertz, Ohms},
    Complex64,
};

/// A decoded data line.
///
/// The measured element is assumed to sit in series between port 1 and
/// port 2 (`1 --@@@-- 2`). On two-port files the load of port 2 is subtracted
/// from the input impedance to recover the element itself.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasurementPoint {
    /// Frequency in hertz (may be 0 for a DC sample).
    pub frequency: Hertz,

    /// `s11` or `s11, s21, s12, s22`.
    pub s_parameters: SParameterSet,

    /// Far-port load: 0 for one-port, Z0 for two-port data.
    pub termination_impedance: Ohms,

    /// `Z0 * (1 + s11) / (1 - s11)`.
    pub input_impedance: Complex64,

    /// Input impedance minus the termination impedance.
    pub series_impedance: Complex64,

    /// `imag(series_impedance) / (2 pi f)`; `None` for a 0 Hz sample.
    pub series_inductance: Option<Henries>,
}

impl MeasurementPoint {
    /// Decode one data line: `[f, v1, v2]` or `[f, v1, v2, ..., v8]`.
    pub fn decode(header: &FormatHeader, raw: &[f64]) -> Result<Self, ParseError> {
        if raw.len() != 3 && raw.len() != 9 {
            return Err(ParseError::DataValueCount(raw.len()));
        }

        let frequency = Hertz(header.frequency_scale() * raw[0]);

        let values: Vec<Complex64> = raw[1..]
            .chunks_exact(2)
            .map(|pair| header.decode_value(pair[0], pair[1]))
            .collect();
        let s_parameters =
            SParameterSet::from_values(&values).ok_or(ParseError::DataValueCount(raw.len()))?;

        let z0 = header.reference_impedance;
        let termination_impedance = match s_parameters.port_count() {
            1 => Ohms::ZERO,
            _ => z0,
        };

        let input_impedance = input_impedance(s_parameters.s11(), z0)?;
        let series_impedance = input_impedance - termination_impedance.0;
        let series_inductance = if frequency.is_dc() {
            None
        } else {
            Some(Henries::from_reactance(series_impedance.im, frequency))
        };

        Ok(Self {
            frequency,
            s_parameters,
            termination_impedance,
            input_impedance,
            series_impedance,
            series_inductance,
        })
    }

    /// 1 for `.s1p` data, 2 for `.s2p` data.
    pub fn port_count(&self) -> usize {
        self.s_parameters.port_count()
    }

    pub fn s11(&self) -> Complex64 {
        self.s_parameters.s11()
    }
}

/// Reflection-to-impedance transform of a one-port.
pub fn input_impedance(s11: Complex64, z0: Ohms) -> Result<Complex64, DomainError> {
    let one = Complex64::new(1.0, 0.0);
    if s11 == one {
        return Err(DomainError::UnitReflection);
    }
    Ok((one + s11) / (one - s11) * z0.0)
}
