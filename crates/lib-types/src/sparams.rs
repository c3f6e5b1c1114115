//! S-parameter (scattering parameter) option keywords and value sets.
//!
//! A Touchstone option line names a frequency unit, a parameter kind, a value
//! encoding and a reference marker. Each keyword maps onto one of the enums
//! below; anything not listed is rejected by the parser.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Frequency unit of the first column of a data line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrequencyUnit {
    Hz,
    KHz,
    MHz,
    GHz,
}

impl FrequencyUnit {
    /// Multiplier converting the file's unit to hertz.
    pub fn scale(&self) -> f64 {
        match self {
            Self::Hz => 1.0,
            Self::KHz => 1e3,
            Self::MHz => 1e6,
            Self::GHz => 1e9,
        }
    }

    /// Option-line keyword (upper case).
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Hz => "HZ",
            Self::KHz => "KHZ",
            Self::MHz => "MHZ",
            Self::GHz => "GHZ",
        }
    }
}

/// Network parameter kind. Only scattering parameters are supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterKind {
    S,
}

/// Reference marker. Only the resistive `R <z0>` form is supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceMarker {
    R,
}

/// Encoding of each value pair in a data line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueEncoding {
    /// Real/Imaginary
    RI,
    /// Magnitude/Angle (degrees)
    MA,
    /// dB/Angle (degrees)
    DB,
}

impl ValueEncoding {
    /// Convert a raw value pair to a complex S-parameter.
    pub fn decode(&self, val1: f64, val2: f64) -> Complex64 {
        match self {
            Self::RI => Complex64::new(val1, val2),
            Self::MA => Complex64::from_polar(val1, val2.to_radians()),
            Self::DB => {
                let magnitude = 10.0_f64.powf(val1 / 20.0);
                Complex64::from_polar(magnitude, val2.to_radians())
            }
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::RI => "RI",
            Self::MA => "MA",
            Self::DB => "DB",
        }
    }
}

/// S-parameters of one frequency sample, in file order.
///
/// One-port files carry `s11` only; two-port files carry
/// `s11, s21, s12, s22`.
#[derive(Clone, Debug, PartialEq)]
pub enum SParameterSet {
    OnePort([Complex64; 1]),
    TwoPort([Complex64; 4]),
}

impl SParameterSet {
    /// Build from decoded values. Returns `None` unless there are exactly
    /// one or four values.
    pub fn from_values(values: &[Complex64]) -> Option<Self> {
        match *values {
            [s11] => Some(Self::OnePort([s11])),
            [s11, s21, s12, s22] => Some(Self::TwoPort([s11, s21, s12, s22])),
            _ => None,
        }
    }

    pub fn port_count(&self) -> usize {
        match self {
            Self::OnePort(_) => 1,
            Self::TwoPort(_) => 2,
        }
    }

    pub fn as_slice(&self) -> &[Complex64] {
        match self {
            Self::OnePort(s) => s,
            Self::TwoPort(s) => s,
        }
    }

    /// Input reflection, always the first value.
    pub fn s11(&self) -> Complex64 {
        self.as_slice()[0]
    }

    pub fn s21(&self) -> Option<Complex64> {
        self.two_port_value(1)
    }

    pub fn s12(&self) -> Option<Complex64> {
        self.two_port_value(2)
    }

    pub fn s22(&self) -> Option<Complex64> {
        self.two_port_value(3)
    }

    fn two_port_value(&self, idx: usize) -> Option<Complex64> {
        match self {
            Self::OnePort(_) => None,
            Self::TwoPort(s) => Some(s[idx]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_encoding_conversion() {
        let ri = ValueEncoding::RI.decode(1.0, 0.5);
        assert!((ri.re - 1.0).abs() < 1e-12);
        assert!((ri.im - 0.5).abs() < 1e-12);

        let ma = ValueEncoding::MA.decode(1.0, 90.0);
        assert!(ma.re.abs() < 1e-10);
        assert!((ma.im - 1.0).abs() < 1e-10);

        // -6.0206 dB is half the magnitude
        let db = ValueEncoding::DB.decode(-6.020599913279624, 180.0);
        assert!((db.re + 0.5).abs() < 1e-10);
        assert!(db.im.abs() < 1e-10);
    }

    #[test]
    fn test_unit_scale() {
        assert_eq!(FrequencyUnit::Hz.scale(), 1.0);
        assert_eq!(FrequencyUnit::KHz.scale(), 1e3);
        assert_eq!(FrequencyUnit::MHz.scale(), 1e6);
        assert_eq!(FrequencyUnit::GHz.scale(), 1e9);
    }

    #[test]
    fn test_parameter_set_shapes() {
        let one = SParameterSet::from_values(&[Complex64::new(0.2, 0.1)]).unwrap();
        assert_eq!(one.port_count(), 1);
        assert_eq!(one.s21(), None);

        let values = [
            Complex64::new(0.1, 0.0),
            Complex64::new(0.9, 0.0),
            Complex64::new(0.8, 0.0),
            Complex64::new(0.2, 0.0),
        ];
        let two = SParameterSet::from_values(&values).unwrap();
        assert_eq!(two.port_count(), 2);
        assert_eq!(two.s11(), values[0]);
        assert_eq!(two.s21(), Some(values[1]));
        assert_eq!(two.s12(), Some(values[2]));
        assert_eq!(two.s22(), Some(values[3]));

        assert!(SParameterSet::from_values(&values[..2]).is_none());
        assert!(SParameterSet::from_values(&[]).is_none());
    }
}
