//! Physical units with type safety.
//!
//! These newtypes keep frequencies, impedances and inductances apart so a
//! value in hertz is never compared against a window expressed in ohms.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Frequency in Hertz.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Hertz(pub f64);

impl Hertz {
    #[inline]
    pub fn from_mhz(mhz: f64) -> Self {
        Self(mhz * 1e6)
    }

    #[inline]
    pub fn as_mhz(&self) -> f64 {
        self.0 * 1e-6
    }

    /// Angular frequency (omega = 2 * pi * f).
    #[inline]
    pub fn angular(&self) -> f64 {
        2.0 * std::f64::consts::PI * self.0
    }

    /// True for the DC sample some vendors put at the top of their files.
    #[inline]
    pub fn is_dc(&self) -> bool {
        self.0 == 0.0
    }
}

impl fmt::Display for Hertz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

/// Impedance in Ohms.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Ohms(pub f64);

impl Ohms {
    pub const ZERO: Self = Self(0.0);
}

/// Inductance in Henries.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Henries(pub f64);

impl Henries {
    /// Inductance equivalent to a reactance at a frequency: X / (2 * pi * f).
    #[inline]
    pub fn from_reactance(reactance: f64, freq: Hertz) -> Self {
        Self(reactance / freq.angular())
    }
}

impl fmt::Display for Henries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} H", self.0)
    }
}

/// Inclusive acceptance window `[min, max]`.
///
/// Serialized as a two element array so parameter files can write
/// `impedance = [270.0, 360.0]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `min <= value <= max`. NaN is never inside.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn is_empty(&self) -> bool {
        !(self.min <= self.max)
    }
}

impl From<(f64, f64)> for Bounds {
    fn from((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }
}

impl From<Bounds> for (f64, f64) {
    fn from(b: Bounds) -> Self {
        (b.min, b.max)
    }
}
