//! Impedance curve of one chip bead.

use crate::error::{BeadError, BeadResult};
use crate::interpolation::{crossover, interpolate_backward, peak_magnitude};
use lib_touchstone::{LineSource, ParseError, TouchstoneDocument};
use lib_types::units::{Henries, Hertz};
use num_complex::Complex64;
use serde::Serialize;

/// Frequency at which the inductance of a part is quoted and ranked.
pub const INDUCTANCE_FREQUENCY: Hertz = Hertz(1e6);

/// Frequency at which datasheets quote the nominal impedance.
pub const IMPEDANCE_FREQUENCY: Hertz = Hertz(100e6);

/// Frequencies listed in a part summary.
pub const SUMMARY_FREQUENCIES: [Hertz; 3] = [Hertz(1e6), Hertz(10e6), Hertz(100e6)];

/// Series impedance of a part over frequency, DC sample excluded.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentCurve {
    name: String,
    frequencies: Vec<Hertz>,
    impedances: Vec<Complex64>,
}

impl ComponentCurve {
    /// Parse a document and keep the series impedance of every non-DC sample
    /// in file order.
    pub fn build<S: LineSource>(document: TouchstoneDocument<S>) -> Result<Self, ParseError> {
        let name = part_name(document.name());
        let points = document.into_points()?;

        let mut frequencies = Vec::with_capacity(points.len());
        let mut impedances = Vec::with_capacity(points.len());
        // sometimes the DC value is there, throw it away
        for point in points.iter().filter(|p| p.frequency.0 > 0.0) {
            frequencies.push(point.frequency);
            impedances.push(point.series_impedance);
        }

        Ok(Self {
            name,
            frequencies,
            impedances,
        })
    }

    /// Curve from already computed samples. Non-positive frequencies are
    /// dropped the same way `build` drops them.
    pub fn from_samples(
        name: impl Into<String>,
        frequencies: Vec<Hertz>,
        impedances: Vec<Complex64>,
    ) -> BeadResult<Self> {
        if frequencies.len() != impedances.len() {
            return Err(BeadError::LengthMismatch {
                expected: frequencies.len(),
                actual: impedances.len(),
            });
        }

        let (frequencies, impedances) = frequencies
            .into_iter()
            .zip(impedances)
            .filter(|(f, _)| f.0 > 0.0)
            .unzip();

        Ok(Self {
            name: name.into(),
            frequencies,
            impedances,
        })
    }

    /// Part identifier: the file name without directory and extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frequencies(&self) -> &[Hertz] {
        &self.frequencies
    }

    pub fn impedances(&self) -> &[Complex64] {
        &self.impedances
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Complex impedance at `freq`, linearly interpolated.
    ///
    /// `None` above the highest sample; the lowest sample is returned for any
    /// frequency at or below it.
    pub fn impedance_at(&self, freq: Hertz) -> Option<Complex64> {
        interpolate_backward(&self.frequencies, &self.impedances, freq)
    }

    /// Inductance at `freq`: `imag(Z(freq)) / (2 pi freq)`.
    pub fn inductance_at(&self, freq: Hertz) -> Option<Henries> {
        self.impedance_at(freq)
            .map(|z| Henries::from_reactance(z.im, freq))
    }

    /// X = R cross point (interpolated).
    pub fn crossover_frequency(&self) -> Option<Hertz> {
        crossover(&self.frequencies, &self.impedances)
    }

    /// Maximum `|Z|` and the frequency it occurs at.
    pub fn peak_impedance(&self) -> Option<(f64, Hertz)> {
        peak_magnitude(&self.frequencies, &self.impedances)
    }

    /// Frequencies in MHz.
    pub fn mhz(&self) -> Vec<f64> {
        self.frequencies.iter().map(|f| f.as_mhz()).collect()
    }

    /// Resistance (real part) per sample.
    pub fn resistance(&self) -> Vec<f64> {
        self.impedances.iter().map(|z| z.re).collect()
    }

    /// Reactance (imaginary part) per sample.
    pub fn reactance(&self) -> Vec<f64> {
        self.impedances.iter().map(|z| z.im).collect()
    }

    /// `|Z|` per sample.
    pub fn magnitude(&self) -> Vec<f64> {
        self.impedances.iter().map(|z| z.norm()).collect()
    }

    /// Parallel series handed to a plotting backend.
    pub fn plot_series(&self) -> PlotSeries {
        PlotSeries {
            name: self.name.clone(),
            mhz: self.mhz(),
            resistance: self.resistance(),
            reactance: self.reactance(),
            magnitude: self.magnitude(),
        }
    }

    /// Key figures of the part for reporting.
    pub fn summary(&self) -> CurveSummary {
        let peak = self.peak_impedance();
        let [f1, f10, f100] = SUMMARY_FREQUENCIES;
        let magnitude_at = |f| self.impedance_at(f).map(|z| z.norm());

        CurveSummary {
            name: self.name.clone(),
            inductance_1mhz: self.inductance_at(INDUCTANCE_FREQUENCY),
            crossover: self.crossover_frequency(),
            peak_impedance: peak.map(|(m, _)| m),
            peak_frequency: peak.map(|(_, f)| f),
            impedance_1mhz: magnitude_at(f1),
            impedance_10mhz: magnitude_at(f10),
            impedance_100mhz: magnitude_at(f100),
        }
    }
}

/// Plot data of one part: frequency in MHz against R, X and |Z| in ohms.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlotSeries {
    pub name: String,
    pub mhz: Vec<f64>,
    pub resistance: Vec<f64>,
    pub reactance: Vec<f64>,
    pub magnitude: Vec<f64>,
}

/// Key figures of one part.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CurveSummary {
    pub name: String,
    pub inductance_1mhz: Option<Henries>,
    pub crossover: Option<Hertz>,
    pub peak_impedance: Option<f64>,
    pub peak_frequency: Option<Hertz>,
    pub impedance_1mhz: Option<f64>,
    pub impedance_10mhz: Option<f64>,
    pub impedance_100mhz: Option<f64>,
}

/// Part name from a member or file name: `sparam/BLM18AG331SN1.s2p` ->
/// `BLM18AG331SN1`.
pub fn part_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name);
    match base.rfind('.') {
        Some(idx) if idx > 0 => base[..idx].to_string(),
        _ => base.to_string(),
    }
}
