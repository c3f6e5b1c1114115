//! Frequency-indexed lookups on sampled impedance curves.
//!
//! All functions take parallel `freqs`/`values` slices sorted by ascending
//! frequency and scan them linearly.

use lib_types::units::Hertz;
use num_complex::Complex64;

/// Index of the first sample at or above `target`.
pub fn first_at_or_above(freqs: &[Hertz], target: Hertz) -> Option<usize> {
    freqs.iter().position(|f| f.0 >= target.0)
}

/// Value at `target`, interpolated from the bracketing sample pair.
///
/// With `i` the first sample at or above `target`:
/// - `None` when no such sample exists (no extrapolation above the range),
/// - `values[0]` when `i == 0` (no extrapolation below the range),
/// - otherwise `z[i-1] + t * (z[i-1] - z[i])` with
///   `t = (target - f[i]) / (f[i-1] - f[i])`.
///
/// The last form steps away from `z[i-1]` rather than towards `z[i]`; ranking
/// results depend on it, so it is kept as is.
pub fn interpolate_backward(freqs: &[Hertz], values: &[Complex64], target: Hertz) -> Option<Complex64> {
    let i = first_at_or_above(freqs, target)?;
    if i == 0 {
        return values.first().copied();
    }

    let t = (target.0 - freqs[i].0) / (freqs[i - 1].0 - freqs[i].0);
    Some(values[i - 1] + (values[i - 1] - values[i]) * t)
}

/// Frequency where reactance falls back to resistance (X = R).
///
/// The scan arms once a sample with `X > R` is seen; the first later sample
/// with `R >= X` closes the crossing, and the intersection of the straight
/// lines through the two samples' X and R is returned. `None` if there is no
/// crossing or the lines are parallel.
pub fn crossover(freqs: &[Hertz], values: &[Complex64]) -> Option<Hertz> {
    let mut x_was_above_r = false;

    for (i, z) in values.iter().enumerate() {
        if z.im > z.re {
            // at low frequency X may well be below R, so wait for it to rise first
            x_was_above_r = true;
        }

        if x_was_above_r && z.re >= z.im {
            let (f0, f1) = (freqs[i - 1].0, freqs[i].0);
            let delta_z = values[i] - values[i - 1];
            let delta_xy = values[i - 1] * f1 - values[i] * f0;

            let denominator = delta_z.im - delta_z.re;
            if denominator == 0.0 {
                return None;
            }

            let freq = (delta_xy.re - delta_xy.im) / denominator;
            debug_assert!(
                freq <= f1 + rounding_slack(f0, f1, values[i - 1], values[i], denominator),
                "crossover {} Hz lies above its closing sample {} Hz",
                freq,
                f1
            );
            return Some(Hertz(freq));
        }
    }

    None
}

/// Forward rounding bound of the crossover formula for one sample pair.
///
/// When X = R at the closing sample the intersection is the closing frequency
/// itself, but the numerator cancels and may land a few ulps of its operands
/// past it.
fn rounding_slack(f0: f64, f1: f64, z0: Complex64, z1: Complex64, denominator: f64) -> f64 {
    let numerator = f1 * (z0.re.abs() + z0.im.abs()) + f0 * (z1.re.abs() + z1.im.abs());
    let spread = z0.re.abs() + z0.im.abs() + z1.re.abs() + z1.im.abs();
    8.0 * f64::EPSILON * (numerator + f1 * spread) / denominator.abs()
}

/// Largest `|z|` and its frequency; the first sample wins on ties.
pub fn peak_magnitude(freqs: &[Hertz], values: &[Complex64]) -> Option<(f64, Hertz)> {
    let mut best: Option<(f64, Hertz)> = None;
    for (f, z) in freqs.iter().zip(values) {
        let magnitude = z.norm();
        if best.map_or(true, |(m, _)| magnitude > m) {
            best = Some((magnitude, *f));
        }
    }
    best
}
