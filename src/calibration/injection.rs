//! Injection-position and humidity corrections
//!
//! Both corrections are additive terms in ‰. The injection correction removes
//! the memory carried into the first injections of a run; the humidity
//! correction normalises the concentration-dependent bias of the analyzer
//! to a 10000 ppm reference.

use crate::constants::{
    D18O_HUMIDITY_COEFFICIENTS, D18O_INJECTION_CORRECTION, D2H_HUMIDITY_COEFFICIENTS,
    D2H_INJECTION_CORRECTION, HUMIDITY_REFERENCE_PPM,
};
use crate::error::{PicarroError, Result};
use crate::models::{Isotope, Measurement};

/// Additive correction for the `injection`-th injection of a run (1-based)
///
/// Injections beyond the end of the correction table need no correction.
pub fn injection_correction(isotope: Isotope, injection: u32) -> Result<f64> {
    if injection == 0 {
        return Err(PicarroError::InvalidInjectionIndex { index: injection });
    }

    let table = match isotope {
        Isotope::Oxygen18 => &D18O_INJECTION_CORRECTION,
        Isotope::Hydrogen2 => &D2H_INJECTION_CORRECTION,
    };

    Ok(table
        .get(injection as usize - 1)
        .copied()
        .unwrap_or(0.0))
}

/// Additive correction for a reading taken at `water_ppm`
///
/// A concentration of exactly zero means "no reading" and is left alone, as
/// is anything at or above the reference concentration.
pub fn humidity_correction(isotope: Isotope, water_ppm: f64) -> f64 {
    if water_ppm >= HUMIDITY_REFERENCE_PPM || water_ppm == 0.0 {
        return 0.0;
    }

    let (d0, a) = match isotope {
        Isotope::Oxygen18 => D18O_HUMIDITY_COEFFICIENTS,
        Isotope::Hydrogen2 => D2H_HUMIDITY_COEFFICIENTS,
    };

    (d0 - a / HUMIDITY_REFERENCE_PPM) - (d0 - a / water_ppm)
}

/// Apply the humidity correction to every reading of an ambient series
pub fn humidity_correct(measurements: Vec<Measurement>) -> Vec<Measurement> {
    measurements
        .into_iter()
        .map(|mut m| {
            m.d18o += humidity_correction(Isotope::Oxygen18, m.water_ppm);
            m.d2h += humidity_correction(Isotope::Hydrogen2, m.water_ppm);
            m
        })
        .collect()
}

/// Injection-corrected `(δ18O, δ2H)` of a reference injection
pub fn injection_corrected(measurement: &Measurement) -> Result<(f64, f64)> {
    let injection = measurement.run.as_ref().map(|tag| tag.injection).unwrap_or(0);
    Ok((
        measurement.d18o + injection_correction(Isotope::Oxygen18, injection)?,
        measurement.d2h + injection_correction(Isotope::Hydrogen2, injection)?,
    ))
}
