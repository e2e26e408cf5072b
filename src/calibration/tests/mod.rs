//! Unit tests for the calibration stages
//!
//! Shared builders for synthetic reference runs and ambient series live here;
//! each stage has its own test file.

pub mod drift_tests;
pub mod window_tests;

use crate::models::{Measurement, RunTag};
use crate::timestamp::Timestamp;

/// Seconds offset from 2021-06-01 00:00:00
pub fn ts(offset_secs: i64) -> Timestamp {
    let base = Timestamp::from_ymd_hms(2021, 6, 1, 0, 0, 0).unwrap();
    Timestamp::from_epoch_seconds(base.epoch_seconds() + offset_secs).unwrap()
}

pub fn reference_injection(
    analysis: &str,
    injection: u32,
    timestamp: Timestamp,
    d18o: f64,
    d2h: f64,
    first_of_session: bool,
) -> Measurement {
    Measurement {
        timestamp,
        port: "2-1".to_string(),
        water_ppm: 20000.0,
        d18o,
        d2h,
        run: Some(RunTag {
            analysis: analysis.to_string(),
            identifier: "VE".to_string(),
            injection,
            first_of_session,
        }),
    }
}

/// Injections 1..=n of one run, one minute apart starting at `start`
pub fn reference_run(analysis: &str, start: i64, d18o: &[f64], d2h: &[f64]) -> Vec<Measurement> {
    d18o.iter()
        .zip(d2h)
        .enumerate()
        .map(|(i, (o, h))| {
            reference_injection(
                analysis,
                i as u32 + 1,
                ts(start + 60 * i as i64),
                *o,
                *h,
                false,
            )
        })
        .collect()
}

/// `count` ambient readings `step` seconds apart at 15000 ppm (no humidity correction)
pub fn ambient_series(start: i64, count: usize, step: i64, d18o: impl Fn(usize) -> f64) -> Vec<Measurement> {
    (0..count)
        .map(|i| {
            let o = d18o(i);
            Measurement::ambient(ts(start + step * i as i64), 15000.0, o, 8.0 * o + 10.0)
        })
        .collect()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
