//! Reference run segmentation and averaging
//!
//! Reference injections are grouped into runs, and every qualifying run is
//! reduced to one calibration point: the settling prefix is dropped and the
//! remaining injection-corrected values are averaged.

use super::injection::injection_corrected;
use crate::config::CalibrationConfig;
use crate::models::{CalibrationPoint, Measurement, Run, SkipSummary};
use crate::timestamp::Timestamp;
use tracing::{debug, warn};

/// Outcome of averaging all reference runs of one year
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceAveraging {
    /// One point per qualifying run, ordered by time
    pub points: Vec<CalibrationPoint>,
    /// End time of every run, qualifying or not
    pub run_end_times: Vec<Timestamp>,
    pub skips: SkipSummary,
}

/// Group reference injections into runs
///
/// Injections are put in time order first; a new run starts whenever the
/// analysis identifier or the port changes. Readings without run bookkeeping
/// are ignored.
pub fn segment_runs(mut measurements: Vec<Measurement>) -> Vec<Run> {
    measurements.sort_by_key(|m| m.timestamp);

    let mut runs: Vec<Run> = Vec::new();
    for measurement in measurements {
        let Some(tag) = measurement.run.as_ref() else {
            debug!(
                "Ignoring untagged reading at {} in standards stream",
                measurement.timestamp
            );
            continue;
        };

        let continues_current = runs
            .last()
            .is_some_and(|run| run.analysis == tag.analysis && run.port == measurement.port);

        if continues_current {
            if let Some(run) = runs.last_mut() {
                run.injections.push(measurement);
            }
        } else {
            runs.push(Run {
                analysis: tag.analysis.clone(),
                port: measurement.port.clone(),
                identifier: tag.identifier.clone(),
                first_of_session: tag.first_of_session,
                injections: vec![measurement],
            });
        }
    }

    runs
}

/// Mean and sample standard deviation of `values[discard..]`
///
/// Returns `None` when fewer than two values remain.
pub fn settled_mean_sd(values: &[f64], discard: usize) -> Option<(f64, f64)> {
    let retained = values.get(discard..)?;
    if retained.len() < 2 {
        return None;
    }

    let n = retained.len() as f64;
    let mean = retained.iter().sum::<f64>() / n;
    let sum_sq: f64 = retained.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some((mean, (sum_sq / (n - 1.0)).sqrt()))
}

/// Reduce one run to a calibration point, or `None` if it does not qualify
pub fn average_run(run: &Run, config: &CalibrationConfig) -> Option<CalibrationPoint> {
    if run.first_of_session || run.len() != config.expected_injections {
        return None;
    }

    let mut d18o = Vec::with_capacity(run.len());
    let mut d2h = Vec::with_capacity(run.len());
    for injection in &run.injections {
        match injection_corrected(injection) {
            Ok((o, h)) => {
                d18o.push(o);
                d2h.push(h);
            }
            Err(e) => {
                warn!("Run {} not averaged: {}", run.analysis, e);
                return None;
            }
        }
    }

    let (d18o_mean, d18o_sd) = settled_mean_sd(&d18o, config.settling_discard)?;
    let (d2h_mean, d2h_sd) = settled_mean_sd(&d2h, config.settling_discard)?;

    Some(CalibrationPoint {
        timestamp: run.end_time()?,
        identifier: run.identifier.clone(),
        analysis: run.analysis.clone(),
        d18o: d18o_mean,
        d18o_sd,
        d2h: d2h_mean,
        d2h_sd,
    })
}

/// Average every qualifying run and collect memory-exclusion markers
pub fn average_reference_runs(runs: &[Run], config: &CalibrationConfig) -> ReferenceAveraging {
    let mut outcome = ReferenceAveraging::default();

    for run in runs {
        if let Some(end) = run.end_time() {
            outcome.run_end_times.push(end);
        }

        if !config.is_reference_identifier(&run.identifier) {
            debug!(
                "Run {} skipped: identifier '{}' is not a configured reference",
                run.analysis, run.identifier
            );
            outcome.skips.non_reference_runs += 1;
            continue;
        }

        if run.first_of_session {
            debug!("Run {} skipped: first of session", run.analysis);
            outcome.skips.first_of_session_runs += 1;
            continue;
        }

        if run.len() != config.expected_injections {
            debug!(
                "Run {} skipped: {} injections, expected {}",
                run.analysis,
                run.len(),
                config.expected_injections
            );
            outcome.skips.incomplete_runs += 1;
            continue;
        }

        match average_run(run, config) {
            Some(point) => {
                debug!(
                    "Calibration point {} ({}): δ18O {:.3} ± {:.3}, δ2H {:.3} ± {:.3}",
                    point.timestamp, point.identifier, point.d18o, point.d18o_sd, point.d2h,
                    point.d2h_sd
                );
                outcome.points.push(point);
            }
            None => outcome.skips.incomplete_runs += 1,
        }
    }

    outcome.points.sort_by_key(|p| p.timestamp);
    outcome.run_end_times.sort();
    outcome
}
