use super::*;
use crate::calibration::drift::{step_index, DriftCorrector};
use crate::config::CalibrationConfig;
use crate::constants::{REFERENCE_TRUE_D18O, REFERENCE_TRUE_D2H};
use crate::error::PicarroError;
use crate::models::{deuterium_excess, CalibrationPoint, IsotopePair, WindowMean};

fn point(offset: i64, d18o: f64, d2h: f64) -> CalibrationPoint {
    CalibrationPoint {
        timestamp: ts(offset),
        identifier: "VE".to_string(),
        analysis: format!("A{offset}"),
        d18o,
        d18o_sd: 0.05,
        d2h,
        d2h_sd: 0.3,
    }
}

fn window(offset: i64, d18o: f64, d2h: f64) -> WindowMean {
    WindowMean {
        timestamp: ts(offset),
        d18o,
        d2h,
        water_ppm: 15000.0,
    }
}

fn corrector(points: Vec<CalibrationPoint>, markers: Vec<i64>) -> DriftCorrector {
    DriftCorrector::new(
        2021,
        points,
        markers.into_iter().map(ts).collect(),
        &CalibrationConfig::default(),
    )
    .unwrap()
}

#[test]
fn test_step_index_lookup() {
    let times = [ts(100), ts(200), ts(300)];
    assert_eq!(step_index(&times, ts(50)), 0);
    assert_eq!(step_index(&times, ts(100)), 0);
    assert_eq!(step_index(&times, ts(250)), 1);
    assert_eq!(step_index(&times, ts(300)), 2);
    assert_eq!(step_index(&times, ts(350)), 2);
}

#[test]
fn test_calibration_step_function() {
    let drift = corrector(
        vec![point(300, 3.0, 0.0), point(100, 1.0, 0.0), point(200, 2.0, 0.0)],
        vec![],
    );

    assert_eq!(drift.calibration_for(ts(250)).d18o, 2.0);
    assert_eq!(drift.calibration_for(ts(50)).d18o, 1.0);
    assert_eq!(drift.calibration_for(ts(350)).d18o, 3.0);
    assert_eq!(drift.calibration_for(ts(100)).d18o, 1.0);
}

#[test]
fn test_empty_calibration_is_fatal() {
    let result = DriftCorrector::new(2019, vec![], vec![ts(0)], &CalibrationConfig::default());
    assert!(matches!(
        result,
        Err(PicarroError::NoCalibrationPoints { year: 2019 })
    ));
}

#[test]
fn test_memory_exclusion_boundaries() {
    let drift = corrector(vec![point(0, REFERENCE_TRUE_D18O, REFERENCE_TRUE_D2H)], vec![1000]);

    assert!(!drift.is_memory_affected(ts(999)));
    assert!(drift.is_memory_affected(ts(1000)));
    assert!(drift.is_memory_affected(ts(1299)));
    assert!(!drift.is_memory_affected(ts(1300)));
}

#[test]
fn test_exclusion_uses_latest_marker() {
    let drift = corrector(
        vec![point(0, REFERENCE_TRUE_D18O, REFERENCE_TRUE_D2H)],
        vec![1000, 5000],
    );

    assert!(!drift.is_memory_affected(ts(4000)));
    assert!(drift.is_memory_affected(ts(5100)));
    assert!(!drift.is_memory_affected(ts(5300)));
}

#[test]
fn test_correct_drops_affected_windows_in_order() {
    let drift = corrector(
        vec![point(0, REFERENCE_TRUE_D18O, REFERENCE_TRUE_D2H)],
        vec![1000],
    );
    let windows = vec![
        window(500, -10.0, -75.0),
        window(1000, -11.0, -80.0),
        window(1299, -12.0, -85.0),
        window(1300, -13.0, -90.0),
    ];

    let outcome = drift.correct(windows);

    assert_eq!(outcome.excluded, 2);
    let times: Vec<_> = outcome.records.iter().map(|r| r.timestamp).collect();
    assert_eq!(times, vec![ts(500), ts(1300)]);
    // No drift when the reference reads its certified value
    assert_close(outcome.records[0].d18o, -10.0);
    assert_close(outcome.records[1].d2h, -90.0);
}

#[test]
fn test_correct_subtracts_drift() {
    let drift = corrector(
        vec![
            point(0, REFERENCE_TRUE_D18O + 0.5, REFERENCE_TRUE_D2H - 2.0),
            point(10_000, REFERENCE_TRUE_D18O - 0.25, REFERENCE_TRUE_D2H + 1.0),
        ],
        vec![],
    );

    let outcome = drift.correct(vec![window(5_000, -10.0, -75.0), window(20_000, -10.0, -75.0)]);

    assert_close(outcome.records[0].d18o, -10.5);
    assert_close(outcome.records[0].d2h, -73.0);
    assert_close(outcome.records[1].d18o, -9.75);
    assert_close(outcome.records[1].d2h, -76.0);
    assert_close(drift.drift_offset(ts(5_000)).d18o, 0.5);
}

#[test]
fn test_baseline_offset_applied_before_drift() {
    let config = CalibrationConfig::default().with_baseline_offset(IsotopePair::new(0.1, 1.0));
    let drift = DriftCorrector::new(
        2021,
        vec![point(0, REFERENCE_TRUE_D18O, REFERENCE_TRUE_D2H)],
        vec![],
        &config,
    )
    .unwrap();

    let outcome = drift.correct(vec![window(100, -10.0, -75.0)]);

    assert_close(outcome.records[0].d18o, -10.1);
    assert_close(outcome.records[0].d2h, -76.0);
}

#[test]
fn test_deuterium_excess_identity() {
    let drift = corrector(vec![point(0, -8.0, -60.0)], vec![]);
    let windows = (0..5).map(|i| window(i * 600, -10.0 - i as f64, -70.0 - 3.0 * i as f64)).collect();

    let outcome = drift.correct(windows);

    assert_eq!(outcome.records.len(), 5);
    for record in &outcome.records {
        assert_eq!(record.d_excess, deuterium_excess(record.d18o, record.d2h));
        assert_close(record.d_excess, record.d2h - 8.0 * record.d18o);
    }
}
