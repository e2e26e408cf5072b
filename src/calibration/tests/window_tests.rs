use super::*;
use crate::calibration::window::average_windows;

#[test]
fn test_full_windows_stamped_at_middle() {
    let series = ambient_series(0, 180, 10, |i| i as f64);

    let averaging = average_windows(&series, 60);

    assert_eq!(averaging.means.len(), 3);
    assert_eq!(averaging.discarded_tail, 0);
    assert_eq!(averaging.means[0].timestamp, ts(300));
    assert_eq!(averaging.means[1].timestamp, ts(900));
    assert_eq!(averaging.means[2].timestamp, ts(1500));
    assert_close(averaging.means[0].d18o, 29.5);
    assert_close(averaging.means[2].d18o, 149.5);
    assert_close(averaging.means[1].d2h, 8.0 * 89.5 + 10.0);
    assert_close(averaging.means[1].water_ppm, 15000.0);
}

#[test]
fn test_partial_tail_dropped() {
    let series = ambient_series(0, 170, 10, |_| -12.0);

    let averaging = average_windows(&series, 60);

    assert_eq!(averaging.means.len(), 2);
    assert_eq!(averaging.discarded_tail, 50);
}

#[test]
fn test_short_series_yields_no_windows() {
    let series = ambient_series(0, 59, 10, |_| -12.0);

    let averaging = average_windows(&series, 60);

    assert!(averaging.means.is_empty());
    assert_eq!(averaging.discarded_tail, 59);
    assert!(average_windows(&[], 60).means.is_empty());
}

#[test]
fn test_zero_window_size_yields_nothing() {
    let series = ambient_series(0, 10, 10, |_| -12.0);

    let averaging = average_windows(&series, 0);

    assert!(averaging.means.is_empty());
    assert_eq!(averaging.discarded_tail, 10);
}

#[test]
fn test_odd_window_size_middle_element() {
    let series = ambient_series(0, 6, 1, |i| i as f64);

    let averaging = average_windows(&series, 3);

    assert_eq!(averaging.means.len(), 2);
    assert_eq!(averaging.means[0].timestamp, ts(1));
    assert_eq!(averaging.means[1].timestamp, ts(4));
    assert_close(averaging.means[1].d18o, 4.0);
}
