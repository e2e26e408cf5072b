//! Fixed-size block averaging of ambient injections

use crate::models::{Measurement, WindowMean};

/// Window means plus the number of injections left in a trailing partial block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowAveraging {
    pub means: Vec<WindowMean>,
    pub discarded_tail: usize,
}

/// Average consecutive, non-overlapping blocks of `window_size` injections
///
/// Each mean is stamped with the block's middle element (index
/// `window_size / 2`), and a trailing block shorter than `window_size` is
/// dropped. Input order is preserved.
pub fn average_windows(measurements: &[Measurement], window_size: usize) -> WindowAveraging {
    if window_size == 0 {
        return WindowAveraging {
            means: Vec::new(),
            discarded_tail: measurements.len(),
        };
    }

    let blocks = measurements.chunks_exact(window_size);
    let discarded_tail = blocks.remainder().len();
    let n = window_size as f64;

    let means = blocks
        .map(|block| {
            let (d18o, d2h, water) = block.iter().fold((0.0, 0.0, 0.0), |acc, m| {
                (acc.0 + m.d18o, acc.1 + m.d2h, acc.2 + m.water_ppm)
            });
            WindowMean {
                timestamp: block[window_size / 2].timestamp,
                d18o: d18o / n,
                d2h: d2h / n,
                water_ppm: water / n,
            }
        })
        .collect();

    WindowAveraging {
        means,
        discarded_tail,
    }
}
