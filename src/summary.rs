//! Per-year exploratory statistics of the corrected series
//!
//! Everything here is derived from a finished [`YearResult`]: value ranges,
//! humidity band counts, local meteoric water lines overall and per season,
//! monthly means and the monthly δ18O to air temperature relation, the
//! normalised diurnal cycle, and the spread of the calibration points.

use crate::calibration::YearResult;
use crate::constants::{HUMIDITY_BAND_HIGH, HUMIDITY_BAND_LOW, HUMIDITY_BAND_VERY_LOW};
use crate::models::{CalibrationPoint, CorrectedRecord, MergedRecord, SkipSummary};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Smallest and largest value of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |range, v| {
            Some(match range {
                None => ValueRange { min: v, max: v },
                Some(r) => ValueRange {
                    min: r.min.min(v),
                    max: r.max.max(v),
                },
            })
        })
    }
}

/// Record counts per water-vapour concentration band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HumidityBands {
    /// At or below 10000 ppm
    pub dry: usize,
    /// At or above 25000 ppm
    pub humid: usize,
    /// At or below 7000 ppm
    pub very_dry: usize,
}

impl HumidityBands {
    pub fn count(records: &[CorrectedRecord]) -> Self {
        records.iter().fold(Self::default(), |mut bands, r| {
            if r.water_ppm <= HUMIDITY_BAND_LOW {
                bands.dry += 1;
            }
            if r.water_ppm >= HUMIDITY_BAND_HIGH {
                bands.humid += 1;
            }
            if r.water_ppm <= HUMIDITY_BAND_VERY_LOW {
                bands.very_dry += 1;
            }
            bands
        })
    }
}

/// Ordinary least-squares line `y = intercept + slope * x`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub intercept: f64,
    pub intercept_se: f64,
    pub slope: f64,
    pub slope_se: f64,
    pub points: usize,
}

/// Fit a straight line through `(x, y)`
///
/// Needs at least three points and some spread in `x`, otherwise the
/// parameter errors are undefined and `None` is returned.
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    let n = x.len().min(y.len());
    if n < 3 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let nf = n as f64;

    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;
    let sxx: f64 = x.iter().map(|v| (v - x_mean).powi(2)).sum();
    if sxx <= f64::EPSILON {
        return None;
    }
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| (a - x_mean) * (b - y_mean)).sum();

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let residual: f64 = x
        .iter()
        .zip(y)
        .map(|(a, b)| (b - intercept - slope * a).powi(2))
        .sum();
    let variance = residual / (nf - 2.0);

    Some(LinearFit {
        intercept,
        intercept_se: (variance * (1.0 / nf + x_mean * x_mean / sxx)).sqrt(),
        slope,
        slope_se: (variance / sxx).sqrt(),
        points: n,
    })
}

/// Meteorological season
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Autumn];

    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Season::Winter => "DJF",
            Season::Spring => "MAM",
            Season::Summer => "JJA",
            Season::Autumn => "SON",
        };
        write!(f, "{}", label)
    }
}

/// Water line of one season
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeasonalFit {
    pub season: Season,
    pub records: usize,
    pub fit: Option<LinearFit>,
    /// Mean ventilated air temperature of the matched station records
    pub mean_temperature: Option<f64>,
}

/// Means of one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyMean {
    pub month: u32,
    pub count: usize,
    pub d18o: f64,
    pub d2h: f64,
    /// Mean ventilated air temperature of the month's matched station records
    pub ventilated_temperature: Option<f64>,
}

/// Ventilated air temperature against δ18O within one month
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureFit {
    pub month: u32,
    pub pairs: usize,
    /// `temperature = intercept + slope * δ18O`
    pub fit: Option<LinearFit>,
}

/// Monthly means of the corrected series, for every month that has records
pub fn monthly_means(
    records: &[CorrectedRecord],
    merged: Option<&[MergedRecord]>,
) -> Vec<MonthlyMean> {
    let mut months: BTreeMap<u32, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for record in records {
        let (d18o, d2h) = months.entry(record.timestamp.month()).or_default();
        d18o.push(record.d18o);
        d2h.push(record.d2h);
    }

    let mut temperatures: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for m in merged.unwrap_or_default() {
        temperatures
            .entry(m.record.timestamp.month())
            .or_default()
            .push(m.meteo.ventilated_temperature);
    }

    months
        .into_iter()
        .map(|(month, (d18o, d2h))| MonthlyMean {
            month,
            count: d18o.len(),
            d18o: mean_sd(&d18o).0,
            d2h: mean_sd(&d2h).0,
            ventilated_temperature: temperatures.get(&month).map(|t| mean_sd(t).0),
        })
        .collect()
}

/// Per-month fit of the matched ventilated temperature against δ18O
pub fn temperature_fits(merged: &[MergedRecord]) -> Vec<TemperatureFit> {
    let mut months: BTreeMap<u32, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for m in merged {
        let (d18o, temperature) = months.entry(m.record.timestamp.month()).or_default();
        d18o.push(m.record.d18o);
        temperature.push(m.meteo.ventilated_temperature);
    }

    months
        .into_iter()
        .map(|(month, (d18o, temperature))| TemperatureFit {
            month,
            pairs: d18o.len(),
            fit: fit_line(&d18o, &temperature),
        })
        .collect()
}

/// Hourly mean of one quantity, raw and normalised to the mean of all hours
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourlyLevel {
    pub hour: u32,
    pub count: usize,
    pub mean: f64,
    pub standard_error: f64,
    pub normalised: f64,
    pub normalised_error: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiurnalCycle {
    pub d18o: Vec<HourlyLevel>,
    pub d2h: Vec<HourlyLevel>,
    pub d_excess: Vec<HourlyLevel>,
}

fn mean_sd(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (mean, (sum_sq / (n - 1.0)).sqrt())
}

/// Hourly levels of `value`, for every clock hour that has records
///
/// Normalisation divides by the mean `m` of the hourly means; the error of
/// `y / m` combines the hour's standard error with the spread `s` of the
/// hourly means: `sqrt((e / m)^2 + (s * y / m^2)^2)`.
pub fn hourly_levels(
    records: &[CorrectedRecord],
    value: impl Fn(&CorrectedRecord) -> f64,
) -> Vec<HourlyLevel> {
    let mut buckets: [Vec<f64>; 24] = std::array::from_fn(|_| Vec::new());
    for record in records {
        buckets[record.timestamp.hour() as usize].push(value(record));
    }

    let mut levels: Vec<HourlyLevel> = buckets
        .iter()
        .enumerate()
        .filter(|(_, bucket)| !bucket.is_empty())
        .map(|(hour, bucket)| {
            let (mean, sd) = mean_sd(bucket);
            HourlyLevel {
                hour: hour as u32,
                count: bucket.len(),
                mean,
                standard_error: sd / (bucket.len() as f64).sqrt(),
                normalised: 0.0,
                normalised_error: 0.0,
            }
        })
        .collect();

    let means: Vec<f64> = levels.iter().map(|l| l.mean).collect();
    let (grand_mean, spread) = mean_sd(&means);
    if grand_mean == 0.0 {
        debug!("Hourly means average to zero; diurnal cycle left unnormalised");
        return levels;
    }

    for level in &mut levels {
        level.normalised = level.mean / grand_mean;
        level.normalised_error = ((level.standard_error / grand_mean).powi(2)
            + (spread * level.mean / (grand_mean * grand_mean)).powi(2))
        .sqrt();
    }
    levels
}

impl DiurnalCycle {
    pub fn from_records(records: &[CorrectedRecord]) -> Self {
        Self {
            d18o: hourly_levels(records, |r| r.d18o),
            d2h: hourly_levels(records, |r| r.d2h),
            d_excess: hourly_levels(records, |r| r.d_excess),
        }
    }
}

/// Mean and sample standard deviation of the calibration points
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CalibrationStats {
    pub points: usize,
    pub d18o_mean: f64,
    pub d18o_sd: f64,
    pub d2h_mean: f64,
    pub d2h_sd: f64,
}

impl CalibrationStats {
    pub fn from_points(points: &[CalibrationPoint]) -> Self {
        let d18o: Vec<f64> = points.iter().map(|p| p.d18o).collect();
        let d2h: Vec<f64> = points.iter().map(|p| p.d2h).collect();
        let (d18o_mean, d18o_sd) = mean_sd(&d18o);
        let (d2h_mean, d2h_sd) = mean_sd(&d2h);
        Self {
            points: points.len(),
            d18o_mean,
            d18o_sd,
            d2h_mean,
            d2h_sd,
        }
    }
}

/// Statistics of one evaluated year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub records: usize,
    pub d18o: Option<ValueRange>,
    pub d2h: Option<ValueRange>,
    pub water_ppm: Option<ValueRange>,
    pub humidity: HumidityBands,
    pub water_line: Option<LinearFit>,
    pub seasons: Vec<SeasonalFit>,
    pub monthly: Vec<MonthlyMean>,
    /// Empty without meteorological input
    pub temperature_fits: Vec<TemperatureFit>,
    pub diurnal: DiurnalCycle,
    pub calibration: CalibrationStats,
    pub skips: SkipSummary,
}

impl YearSummary {
    /// Summarise a year, using `merged` for seasonal station temperatures
    pub fn build(result: &YearResult, merged: Option<&[MergedRecord]>) -> Self {
        let records = &result.records;
        let d18o: Vec<f64> = records.iter().map(|r| r.d18o).collect();
        let d2h: Vec<f64> = records.iter().map(|r| r.d2h).collect();

        let seasons = Season::ALL
            .iter()
            .map(|&season| {
                let (x, y): (Vec<f64>, Vec<f64>) = records
                    .iter()
                    .filter(|r| Season::from_month(r.timestamp.month()) == season)
                    .map(|r| (r.d18o, r.d2h))
                    .unzip();
                let temperatures: Vec<f64> = merged
                    .unwrap_or_default()
                    .iter()
                    .filter(|m| Season::from_month(m.meteo.timestamp.month()) == season)
                    .map(|m| m.meteo.ventilated_temperature)
                    .collect();
                SeasonalFit {
                    season,
                    records: x.len(),
                    fit: fit_line(&x, &y),
                    mean_temperature: (!temperatures.is_empty()).then(|| mean_sd(&temperatures).0),
                }
            })
            .collect();

        Self {
            year: result.year,
            records: records.len(),
            d18o: ValueRange::of(d18o.iter().copied()),
            d2h: ValueRange::of(d2h.iter().copied()),
            water_ppm: ValueRange::of(records.iter().map(|r| r.water_ppm)),
            humidity: HumidityBands::count(records),
            water_line: fit_line(&d18o, &d2h),
            seasons,
            monthly: monthly_means(records, merged),
            temperature_fits: merged.map(temperature_fits).unwrap_or_default(),
            diurnal: DiurnalCycle::from_records(records),
            calibration: CalibrationStats::from_points(&result.calibration),
            skips: result.skips,
        }
    }

    /// Write the headline numbers to the log
    pub fn log(&self) {
        info!(
            "Year {}: {} corrected records, {} calibration points (δ18O {:.3} ± {:.3}, δ2H {:.3} ± {:.3})",
            self.year,
            self.records,
            self.calibration.points,
            self.calibration.d18o_mean,
            self.calibration.d18o_sd,
            self.calibration.d2h_mean,
            self.calibration.d2h_sd
        );
        if let Some(fit) = &self.water_line {
            info!(
                "Year {}: LMWL δ2H = ({:.2} ± {:.2}) + ({:.3} ± {:.3})·δ18O",
                self.year, fit.intercept, fit.intercept_se, fit.slope, fit.slope_se
            );
        }
        for season in &self.seasons {
            if let Some(fit) = &season.fit {
                debug!(
                    "Year {} {}: {} records, slope {:.3} ± {:.3}",
                    self.year, season.season, season.records, fit.slope, fit.slope_se
                );
            }
        }
        for month in &self.monthly {
            debug!(
                "Year {} month {:02}: {} records, δ18O {:.3}, δ2H {:.3}, ventilated temperature {:?}",
                self.year, month.month, month.count, month.d18o, month.d2h, month.ventilated_temperature
            );
        }
        for month in &self.temperature_fits {
            if let Some(fit) = &month.fit {
                debug!(
                    "Year {} month {:02}: temperature = {:.2} + {:.3}·δ18O over {} pairs",
                    self.year, month.month, fit.intercept, fit.slope, month.pairs
                );
            }
        }
        info!(
            "Year {}: humidity bands <=10000 ppm: {}, >=25000 ppm: {}, <=7000 ppm: {}",
            self.year, self.humidity.dry, self.humidity.humid, self.humidity.very_dry
        );
        for (label, count) in self.skips.entries() {
            info!("Year {}: skipped {} {}", self.year, count, label);
        }
    }
}
