//! Nearest-in-time merge of corrected records with the meteorological log

use crate::models::{CorrectedRecord, MergedRecord, MeteoRecord};
use crate::timestamp::Timestamp;
use tracing::{debug, info};

/// Merged series plus the number of records without a station match
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeteoMerge {
    pub merged: Vec<MergedRecord>,
    pub unmatched: usize,
}

/// Index of the observation nearest to `t`, ties going to the earlier one
///
/// `times` must be sorted ascending.
fn nearest_index(times: &[Timestamp], t: Timestamp) -> Option<usize> {
    let after = times.partition_point(|time| *time < t);
    let before = after.checked_sub(1);

    match (before, times.get(after)) {
        (None, None) => None,
        (Some(b), None) => Some(b),
        (None, Some(_)) => Some(after),
        (Some(b), Some(next)) => {
            if t.seconds_since(times[b]) <= next.seconds_since(t) {
                Some(b)
            } else {
                Some(after)
            }
        }
    }
}

/// Pair every record with the observation nearest in time within `tolerance_secs`
///
/// Records without an observation inside the tolerance are dropped from the
/// merged series and counted. Record order is preserved.
pub fn merge_meteo(
    records: &[CorrectedRecord],
    mut meteo: Vec<MeteoRecord>,
    tolerance_secs: i64,
) -> MeteoMerge {
    meteo.sort_by_key(|m| m.timestamp);
    let times: Vec<Timestamp> = meteo.iter().map(|m| m.timestamp).collect();

    let mut outcome = MeteoMerge::default();
    for record in records {
        let matched = nearest_index(&times, record.timestamp)
            .filter(|&i| record.timestamp.seconds_since(times[i]).abs() <= tolerance_secs);

        match matched {
            Some(i) => outcome.merged.push(MergedRecord {
                record: *record,
                meteo: meteo[i],
            }),
            None => {
                debug!("No meteorological record near {}", record.timestamp);
                outcome.unmatched += 1;
            }
        }
    }

    info!(
        "Meteorological merge: {} of {} records matched",
        outcome.merged.len(),
        records.len()
    );
    outcome
}
