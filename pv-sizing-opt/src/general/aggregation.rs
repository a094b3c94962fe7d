use pv_model::MeteredSample;
use tracing::debug;

use crate::error::{Result, SizingError};
use crate::general::series::HourlySeries;

/// Raw consumption samples per hour (10 minute cadence)
pub const SAMPLES_PER_HOUR: usize = 6;

/// Groups time-ordered consumption samples into hourly totals.
///
/// Each complete group of [`SAMPLES_PER_HOUR`] samples becomes one entry keyed by the
/// timestamp of its last sample, holding the sum of the group. A trailing incomplete
/// group is dropped.
pub fn aggregate_hourly(samples: &[MeteredSample]) -> HourlySeries {
    let series: HourlySeries = samples
        .chunks_exact(SAMPLES_PER_HOUR)
        .map(|group| {
            let last = &group[SAMPLES_PER_HOUR - 1];
            (last.timestamp, group.iter().map(|s| s.value).sum())
        })
        .collect();

    let dropped = samples.len() % SAMPLES_PER_HOUR;
    if dropped > 0 {
        debug!(dropped, "dropping incomplete trailing hour");
    }
    series
}

/// Sums per-appliance hourly series into whole-house consumption.
///
/// The result covers the union of all timestamps; an appliance without a value at a
/// timestamp contributes nothing there.
pub fn merge_appliances(series: &[HourlySeries]) -> Result<HourlySeries> {
    if series.iter().all(HourlySeries::is_empty) {
        return Err(SizingError::EmptySeries("household consumption".to_string()));
    }

    let mut merged = HourlySeries::new();
    for appliance in series {
        for (&time, &value) in appliance {
            merged.accumulate(time, value);
        }
    }
    Ok(merged)
}

/// Hourly series straight from samples that are already hourly (irradiance)
pub fn hourly_values(samples: &[MeteredSample]) -> HourlySeries {
    samples.iter().map(|s| (s.timestamp, s.value)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(1998, 2, 5)
            .unwrap()
            .and_hms_opt(20, 10, 0)
            .unwrap()
    }

    fn samples(values: &[f64]) -> Vec<MeteredSample> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                MeteredSample::new(1, 0, start() + Duration::minutes(10 * i as i64), v)
            })
            .collect()
    }

    #[test]
    fn test_complete_groups_sum_exactly() {
        let values: Vec<f64> = (1..=12).map(|v| v as f64).collect();
        let hourly = aggregate_hourly(&samples(&values));

        assert_eq!(hourly.len(), 2);
        let first_key = start() + Duration::minutes(50);
        let second_key = start() + Duration::minutes(110);
        assert_eq!(hourly.get(&first_key), Some(21.0));
        assert_eq!(hourly.get(&second_key), Some(57.0));
    }

    #[test]
    fn test_trailing_partial_group_is_dropped() {
        let values = vec![10.0; 6 + 5];
        let hourly = aggregate_hourly(&samples(&values));
        assert_eq!(hourly.len(), 1);
        assert_eq!(hourly.total(), 60.0);

        let too_short = aggregate_hourly(&samples(&[1.0, 2.0, 3.0]));
        assert!(too_short.is_empty());
    }

    #[test]
    fn test_merge_appliances_sums_pointwise() {
        let fridge = aggregate_hourly(&samples(&[5.0; 12]));
        let lights = aggregate_hourly(&samples(&[1.0; 6]));
        let house = merge_appliances(&[fridge, lights]).unwrap();

        assert_eq!(house.len(), 2);
        let mut values = house.iter().map(|(_, &v)| v);
        assert_eq!(values.next(), Some(36.0));
        assert_eq!(values.next(), Some(30.0));
    }

    #[test]
    fn test_merge_of_empty_series_fails() {
        assert!(matches!(
            merge_appliances(&[HourlySeries::new(), HourlySeries::new()]),
            Err(SizingError::EmptySeries(_))
        ));
        assert!(merge_appliances(&[]).is_err());
    }
}
