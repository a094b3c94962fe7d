use chrono::Datelike;
use tracing::debug;

use crate::general::series::HourlySeries;

/// A reference-year series repeated over the planning horizon.
#[derive(Debug, Clone, Default)]
pub struct ExtendedSeries {
    pub series: HourlySeries,
    /// Feb 29 hours that had no counterpart in a non-leap target year.
    pub dropped_leap_hours: usize,
}

/// Replicates a reference year across `years` consecutive years.
///
/// For every offset in `0..years` each timestamp keeps month, day and time of day and
/// moves its year by the offset. Feb 29 hours landing in a non-leap year are dropped.
/// If two offsets produce the same timestamp, the later offset wins.
pub fn extend_series(reference: &HourlySeries, years: u32) -> ExtendedSeries {
    let mut extended = ExtendedSeries::default();

    for offset in 0..years as i32 {
        for (&time, &value) in reference {
            match time.with_year(time.year() + offset) {
                Some(shifted) => extended.series.insert(shifted, value),
                None => extended.dropped_leap_hours += 1,
            }
        }
    }

    if extended.dropped_leap_hours > 0 {
        debug!(
            dropped = extended.dropped_leap_hours,
            years, "leap day hours dropped while extending horizon"
        );
    }
    extended
}

/// Extends consumption and production over the same horizon
pub fn extend_pair(
    consumption: &HourlySeries,
    production: &HourlySeries,
    years: u32,
) -> (ExtendedSeries, ExtendedSeries) {
    (
        extend_series(consumption, years),
        extend_series(production, years),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::general::series::hourly_from;
    use chrono::{NaiveDate, Timelike};

    fn reference_year() -> HourlySeries {
        // Feb 1998 - Feb 1999, no leap day
        let start = NaiveDate::from_ymd_opt(1998, 2, 5)
            .unwrap()
            .and_hms_opt(21, 0, 0)
            .unwrap();
        hourly_from(start, &vec![1.0; 8760])
    }

    #[test]
    fn test_non_leap_reference_has_no_collisions() {
        let reference = reference_year();
        for years in 1..=5 {
            let extended = extend_series(&reference, years);
            assert_eq!(extended.series.len(), years as usize * reference.len());
            assert_eq!(extended.dropped_leap_hours, 0);
        }
    }

    #[test]
    fn test_only_year_changes() {
        let reference = reference_year();
        let extended = extend_series(&reference, 3);
        let first = reference.first_time().unwrap();
        let shifted = first.with_year(first.year() + 2).unwrap();
        assert_eq!(extended.series.get(&shifted), Some(1.0));
        assert_eq!(shifted.month(), first.month());
        assert_eq!(shifted.day(), first.day());
        assert_eq!(shifted.hour(), first.hour());
    }

    #[test]
    fn test_leap_day_hours_dropped_in_non_leap_years() {
        let start = NaiveDate::from_ymd_opt(2000, 2, 29)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let reference = hourly_from(start, &vec![2.0; 48]);
        let extended = extend_series(&reference, 2);

        // Feb 29 survives in 2000 only, Mar 1 in both years
        assert_eq!(extended.dropped_leap_hours, 24);
        assert_eq!(extended.series.len(), 48 + 24);
    }

    #[test]
    fn test_pair_stays_aligned() {
        let consumption = reference_year();
        let production = consumption.scaled(0.5);
        let (cons, prod) = extend_pair(&consumption, &production, 2);
        assert_eq!(cons.series.len(), prod.series.len());
        assert!(cons.series.keys().eq(prod.series.keys()));
    }

    #[test]
    fn test_zero_years_is_empty() {
        let extended = extend_series(&reference_year(), 0);
        assert!(extended.series.is_empty());
    }
}
