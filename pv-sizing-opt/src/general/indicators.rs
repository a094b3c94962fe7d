use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};
use pv_model::{DailyIndicator, IndicatorSummary};

use crate::general::series::HourlySeries;

/// Daily indicator curves of one consumption/production pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyIndicators {
    pub self_consumption: Vec<DailyIndicator>,
    pub self_sufficiency: Vec<DailyIndicator>,
    pub neeg_kwh: Vec<DailyIndicator>,
}

impl DailyIndicators {
    pub fn summary(&self) -> IndicatorSummary {
        IndicatorSummary {
            self_consumption: mean(&self.self_consumption),
            self_sufficiency: mean(&self.self_sufficiency),
            neeg_kwh: self.neeg_kwh.iter().map(|d| d.value).sum(),
            days: self.neeg_kwh.len(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct DayTotals {
    production: f64,
    consumption: f64,
    overlap: f64,
    mismatch: f64,
}

/// Self-consumption, self-sufficiency and NEEG for every date that has both
/// consumption and production.
///
/// Within such a date hours are paired by timestamp over the union of both series;
/// an hour missing from one side reads as zero. Ratios with a zero denominator are 0.
pub fn daily_indicators(consumption: &HourlySeries, production: &HourlySeries) -> DailyIndicators {
    let consumption_days: BTreeSet<NaiveDate> = consumption.keys().map(|time| time.date()).collect();
    let production_days: BTreeSet<NaiveDate> = production.keys().map(|time| time.date()).collect();

    let hours: BTreeSet<&NaiveDateTime> = consumption
        .keys()
        .chain(production.keys())
        .filter(|time| {
            let date = time.date();
            consumption_days.contains(&date) && production_days.contains(&date)
        })
        .collect();

    let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();
    for time in hours {
        let demand = consumption.get_or_zero(time);
        let supply = production.get_or_zero(time);
        let day = days.entry(time.date()).or_default();
        day.production += supply;
        day.consumption += demand;
        day.overlap += supply.min(demand);
        day.mismatch += (supply - demand).abs();
    }

    let mut indicators = DailyIndicators::default();
    for (date, day) in days {
        indicators.self_consumption.push(DailyIndicator {
            date,
            value: ratio(day.overlap, day.production),
        });
        indicators.self_sufficiency.push(DailyIndicator {
            date,
            value: ratio(day.overlap, day.consumption),
        });
        indicators.neeg_kwh.push(DailyIndicator {
            date,
            value: day.mismatch / 1000.0,
        });
    }
    indicators
}

/// Share of consumption covered by production over every hour of `consumption`
pub fn overall_self_sufficiency(consumption: &HourlySeries, production: &HourlySeries) -> f64 {
    ratio(consumption.overlap_with(production), consumption.total())
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn mean(values: &[DailyIndicator]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|d| d.value).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::general::series::hourly_from;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(1998, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    /// Two days with a daylight production bump
    fn profiles() -> (HourlySeries, HourlySeries) {
        let consumption: Vec<f64> = (0..48).map(|h| 300.0 + 20.0 * (h % 24) as f64).collect();
        let production: Vec<f64> = (0..48)
            .map(|h| {
                let hour = h % 24;
                if (7..19).contains(&hour) { 900.0 - 60.0 * (hour as f64 - 13.0).abs() } else { 0.0 }
            })
            .collect();
        (
            hourly_from(start(), &consumption),
            hourly_from(start(), &production),
        )
    }

    #[test]
    fn test_ratios_stay_within_unit_interval() {
        let (consumption, production) = profiles();
        let daily = daily_indicators(&consumption, &production);
        assert_eq!(daily.self_consumption.len(), 2);
        for day in daily.self_consumption.iter().chain(&daily.self_sufficiency) {
            assert!((0.0..=1.0).contains(&day.value), "{day:?}");
        }
        for day in &daily.neeg_kwh {
            assert!(day.value > 0.0);
        }
    }

    #[test]
    fn test_identical_series_are_fully_self_sufficient() {
        let (consumption, _) = profiles();
        let daily = daily_indicators(&consumption, &consumption);
        for day in daily.self_consumption.iter().chain(&daily.self_sufficiency) {
            assert_eq!(day.value, 1.0);
        }
        for day in &daily.neeg_kwh {
            assert_eq!(day.value, 0.0);
        }
        let summary = daily.summary();
        assert_eq!(summary.self_consumption, 1.0);
        assert_eq!(summary.self_sufficiency, 1.0);
        assert_eq!(summary.neeg_kwh, 0.0);
        assert_eq!(summary.days, 2);
    }

    #[test]
    fn test_zero_production_day() {
        let consumption = hourly_from(start(), &[500.0; 24]);
        let production = hourly_from(start(), &[0.0; 24]);
        let daily = daily_indicators(&consumption, &production);

        assert_eq!(daily.self_consumption[0].value, 0.0);
        assert_eq!(daily.self_sufficiency[0].value, 0.0);
        assert_eq!(daily.neeg_kwh[0].value, 12.0);
    }

    #[test]
    fn test_single_hour_mismatch_shows_in_neeg() {
        let consumption = hourly_from(start(), &[500.0; 24]);
        let mut values = [500.0; 24];
        values[12] = 800.0;
        let production = hourly_from(start(), &values);
        let daily = daily_indicators(&consumption, &production);
        assert!((daily.neeg_kwh[0].value - 0.3).abs() < 1e-12);
        assert_eq!(daily.self_sufficiency[0].value, 1.0);
    }

    #[test]
    fn test_days_without_production_data_are_skipped() {
        let consumption = hourly_from(start(), &[100.0; 48]);
        let production = hourly_from(start(), &[50.0; 24]);
        let daily = daily_indicators(&consumption, &production);
        assert_eq!(daily.neeg_kwh.len(), 1);
        assert_eq!(daily.self_sufficiency[0].value, 0.5);
        assert_eq!(daily.self_consumption[0].value, 1.0);
    }

    #[test]
    fn test_production_without_consumption_counts() {
        let consumption = hourly_from(start(), &[100.0; 12]);
        let production = hourly_from(start(), &[100.0; 24]);
        let daily = daily_indicators(&consumption, &production);

        assert_eq!(daily.self_consumption.len(), 1);
        assert_eq!(daily.self_consumption[0].value, 0.5);
        assert_eq!(daily.self_sufficiency[0].value, 1.0);
        assert!((daily.neeg_kwh[0].value - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_overall_self_sufficiency() {
        let consumption = hourly_from(start(), &[1000.0; 8760]);
        assert_eq!(overall_self_sufficiency(&consumption, &HourlySeries::new()), 0.0);
        assert_eq!(overall_self_sufficiency(&HourlySeries::new(), &consumption), 0.0);

        let half = hourly_from(start(), &[500.0; 8760]);
        assert_eq!(overall_self_sufficiency(&consumption, &half), 0.5);
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = DailyIndicators::default().summary();
        assert_eq!(summary, IndicatorSummary::default());
    }
}
