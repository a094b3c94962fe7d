use std::collections::BTreeMap;

use chrono::Datelike;
use pv_model::MonthlyCostRecord;

use crate::general::series::HourlySeries;

/// Grid tariff used to price the monthly exchange.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPrices {
    /// Price paid per kWh drawn from the grid
    pub grid_price: f64,
    /// Price received per kWh injected into the grid (day ahead market)
    pub injection_price: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct MonthAccumulator {
    consumption_wh: f64,
    grid_wh: f64,
    injected_wh: f64,
}

/// Monthly grid draw, injection and costs, one record per month present in `consumption`.
///
/// Production missing for an hour counts as zero. Records are sorted by (year, month).
pub fn monthly_costs(
    consumption: &HourlySeries,
    production: &HourlySeries,
    prices: GridPrices,
) -> Vec<MonthlyCostRecord> {
    let mut months: BTreeMap<(i32, u32), MonthAccumulator> = BTreeMap::new();

    for (time, &demand) in consumption {
        let supply = production.get_or_zero(time);
        let month = months.entry((time.year(), time.month())).or_default();

        month.consumption_wh += demand;
        if demand > supply {
            month.grid_wh += demand - supply;
        } else {
            month.injected_wh += supply - demand;
        }
    }

    months
        .into_iter()
        .map(|((year, month), acc)| {
            let grid_energy_kwh = acc.grid_wh / 1000.0;
            let injected_energy_kwh = acc.injected_wh / 1000.0;
            MonthlyCostRecord {
                year,
                month,
                grid_energy_kwh,
                injected_energy_kwh,
                cost_without_pv: acc.consumption_wh / 1000.0 * prices.grid_price,
                cost_with_pv: grid_energy_kwh * prices.grid_price
                    - injected_energy_kwh * prices.injection_price,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::general::series::hourly_from;
    use chrono::{NaiveDate, NaiveDateTime};

    const PRICES: GridPrices = GridPrices {
        grid_price: 0.25,
        injection_price: 0.1,
    };

    fn january() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(1999, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_no_production_means_no_savings() {
        let start = NaiveDate::from_ymd_opt(1998, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let consumption = hourly_from(start, &vec![1000.0; 8760]);
        let records = monthly_costs(&consumption, &HourlySeries::new(), PRICES);

        assert_eq!(records.len(), 12);
        let january = &records[0];
        assert_eq!((january.year, january.month), (1998, 1));
        assert_eq!(january.grid_energy_kwh, 744.0);
        assert_eq!(january.injected_energy_kwh, 0.0);
        assert_eq!(january.cost_without_pv, 186.0);
        for record in &records {
            assert_eq!(record.cost_without_pv, record.cost_with_pv);
        }
    }

    #[test]
    fn test_deficit_and_surplus_buckets() {
        let consumption = hourly_from(january(), &[1000.0, 200.0, 500.0]);
        let production = hourly_from(january(), &[400.0, 1200.0, 500.0]);
        let records = monthly_costs(&consumption, &production, PRICES);

        assert_eq!(records.len(), 1);
        let record = records[0];
        assert!((record.grid_energy_kwh - 0.6).abs() < 1e-12);
        assert!((record.injected_energy_kwh - 1.0).abs() < 1e-12);
        assert!((record.cost_without_pv - 1.7 * 0.25).abs() < 1e-12);
        assert!((record.cost_with_pv - (0.6 * 0.25 - 1.0 * 0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_production_outside_consumption_is_ignored() {
        let consumption = hourly_from(january(), &[100.0]);
        let production = hourly_from(january() + chrono::Duration::hours(5), &[5000.0]);
        let records = monthly_costs(&consumption, &production, PRICES);
        assert_eq!(records[0].injected_energy_kwh, 0.0);
        assert!((records[0].grid_energy_kwh - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_records_sorted_across_years() {
        let dec = NaiveDate::from_ymd_opt(1998, 12, 31)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap();
        let consumption = hourly_from(dec, &[10.0, 10.0]);
        let records = monthly_costs(&consumption, &HourlySeries::new(), PRICES);
        let keys: Vec<(i32, u32)> = records.iter().map(|r| (r.year, r.month)).collect();
        assert_eq!(keys, vec![(1998, 12), (1999, 1)]);
    }
}
