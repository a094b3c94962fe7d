use pv_model::{Configuration, PanelCatalog};

use crate::general::series::HourlySeries;

/// Hourly output of `count` panels of one type.
///
/// `production(t) = nominal_power * count * derating * irradiance(t) / 1000`,
/// keyed exactly like the irradiance series.
pub fn panel_production(
    irradiance: &HourlySeries,
    nominal_power_w: f64,
    count: u32,
    derating_factor: f64,
) -> HourlySeries {
    let factor = nominal_power_w * count as f64 * derating_factor / 1000.0;
    irradiance.scaled(factor)
}

/// Hourly output of a mixed configuration: the per-type productions summed pointwise
pub fn configuration_production(
    irradiance: &HourlySeries,
    configuration: &Configuration,
    catalog: &PanelCatalog,
    derating_factor: f64,
) -> HourlySeries {
    catalog
        .iter()
        .map(|(class, panel)| {
            panel_production(
                irradiance,
                panel.nominal_power_w,
                configuration.count(class),
                derating_factor,
            )
        })
        .fold(HourlySeries::new(), |total, part| total.add(&part))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::general::series::hourly_from;
    use chrono::NaiveDate;

    fn irradiance() -> HourlySeries {
        let start = NaiveDate::from_ymd_opt(1998, 6, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        hourly_from(start, &[0.0, 500.0, 1000.0])
    }

    #[test]
    fn test_panel_production_formula() {
        let production = panel_production(&irradiance(), 300.0, 2, 0.8);
        let values: Vec<f64> = production.iter().map(|(_, &v)| v).collect();
        let expected = [0.0, 240.0, 480.0];
        for (value, expected) in values.iter().zip(expected) {
            assert!((value - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_panels_produce_nothing() {
        let production = panel_production(&irradiance(), 415.0, 0, 0.8);
        assert_eq!(production.len(), 3);
        assert_eq!(production.total(), 0.0);
    }

    #[test]
    fn test_configuration_sums_panel_types() {
        let catalog = PanelCatalog::default();
        let config = Configuration::new(1, 1, 1);
        let mixed = configuration_production(&irradiance(), &config, &catalog, 0.8);

        // (200 + 300 + 415) * 0.8 * 1000 / 1000
        let peak = mixed.iter().map(|(_, &v)| v).fold(0.0, f64::max);
        assert!((peak - 732.0).abs() < 1e-9);
        assert_eq!(mixed.len(), 3);
    }
}
