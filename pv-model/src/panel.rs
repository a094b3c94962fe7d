use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// The three panel classes a household can choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./panel.ts")]
pub enum PanelClass {
    LowCost,
    Standard,
    HighEfficiency,
}

impl PanelClass {
    pub const ALL: [PanelClass; 3] = [
        PanelClass::LowCost,
        PanelClass::Standard,
        PanelClass::HighEfficiency,
    ];
}

/// A purchasable panel model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./panel.ts")]
pub struct PanelType {
    /// Display name of the panel.
    pub name: String,
    /// Nameplate power in watts.
    pub nominal_power_w: f64,
    /// Price per installed watt.
    pub cost_per_watt: f64,
}

impl PanelType {
    pub fn new(name: &str, nominal_power_w: f64, cost_per_watt: f64) -> Self {
        Self {
            name: name.to_string(),
            nominal_power_w,
            cost_per_watt,
        }
    }

    /// Investment for a single panel of this type
    pub fn unit_cost(&self) -> f64 {
        self.nominal_power_w * self.cost_per_watt
    }
}

/// Fixed catalog with exactly one panel type per [`PanelClass`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./panel.ts")]
#[serde(default)]
pub struct PanelCatalog {
    pub low_cost: PanelType,
    pub standard: PanelType,
    pub high_efficiency: PanelType,
}

impl Default for PanelCatalog {
    fn default() -> Self {
        Self {
            low_cost: PanelType::new("Low-cost", 200.0, 0.16),
            standard: PanelType::new("Standard", 300.0, 0.22),
            high_efficiency: PanelType::new("High Efficiency", 415.0, 0.31),
        }
    }
}

impl PanelCatalog {
    pub fn get(&self, class: PanelClass) -> &PanelType {
        match class {
            PanelClass::LowCost => &self.low_cost,
            PanelClass::Standard => &self.standard,
            PanelClass::HighEfficiency => &self.high_efficiency,
        }
    }

    /// Iterate the catalog in [`PanelClass::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (PanelClass, &PanelType)> {
        PanelClass::ALL.into_iter().map(move |class| (class, self.get(class)))
    }
}

/// Panel counts per class. This is the decision variable of the search.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, TS,
)]
#[ts(export, export_to = "./panel.ts")]
pub struct Configuration {
    pub low_cost: u32,
    pub standard: u32,
    pub high_efficiency: u32,
}

impl Configuration {
    pub fn new(low_cost: u32, standard: u32, high_efficiency: u32) -> Self {
        Self {
            low_cost,
            standard,
            high_efficiency,
        }
    }

    /// Builds a configuration from a continuous search vector.
    ///
    /// Every coordinate is truncated toward zero; negative values and NaN become 0.
    pub fn from_continuous(x: &[f64; 3]) -> Self {
        let truncate = |v: f64| if v.is_nan() || v <= 0.0 { 0 } else { v.trunc() as u32 };
        Self::new(truncate(x[0]), truncate(x[1]), truncate(x[2]))
    }

    pub fn count(&self, class: PanelClass) -> u32 {
        match class {
            PanelClass::LowCost => self.low_cost,
            PanelClass::Standard => self.standard,
            PanelClass::HighEfficiency => self.high_efficiency,
        }
    }

    pub fn total_panels(&self) -> u32 {
        self.low_cost + self.standard + self.high_efficiency
    }

    /// Σ count · power · cost per watt
    pub fn capital_expenditure(&self, catalog: &PanelCatalog) -> f64 {
        catalog
            .iter()
            .map(|(class, panel)| self.count(class) as f64 * panel.unit_cost())
            .sum()
    }

    /// Total nameplate power in watts
    pub fn installed_power_w(&self, catalog: &PanelCatalog) -> f64 {
        catalog
            .iter()
            .map(|(class, panel)| self.count(class) as f64 * panel.nominal_power_w)
            .sum()
    }

    /// Average nameplate power per panel, 0 for an empty configuration
    pub fn blended_nominal_power(&self, catalog: &PanelCatalog) -> f64 {
        let total = self.total_panels();
        if total == 0 {
            return 0.0;
        }
        self.installed_power_w(catalog) / total as f64
    }
}

impl std::fmt::Display for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} low-cost, {} standard, {} high-efficiency",
            self.low_cost, self.standard, self.high_efficiency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capital_expenditure() {
        let catalog = PanelCatalog::default();
        let config = Configuration::new(1, 2, 3);
        // 200*0.16 + 2*300*0.22 + 3*415*0.31
        let expected = 32.0 + 132.0 + 385.95;
        assert!((config.capital_expenditure(&catalog) - expected).abs() < 1e-9);
        assert_eq!(config.total_panels(), 6);
    }

    #[test]
    fn test_blended_nominal_power() {
        let catalog = PanelCatalog::default();
        assert_eq!(Configuration::default().blended_nominal_power(&catalog), 0.0);

        let config = Configuration::new(1, 1, 0);
        assert_eq!(config.blended_nominal_power(&catalog), 250.0);
    }

    #[test]
    fn test_from_continuous_truncates() {
        let config = Configuration::from_continuous(&[2.9, -0.5, f64::NAN]);
        assert_eq!(config, Configuration::new(2, 0, 0));

        let config = Configuration::from_continuous(&[0.999, 7.0, 3.5]);
        assert_eq!(config, Configuration::new(0, 7, 3));
    }
}
