use std::path::Path;

use pv_model::{Appliance, PanelCatalog, ReferenceWindow};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SizingError};
use crate::general::FinancialParameters;
use crate::general::balance::GridPrices;

/// Largest per-type count the exhaustive sweep accepts, about a million candidates
pub const MAX_EXHAUSTIVE_PANELS: u32 = 100;

/// Configuration struct holding all sizing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    pub catalog: PanelCatalog,

    // Economic parameters
    pub grid_price: f64,      // Cost per kWh drawn from the grid
    pub injection_price: f64, // Revenue per kWh injected (day ahead market)
    pub discount_rate: f64,   // Annual discount rate
    pub opex_fraction: f64,   // Yearly operating cost as a fraction of CapEx
    pub horizon_years: u32,   // Planning horizon

    // System parameters
    pub derating_factor: f64, // Real-world output per nameplate watt

    // Constraints
    pub min_self_sufficiency: f64, // Required share of demand covered by PV (0-1)
    pub max_panels: u32,           // Panels fitting on the available surface

    pub penalties: PenaltyTable,
    pub optimizer: OptimizerSettings,
    pub data: DataSelection,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            catalog: PanelCatalog::default(),

            grid_price: 0.25,
            injection_price: 0.1,
            discount_rate: 0.05,
            opex_fraction: 0.03,
            horizon_years: 5,

            derating_factor: 0.8,

            min_self_sufficiency: 0.5,
            max_panels: 20,

            penalties: PenaltyTable::default(),
            optimizer: OptimizerSettings::default(),
            data: DataSelection::default(),
        }
    }
}

impl SizingConfig {
    /// Parses a TOML document; missing keys fall back to the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SizingConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(SizingError::InvalidConfig(msg));

        if !(0.0..=1.0).contains(&self.min_self_sufficiency) {
            return invalid(format!(
                "min_self_sufficiency must be within [0, 1], got {}",
                self.min_self_sufficiency
            ));
        }
        if self.grid_price < 0.0 || self.injection_price < 0.0 {
            return invalid("prices must not be negative".to_string());
        }
        if self.derating_factor <= 0.0 {
            return invalid(format!(
                "derating_factor must be positive, got {}",
                self.derating_factor
            ));
        }
        if self.horizon_years == 0 {
            return invalid("horizon_years must be at least 1".to_string());
        }
        if self.max_panels == 0 {
            return invalid("max_panels must be at least 1".to_string());
        }
        if self.optimizer.strategy == Strategy::Exhaustive && self.max_panels > MAX_EXHAUSTIVE_PANELS {
            return invalid(format!(
                "exhaustive search is limited to max_panels <= {MAX_EXHAUSTIVE_PANELS}, got {}",
                self.max_panels
            ));
        }
        if self.discount_rate <= -1.0 {
            return invalid(format!("discount_rate {} is not usable", self.discount_rate));
        }
        for (_, panel) in self.catalog.iter() {
            if panel.nominal_power_w <= 0.0 || panel.cost_per_watt < 0.0 {
                return invalid(format!("panel `{}` has invalid power or cost", panel.name));
            }
        }
        if !self.penalties.is_ordered() {
            return invalid("penalty steps must be sorted by descending threshold".to_string());
        }
        self.optimizer.validate()?;
        if !self.data.consumption_window.is_valid() || !self.data.irradiance_window.is_valid() {
            return invalid("reference window start is after its end".to_string());
        }
        Ok(())
    }

    pub fn prices(&self) -> GridPrices {
        GridPrices {
            grid_price: self.grid_price,
            injection_price: self.injection_price,
        }
    }

    pub fn financial_parameters(&self) -> FinancialParameters {
        FinancialParameters {
            discount_rate: self.discount_rate,
            opex_fraction: self.opex_fraction,
        }
    }
}

/// One rung of the self-sufficiency penalty ladder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyStep {
    /// Minimum deficit for this rung to apply
    pub threshold: f64,
    pub penalty: f64,
}

/// Penalties that steer the search toward feasible configurations.
///
/// Steps are checked in order (largest threshold first); the first step whose
/// threshold is reached by the deficit wins. Smaller deficits fall back to
/// `linear_base + deficit * linear_slope`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyTable {
    pub panel_cap_penalty: f64,
    pub steps: Vec<PenaltyStep>,
    pub linear_base: f64,
    pub linear_slope: f64,
}

impl Default for PenaltyTable {
    fn default() -> Self {
        let step = |threshold, penalty| PenaltyStep { threshold, penalty };
        Self {
            panel_cap_penalty: 1_000_000.0,
            steps: vec![
                step(0.10, 500_000.0),
                step(0.05, 450_000.0),
                step(0.03, 400_000.0),
                step(0.02, 350_000.0),
                step(0.01, 300_000.0),
            ],
            linear_base: 250_000.0,
            linear_slope: 1_000_000.0,
        }
    }
}

impl PenaltyTable {
    /// Penalty for a positive self-sufficiency deficit
    pub fn deficit_penalty(&self, deficit: f64) -> f64 {
        self.steps
            .iter()
            .find(|step| deficit >= step.threshold)
            .map(|step| step.penalty)
            .unwrap_or(self.linear_base + deficit * self.linear_slope)
    }

    fn is_ordered(&self) -> bool {
        self.steps.windows(2).all(|w| w[0].threshold >= w[1].threshold)
    }
}

/// Which search drives the objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Differential evolution, best/1/bin
    DifferentialEvolution,
    /// Every integer configuration in the box
    Exhaustive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    pub strategy: Strategy,
    /// Population size is `population_multiplier * 3`
    pub population_multiplier: usize,
    /// Mutation factor is drawn uniformly from this range once per generation
    pub mutation_min: f64,
    pub mutation_max: f64,
    pub crossover_probability: f64,
    pub max_generations: usize,
    /// Hard cap on objective evaluations
    pub max_evaluations: Option<usize>,
    /// Stop after this many generations without improvement
    pub patience: Option<usize>,
    /// Fixed seed for reproducible runs, random when unset
    pub seed: Option<u64>,
    /// Evaluate the population on the rayon thread pool
    pub parallel: bool,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            strategy: Strategy::DifferentialEvolution,
            population_multiplier: 15,
            mutation_min: 0.5,
            mutation_max: 1.0,
            crossover_probability: 0.7,
            max_generations: 500,
            max_evaluations: None,
            patience: None,
            seed: None,
            parallel: true,
        }
    }
}

impl OptimizerSettings {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(SizingError::InvalidConfig(msg.to_string()));
        if self.population_multiplier < 2 {
            return invalid("population_multiplier must be at least 2");
        }
        if !(0.0..=2.0).contains(&self.mutation_min)
            || !(0.0..=2.0).contains(&self.mutation_max)
            || self.mutation_min > self.mutation_max
        {
            return invalid("mutation range must satisfy 0 <= min <= max <= 2");
        }
        if !(0.0..=1.0).contains(&self.crossover_probability) {
            return invalid("crossover_probability must be within [0, 1]");
        }
        if self.max_evaluations == Some(0) {
            return invalid("max_evaluations must be positive");
        }
        Ok(())
    }
}

/// Selects the household and weather station in the metering store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSelection {
    pub house_id: i64,
    pub appliances: Vec<Appliance>,
    pub station_id: i64,
    pub irradiance_variable_id: i64,
    pub consumption_window: ReferenceWindow,
    pub irradiance_window: ReferenceWindow,
}

impl Default for DataSelection {
    fn default() -> Self {
        Self {
            house_id: 2_000_916,
            appliances: Appliance::reference_set(),
            station_id: 26_198_001,
            irradiance_variable_id: 4,
            consumption_window: ReferenceWindow::CONSUMPTION,
            irradiance_window: ReferenceWindow::IRRADIANCE,
        }
    }
}
