use pv_model::{Configuration, MonthlyCostRecord};

use crate::general::balance::monthly_costs;
use crate::general::finance::{NpvResult, calculate_npv};
use crate::general::horizon::extend_series;
use crate::general::indicators::overall_self_sufficiency;
use crate::general::production::configuration_production;
use crate::general::series::HourlySeries;
use crate::sizing::config::SizingConfig;
use crate::sizing::data_source::ReferenceData;

/// Which rule decided the fitness of a candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Feasible,
    PanelCapExceeded,
    /// Horizon self-sufficiency fell short of the target by this much
    SelfSufficiencyDeficit(f64),
}

/// Outcome of evaluating one configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub configuration: Configuration,
    /// Value minimized by the search
    pub fitness: f64,
    pub verdict: Verdict,
    pub capital_expenditure: f64,
    pub npv: NpvResult,
    pub self_sufficiency: f64,
    /// Monthly exchange with the grid over the whole horizon
    pub monthly_costs: Vec<MonthlyCostRecord>,
}

impl Evaluation {
    pub fn is_feasible(&self) -> bool {
        self.verdict == Verdict::Feasible
    }
}

/// Scores panel configurations against shared reference data.
///
/// Holds only borrowed, read-only state plus the horizon consumption built once,
/// so one instance can be evaluated from many threads.
pub struct ObjectiveFunction<'a> {
    reference: &'a ReferenceData,
    config: &'a SizingConfig,
    horizon_consumption: HourlySeries,
}

impl<'a> ObjectiveFunction<'a> {
    pub fn new(reference: &'a ReferenceData, config: &'a SizingConfig) -> Self {
        let extended = extend_series(&reference.consumption, config.horizon_years);
        Self {
            reference,
            config,
            horizon_consumption: extended.series,
        }
    }

    /// Fitness of a continuous search vector, truncated to a configuration first
    pub fn fitness(&self, x: &[f64; 3]) -> f64 {
        self.evaluate(&Configuration::from_continuous(x)).fitness
    }

    pub fn evaluate(&self, configuration: &Configuration) -> Evaluation {
        let config = self.config;
        let capex = configuration.capital_expenditure(&config.catalog);

        let production = configuration_production(
            &self.reference.irradiance,
            configuration,
            &config.catalog,
            config.derating_factor,
        );
        let horizon_production = extend_series(&production, config.horizon_years).series;

        let costs = monthly_costs(&self.horizon_consumption, &horizon_production, config.prices());
        let npv = calculate_npv(&costs, capex, config.financial_parameters());
        let self_sufficiency = overall_self_sufficiency(&self.horizon_consumption, &horizon_production);

        let (fitness, verdict) = if configuration.total_panels() > config.max_panels {
            (config.penalties.panel_cap_penalty, Verdict::PanelCapExceeded)
        } else if self_sufficiency < config.min_self_sufficiency {
            let deficit = config.min_self_sufficiency - self_sufficiency;
            (
                config.penalties.deficit_penalty(deficit),
                Verdict::SelfSufficiencyDeficit(deficit),
            )
        } else {
            (-npv.net_present_value, Verdict::Feasible)
        };

        Evaluation {
            configuration: *configuration,
            fitness,
            verdict,
            capital_expenditure: capex,
            npv,
            self_sufficiency,
            monthly_costs: costs,
        }
    }
}
