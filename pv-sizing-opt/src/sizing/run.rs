use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use pv_model::SizingReport;
use tracing::{info, warn};

use crate::error::Result;
use crate::general::indicators::{DailyIndicators, daily_indicators};
use crate::general::production::configuration_production;
use crate::general::profile::{ProfileSet, build_profiles};
use crate::sizing::config::{SizingConfig, Strategy};
use crate::sizing::data_source::{DataSource, ReferenceData};
use crate::sizing::objective::{Evaluation, ObjectiveFunction};
use crate::sizing::optimizer::{OptimizationResult, Optimizer};

/// Everything a sizing run produces
#[derive(Debug, Clone)]
pub struct SizingOutcome {
    pub report: SizingReport,
    pub evaluation: Evaluation,
    pub optimization: OptimizationResult,
    /// Indicators of the winning configuration over the reference year
    pub indicators: DailyIndicators,
    pub profiles: ProfileSet,
}

/// Loads the reference data once, then searches for the best configuration
pub fn run_sizing(source: &dyn DataSource, config: &SizingConfig) -> Result<SizingOutcome> {
    config.validate()?;
    let reference = ReferenceData::load(source, &config.data)?;
    Ok(size_reference(&reference, config))
}

/// Searches the configuration space against already loaded reference data
pub fn size_reference(reference: &ReferenceData, config: &SizingConfig) -> SizingOutcome {
    info!(
        max_panels = config.max_panels,
        min_self_sufficiency = config.min_self_sufficiency,
        horizon_years = config.horizon_years,
        strategy = ?config.optimizer.strategy,
        "starting sizing"
    );

    let objective = ObjectiveFunction::new(reference, config);
    let optimizer = Optimizer::new(config.optimizer.clone(), config.max_panels);
    let optimization = match config.optimizer.strategy {
        Strategy::DifferentialEvolution => optimizer.minimize(|x| objective.fitness(x)),
        Strategy::Exhaustive => optimizer.exhaustive(|x| objective.fitness(x)),
    };

    let evaluation = objective.evaluate(&optimization.best);
    if !evaluation.is_feasible() {
        warn!(
            best = %evaluation.configuration,
            verdict = ?evaluation.verdict,
            "no configuration meets the constraints"
        );
    }

    let production = configuration_production(
        &reference.irradiance,
        &evaluation.configuration,
        &config.catalog,
        config.derating_factor,
    );
    let indicators = daily_indicators(&reference.consumption, &production);
    let profiles = build_profiles(&reference.consumption, &production);

    let report = build_report(config, &evaluation, &optimization, &indicators);
    info!(
        configuration = %report.configuration,
        npv = report.net_present_value,
        capex = report.capital_expenditure,
        self_sufficiency = report.horizon_self_sufficiency,
        "sizing finished"
    );

    SizingOutcome {
        report,
        evaluation,
        optimization,
        indicators,
        profiles,
    }
}

fn build_report(
    config: &SizingConfig,
    evaluation: &Evaluation,
    optimization: &OptimizationResult,
    indicators: &DailyIndicators,
) -> SizingReport {
    let configuration = evaluation.configuration;
    SizingReport {
        configuration,
        total_panels: configuration.total_panels(),
        capital_expenditure: evaluation.capital_expenditure,
        blended_nominal_power_w: configuration.blended_nominal_power(&config.catalog),
        net_present_value: evaluation.npv.net_present_value,
        payback_month: evaluation.npv.payback_month,
        horizon_self_sufficiency: evaluation.self_sufficiency,
        feasible: evaluation.is_feasible(),
        evaluations: optimization.evaluations,
        generations: optimization.generations,
        indicators: indicators.summary(),
        npv_trace: evaluation.npv.trace.clone(),
        monthly_costs: evaluation.monthly_costs.clone(),
    }
}

/// Writes the report as pretty-printed JSON
pub fn write_report(report: &SizingReport, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, report).map_err(std::io::Error::from)?;
    writer.flush()?;
    info!(path = %path.display(), "report written");
    Ok(())
}
