use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pv_sizing_opt::sizing::plot::write_charts;
use pv_sizing_opt::sizing::{CsvDataSource, SizingConfig, run_sizing, write_report};
use tracing::info;

#[derive(Parser)]
#[command(name = "pv-sizing")]
#[command(about = "Find the panel mix that maximizes NPV under a self-sufficiency target", long_about = None)]
struct Cli {
    /// CSV with columns house_id,appliance_id,epoch_time,value
    #[arg(long)]
    consumption: PathBuf,

    /// CSV with columns station_id,variable_id,epoch_time,value
    #[arg(long)]
    irradiance: PathBuf,

    /// TOML configuration; defaults apply to every missing key
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Required share of consumption covered by PV, 0 to 1
    #[arg(long)]
    min_self_sufficiency: Option<f64>,

    /// Maximum number of panels on the roof
    #[arg(long)]
    max_panels: Option<u32>,

    /// Seed for a reproducible search
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many generations without improvement
    #[arg(long)]
    patience: Option<usize>,

    /// Directory for the JSON report and the charts
    #[arg(short, long, default_value = "results")]
    output: PathBuf,

    /// Skip chart rendering
    #[arg(long)]
    no_charts: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SizingConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SizingConfig::default(),
    };
    if let Some(target) = cli.min_self_sufficiency {
        config.min_self_sufficiency = target;
    }
    if let Some(max_panels) = cli.max_panels {
        config.max_panels = max_panels;
    }
    if cli.seed.is_some() {
        config.optimizer.seed = cli.seed;
    }
    if cli.patience.is_some() {
        config.optimizer.patience = cli.patience;
    }

    let source = CsvDataSource::new(&cli.consumption, &cli.irradiance);
    let outcome = run_sizing(&source, &config).context("Sizing failed")?;

    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("Failed to create {}", cli.output.display()))?;
    write_report(&outcome.report, &cli.output.join("report.json"))
        .context("Failed to write report")?;

    if !cli.no_charts {
        write_charts(
            &cli.output,
            &outcome.profiles,
            &outcome.indicators,
            &outcome.report.npv_trace,
        )
        .context("Failed to render charts")?;
    }

    let report = &outcome.report;
    info!(
        "Best configuration: {} ({} panels, {:.0} W blended)",
        report.configuration, report.total_panels, report.blended_nominal_power_w
    );
    info!(
        "NPV {:.2} over {} years, CapEx {:.2}, payback month {:?}",
        report.net_present_value, config.horizon_years, report.capital_expenditure, report.payback_month
    );
    info!(
        "Self-sufficiency {:.1}% (target {:.1}%), self-consumption {:.1}%, NEEG {:.1} kWh",
        report.horizon_self_sufficiency * 100.0,
        config.min_self_sufficiency * 100.0,
        report.indicators.self_consumption * 100.0,
        report.indicators.neeg_kwh
    );
    if !report.feasible {
        info!("No configuration reached the self-sufficiency target; reporting the closest one");
    }
    Ok(())
}
