use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::panel::Configuration;

/// Grid exchange and costs of one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./report.ts")]
pub struct MonthlyCostRecord {
    pub year: i32,
    pub month: u32,
    /// Energy drawn from the grid in kWh.
    pub grid_energy_kwh: f64,
    /// Energy injected into the grid in kWh.
    pub injected_energy_kwh: f64,
    /// What the month would have cost without panels.
    pub cost_without_pv: f64,
    /// Grid purchases minus injection revenue.
    pub cost_with_pv: f64,
}

impl MonthlyCostRecord {
    pub fn savings(&self) -> f64 {
        self.cost_without_pv - self.cost_with_pv
    }
}

/// Cumulative net present value after a given month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./report.ts")]
pub struct NpvPoint {
    pub year: i32,
    pub month: u32,
    pub cumulative_npv: f64,
}

/// A per-day indicator value (ratio or kWh depending on the indicator).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./report.ts")]
pub struct DailyIndicator {
    pub date: NaiveDate,
    pub value: f64,
}

/// Whole-period indicators of a configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./report.ts")]
pub struct IndicatorSummary {
    /// Mean daily self-consumption ratio.
    pub self_consumption: f64,
    /// Mean daily self-sufficiency ratio.
    pub self_sufficiency: f64,
    /// Sum of daily NEEG in kWh.
    pub neeg_kwh: f64,
    /// Number of days that had both consumption and production data.
    pub days: usize,
}

/// One point of an averaged consumption vs production profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./report.ts")]
pub struct ProfilePoint {
    /// Position label, e.g. "2024-01-03 14:00", "d03 14h", "Mon 14h" or "14h".
    pub label: String,
    pub consumption_w: f64,
    pub production_w: f64,
}

/// Everything the presentation layer needs about a finished sizing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./report.ts")]
pub struct SizingReport {
    pub configuration: Configuration,
    pub total_panels: u32,
    pub capital_expenditure: f64,
    pub blended_nominal_power_w: f64,
    pub net_present_value: f64,
    /// Month index (1-based) in which the cumulative NPV turns non-negative.
    pub payback_month: Option<usize>,
    /// Self-sufficiency over the whole planning horizon.
    pub horizon_self_sufficiency: f64,
    pub feasible: bool,
    pub evaluations: usize,
    pub generations: usize,
    pub indicators: IndicatorSummary,
    pub npv_trace: Vec<NpvPoint>,
    pub monthly_costs: Vec<MonthlyCostRecord>,
}
