use pv_model::{MonthlyCostRecord, NpvPoint};

/// Parameters of the discounted cash flow
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinancialParameters {
    /// Annual discount rate, e.g. 0.05
    pub discount_rate: f64,
    /// Yearly operating expenditure as a fraction of the investment
    pub opex_fraction: f64,
}

impl Default for FinancialParameters {
    fn default() -> Self {
        Self {
            discount_rate: 0.05,
            opex_fraction: 0.03,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NpvResult {
    pub initial_investment: f64,
    pub net_present_value: f64,
    /// First month (1-based) whose cumulative NPV is non-negative
    pub payback_month: Option<usize>,
    pub trace: Vec<NpvPoint>,
}

/// Monthly discounted net present value.
///
/// Starting from `-capex`, month `t` (1-based, in (year, month) order) adds
/// `(savings_t - opex / 12) / (1 + r)^((t - 1) / 12)`, so the first month is not
/// discounted. `opex = opex_fraction * capex`.
pub fn calculate_npv(
    monthly_costs: &[MonthlyCostRecord],
    capex: f64,
    params: FinancialParameters,
) -> NpvResult {
    let mut records = monthly_costs.to_vec();
    records.sort_by_key(|record| (record.year, record.month));

    let monthly_opex = params.opex_fraction * capex / 12.0;
    let mut npv = -capex;
    let mut payback_month = None;
    let mut trace = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let t = index + 1;
        let discount = (1.0 + params.discount_rate).powf((t - 1) as f64 / 12.0);
        npv += (record.savings() - monthly_opex) / discount;

        if payback_month.is_none() && npv >= 0.0 {
            payback_month = Some(t);
        }
        trace.push(NpvPoint {
            year: record.year,
            month: record.month,
            cumulative_npv: npv,
        });
    }

    NpvResult {
        initial_investment: capex,
        net_present_value: npv,
        payback_month,
        trace,
    }
}
