pub mod aggregation;
pub mod balance;
pub mod finance;
pub mod horizon;
pub mod indicators;
pub mod production;
pub mod profile;
pub mod series;

pub use finance::{FinancialParameters, NpvResult, calculate_npv};
pub use series::HourlySeries;
