pub mod config;
pub mod data_source;
pub mod objective;
pub mod optimizer;
pub mod plot;
pub mod run;

pub use config::{OptimizerSettings, PenaltyTable, SizingConfig, Strategy};
pub use data_source::{CsvDataSource, DataSource, InMemoryDataSource, ReferenceData};
pub use objective::{Evaluation, ObjectiveFunction, Verdict};
pub use optimizer::{GenerationProgress, OptimizationResult, Optimizer, StopReason};
pub use run::{SizingOutcome, run_sizing, size_reference, write_report};
