pub mod panel;
pub mod report;
pub mod sample;

pub use panel::{Configuration, PanelCatalog, PanelClass, PanelType};
pub use report::{
    DailyIndicator, IndicatorSummary, MonthlyCostRecord, NpvPoint, ProfilePoint, SizingReport,
};
pub use sample::{Appliance, MeteredSample, ReferenceWindow};
