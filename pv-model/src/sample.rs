use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// One raw reading from the metering store.
///
/// `source_id` is the appliance (consumption) or weather station (irradiance),
/// `variable_id` the measured quantity. Timestamps are UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./sample.ts")]
pub struct MeteredSample {
    pub source_id: i64,
    pub variable_id: i64,
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl MeteredSample {
    pub fn new(source_id: i64, variable_id: i64, timestamp: NaiveDateTime, value: f64) -> Self {
        Self {
            source_id,
            variable_id,
            timestamp,
            value,
        }
    }

    /// Builds a sample from epoch seconds, `None` if the epoch is out of range
    pub fn from_epoch(source_id: i64, variable_id: i64, epoch: i64, value: f64) -> Option<Self> {
        let timestamp = DateTime::from_timestamp(epoch, 0)?.naive_utc();
        Some(Self::new(source_id, variable_id, timestamp, value))
    }
}

/// Inclusive epoch bounds of the reference year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./sample.ts")]
pub struct ReferenceWindow {
    pub start_epoch: i64,
    pub end_epoch: i64,
}

impl ReferenceWindow {
    /// Window of the appliance consumption samples (Feb 1998 - Feb 1999)
    pub const CONSUMPTION: ReferenceWindow = ReferenceWindow {
        start_epoch: 886_709_400,
        end_epoch: 918_244_800,
    };

    /// Window of the hourly irradiance samples, starting on the first full hour
    pub const IRRADIANCE: ReferenceWindow = ReferenceWindow {
        start_epoch: 886_712_400,
        end_epoch: 918_244_800,
    };

    pub fn contains(&self, epoch: i64) -> bool {
        (self.start_epoch..=self.end_epoch).contains(&epoch)
    }

    pub fn is_valid(&self) -> bool {
        self.start_epoch <= self.end_epoch
    }
}

/// A metered appliance of the household.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./sample.ts")]
pub struct Appliance {
    pub id: i64,
    pub name: String,
}

impl Appliance {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }

    /// Appliances metered in the reference household
    pub fn reference_set() -> Vec<Appliance> {
        vec![
            Appliance::new(0, "water pump"),
            Appliance::new(1, "water heater"),
            Appliance::new(2, "washing machine"),
            Appliance::new(4, "freezer"),
            Appliance::new(5, "fridge freezer"),
            Appliance::new(6, "total site light"),
            Appliance::new(7, "TV"),
            Appliance::new(9, "boiler"),
        ]
    }
}
