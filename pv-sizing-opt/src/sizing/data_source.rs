use std::path::{Path, PathBuf};

use pv_model::{MeteredSample, ReferenceWindow};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, SizingError};
use crate::general::aggregation::{aggregate_hourly, hourly_values, merge_appliances};
use crate::general::series::HourlySeries;
use crate::sizing::config::DataSelection;

/// Read access to the metering store.
pub trait DataSource {
    /// Raw consumption samples of one appliance within `window`, ordered by time
    fn query_consumption(
        &self,
        house_id: i64,
        appliance_id: i64,
        window: ReferenceWindow,
    ) -> Result<Vec<MeteredSample>>;

    /// Hourly irradiance samples of one weather station within `window`, ordered by time
    fn query_irradiance(
        &self,
        station_id: i64,
        variable_id: i64,
        window: ReferenceWindow,
    ) -> Result<Vec<MeteredSample>>;
}

/// Samples held in memory, keyed by (source, variable) like the store tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    /// (house_id, sample) with `sample.source_id` the appliance
    consumption: Vec<(i64, MeteredSample)>,
    irradiance: Vec<MeteredSample>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_consumption(&mut self, house_id: i64, sample: MeteredSample) {
        self.consumption.push((house_id, sample));
    }

    pub fn add_irradiance(&mut self, sample: MeteredSample) {
        self.irradiance.push(sample);
    }
}

fn in_window(sample: &MeteredSample, window: ReferenceWindow) -> bool {
    window.contains(sample.timestamp.and_utc().timestamp())
}

fn sorted(mut samples: Vec<MeteredSample>) -> Vec<MeteredSample> {
    samples.sort_by_key(|s| s.timestamp);
    samples
}

impl DataSource for InMemoryDataSource {
    fn query_consumption(
        &self,
        house_id: i64,
        appliance_id: i64,
        window: ReferenceWindow,
    ) -> Result<Vec<MeteredSample>> {
        Ok(sorted(
            self.consumption
                .iter()
                .filter(|(house, s)| {
                    *house == house_id && s.source_id == appliance_id && in_window(s, window)
                })
                .map(|(_, s)| s.clone())
                .collect(),
        ))
    }

    fn query_irradiance(
        &self,
        station_id: i64,
        variable_id: i64,
        window: ReferenceWindow,
    ) -> Result<Vec<MeteredSample>> {
        Ok(sorted(
            self.irradiance
                .iter()
                .filter(|s| {
                    s.source_id == station_id && s.variable_id == variable_id && in_window(s, window)
                })
                .cloned()
                .collect(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct ConsumptionRow {
    house_id: i64,
    appliance_id: i64,
    epoch_time: i64,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct WeatherRow {
    station_id: i64,
    variable_id: i64,
    epoch_time: i64,
    value: f64,
}

/// Reads the store exports from two CSV files.
///
/// Consumption: `house_id,appliance_id,epoch_time,value`.
/// Irradiance: `station_id,variable_id,epoch_time,value`.
/// Every query re-reads its file, so load the reference data once with
/// [`ReferenceData::load`] before searching.
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    consumption_path: PathBuf,
    irradiance_path: PathBuf,
}

impl CsvDataSource {
    pub fn new(consumption_path: impl AsRef<Path>, irradiance_path: impl AsRef<Path>) -> Self {
        Self {
            consumption_path: consumption_path.as_ref().to_path_buf(),
            irradiance_path: irradiance_path.as_ref().to_path_buf(),
        }
    }
}

fn to_sample(source_id: i64, variable_id: i64, epoch: i64, value: f64) -> Result<MeteredSample> {
    MeteredSample::from_epoch(source_id, variable_id, epoch, value)
        .ok_or_else(|| SizingError::DataSource(format!("epoch {epoch} is out of range")))
}

impl DataSource for CsvDataSource {
    fn query_consumption(
        &self,
        house_id: i64,
        appliance_id: i64,
        window: ReferenceWindow,
    ) -> Result<Vec<MeteredSample>> {
        let mut reader = csv::Reader::from_path(&self.consumption_path)?;
        let mut samples = Vec::new();
        for row in reader.deserialize() {
            let row: ConsumptionRow = row?;
            if row.house_id == house_id
                && row.appliance_id == appliance_id
                && window.contains(row.epoch_time)
            {
                samples.push(to_sample(row.appliance_id, 0, row.epoch_time, row.value)?);
            }
        }
        Ok(sorted(samples))
    }

    fn query_irradiance(
        &self,
        station_id: i64,
        variable_id: i64,
        window: ReferenceWindow,
    ) -> Result<Vec<MeteredSample>> {
        let mut reader = csv::Reader::from_path(&self.irradiance_path)?;
        let mut samples = Vec::new();
        for row in reader.deserialize() {
            let row: WeatherRow = row?;
            if row.station_id == station_id
                && row.variable_id == variable_id
                && window.contains(row.epoch_time)
            {
                samples.push(to_sample(row.station_id, row.variable_id, row.epoch_time, row.value)?);
            }
        }
        Ok(sorted(samples))
    }
}

/// Reference-year series, loaded once and shared read-only by every evaluation.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    /// Whole-house hourly consumption in Wh
    pub consumption: HourlySeries,
    /// Hourly irradiance in W/m²
    pub irradiance: HourlySeries,
}

impl ReferenceData {
    pub fn new(consumption: HourlySeries, irradiance: HourlySeries) -> Result<Self> {
        if consumption.is_empty() {
            return Err(SizingError::EmptySeries("household consumption".to_string()));
        }
        if irradiance.is_empty() {
            return Err(SizingError::EmptySeries("irradiance".to_string()));
        }
        Ok(Self {
            consumption,
            irradiance,
        })
    }

    /// Queries every appliance and the irradiance once and builds the hourly series
    pub fn load(source: &dyn DataSource, selection: &DataSelection) -> Result<Self> {
        let mut appliance_series = Vec::with_capacity(selection.appliances.len());
        for appliance in &selection.appliances {
            let samples = source.query_consumption(
                selection.house_id,
                appliance.id,
                selection.consumption_window,
            )?;
            let hourly = aggregate_hourly(&samples);
            debug!(
                appliance = %appliance.name,
                samples = samples.len(),
                hours = hourly.len(),
                "aggregated appliance consumption"
            );
            appliance_series.push(hourly);
        }
        let consumption = merge_appliances(&appliance_series)?;

        let irradiance = hourly_values(&source.query_irradiance(
            selection.station_id,
            selection.irradiance_variable_id,
            selection.irradiance_window,
        )?);

        info!(
            consumption_hours = consumption.len(),
            irradiance_hours = irradiance.len(),
            "loaded reference data"
        );
        Self::new(consumption, irradiance)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pv_model::Appliance;

    const HOUSE: i64 = 2_000_916;
    const STATION: i64 = 26_198_001;

    /// 48 hours of irradiance plus two appliances at 10 minute cadence
    pub(crate) fn sample_source() -> InMemoryDataSource {
        let window = ReferenceWindow::IRRADIANCE;
        let mut source = InMemoryDataSource::new();
        for hour in 0..48 {
            let epoch = window.start_epoch + hour * 3600;
            let irradiance = if (8..18).contains(&(hour % 24)) { 600.0 } else { 0.0 };
            source.add_irradiance(MeteredSample::from_epoch(STATION, 4, epoch, irradiance).unwrap());
            for slot in 0..6 {
                let epoch = epoch - 3000 + slot * 600;
                source.add_consumption(HOUSE, MeteredSample::from_epoch(0, 0, epoch, 50.0).unwrap());
                source.add_consumption(HOUSE, MeteredSample::from_epoch(9, 0, epoch, 20.0).unwrap());
            }
        }
        source
    }

    pub(crate) fn selection() -> DataSelection {
        DataSelection {
            appliances: vec![Appliance::new(0, "water pump"), Appliance::new(9, "boiler")],
            ..DataSelection::default()
        }
    }

    #[test]
    fn test_reference_data_aligns_consumption_with_irradiance() {
        let reference = ReferenceData::load(&sample_source(), &selection()).unwrap();
        assert_eq!(reference.consumption.len(), 48);
        assert_eq!(reference.irradiance.len(), 48);
        for (time, &value) in &reference.consumption {
            assert_eq!(value, 6.0 * 70.0);
            assert!(reference.irradiance.get(time).is_some());
        }
    }

    #[test]
    fn test_window_filters_samples() {
        let source = sample_source();
        let narrow = ReferenceWindow {
            start_epoch: ReferenceWindow::IRRADIANCE.start_epoch,
            end_epoch: ReferenceWindow::IRRADIANCE.start_epoch + 3600,
        };
        let samples = source.query_irradiance(STATION, 4, narrow).unwrap();
        assert_eq!(samples.len(), 2);
        assert!(source.query_irradiance(STATION, 5, narrow).unwrap().is_empty());
    }

    #[test]
    fn test_missing_data_fails_fast() {
        let empty = InMemoryDataSource::new();
        assert!(matches!(
            ReferenceData::load(&empty, &selection()),
            Err(SizingError::EmptySeries(_))
        ));

        let mut consumption_only = sample_source();
        consumption_only.irradiance.clear();
        assert!(matches!(
            ReferenceData::load(&consumption_only, &selection()),
            Err(SizingError::EmptySeries(name)) if name == "irradiance"
        ));
    }

    #[test]
    fn test_csv_source() {
        let dir = tempfile::tempdir().unwrap();
        let consumption_path = dir.path().join("consumption.csv");
        let irradiance_path = dir.path().join("irradiance.csv");

        let start = ReferenceWindow::IRRADIANCE.start_epoch;
        let mut consumption = String::from("house_id,appliance_id,epoch_time,value\n");
        for slot in 0..7 {
            consumption.push_str(&format!("{HOUSE},1,{},{}\n", start - 3000 + slot * 600, slot + 1));
        }
        consumption.push_str(&format!("999,1,{start},1000\n"));
        std::fs::write(&consumption_path, consumption).unwrap();
        std::fs::write(
            &irradiance_path,
            format!("station_id,variable_id,epoch_time,value\n{STATION},4,{start},250.5\n{STATION},3,{start},1.0\n"),
        )
        .unwrap();

        let source = CsvDataSource::new(&consumption_path, &irradiance_path);
        let samples = source
            .query_consumption(HOUSE, 1, ReferenceWindow::CONSUMPTION)
            .unwrap();
        assert_eq!(samples.len(), 7);

        let hourly = aggregate_hourly(&samples);
        assert_eq!(hourly.len(), 1);
        assert_eq!(hourly.total(), 21.0);

        let irradiance = source
            .query_irradiance(STATION, 4, ReferenceWindow::IRRADIANCE)
            .unwrap();
        assert_eq!(irradiance.len(), 1);
        assert_eq!(irradiance[0].value, 250.5);
        assert_eq!(hourly.first_time(), Some(irradiance[0].timestamp));
    }

    #[test]
    fn test_csv_missing_file_is_an_error() {
        let source = CsvDataSource::new("/nonexistent/consumption.csv", "/nonexistent/irradiance.csv");
        assert!(source
            .query_irradiance(STATION, 4, ReferenceWindow::IRRADIANCE)
            .is_err());
    }
}
