use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDateTime, Timelike};
use pv_model::ProfilePoint;

use crate::general::series::HourlySeries;

/// The four consumption vs production views shown to the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileSet {
    /// Every hour of the reference year
    pub annual: Vec<ProfilePoint>,
    /// Average per (day of month, hour)
    pub monthly: Vec<ProfilePoint>,
    /// Average per (weekday, hour), Monday first
    pub weekly: Vec<ProfilePoint>,
    /// Average per hour of day
    pub daily: Vec<ProfilePoint>,
}

pub fn build_profiles(consumption: &HourlySeries, production: &HourlySeries) -> ProfileSet {
    ProfileSet {
        annual: annual_profile(consumption, production),
        monthly: averaged_profile(consumption, production, |t| (t.day(), t.hour()), |(day, hour)| {
            format!("d{day:02} {hour:02}h")
        }),
        weekly: averaged_profile(
            consumption,
            production,
            |t| (t.weekday().num_days_from_monday(), t.hour()),
            |(weekday, hour)| format!("{} {hour:02}h", weekday_name(weekday)),
        ),
        daily: averaged_profile(consumption, production, |t| (0, t.hour()), |(_, hour)| {
            format!("{hour:02}h")
        }),
    }
}

/// Hour by hour over the union of both series, gaps read as zero
pub fn annual_profile(consumption: &HourlySeries, production: &HourlySeries) -> Vec<ProfilePoint> {
    let times: BTreeSet<&NaiveDateTime> = consumption.keys().chain(production.keys()).collect();
    times
        .into_iter()
        .map(|time| ProfilePoint {
            label: time.format("%Y-%m-%d %H:00").to_string(),
            consumption_w: consumption.get_or_zero(time),
            production_w: production.get_or_zero(time),
        })
        .collect()
}

/// Averages each series independently per bucket; a bucket missing from one series reads as 0
fn averaged_profile<K, L>(
    consumption: &HourlySeries,
    production: &HourlySeries,
    bucket: K,
    label: L,
) -> Vec<ProfilePoint>
where
    K: Fn(&NaiveDateTime) -> (u32, u32),
    L: Fn((u32, u32)) -> String,
{
    let consumption_avg = bucket_means(consumption, &bucket);
    let production_avg = bucket_means(production, &bucket);

    let keys: BTreeSet<(u32, u32)> = consumption_avg
        .keys()
        .chain(production_avg.keys())
        .copied()
        .collect();

    keys.into_iter()
        .map(|key| ProfilePoint {
            label: label(key),
            consumption_w: consumption_avg.get(&key).copied().unwrap_or(0.0),
            production_w: production_avg.get(&key).copied().unwrap_or(0.0),
        })
        .collect()
}

fn bucket_means<K>(series: &HourlySeries, bucket: &K) -> BTreeMap<(u32, u32), f64>
where
    K: Fn(&NaiveDateTime) -> (u32, u32),
{
    let mut sums: BTreeMap<(u32, u32), (f64, usize)> = BTreeMap::new();
    for (time, &value) in series {
        let entry = sums.entry(bucket(time)).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(key, (sum, count))| (key, sum / count as f64))
        .collect()
}

fn weekday_name(days_from_monday: u32) -> &'static str {
    const NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    NAMES.get(days_from_monday as usize).copied().unwrap_or("?")
}
