use std::collections::BTreeMap;
use std::collections::btree_map;

use chrono::NaiveDateTime;

/// Ordered hourly energy values (Wh) keyed by timestamp.
///
/// Gaps are allowed; a missing hour reads as zero when two series are paired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlySeries {
    values: BTreeMap<NaiveDateTime, f64>,
}

impl HourlySeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replaces any previous value at `time`
    pub fn insert(&mut self, time: NaiveDateTime, value: f64) {
        self.values.insert(time, value);
    }

    /// Adds `value` to the entry at `time`, creating it when absent
    pub fn accumulate(&mut self, time: NaiveDateTime, value: f64) {
        *self.values.entry(time).or_insert(0.0) += value;
    }

    pub fn get(&self, time: &NaiveDateTime) -> Option<f64> {
        self.values.get(time).copied()
    }

    pub fn get_or_zero(&self, time: &NaiveDateTime) -> f64 {
        self.get(time).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDateTime, &f64)> {
        self.values.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &NaiveDateTime> {
        self.values.keys()
    }

    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }

    pub fn first_time(&self) -> Option<NaiveDateTime> {
        self.values.keys().next().copied()
    }

    /// Multiplies every value by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        self.values.iter().map(|(&t, &v)| (t, v * factor)).collect()
    }

    /// Pointwise sum over the union of both key sets
    pub fn add(&self, other: &HourlySeries) -> Self {
        let mut sum = self.clone();
        for (&time, &value) in other.iter() {
            sum.accumulate(time, value);
        }
        sum
    }

    /// Σ min(self, other) over the keys of `self`, missing hours of `other` read as zero
    pub fn overlap_with(&self, other: &HourlySeries) -> f64 {
        self.values
            .iter()
            .map(|(time, &value)| value.min(other.get_or_zero(time)))
            .sum()
    }
}

impl FromIterator<(NaiveDateTime, f64)> for HourlySeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDateTime, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for HourlySeries {
    type Item = (NaiveDateTime, f64);
    type IntoIter = btree_map::IntoIter<NaiveDateTime, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a HourlySeries {
    type Item = (&'a NaiveDateTime, &'a f64);
    type IntoIter = btree_map::Iter<'a, NaiveDateTime, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Test helper: a contiguous hourly series starting at `start`
#[cfg(test)]
pub(crate) fn hourly_from(start: NaiveDateTime, values: &[f64]) -> HourlySeries {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| (start + chrono::Duration::hours(i as i64), v))
        .collect()
}
