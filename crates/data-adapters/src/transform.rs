//! Reshaping of parsed payloads into display-ready series.
//!
//! Steps run in a fixed order: fill-value substitution, column pruning,
//! scaling, resampling and finally renaming, so every rule refers to the
//! column names the remote service uses.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

use crate::error::AdapterError;
use crate::product::{Aggregation, Interval, ResampleConfig, TransformConfig};
use crate::series::{Column, Grid, TimeSeries};

const FILL_RELATIVE_TOLERANCE: f64 = 1e-6;

/// Apply every configured rule to a time series.
pub fn apply(series: TimeSeries, config: &TransformConfig) -> Result<TimeSeries, AdapterError> {
    let mut series = series;

    if let Some(fill) = config.fill_value {
        for column in &mut series.columns {
            substitute_fill(&mut column.values, fill);
        }
    }

    if !config.keep.is_empty() {
        series = prune(series, &config.keep)?;
    }

    for (name, factor) in &config.scale {
        let column = series
            .columns
            .iter_mut()
            .find(|c| &c.name == name)
            .ok_or_else(|| missing_column(name))?;
        for value in column.values.iter_mut().flatten() {
            *value *= factor;
        }
    }

    if let Some(resample_config) = &config.resample {
        series = resample(&series, resample_config);
    }

    for column in &mut series.columns {
        if let Some(new_name) = config.rename.get(&column.name) {
            column.name = new_name.clone();
        }
    }

    Ok(series)
}

/// Map the sentinel `fill` to missing in place.
///
/// Matching is relative so a float32 sentinel printed as text by the remote
/// service still matches its exact binary value.
pub fn substitute_fill(values: &mut [Option<f64>], fill: f64) {
    let tolerance = FILL_RELATIVE_TOLERANCE * fill.abs().max(1.0);
    for slot in values.iter_mut() {
        if matches!(slot, Some(v) if (*v - fill).abs() <= tolerance) {
            *slot = None;
        }
    }
}

/// Apply the fill value of `config` to a grid.
pub fn apply_grid(mut grid: Grid, config: &TransformConfig) -> Grid {
    if let Some(fill) = config.fill_value {
        substitute_fill(&mut grid.values, fill);
    }
    grid
}

/// Apply the fill value of `config` to a profile.
pub fn apply_profile(mut values: Vec<Option<f64>>, config: &TransformConfig) -> Vec<Option<f64>> {
    if let Some(fill) = config.fill_value {
        substitute_fill(&mut values, fill);
    }
    values
}

fn missing_column(name: &str) -> AdapterError {
    AdapterError::parse("csv", format!("response has no column '{}'", name))
}

fn prune(series: TimeSeries, keep: &[String]) -> Result<TimeSeries, AdapterError> {
    let TimeSeries { index, columns } = series;
    let mut by_name: BTreeMap<String, Column> =
        columns.into_iter().map(|c| (c.name.clone(), c)).collect();

    let kept = keep
        .iter()
        .map(|name| by_name.remove(name).ok_or_else(|| missing_column(name)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TimeSeries::new(index, kept))
}

/// Bucket start for a timestamp.
fn bucket(ts: &NaiveDateTime, interval: Interval) -> NaiveDate {
    let month = match interval {
        Interval::Year => 1,
        Interval::Month => ts.month(),
    };
    NaiveDate::from_ymd_opt(ts.year(), month, 1).unwrap_or_else(|| ts.date())
}

/// Resample to a coarser interval. Buckets are labelled by their first day
/// and returned in ascending order; a bucket with no present values stays
/// missing.
pub fn resample(series: &TimeSeries, config: &ResampleConfig) -> TimeSeries {
    let mut buckets: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
    for (row, ts) in series.index.iter().enumerate() {
        buckets.entry(bucket(ts, config.interval)).or_default().push(row);
    }

    let index = buckets
        .keys()
        .filter_map(|d| d.and_hms_opt(0, 0, 0))
        .collect();

    let columns = series
        .columns
        .iter()
        .map(|column| {
            let values = buckets
                .values()
                .map(|rows| {
                    let present: Vec<f64> =
                        rows.iter().filter_map(|&r| column.values[r]).collect();
                    aggregate(&present, config.aggregation)
                })
                .collect();
            Column::new(column.name.clone(), values)
        })
        .collect();

    TimeSeries::new(index, columns)
}

fn aggregate(values: &[f64], aggregation: Aggregation) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    match aggregation {
        Aggregation::Sum => Some(values.iter().sum()),
        Aggregation::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
        Aggregation::Last => values.last().copied(),
    }
}
