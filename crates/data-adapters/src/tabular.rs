//! CSV responses with a date index.
//!
//! Expected shape (header row required):
//!
//! ```text
//! date,volume,area
//! 2021-01-01,50000,200000
//! ```
//!
//! The first column is the index; every other column must be numeric.
//! Empty cells and `NaN` become missing values.

use csv::ReaderBuilder;
use dash_common::parse_timestamp;

use crate::error::AdapterError;
use crate::series::{Column, TimeSeries};

/// Parse a CSV body into a [`TimeSeries`].
pub fn parse_csv(body: &[u8]) -> Result<TimeSeries, AdapterError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(body);

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(AdapterError::parse(
            "csv",
            format!("expected an index and at least one value column, got {} columns", headers.len()),
        ));
    }

    let mut index = Vec::new();
    let mut columns: Vec<Column> = headers
        .iter()
        .skip(1)
        .map(|name| Column::new(name, Vec::new()))
        .collect();

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let raw_ts = record.get(0).unwrap_or_default();
        let ts = parse_timestamp(raw_ts)
            .map_err(|e| AdapterError::parse("csv", format!("row {}: {}", line + 1, e)))?;
        index.push(ts);

        for (col, column) in columns.iter_mut().enumerate() {
            let cell = record.get(col + 1).unwrap_or_default();
            let value = parse_cell(cell).map_err(|_| {
                AdapterError::parse(
                    "csv",
                    format!("row {}: column '{}' is not numeric: '{}'", line + 1, column.name, cell),
                )
            })?;
            column.values.push(value);
        }
    }

    Ok(TimeSeries::new(index, columns))
}

fn parse_cell(cell: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let value: f64 = cell.parse()?;
    Ok(value.is_finite().then_some(value))
}
