//! Display-ready payloads returned by the adapters.

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

/// A named numeric column; `None` marks a missing value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Date-indexed table with one or more numeric columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    pub index: Vec<NaiveDateTime>,
    pub columns: Vec<Column>,
}

impl TimeSeries {
    pub fn new(index: Vec<NaiveDateTime>, columns: Vec<Column>) -> Self {
        Self { index, columns }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Value at `row` of the column named `name`.
    pub fn value(&self, row: usize, name: &str) -> Option<f64> {
        self.column(name)?.values.get(row).copied().flatten()
    }

    /// Value at (`row`, `col`) by position, as with a positional dataframe lookup.
    pub fn value_at(&self, row: usize, col: usize) -> Option<f64> {
        self.columns.get(col)?.values.get(row).copied().flatten()
    }

    /// Rows whose timestamp falls within calendar year `year`.
    pub fn filter_year(&self, year: i32) -> TimeSeries {
        let rows: Vec<usize> = self
            .index
            .iter()
            .enumerate()
            .filter(|(_, ts)| ts.year() == year)
            .map(|(i, _)| i)
            .collect();

        TimeSeries {
            index: rows.iter().map(|&i| self.index[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), rows.iter().map(|&i| c.values[i]).collect()))
                .collect(),
        }
    }

    /// Distinct calendar years present in the index, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.index.iter().map(|ts| ts.year()).collect();
        years.sort_unstable();
        years.dedup();
        years
    }
}

/// Gridded 2-D values in row-major order (e.g. an elevation surface).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<Option<f64>>,
}

impl Grid {
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.values[row * self.cols + col]
    }

    /// Values as nested rows, the shape a surface trace expects.
    pub fn to_rows(&self) -> Vec<Vec<Option<f64>>> {
        if self.cols == 0 {
            return Vec::new();
        }
        self.values.chunks(self.cols).map(|r| r.to_vec()).collect()
    }
}

/// Anything an adapter can hand back to a binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    TimeSeries(TimeSeries),
    Grid(Grid),
    Profile(Vec<Option<f64>>),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::TimeSeries(_) => "time series",
            Payload::Grid(_) => "grid",
            Payload::Profile(_) => "profile",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_common::parse_timestamp;

    fn series() -> TimeSeries {
        let index = ["2002-05-01", "2002-11-01", "2003-02-01"]
            .iter()
            .map(|s| parse_timestamp(s).unwrap())
            .collect();
        TimeSeries::new(
            index,
            vec![Column::new("tws", vec![Some(1.0), None, Some(3.0)])],
        )
    }

    #[test]
    fn test_filter_year() {
        let ts = series();
        let y2002 = ts.filter_year(2002);
        assert_eq!(y2002.len(), 2);
        assert_eq!(y2002.value(0, "tws"), Some(1.0));
        assert_eq!(y2002.value(1, "tws"), None);
        assert!(ts.filter_year(1990).is_empty());
    }

    #[test]
    fn test_years() {
        assert_eq!(series().years(), vec![2002, 2003]);
    }

    #[test]
    fn test_grid_rows() {
        let grid = Grid {
            rows: 2,
            cols: 2,
            values: vec![Some(1.0), None, Some(-2.0), Some(5.0)],
        };
        assert_eq!(grid.get(1, 0), Some(-2.0));
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.to_rows()[0], vec![Some(1.0), None]);
    }
}
