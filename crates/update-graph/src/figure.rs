//! Chart and table models handed to the browser for rendering.

use data_adapters::{Grid, TimeSeries};
use serde::Serialize;

/// Values along the x axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum XValues {
    /// ISO-formatted dates or category labels.
    Labels(Vec<String>),
    Numbers(Vec<f64>),
}

/// One plotted series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trace {
    Line {
        name: String,
        x: XValues,
        y: Vec<Option<f64>>,
    },
    Bar {
        name: String,
        x: XValues,
        y: Vec<Option<f64>>,
    },
    Surface {
        name: String,
        z: Vec<Vec<Option<f64>>>,
    },
}

/// A chart: title, axis labels and traces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    pub traces: Vec<Trace>,
}

impl Figure {
    /// A figure with no traces, shown when there is nothing to plot.
    pub fn empty(title: &str) -> Self {
        Self {
            title: title.to_string(),
            x_label: None,
            y_label: None,
            traces: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn with_labels(mut self, x: &str, y: &str) -> Self {
        self.x_label = Some(x.to_string());
        self.y_label = Some(y.to_string());
        self
    }

    /// One line per column of `series`, dates on the x axis.
    pub fn lines(title: &str, series: &TimeSeries) -> Self {
        let x = date_labels(series, "%Y-%m-%d");
        Self {
            traces: series
                .columns
                .iter()
                .map(|c| Trace::Line {
                    name: c.name.clone(),
                    x: x.clone(),
                    y: c.values.clone(),
                })
                .collect(),
            ..Self::empty(title)
        }
    }

    /// Bars for the first column of an annual series, years on the x axis.
    pub fn annual_bars(title: &str, series: &TimeSeries) -> Self {
        let Some(column) = series.columns.first() else {
            return Self::empty(title);
        };
        Self {
            traces: vec![Trace::Bar {
                name: column.name.clone(),
                x: date_labels(series, "%Y"),
                y: column.values.clone(),
            }],
            ..Self::empty(title)
        }
    }

    /// A 3-D surface of a grid.
    pub fn surface(title: &str, grid: &Grid) -> Self {
        Self {
            traces: vec![Trace::Surface {
                name: "elevation".to_string(),
                z: grid.to_rows(),
            }],
            ..Self::empty(title)
        }
    }

    /// A profile line over sample positions 0..n.
    pub fn profile(title: &str, values: &[Option<f64>]) -> Self {
        Self {
            traces: vec![Trace::Line {
                name: "elevation".to_string(),
                x: XValues::Numbers((0..values.len()).map(|i| i as f64).collect()),
                y: values.to_vec(),
            }],
            ..Self::empty(title)
        }
    }
}

fn date_labels(series: &TimeSeries, fmt: &str) -> XValues {
    XValues::Labels(series.index.iter().map(|ts| ts.format(fmt).to_string()).collect())
}

/// A read-only data table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl Table {
    /// Date column followed by one column per series column.
    pub fn from_series(series: &TimeSeries, date_header: &str, date_fmt: &str) -> Self {
        let mut columns = vec![date_header.to_string()];
        columns.extend(series.columns.iter().map(|c| c.name.clone()));

        let rows = series
            .index
            .iter()
            .enumerate()
            .map(|(i, ts)| {
                let mut row = vec![serde_json::json!(ts.format(date_fmt).to_string())];
                row.extend(series.columns.iter().map(|c| match c.values[i] {
                    Some(v) => serde_json::json!((v * 100.0).round() / 100.0),
                    None => serde_json::Value::Null,
                }));
                row
            })
            .collect();

        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
