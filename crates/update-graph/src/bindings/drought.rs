//! Drought index trend for a selected year and annual rainfall totals.

use async_trait::async_trait;
use data_adapters::{RequestParams, TimeSeries};

use super::{controls, drawn, expect_series, outputs};
use crate::binding::{Binding, BindingContext, BindingError, BindingOutcome};
use crate::control::ControlId;
use crate::figure::Figure;
use crate::view::{OutputTarget, OutputValue};

/// Drought index series restricted to one calendar year.
pub struct DroughtTrend {
    inputs: [ControlId; 1],
    output: OutputTarget,
}

impl DroughtTrend {
    pub fn new() -> Self {
        Self {
            inputs: [controls::YEAR.into()],
            output: outputs::DROUGHT.into(),
        }
    }
}

impl Default for DroughtTrend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Binding for DroughtTrend {
    fn name(&self) -> &str {
        "drought_trend"
    }

    fn inputs(&self) -> &[ControlId] {
        &self.inputs
    }

    fn output(&self) -> &OutputTarget {
        &self.output
    }

    async fn compute(&self, ctx: &BindingContext<'_>) -> Result<BindingOutcome, BindingError> {
        let series = ctx
            .services
            .reference
            .drought
            .as_ref()
            .ok_or(BindingError::MissingReference("drought"))?;
        let year = ctx.number(&self.inputs[0])?;
        let title = format!("Drought index {}", year as i32);

        let rows = series.filter_year(year as i32);
        if rows.is_empty() {
            return Ok(BindingOutcome::Update(OutputValue::Figure(Figure::empty(&title))));
        }

        // One trace: the first data column.
        let single = TimeSeries::new(rows.index, rows.columns.into_iter().take(1).collect());
        Ok(BindingOutcome::Update(OutputValue::Figure(
            Figure::lines(&title, &single).with_labels("Date", "Index"),
        )))
    }
}

/// Annual rainfall totals for the last drawn feature.
pub struct RainfallTotals {
    inputs: [ControlId; 1],
    output: OutputTarget,
    product: String,
}

impl RainfallTotals {
    pub fn new() -> Self {
        Self {
            inputs: [controls::DRAWN.into()],
            output: outputs::RAINFALL.into(),
            product: "rainfall".to_string(),
        }
    }
}

impl Default for RainfallTotals {
    fn default() -> Self {
        Self::new()
    }
}

const RAINFALL_TITLE: &str = "Annual rainfall";

#[async_trait]
impl Binding for RainfallTotals {
    fn name(&self) -> &str {
        "rainfall_totals"
    }

    fn inputs(&self) -> &[ControlId] {
        &self.inputs
    }

    fn output(&self) -> &OutputTarget {
        &self.output
    }

    async fn compute(&self, ctx: &BindingContext<'_>) -> Result<BindingOutcome, BindingError> {
        let collection = drawn(ctx, &self.inputs[0]);
        let Some(feature) = collection.last_feature() else {
            return Ok(BindingOutcome::Update(OutputValue::Figure(Figure::empty(
                RAINFALL_TITLE,
            ))));
        };

        let payload = ctx
            .services
            .adapter
            .fetch(&self.product, &RequestParams::default(), feature)
            .await?;
        let series = expect_series(&self.product, payload)?;

        Ok(BindingOutcome::Update(OutputValue::Figure(
            Figure::annual_bars(RAINFALL_TITLE, &series).with_labels("Year", "Rainfall (mm)"),
        )))
    }
}
