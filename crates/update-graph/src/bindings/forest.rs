//! Forest condition indicators under the last drawn polygon.

use async_trait::async_trait;
use dash_common::GeometryKind;
use data_adapters::RequestParams;

use super::{controls, drawn, expect_series, outputs};
use crate::binding::{Binding, BindingContext, BindingError, BindingOutcome};
use crate::control::ControlId;
use crate::figure::Figure;
use crate::view::{OutputTarget, OutputValue};

const TITLE: &str = "Forest condition";

pub struct ForestCondition {
    inputs: [ControlId; 1],
    output: OutputTarget,
    product: String,
}

impl ForestCondition {
    pub fn new() -> Self {
        Self {
            inputs: [controls::DRAWN.into()],
            output: outputs::FOREST.into(),
            product: "forest_condition".to_string(),
        }
    }
}

impl Default for ForestCondition {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Binding for ForestCondition {
    fn name(&self) -> &str {
        "forest_condition"
    }

    fn inputs(&self) -> &[ControlId] {
        &self.inputs
    }

    fn output(&self) -> &OutputTarget {
        &self.output
    }

    async fn compute(&self, ctx: &BindingContext<'_>) -> Result<BindingOutcome, BindingError> {
        let collection = drawn(ctx, &self.inputs[0]);
        if collection.is_empty() {
            return Ok(BindingOutcome::Update(OutputValue::Figure(Figure::empty(TITLE))));
        }
        let Some(polygon) = collection.last_of_kind(GeometryKind::Polygon) else {
            return Ok(BindingOutcome::NoUpdate);
        };

        let payload = ctx
            .services
            .adapter
            .fetch(&self.product, &RequestParams::default(), polygon)
            .await?;
        let series = expect_series(&self.product, payload)?;
        if series.is_empty() {
            return Err(BindingError::EmptyResult(format!(
                "{} returned no rows",
                self.product
            )));
        }

        Ok(BindingOutcome::Update(OutputValue::Figure(
            Figure::lines(TITLE, &series).with_labels("Date", "Value"),
        )))
    }
}
