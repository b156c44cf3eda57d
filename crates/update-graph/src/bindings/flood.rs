//! Flood inundation: the WMS overlay threshold and the info panel summary.

use std::collections::BTreeMap;

use async_trait::async_trait;
use data_adapters::RequestParams;
use tracing::debug;

use super::{controls, drawn, expect_series, outputs};
use crate::binding::{Binding, BindingContext, BindingError, BindingOutcome, FirePolicy};
use crate::control::ControlId;
use crate::view::{OutputTarget, OutputValue};

/// Pushes the inundation slider value into the flood layer's parameters.
///
/// The layer keeps its initial parameters until the slider is really moved.
pub struct FloodOverlay {
    inputs: [ControlId; 1],
    output: OutputTarget,
}

impl FloodOverlay {
    pub fn new() -> Self {
        Self {
            inputs: [controls::THRESHOLD.into()],
            output: outputs::FLOOD_PARAMS.into(),
        }
    }
}

impl Default for FloodOverlay {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Binding for FloodOverlay {
    fn name(&self) -> &str {
        "flood_overlay"
    }

    fn inputs(&self) -> &[ControlId] {
        &self.inputs
    }

    fn output(&self) -> &OutputTarget {
        &self.output
    }

    fn policy(&self) -> FirePolicy {
        FirePolicy::FiresOnlyOnChange
    }

    async fn compute(&self, ctx: &BindingContext<'_>) -> Result<BindingOutcome, BindingError> {
        if !ctx.triggered_by_user() {
            return Ok(BindingOutcome::NoUpdate);
        }
        let threshold = ctx.number(&self.inputs[0])?;
        Ok(BindingOutcome::Update(OutputValue::LayerParams(BTreeMap::from([(
            "threshold".to_string(),
            serde_json::json!(threshold),
        )]))))
    }
}

/// Square metres per hectare.
const M2_PER_HA: f64 = 10_000.0;
/// Cubic metres per megalitre.
const M3_PER_ML: f64 = 1_000.0;

/// Inundated area and volume under the last drawn feature.
///
/// The flood product answers one row whose first data column is the
/// volume (m³) and second the area (m²), whatever the headers are called.
pub struct FloodInfo {
    inputs: [ControlId; 2],
    output: OutputTarget,
    product: String,
}

impl FloodInfo {
    pub fn new() -> Self {
        Self {
            inputs: [controls::DRAWN.into(), controls::THRESHOLD.into()],
            output: outputs::INFO.into(),
            product: "flood".to_string(),
        }
    }
}

impl Default for FloodInfo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Binding for FloodInfo {
    fn name(&self) -> &str {
        "flood_info"
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
            return Ok(BindingOutcome::Update(OutputValue::Text(String::new())));
        };
        let threshold = ctx.number(&self.inputs[1])?;

        let payload = ctx
            .services
            .adapter
            .fetch(&self.product, &RequestParams::with_threshold(threshold), feature)
            .await?;
        let series = expect_series(&self.product, payload)?;

        let (Some(volume), Some(area)) = (series.value_at(0, 0), series.value_at(0, 1)) else {
            return Err(BindingError::EmptyResult(format!(
                "no volume and area in the first row of {}",
                self.product
            )));
        };
        let (area, volume) = (area / M2_PER_HA, volume / M3_PER_ML);

        debug!(threshold, area, volume, "Flood summary");
        Ok(BindingOutcome::Update(OutputValue::Text(format!(
            "Area: {:.2} ha | Volume: {:.2} ML",
            area, volume
        ))))
    }
}
