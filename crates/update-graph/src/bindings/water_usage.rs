//! Water usage per project catchment and the catchment hover panel.

use async_trait::async_trait;
use dash_common::Feature;
use data_adapters::reference::AREA_PROPERTY;
use data_adapters::RequestParams;

use super::{controls, expect_series, outputs};
use crate::binding::{Binding, BindingContext, BindingError, BindingOutcome};
use crate::control::{ControlId, ControlValue};
use crate::figure::Table;
use crate::view::{OutputTarget, OutputValue};

const INFO_HEADER: &str = "Catchment areas";

/// Annual usage table for the catchment picked in the project dropdown.
pub struct WaterUsage {
    inputs: [ControlId; 1],
    output: OutputTarget,
    product: String,
}

impl WaterUsage {
    pub fn new() -> Self {
        Self {
            inputs: [controls::PROJECT.into()],
            output: outputs::USAGE.into(),
            product: "water_usage".to_string(),
        }
    }
}

impl Default for WaterUsage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Binding for WaterUsage {
    fn name(&self) -> &str {
        "water_usage"
    }

    fn inputs(&self) -> &[ControlId] {
        &self.inputs
    }

    fn output(&self) -> &OutputTarget {
        &self.output
    }

    async fn compute(&self, ctx: &BindingContext<'_>) -> Result<BindingOutcome, BindingError> {
        let project = match ctx.controls.get(&self.inputs[0]) {
            Some(ControlValue::Text(id)) => id.clone(),
            Some(ControlValue::Number(n)) => format!("{}", n),
            // Cleared selection keeps the last table.
            _ => return Ok(BindingOutcome::NoUpdate),
        };

        let catchments = ctx
            .services
            .reference
            .catchments
            .as_ref()
            .ok_or(BindingError::MissingReference("catchments"))?;
        let feature = catchments
            .get(&project)
            .ok_or_else(|| BindingError::UnknownFeature(project.clone()))?;

        let payload = ctx
            .services
            .adapter
            .fetch(&self.product, &RequestParams::default(), feature)
            .await?;
        let series = expect_series(&self.product, payload)?;

        Ok(BindingOutcome::Update(OutputValue::Table(Table::from_series(
            &series, "Year", "%Y",
        ))))
    }
}

/// Equal-area size of the catchment under the pointer.
pub struct CatchmentInfo {
    inputs: [ControlId; 1],
    output: OutputTarget,
}

impl CatchmentInfo {
    pub fn new() -> Self {
        Self {
            inputs: [controls::HOVER.into()],
            output: outputs::CATCHMENT_INFO.into(),
        }
    }

    fn area_m2(ctx: &BindingContext<'_>, feature: &Feature) -> Result<f64, BindingError> {
        if let Some(area) = feature.number_property(AREA_PROPERTY) {
            return Ok(area);
        }
        let catchments = ctx
            .services
            .reference
            .catchments
            .as_ref()
            .ok_or(BindingError::MissingReference("catchments"))?;
        let id = feature
            .identifier(catchments.id_property())
            .ok_or_else(|| BindingError::UnknownFeature("feature without id".to_string()))?;
        catchments
            .area_of(&id)
            .ok_or(BindingError::UnknownFeature(id))
    }
}

impl Default for CatchmentInfo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Binding for CatchmentInfo {
    fn name(&self) -> &str {
        "catchment_info"
    }

    fn inputs(&self) -> &[ControlId] {
        &self.inputs
    }

    fn output(&self) -> &OutputTarget {
        &self.output
    }

    async fn compute(&self, ctx: &BindingContext<'_>) -> Result<BindingOutcome, BindingError> {
        let text = match ctx.controls.feature(&self.inputs[0]) {
            None => format!("{}\nHover over a region", INFO_HEADER),
            Some(feature) => {
                let hectares = Self::area_m2(ctx, feature)? / 10_000.0;
                format!("{}\n{:.2} ha", INFO_HEADER, hectares)
            }
        };
        Ok(BindingOutcome::Update(OutputValue::Text(text)))
    }
}
