//! Terrain: elevation surface under a drawn polygon and a profile along a
//! drawn line.

use async_trait::async_trait;
use dash_common::GeometryKind;
use data_adapters::RequestParams;
use tracing::debug;

use super::{controls, drawn, expect_grid, expect_profile, outputs};
use crate::binding::{Binding, BindingContext, BindingError, BindingOutcome};
use crate::control::ControlId;
use crate::figure::Figure;
use crate::view::{OutputTarget, OutputValue};

const SURFACE_TITLE: &str = "Elevation surface";
const SAMPLE_TITLE: &str = "Mt Bruno Elevation";
const PROFILE_TITLE: &str = "Cross-section";

/// 3-D elevation surface of the last drawn polygon.
pub struct TerrainSurface {
    inputs: [ControlId; 1],
    output: OutputTarget,
    product: String,
}

impl TerrainSurface {
    pub fn new() -> Self {
        Self {
            inputs: [controls::DRAWN.into()],
            output: outputs::SURFACE.into(),
            product: "terrain_surface".to_string(),
        }
    }

    /// What the panel shows before anything is drawn.
    fn default_figure(ctx: &BindingContext<'_>) -> Figure {
        match &ctx.services.reference.sample_surface {
            Some(grid) => Figure::surface(SAMPLE_TITLE, grid),
            None => Figure::empty(SURFACE_TITLE),
        }
    }
}

impl Default for TerrainSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Binding for TerrainSurface {
    fn name(&self) -> &str {
        "terrain_surface"
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
            return Ok(BindingOutcome::Update(OutputValue::Figure(
                Self::default_figure(ctx),
            )));
        }
        let Some(polygon) = collection.last_of_kind(GeometryKind::Polygon) else {
            debug!(binding = self.name(), "Last drawn feature is not a polygon");
            return Ok(BindingOutcome::NoUpdate);
        };

        let payload = ctx
            .services
            .adapter
            .fetch(&self.product, &RequestParams::default(), polygon)
            .await?;
        let grid = expect_grid(&self.product, payload)?;

        Ok(BindingOutcome::Update(OutputValue::Figure(
            Figure::surface(SURFACE_TITLE, &grid).with_labels("x", "y"),
        )))
    }
}

/// Elevation profile along the last drawn line.
pub struct CrossSection {
    inputs: [ControlId; 1],
    output: OutputTarget,
    product: String,
}

impl CrossSection {
    pub fn new() -> Self {
        Self {
            inputs: [controls::DRAWN.into()],
            output: outputs::PROFILE.into(),
            product: "cross_section".to_string(),
        }
    }
}

impl Default for CrossSection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Binding for CrossSection {
    fn name(&self) -> &str {
        "cross_section"
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
            return Ok(BindingOutcome::Update(OutputValue::Figure(Figure::empty(
                PROFILE_TITLE,
            ))));
        }
        let Some(line) = collection.last_of_kind(GeometryKind::LineString) else {
            debug!(binding = self.name(), "Last drawn feature is not a line");
            return Ok(BindingOutcome::NoUpdate);
        };

        let payload = ctx
            .services
            .adapter
            .fetch(&self.product, &RequestParams::default(), line)
            .await?;
        let values = expect_profile(&self.product, payload)?;

        Ok(BindingOutcome::Update(OutputValue::Figure(
            Figure::profile(PROFILE_TITLE, &values).with_labels("Sample", "Elevation (m)"),
        )))
    }
}
