//! The concrete dashboard bindings.
//!
//! Each binding owns its input ids and output target so the dashboard
//! variants can register any subset of them against the same controls.

mod drought;
mod flood;
mod forest;
mod terrain;
mod water_usage;

pub use drought::{DroughtTrend, RainfallTotals};
pub use flood::{FloodInfo, FloodOverlay};
pub use forest::ForestCondition;
pub use terrain::{CrossSection, TerrainSurface};
pub use water_usage::{CatchmentInfo, WaterUsage};

use data_adapters::{Grid, Payload, TimeSeries};
use dash_common::FeatureCollection;

use crate::binding::{BindingContext, BindingError};
use crate::control::ControlId;

/// Control ids used by the layout.
pub mod controls {
    pub const THRESHOLD: &str = "sld_height.value";
    pub const DRAWN: &str = "edit_control.geojson";
    pub const YEAR: &str = "year.value";
    pub const PROJECT: &str = "project.value";
    pub const HOVER: &str = "catchments.hover_feature";
}

/// Output targets written by the bindings.
pub mod outputs {
    pub const FLOOD_PARAMS: &str = "flood-wms.extraProps";
    pub const INFO: &str = "info.children";
    pub const SURFACE: &str = "surface-graph.figure";
    pub const PROFILE: &str = "profile-graph.figure";
    pub const DROUGHT: &str = "drought-graph.figure";
    pub const RAINFALL: &str = "rainfall-graph.figure";
    pub const FOREST: &str = "forest-graph.figure";
    pub const USAGE: &str = "usage-table.data";
    pub const CATCHMENT_INFO: &str = "catchment-info.children";
}

/// The drawn collection; a control that was never set reads as empty.
pub(crate) fn drawn(ctx: &BindingContext<'_>, id: &ControlId) -> FeatureCollection {
    ctx.controls.geometry(id).cloned().unwrap_or_default()
}

pub(crate) fn expect_series(product: &str, payload: Payload) -> Result<TimeSeries, BindingError> {
    match payload {
        Payload::TimeSeries(series) => Ok(series),
        other => Err(unexpected(product, "time series", &other)),
    }
}

pub(crate) fn expect_grid(product: &str, payload: Payload) -> Result<Grid, BindingError> {
    match payload {
        Payload::Grid(grid) => Ok(grid),
        other => Err(unexpected(product, "grid", &other)),
    }
}

pub(crate) fn expect_profile(
    product: &str,
    payload: Payload,
) -> Result<Vec<Option<f64>>, BindingError> {
    match payload {
        Payload::Profile(values) => Ok(values),
        other => Err(unexpected(product, "profile", &other)),
    }
}

fn unexpected(product: &str, expected: &'static str, got: &Payload) -> BindingError {
    BindingError::UnexpectedPayload {
        product: product.to_string(),
        expected,
        got: got.kind(),
    }
}
