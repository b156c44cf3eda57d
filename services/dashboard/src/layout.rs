//! Dashboard variants and the declarative layout they produce.
//!
//! A [`Variant`] decides which controls, panels and overlay layers appear and
//! which bindings get registered. The layout is built once at startup from
//! the loaded reference data (dropdown options come from it) and served
//! unchanged as `/api/layout`.

use std::sync::Arc;

use clap::ValueEnum;
use dash_common::{BoundingBox, FeatureCollection};
use data_adapters::{ReferenceData, WmsLayer};
use serde::{Deserialize, Serialize};
use update_graph::bindings::{
    controls, outputs, CatchmentInfo, CrossSection, DroughtTrend, FloodInfo, FloodOverlay,
    ForestCondition, RainfallTotals, TerrainSurface, WaterUsage,
};
use update_graph::{Binding, ControlSpec, ControlValue, DropdownOption, OutputTarget};

/// Satellite imagery base layer.
pub const BASE_LAYER_URL: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}";

/// A reference dataset a variant cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Catchments,
    Drought,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Flood,
    Terrain,
    Drought,
    Forest,
    WaterUsage,
}

impl Variant {
    pub fn title(&self) -> &'static str {
        match self {
            Variant::Flood => "Flood inundation",
            Variant::Terrain => "Terrain explorer",
            Variant::Drought => "Drought and rainfall",
            Variant::Forest => "Forest condition",
            Variant::WaterUsage => "Water usage by catchment",
        }
    }

    /// Datasets that must be loaded for this variant to start.
    pub fn required_datasets(&self) -> &'static [Dataset] {
        match self {
            Variant::Drought => &[Dataset::Drought],
            Variant::WaterUsage => &[Dataset::Catchments],
            _ => &[],
        }
    }

    /// Whether the sample elevation surface is shown by this variant.
    pub fn uses_sample_surface(&self) -> bool {
        matches!(self, Variant::Flood | Variant::Terrain)
    }

    /// Bindings in registration order.
    pub fn bindings(&self) -> Vec<Arc<dyn Binding>> {
        match self {
            Variant::Flood => vec![
                Arc::new(FloodOverlay::new()),
                Arc::new(FloodInfo::new()),
                Arc::new(TerrainSurface::new()),
            ],
            Variant::Terrain => vec![Arc::new(TerrainSurface::new()), Arc::new(CrossSection::new())],
            Variant::Drought => vec![Arc::new(DroughtTrend::new()), Arc::new(RainfallTotals::new())],
            Variant::Forest => vec![Arc::new(ForestCondition::new())],
            Variant::WaterUsage => vec![Arc::new(CatchmentInfo::new()), Arc::new(WaterUsage::new())],
        }
    }
}

/// How a panel renders its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    /// Text overlaid on the map.
    Info,
    Graph,
    Table,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub target: OutputTarget,
    pub title: String,
    pub kind: PanelKind,
}

impl Panel {
    fn new(target: &str, title: &str, kind: PanelKind) -> Self {
        Self {
            target: target.into(),
            title: title.to_string(),
            kind,
        }
    }
}

/// A GeoJSON layer the user can hover.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoJsonLayer {
    pub id: String,
    pub data: FeatureCollection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSpec {
    pub base_layer: String,
    /// [latitude, longitude]
    pub center: [f64; 2],
    pub zoom: u8,
    pub edit_control: bool,
    pub overlays: Vec<WmsLayer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geojson: Option<GeoJsonLayer>,
}

impl MapSpec {
    /// Approximate extent shown at the initial zoom, for previews.
    pub fn view_bounds(&self) -> BoundingBox {
        let [lat, lon] = self.center;
        let half = 180.0 / 2f64.powi(self.zoom as i32);
        BoundingBox::new(lon - half, lat - half / 2.0, lon + half, lat + half / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: String,
    pub variant: Variant,
    pub controls: Vec<ControlSpec>,
    pub map: MapSpec,
    pub panels: Vec<Panel>,
}

impl Layout {
    /// Build the layout of `variant` from the loaded reference data.
    pub fn build(variant: Variant, service_url: &str, reference: &ReferenceData) -> Self {
        let mut controls_list = Vec::new();
        let mut panels = Vec::new();
        let mut overlays = Vec::new();
        let mut geojson = None;
        let mut edit_control = true;

        match variant {
            Variant::Flood => {
                controls_list.push(ControlSpec::slider(
                    controls::THRESHOLD,
                    "Inundation Level",
                    100.0,
                    120.0,
                    5.0,
                    100.0,
                ));
                overlays.push(WmsLayer::flood(service_url));
                panels.push(Panel::new(outputs::INFO, "Flooded extent", PanelKind::Info));
                panels.push(Panel::new(outputs::SURFACE, "Temporal evolution", PanelKind::Graph));
            }
            Variant::Terrain => {
                panels.push(Panel::new(outputs::SURFACE, "Elevation surface", PanelKind::Graph));
                panels.push(Panel::new(outputs::PROFILE, "Cross-section", PanelKind::Graph));
            }
            Variant::Drought => {
                let years = reference
                    .drought
                    .as_ref()
                    .map(|s| s.years())
                    .unwrap_or_default();
                let options: Vec<DropdownOption> = years
                    .iter()
                    .map(|y| DropdownOption {
                        label: y.to_string(),
                        value: ControlValue::Number(f64::from(*y)),
                    })
                    .collect();
                let default = options
                    .first()
                    .map(|o| o.value.clone())
                    .unwrap_or(ControlValue::Null);
                controls_list.push(
                    ControlSpec::dropdown(controls::YEAR, "Year", options, false, default)
                        .accepting_any_integer(),
                );
                panels.push(Panel::new(outputs::DROUGHT, "Drought index", PanelKind::Graph));
                panels.push(Panel::new(outputs::RAINFALL, "Annual rainfall", PanelKind::Graph));
            }
            Variant::Forest => {
                panels.push(Panel::new(outputs::FOREST, "Forest condition", PanelKind::Graph));
            }
            Variant::WaterUsage => {
                edit_control = false;
                let options = reference
                    .catchments
                    .as_ref()
                    .map(|c| c.options())
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(id, label)| DropdownOption {
                        label,
                        value: ControlValue::Text(id),
                    })
                    .collect();
                controls_list.push(ControlSpec::dropdown(
                    controls::PROJECT,
                    "Project",
                    options,
                    true,
                    ControlValue::Null,
                ));
                controls_list.push(ControlSpec::hover(controls::HOVER));
                geojson = reference.catchments.as_ref().map(|c| GeoJsonLayer {
                    id: "catchments".to_string(),
                    data: c.collection().clone(),
                });
                panels.push(Panel::new(
                    outputs::CATCHMENT_INFO,
                    "Catchment areas",
                    PanelKind::Info,
                ));
                panels.push(Panel::new(outputs::USAGE, "Water usage", PanelKind::Table));
            }
        }

        if edit_control {
            controls_list.push(ControlSpec::edit_control(controls::DRAWN));
        }

        Self {
            title: variant.title().to_string(),
            variant,
            controls: controls_list,
            map: MapSpec {
                base_layer: BASE_LAYER_URL.to_string(),
                center: [-30.0, 146.3],
                zoom: 10,
                edit_control,
                overlays,
                geojson,
            },
            panels,
        }
    }
}
