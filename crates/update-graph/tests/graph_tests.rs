//! Update graph behaviour with the real bindings and a canned adapter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dash_common::{parse_timestamp, Feature, FeatureCollection, FeatureId, Geometry, GeometryKind};
use data_adapters::{
    http::decode, AdapterError, CatchmentIndex, Column, DataAdapter, Grid, Payload, ProductCatalog,
    ReferenceData, RequestParams, TimeSeries,
};
use projection::AlbersEqualArea;
use serde_json::json;
use update_graph::bindings::{
    controls, outputs, CatchmentInfo, CrossSection, DroughtTrend, FloodInfo, FloodOverlay,
    ForestCondition, RainfallTotals, TerrainSurface, WaterUsage,
};
use update_graph::{
    Binding, BindingContext, BindingError, BindingOutcome, ControlSpec, ControlValue,
    DropdownOption, GraphError, OutputTarget, OutputValue, Rendered, Services, Session,
    UpdateGraph,
};

/// One recorded adapter call: product key, threshold and geometry kind.
type Call = (String, Option<f64>, Option<GeometryKind>);

#[derive(Default)]
struct CannedAdapter {
    responses: HashMap<String, Result<Payload, u16>>,
    calls: Mutex<Vec<Call>>,
}

impl CannedAdapter {
    /// Respond to `product` with `body` decoded as the service would.
    fn body(mut self, product: &str, body: &str) -> Self {
        let catalog = ProductCatalog::builtin("http://mock");
        let config = catalog.get(product).unwrap();
        self.responses
            .insert(product.to_string(), Ok(decode(config, body.as_bytes()).unwrap()));
        self
    }

    fn payload(mut self, product: &str, payload: Payload) -> Self {
        self.responses.insert(product.to_string(), Ok(payload));
        self
    }

    fn failing(mut self, product: &str, status: u16) -> Self {
        self.responses.insert(product.to_string(), Err(status));
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataAdapter for CannedAdapter {
    async fn fetch(
        &self,
        product: &str,
        params: &RequestParams,
        feature: &Feature,
    ) -> Result<Payload, AdapterError> {
        self.calls
            .lock()
            .unwrap()
            .push((product.to_string(), params.threshold, feature.kind()));
        match self.responses.get(product) {
            Some(Ok(payload)) => Ok(payload.clone()),
            Some(Err(status)) => Err(AdapterError::Status {
                url: format!("http://mock/{}", product),
                status: *status,
                body: "processing failed".to_string(),
            }),
            None => Err(AdapterError::UnknownProduct(product.to_string())),
        }
    }
}

/// Decodes the same raw response body for every product on each fetch.
struct RawBody(Vec<u8>);

#[async_trait]
impl DataAdapter for RawBody {
    async fn fetch(
        &self,
        product: &str,
        _params: &RequestParams,
        _feature: &Feature,
    ) -> Result<Payload, AdapterError> {
        let catalog = ProductCatalog::builtin("http://mock");
        decode(catalog.get(product)?, &self.0)
    }
}

const FLOOD_CSV: &str = "date,volume,area\n2021-01-01,50000,200000\n";

fn polygon() -> Feature {
    Feature::new(Geometry::polygon(vec![vec![
        [146.3, -30.0],
        [146.4, -30.0],
        [146.4, -30.1],
        [146.3, -30.1],
        [146.3, -30.0],
    ]]))
}

fn line() -> Feature {
    Feature::new(Geometry::line_string(vec![[146.3, -30.0], [146.5, -30.2]]))
}

fn drawn(features: &[Feature]) -> serde_json::Value {
    let collection = features
        .iter()
        .cloned()
        .fold(FeatureCollection::new(), FeatureCollection::with_feature);
    serde_json::to_value(collection).unwrap()
}

fn drought_series() -> TimeSeries {
    let index = ["2002-04-01", "2002-05-01", "2003-01-01", "2003-06-01"]
        .iter()
        .map(|s| parse_timestamp(s).unwrap())
        .collect();
    TimeSeries::new(
        index,
        vec![
            Column::new("rtzsm", vec![Some(0.2), Some(0.3), Some(0.1), None]),
            Column::new("sfsm", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
        ],
    )
}

fn catchments() -> CatchmentIndex {
    let collection = FeatureCollection::new().with_feature(
        Feature::new(Geometry::polygon(vec![vec![
            [146.0, -31.0],
            [147.0, -31.0],
            [147.0, -30.0],
            [146.0, -30.0],
            [146.0, -31.0],
        ]]))
        .with_id(FeatureId::Text("namoi".to_string()))
        .with_property("name", json!("Namoi")),
    );
    CatchmentIndex::new(collection, None, &AlbersEqualArea::australian_albers())
}

fn reference() -> ReferenceData {
    ReferenceData {
        catchments: Some(catchments()),
        drought: Some(drought_series()),
        sample_surface: Some(Grid {
            rows: 1,
            cols: 2,
            values: vec![Some(27.8), Some(49.6)],
        }),
    }
}

fn controls_all() -> Vec<ControlSpec> {
    vec![
        ControlSpec::slider(controls::THRESHOLD, "Inundation Level", 100.0, 120.0, 5.0, 100.0),
        ControlSpec::edit_control(controls::DRAWN),
        ControlSpec::dropdown(
            controls::YEAR,
            "Year",
            [1990.0, 2002.0, 2003.0]
                .iter()
                .map(|y| DropdownOption {
                    label: y.to_string(),
                    value: ControlValue::Number(*y),
                })
                .collect(),
            false,
            ControlValue::Number(2002.0),
        ),
        ControlSpec::dropdown(
            controls::PROJECT,
            "Project",
            vec![DropdownOption {
                label: "Namoi".into(),
                value: ControlValue::Text("namoi".into()),
            }],
            true,
            ControlValue::Null,
        ),
        ControlSpec::hover(controls::HOVER),
    ]
}

fn graph_with(adapter: Arc<dyn DataAdapter>, bindings: Vec<Arc<dyn Binding>>) -> UpdateGraph {
    let services = Services::new(adapter, Arc::new(reference()));
    let mut graph = UpdateGraph::new(controls_all(), services);
    for binding in bindings {
        graph.register(binding).unwrap();
    }
    graph
}

fn text_of<'a>(session: &'a Session, target: &str) -> Option<&'a str> {
    session
        .view
        .value(&OutputTarget::from(target))
        .and_then(OutputValue::as_text)
}

#[tokio::test]
async fn test_threshold_reaches_overlay_params() {
    let graph = graph_with(Arc::new(CannedAdapter::default()), vec![Arc::new(FloodOverlay::new())]);
    let mut session = graph.new_session();
    graph.initialize(&mut session).await;

    for t in (101..=120).chain([100]) {
        graph
            .dispatch(&mut session, controls::THRESHOLD, &json!(t))
            .await
            .unwrap();
        let params = session
            .view
            .value(&OutputTarget::from(outputs::FLOOD_PARAMS))
            .and_then(OutputValue::as_layer_params)
            .unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params["threshold"], json!(t as f64));
    }
}

#[tokio::test]
async fn test_overlay_does_not_fire_on_init() {
    let graph = graph_with(
        Arc::new(CannedAdapter::default()),
        vec![Arc::new(FloodOverlay::new()), Arc::new(FloodInfo::new())],
    );
    let mut session = graph.new_session();
    let updates = graph.initialize(&mut session).await;

    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].binding, "flood_info");
    assert!(session
        .view
        .get(&OutputTarget::from(outputs::FLOOD_PARAMS))
        .is_none());
    assert_eq!(text_of(&session, outputs::INFO), Some(""));
}

#[tokio::test]
async fn test_overlay_declines_without_trigger() {
    let adapter: Arc<dyn DataAdapter> = Arc::new(CannedAdapter::default());
    let services = Services::new(adapter, Arc::new(ReferenceData::default()));
    let graph = UpdateGraph::new(controls_all(), services.clone());
    let session = graph.new_session();
    let ctx = BindingContext {
        controls: &session.controls,
        trigger: None,
        services: &services,
    };

    let outcome = FloodOverlay::new().compute(&ctx).await.unwrap();
    assert_eq!(outcome, BindingOutcome::NoUpdate);
}

#[tokio::test]
async fn test_flood_info_from_wps_csv() {
    let adapter = Arc::new(CannedAdapter::default().body("flood", FLOOD_CSV));
    let graph = graph_with(adapter.clone(), vec![Arc::new(FloodInfo::new())]);
    let mut session = graph.new_session();

    graph
        .dispatch(&mut session, controls::THRESHOLD, &json!(110))
        .await
        .unwrap();
    let updates = graph
        .dispatch(&mut session, controls::DRAWN, &drawn(&[polygon()]))
        .await
        .unwrap();

    assert_eq!(updates.len(), 1);
    assert_eq!(
        text_of(&session, outputs::INFO),
        Some("Area: 20.00 ha | Volume: 50.00 ML")
    );
    assert_eq!(
        adapter.calls().last().unwrap(),
        &("flood".to_string(), Some(110.0), Some(GeometryKind::Polygon))
    );
}

#[tokio::test]
async fn test_flood_info_reads_columns_by_position() {
    let adapter = Arc::new(
        CannedAdapter::default().body("flood", "time,vol_m3,area_m2\n2021-01-01,50000,200000\n"),
    );
    let graph = graph_with(adapter, vec![Arc::new(FloodInfo::new())]);
    let mut session = graph.new_session();

    graph
        .dispatch(&mut session, controls::DRAWN, &drawn(&[polygon()]))
        .await
        .unwrap();

    assert_eq!(
        text_of(&session, outputs::INFO),
        Some("Area: 20.00 ha | Volume: 50.00 ML")
    );
}

#[tokio::test]
async fn test_flood_info_uses_last_feature() {
    let adapter = Arc::new(CannedAdapter::default().body("flood", FLOOD_CSV));
    let graph = graph_with(adapter.clone(), vec![Arc::new(FloodInfo::new())]);
    let mut session = graph.new_session();

    graph
        .dispatch(&mut session, controls::DRAWN, &drawn(&[polygon(), line()]))
        .await
        .unwrap();

    let calls = adapter.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].2, Some(GeometryKind::LineString));
}

#[tokio::test]
async fn test_polygon_then_line_kind_gating() {
    let grid = Grid {
        rows: 2,
        cols: 2,
        values: vec![Some(1.0), Some(2.0), Some(3.0), None],
    };
    let adapter = Arc::new(
        CannedAdapter::default()
            .payload("terrain_surface", Payload::Grid(grid))
            .body("cross_section", "120.5,118.25,117.0"),
    );
    let graph = graph_with(
        adapter.clone(),
        vec![Arc::new(TerrainSurface::new()), Arc::new(CrossSection::new())],
    );
    let mut session = graph.new_session();

    let updates = graph
        .dispatch(&mut session, controls::DRAWN, &drawn(&[polygon()]))
        .await
        .unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].binding, "terrain_surface");
    let surface = session
        .view
        .value(&OutputTarget::from(outputs::SURFACE))
        .cloned();

    let updates = graph
        .dispatch(&mut session, controls::DRAWN, &drawn(&[polygon(), line()]))
        .await
        .unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].binding, "cross_section");

    // The surface from the polygon stays on display.
    assert_eq!(
        session.view.value(&OutputTarget::from(outputs::SURFACE)).cloned(),
        surface
    );
    let profile = session
        .view
        .value(&OutputTarget::from(outputs::PROFILE))
        .and_then(OutputValue::as_figure)
        .unwrap();
    assert_eq!(profile.traces.len(), 1);

    let products: Vec<_> = adapter.calls().into_iter().map(|c| (c.0, c.2)).collect();
    assert_eq!(
        products,
        vec![
            ("terrain_surface".to_string(), Some(GeometryKind::Polygon)),
            ("cross_section".to_string(), Some(GeometryKind::LineString)),
        ]
    );
}

#[tokio::test]
async fn test_empty_collection_gives_default_figures() {
    let adapter = Arc::new(CannedAdapter::default());
    let graph = graph_with(
        adapter.clone(),
        vec![
            Arc::new(TerrainSurface::new()),
            Arc::new(CrossSection::new()),
            Arc::new(RainfallTotals::new()),
            Arc::new(ForestCondition::new()),
        ],
    );
    let mut session = graph.new_session();

    graph
        .dispatch(&mut session, controls::DRAWN, &drawn(&[line()]))
        .await
        .unwrap();
    let updates = graph
        .dispatch(&mut session, controls::DRAWN, &json!({"type": "FeatureCollection", "features": []}))
        .await
        .unwrap();

    assert_eq!(updates.len(), 4);
    for update in &updates {
        assert!(update.rendered.error().is_none(), "{} failed", update.binding);
    }
    let figure = |target: &str| {
        session
            .view
            .value(&OutputTarget::from(target))
            .and_then(OutputValue::as_figure)
            .cloned()
            .unwrap()
    };
    // Sample surface stands in until a polygon is drawn.
    assert_eq!(figure(outputs::SURFACE).traces.len(), 1);
    assert!(figure(outputs::PROFILE).is_empty());
    assert!(figure(outputs::RAINFALL).is_empty());
    assert!(figure(outputs::FOREST).is_empty());
}

#[tokio::test]
async fn test_drought_year_in_and_out_of_range() {
    let graph = graph_with(Arc::new(CannedAdapter::default()), vec![Arc::new(DroughtTrend::new())]);
    let mut session = graph.new_session();
    graph.initialize(&mut session).await;

    let figure = |session: &Session| {
        session
            .view
            .value(&OutputTarget::from(outputs::DROUGHT))
            .and_then(OutputValue::as_figure)
            .cloned()
            .unwrap()
    };
    let initial = figure(&session);
    assert_eq!(initial.traces.len(), 1);

    graph
        .dispatch(&mut session, controls::YEAR, &json!(2003))
        .await
        .unwrap();
    assert_eq!(figure(&session).traces.len(), 1);

    graph
        .dispatch(&mut session, controls::YEAR, &json!(1990))
        .await
        .unwrap();
    assert!(figure(&session).is_empty());
}

#[tokio::test]
async fn test_rainfall_annual_totals() {
    let adapter = Arc::new(CannedAdapter::default().body(
        "rainfall",
        "date,precip\n2019-01-01,10\n2019-07-01,-9999\n2020-01-01,5\n2020-02-01,7\n",
    ));
    let graph = graph_with(adapter, vec![Arc::new(RainfallTotals::new())]);
    let mut session = graph.new_session();

    graph
        .dispatch(&mut session, controls::DRAWN, &drawn(&[Feature::new(Geometry::point(146.3, -30.0))]))
        .await
        .unwrap();

    let json = serde_json::to_value(
        session
            .view
            .value(&OutputTarget::from(outputs::RAINFALL))
            .unwrap(),
    )
    .unwrap();
    assert_eq!(json["data"]["traces"][0]["type"], "bar");
    assert_eq!(json["data"]["traces"][0]["x"], json!(["2019", "2020"]));
    assert_eq!(json["data"]["traces"][0]["y"], json!([10.0, 12.0]));
}

#[tokio::test]
async fn test_unchanged_value_fires_nothing() {
    let adapter = Arc::new(CannedAdapter::default().body("flood", FLOOD_CSV));
    let graph = graph_with(adapter.clone(), vec![Arc::new(FloodInfo::new())]);
    let mut session = graph.new_session();

    let value = drawn(&[polygon()]);
    assert_eq!(graph.dispatch(&mut session, controls::DRAWN, &value).await.unwrap().len(), 1);
    assert!(graph.dispatch(&mut session, controls::DRAWN, &value).await.unwrap().is_empty());
    assert!(graph
        .dispatch(&mut session, controls::THRESHOLD, &json!(100))
        .await
        .unwrap()
        .is_empty());
    assert_eq!(adapter.calls().len(), 1);
}

#[tokio::test]
async fn test_failure_is_isolated_per_output() {
    let adapter = Arc::new(
        CannedAdapter::default()
            .body("flood", FLOOD_CSV)
            .failing("terrain_surface", 500),
    );
    let graph = graph_with(
        adapter,
        vec![Arc::new(FloodInfo::new()), Arc::new(TerrainSurface::new())],
    );
    let mut session = graph.new_session();

    let updates = graph
        .dispatch(&mut session, controls::DRAWN, &drawn(&[polygon()]))
        .await
        .unwrap();

    assert_eq!(updates.len(), 2);
    assert_eq!(
        text_of(&session, outputs::INFO),
        Some("Area: 20.00 ha | Volume: 50.00 ML")
    );
    let surface = session
        .view
        .get(&OutputTarget::from(outputs::SURFACE))
        .unwrap();
    assert!(matches!(surface, Rendered::Error(msg) if msg.contains("HTTP 500")));
}

#[tokio::test]
async fn test_oversized_npy_renders_error() {
    let header = "{'descr': '<f4', 'fortran_order': False, 'shape': (8589934592, 2147483648), }\n";
    let mut body = b"\x93NUMPY\x01\x00".to_vec();
    body.extend_from_slice(&(header.len() as u16).to_le_bytes());
    body.extend_from_slice(header.as_bytes());
    body.extend_from_slice(&[0u8; 8]);

    let graph = graph_with(Arc::new(RawBody(body)), vec![Arc::new(TerrainSurface::new())]);
    let mut session = graph.new_session();

    let updates = graph
        .dispatch(&mut session, controls::DRAWN, &drawn(&[polygon()]))
        .await
        .unwrap();
    assert_eq!(updates.len(), 1);
    let surface = session
        .view
        .get(&OutputTarget::from(outputs::SURFACE))
        .unwrap();
    assert!(matches!(surface, Rendered::Error(msg) if msg.contains("npy")));
}

#[tokio::test]
async fn test_water_usage_table_and_cleared_selection() {
    let adapter = Arc::new(CannedAdapter::default().body(
        "water_usage",
        "date,usage,licence\n2019-03-01,1500,1\n2019-09-01,500,1\n2020-03-01,2500,1\n",
    ));
    let graph = graph_with(adapter.clone(), vec![Arc::new(WaterUsage::new())]);
    let mut session = graph.new_session();

    // Nothing selected at start: the table stays absent.
    assert!(graph.initialize(&mut session).await.is_empty());

    graph
        .dispatch(&mut session, controls::PROJECT, &json!("namoi"))
        .await
        .unwrap();
    let table = session
        .view
        .value(&OutputTarget::from(outputs::USAGE))
        .and_then(OutputValue::as_table)
        .cloned()
        .unwrap();
    assert_eq!(table.columns, vec!["Year", "Usage (ML)"]);
    assert_eq!(table.rows[0], vec![json!("2019"), json!(2.0)]);
    assert_eq!(table.rows[1], vec![json!("2020"), json!(2.5)]);
    assert_eq!(adapter.calls()[0].2, Some(GeometryKind::Polygon));

    let updates = graph
        .dispatch(&mut session, controls::PROJECT, &json!(null))
        .await
        .unwrap();
    assert!(updates.is_empty());
    assert_eq!(
        session.view.value(&OutputTarget::from(outputs::USAGE)).and_then(OutputValue::as_table),
        Some(&table)
    );
}

#[tokio::test]
async fn test_catchment_hover_info() {
    let graph = graph_with(Arc::new(CannedAdapter::default()), vec![Arc::new(CatchmentInfo::new())]);
    let mut session = graph.new_session();
    graph.initialize(&mut session).await;
    assert_eq!(
        text_of(&session, outputs::CATCHMENT_INFO),
        Some("Catchment areas\nHover over a region")
    );

    let hovered = catchments().get("namoi").cloned().unwrap();
    let expected = hovered.number_property("AlbersArea").unwrap() / 10_000.0;
    graph
        .dispatch(&mut session, controls::HOVER, &serde_json::to_value(&hovered).unwrap())
        .await
        .unwrap();
    assert_eq!(
        text_of(&session, outputs::CATCHMENT_INFO),
        Some(format!("Catchment areas\n{:.2} ha", expected).as_str())
    );

    // A feature without the precomputed area is looked up by id.
    let bare = Feature::new(Geometry::point(146.5, -30.5)).with_id(FeatureId::Text("namoi".into()));
    graph
        .dispatch(&mut session, controls::HOVER, &serde_json::to_value(&bare).unwrap())
        .await
        .unwrap();
    assert_eq!(
        text_of(&session, outputs::CATCHMENT_INFO),
        Some(format!("Catchment areas\n{:.2} ha", expected).as_str())
    );
}

#[tokio::test]
async fn test_unknown_and_invalid_events() {
    let graph = graph_with(Arc::new(CannedAdapter::default()), vec![Arc::new(FloodOverlay::new())]);
    let mut session = graph.new_session();

    assert_eq!(
        graph.dispatch(&mut session, "nope.value", &json!(1)).await,
        Err(GraphError::UnknownControl("nope.value".to_string()))
    );
    assert!(matches!(
        graph.dispatch(&mut session, controls::THRESHOLD, &json!(130)).await,
        Err(GraphError::InvalidValue { .. })
    ));
    assert_eq!(session.controls.number(&controls::THRESHOLD.into()), Some(100.0));
}

#[test]
fn test_registration_rejects_duplicate_output() {
    let mut graph = graph_with(Arc::new(CannedAdapter::default()), vec![Arc::new(FloodInfo::new())]);
    let err = graph.register(Arc::new(FloodInfo::new())).unwrap_err();
    assert_eq!(
        err,
        GraphError::DuplicateOutput {
            target: outputs::INFO.to_string(),
            existing: "flood_info".to_string(),
        }
    );
    assert_eq!(graph.bindings().len(), 1);
}

#[test]
fn test_registration_rejects_undeclared_input() {
    let services = Services::new(Arc::new(CannedAdapter::default()), Arc::new(ReferenceData::default()));
    let mut graph = UpdateGraph::new(vec![ControlSpec::edit_control(controls::DRAWN)], services);
    assert!(matches!(
        graph.register(Arc::new(FloodInfo::new())),
        Err(GraphError::UndeclaredInput { .. })
    ));
    assert!(graph.register(Arc::new(CrossSection::new())).is_ok());
}

#[test]
fn test_binding_error_messages() {
    let err = BindingError::MissingReference("drought");
    assert_eq!(err.to_string(), "Reference dataset not loaded: drought");
}
