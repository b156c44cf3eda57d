//! Startup: configuration plus reference loading from disk.

use std::fs;
use std::time::Duration;

use dashboard::config::DashboardConfig;
use dashboard::layout::Variant;
use dashboard::state::AppState;
use update_graph::ControlKind;

const CATCHMENTS: &str = r#"{"type":"FeatureCollection","features":[
    {"type":"Feature","properties":{"code":"namoi","name":"Namoi"},
     "geometry":{"type":"Polygon","coordinates":[[[146.0,-31.0],[147.0,-31.0],[147.0,-30.0],[146.0,-30.0],[146.0,-31.0]]]}}
]}"#;

fn config_dir(reference_yaml: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("grace.csv"), "date,rtzsm\n2002-04-01,40.5\n2003-04-01,38.2\n").unwrap();
    fs::write(dir.path().join("catchments.geojson"), CATCHMENTS).unwrap();
    let yaml = reference_yaml.replace("$DIR", dir.path().to_str().unwrap());
    fs::write(dir.path().join("reference.yaml"), yaml).unwrap();
    dir
}

async fn start(dir: &tempfile::TempDir, variant: Variant) -> anyhow::Result<AppState> {
    let config = DashboardConfig::load_from_dir(dir.path().to_str().unwrap(), "http://127.0.0.1:9")?;
    AppState::new(config, variant, "http://127.0.0.1:9", Duration::from_secs(1)).await
}

#[tokio::test]
async fn test_drought_variant_loads_series() {
    let dir = config_dir("drought: $DIR/grace.csv\n");
    let state = start(&dir, Variant::Drought).await.unwrap();

    assert!(state.missing_datasets().is_empty());
    let ControlKind::Dropdown { options, .. } = &state.layout.controls[0].kind else {
        panic!("expected the year dropdown");
    };
    assert_eq!(options.len(), 2);
}

#[tokio::test]
async fn test_water_usage_indexes_catchments() {
    let dir = config_dir("catchments:\n  source: $DIR/catchments.geojson\n  id_property: code\n");
    let state = start(&dir, Variant::WaterUsage).await.unwrap();

    let catchments = state.reference.catchments.as_ref().unwrap();
    let area = catchments.area_of("namoi").unwrap();
    // One degree cell near 30.5°S is roughly 1.07e10 m².
    assert!((area - 1.07e10).abs() / 1.07e10 < 0.02, "area {}", area);
    assert!(state.layout.map.geojson.is_some());
}

#[tokio::test]
async fn test_missing_dataset_is_fatal() {
    let dir = config_dir("drought: $DIR/missing.csv\n");
    let err = start(&dir, Variant::Drought).await.err().unwrap();
    assert!(format!("{:#}", err).contains("missing.csv"));

    let dir = config_dir("{}\n");
    assert!(start(&dir, Variant::WaterUsage).await.is_err());
}

#[tokio::test]
async fn test_forest_variant_needs_no_reference() {
    let dir = config_dir("{}\n");
    let state = start(&dir, Variant::Forest).await.unwrap();
    assert!(state.reference.catchments.is_none());
    assert!(state.reference.drought.is_none());
}
