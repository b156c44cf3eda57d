//! View state handler.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::Extension, Json};
use serde::Serialize;
use tracing::warn;
use update_graph::{ControlState, OutputTarget, OutputValue, ViewState};

use crate::state::AppState;

/// Size of the overlay preview image.
const PREVIEW_SIZE: u32 = 256;

#[derive(Debug, Serialize)]
pub struct OverlayView {
    pub id: String,
    /// Parameters the browser must send with every tile request.
    pub params: BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub controls: ControlState,
    pub outputs: ViewState,
    pub overlays: Vec<OverlayView>,
}

/// GET /api/view - Current control values and the latest rendering of every output
pub async fn view_handler(Extension(state): Extension<Arc<AppState>>) -> Json<ViewResponse> {
    let session = state.session.lock().await;
    let bounds = state.layout.map.view_bounds();

    let overlays = state
        .layout
        .map
        .overlays
        .iter()
        .map(|layer| {
            let target = OutputTarget::new(format!("{}.extraProps", layer.id));
            let current = session
                .view
                .value(&target)
                .and_then(OutputValue::as_layer_params);
            let params = layer.effective_params(current).clone();
            let preview_url = match layer.get_map_url(&bounds, PREVIEW_SIZE, PREVIEW_SIZE, &params) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(layer = %layer.id, error = %e, "Cannot build overlay preview URL");
                    None
                }
            };
            OverlayView {
                id: layer.id.clone(),
                params,
                preview_url,
            }
        })
        .collect();

    Json(ViewResponse {
        controls: session.controls.clone(),
        outputs: session.view.clone(),
        overlays,
    })
}
