//! Control event handler.

use std::sync::Arc;
use std::time::Instant;

use axum::{body::Bytes, extract::Extension, Json};
use dash_common::DashError;
use metrics::histogram;
use serde::{Deserialize, Serialize};
use tracing::info;
use update_graph::{GraphError, OutputUpdate};

use super::ApiError;
use crate::state::AppState;

/// `{"control": "<component>.<property>", "value": <json>}`
#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub control: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub updates: Vec<OutputUpdate>,
}

/// POST /api/events - Apply a control change and return the outputs it wrote
pub async fn events_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<EventResponse>, ApiError> {
    let event: EventRequest = serde_json::from_slice(&body).map_err(DashError::from)?;

    let start = Instant::now();
    let mut session = state.session.lock().await;
    let updates = state
        .graph
        .dispatch(&mut session, &event.control, &event.value)
        .await
        .map_err(to_dash_error)?;
    histogram!("dash_event_duration_ms").record(start.elapsed().as_secs_f64() * 1000.0);

    info!(
        control = %event.control,
        updates = updates.len(),
        errors = updates.iter().filter(|u| u.rendered.error().is_some()).count(),
        "Applied control event"
    );
    Ok(Json(EventResponse { updates }))
}

fn to_dash_error(err: GraphError) -> DashError {
    match err {
        GraphError::UnknownControl(id) => DashError::UnknownControl(id),
        GraphError::InvalidValue { control, message } => {
            DashError::InvalidValue { control, message }
        }
        other => DashError::Internal(other.to_string()),
    }
}
