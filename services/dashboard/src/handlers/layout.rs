//! Layout handler.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::state::AppState;

/// GET /api/layout - Controls, map and panels of the running variant
pub async fn layout_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    (
        [(header::CACHE_CONTROL, "max-age=300")],
        Json(&state.layout),
    )
        .into_response()
}
