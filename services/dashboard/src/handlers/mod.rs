//! HTTP request handlers for the dashboard.

pub mod events;
pub mod health;
pub mod index;
pub mod layout;
pub mod view;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use dash_common::DashError;
use serde::Serialize;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// A [`DashError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub DashError);

impl From<DashError> for ApiError {
    fn from(err: DashError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse {
            error: self.0.error_code().to_string(),
            message: self.0.to_string(),
        };
        let json = serde_json::to_string(&body).unwrap_or_default();

        (status, [(header::CONTENT_TYPE, "application/json")], json).into_response()
    }
}
