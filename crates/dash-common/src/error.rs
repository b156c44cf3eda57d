//! Error types shared by the dashboard crates.

use thiserror::Error;

/// Primary error type surfaced at the dashboard's HTTP boundary.
#[derive(Debug, Error)]
pub enum DashError {
    // === Event Errors ===
    #[error("Unknown control: {0}")]
    UnknownControl(String),

    #[error("Invalid value for '{control}': {message}")]
    InvalidValue { control: String, message: String },

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl DashError {
    /// Short machine-readable code for JSON error bodies.
    pub fn error_code(&self) -> &'static str {
        match self {
            DashError::UnknownControl(_) => "UnknownControl",
            DashError::InvalidValue { .. } => "InvalidValue",
            DashError::MalformedEvent(_) => "MalformedEvent",
            DashError::Internal(_) => "InternalError",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            DashError::UnknownControl(_)
            | DashError::InvalidValue { .. }
            | DashError::MalformedEvent(_) => 400,

            DashError::Internal(_) => 500,
        }
    }
}

impl From<serde_json::Error> for DashError {
    fn from(err: serde_json::Error) -> Self {
        DashError::MalformedEvent(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(DashError::UnknownControl("x".into()).http_status_code(), 400);
        assert_eq!(
            DashError::InvalidValue {
                control: "sld_height.value".into(),
                message: "out of range".into()
            }
            .http_status_code(),
            400
        );
        assert_eq!(DashError::Internal("x".into()).http_status_code(), 500);
    }

    #[test]
    fn test_display_includes_control() {
        let err = DashError::InvalidValue {
            control: "year.value".into(),
            message: "expected a number".into(),
        };
        let text = err.to_string();
        assert!(text.contains("year.value"));
        assert!(text.contains("expected a number"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: DashError = json_err.into();
        assert_eq!(err.error_code(), "MalformedEvent");
    }
}
