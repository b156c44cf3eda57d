//! Data adapter error types.

use thiserror::Error;

/// Errors raised while fetching or parsing a remote product.
///
/// None of these are retried; they propagate to the binding that asked.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Product key missing from the catalogue.
    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    /// Connection, TLS or timeout failure.
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Remote answered with a non-2xx status.
    #[error("{url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },

    /// Payload could not be parsed.
    #[error("Malformed {format} payload: {message}")]
    Parse { format: &'static str, message: String },

    /// Payload parsed but is unusable (e.g. no rows).
    #[error("Empty response for product {0}")]
    EmptyResponse(String),

    /// Static dataset could not be read from disk.
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// Catalogue or dataset configuration is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AdapterError {
    pub(crate) fn parse(format: &'static str, message: impl Into<String>) -> Self {
        AdapterError::Parse {
            format,
            message: message.into(),
        }
    }

    /// Whether the failure originated on the remote side rather than locally.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AdapterError::Transport { .. } | AdapterError::Status { .. } | AdapterError::EmptyResponse(_)
        )
    }
}

impl From<csv::Error> for AdapterError {
    fn from(err: csv::Error) -> Self {
        AdapterError::parse("csv", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = AdapterError::Status {
            url: "https://example.org/wps".into(),
            status: 503,
            body: "unavailable".into(),
        };
        let text = err.to_string();
        assert!(text.contains("503"));
        assert!(text.contains("https://example.org/wps"));
        assert!(err.is_upstream());
    }

    #[test]
    fn test_parse_is_local() {
        assert!(!AdapterError::parse("npy", "bad magic").is_upstream());
    }
}
