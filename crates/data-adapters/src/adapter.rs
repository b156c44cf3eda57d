//! The capability every remote product is reached through.

use async_trait::async_trait;
use dash_common::Feature;
use serde::Serialize;

use crate::error::AdapterError;
use crate::series::Payload;

/// Scalar parameters that accompany a geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    /// Inundation threshold for flood products.
    pub threshold: Option<f64>,
    /// Variable name for multi-variable products.
    pub variable: Option<String>,
}

impl RequestParams {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold: Some(threshold),
            ..Self::default()
        }
    }
}

/// JSON body POSTed to the processing services.
///
/// `{"product": <str>, "threshold": <number>, "feature": <GeoJSON feature>}`
/// with `threshold`/`variable` omitted when unset.
#[derive(Debug, Serialize)]
pub struct RequestBody<'a> {
    pub product: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<&'a str>,
    pub feature: &'a Feature,
}

impl<'a> RequestBody<'a> {
    pub fn new(product: &'a str, params: &'a RequestParams, feature: &'a Feature) -> Self {
        Self {
            product,
            threshold: params.threshold,
            variable: params.variable.as_deref(),
            feature,
        }
    }
}

/// Fetch a product for a single feature.
///
/// Implementations perform exactly one request and never retry; any failure
/// is returned to the caller.
#[async_trait]
pub trait DataAdapter: Send + Sync {
    async fn fetch(
        &self,
        product: &str,
        params: &RequestParams,
        feature: &Feature,
    ) -> Result<Payload, AdapterError>;
}
