//! reqwest-backed adapter for the WPS/WCS endpoints.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use dash_common::Feature;
use metrics::{counter, histogram};
use reqwest::{header, Client};
use tracing::{debug, instrument, warn};

use crate::adapter::{DataAdapter, RequestBody, RequestParams};
use crate::arrays::{parse_delimited, parse_npy};
use crate::error::AdapterError;
use crate::product::{ProductCatalog, ProductConfig, ResponseFormat};
use crate::series::Payload;
use crate::tabular::parse_csv;
use crate::transform;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Longest error body echoed back in an [`AdapterError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Adapter that POSTs to the endpoint configured per product.
pub struct HttpAdapter {
    client: Client,
    catalog: ProductCatalog,
}

impl HttpAdapter {
    /// Create an adapter with its own HTTP client.
    pub fn new(catalog: ProductCatalog, request_timeout: Duration) -> Result<Self, AdapterError> {
        let client = build_client(request_timeout)?;
        Ok(Self { client, catalog })
    }

    /// Create an adapter sharing an existing client.
    pub fn with_client(client: Client, catalog: ProductCatalog) -> Self {
        Self { client, catalog }
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    async fn post(&self, config: &ProductConfig, body: &RequestBody<'_>) -> Result<Bytes, AdapterError> {
        let json = serde_json::to_vec(body)
            .map_err(|e| AdapterError::Config(format!("unserializable request: {}", e)))?;

        let response = self
            .client
            .post(&config.endpoint)
            .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(json)
            .send()
            .await
            .map_err(|e| transport_error(&config.endpoint, e))?;

        read_success(&config.endpoint, response).await
    }
}

/// Build the HTTP client used for remote services.
pub fn build_client(request_timeout: Duration) -> Result<Client, AdapterError> {
    Client::builder()
        .timeout(request_timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| AdapterError::Config(format!("failed to create HTTP client: {}", e)))
}

/// GET a resource, failing on any non-2xx status.
pub async fn get_bytes(client: &Client, url: &str) -> Result<Bytes, AdapterError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| transport_error(url, e))?;
    read_success(url, response).await
}

fn transport_error(url: &str, err: reqwest::Error) -> AdapterError {
    AdapterError::Transport {
        url: url.to_string(),
        message: err.to_string(),
    }
}

async fn read_success(url: &str, response: reqwest::Response) -> Result<Bytes, AdapterError> {
    let status = response.status();
    if !status.is_success() {
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        warn!(url = %url, status = status.as_u16(), "Remote service returned an error");
        return Err(AdapterError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    response.bytes().await.map_err(|e| transport_error(url, e))
}

/// Parse and reshape a response body according to its product config.
pub fn decode(config: &ProductConfig, body: &[u8]) -> Result<Payload, AdapterError> {
    match config.format {
        ResponseFormat::Csv => {
            let series = parse_csv(body)?;
            Ok(Payload::TimeSeries(transform::apply(series, &config.transform)?))
        }
        ResponseFormat::Npy => {
            let grid = parse_npy(body)?;
            Ok(Payload::Grid(transform::apply_grid(grid, &config.transform)))
        }
        ResponseFormat::Delimited => {
            let values = parse_delimited(body)?;
            Ok(Payload::Profile(transform::apply_profile(values, &config.transform)))
        }
    }
}

#[async_trait]
impl DataAdapter for HttpAdapter {
    #[instrument(skip(self, params, feature), fields(product = %product))]
    async fn fetch(
        &self,
        product: &str,
        params: &RequestParams,
        feature: &Feature,
    ) -> Result<Payload, AdapterError> {
        let config = self.catalog.get(product)?;
        let body = RequestBody::new(&config.product, params, feature);

        let started = Instant::now();
        let result = self.post(config, &body).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        histogram!("dash_adapter_fetch_ms", "product" => product.to_string()).record(elapsed_ms);

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                counter!("dash_adapter_errors_total", "product" => product.to_string()).increment(1);
                return Err(e);
            }
        };

        debug!(bytes = bytes.len(), elapsed_ms, "Fetched product");
        decode(config, &bytes)
    }
}
