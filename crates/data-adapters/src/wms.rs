//! WMS overlay layer descriptors.
//!
//! Tiles are fetched by the browser straight from the tile server; this side
//! only tracks the layer parameters and builds GetMap URLs from them.

use dash_common::BoundingBox;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::AdapterError;

/// A WMS tile layer drawn over the base map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WmsLayer {
    /// Component id used as the output target prefix (e.g. "flood-wms").
    pub id: String,
    pub url: String,
    pub layers: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_transparent")]
    pub transparent: bool,
    /// Vendor parameters sent with every tile request (time, threshold, ...).
    #[serde(default)]
    pub extra_props: BTreeMap<String, serde_json::Value>,
}

fn default_format() -> String {
    "image/png".to_string()
}

fn default_transparent() -> bool {
    true
}

impl WmsLayer {
    /// The inundation layer served by the flood WMS.
    pub fn flood(service_url: &str) -> Self {
        Self {
            id: "flood-wms".to_string(),
            url: format!("{}/wms", service_url.trim_end_matches('/')),
            layers: "Flood".to_string(),
            format: default_format(),
            transparent: true,
            extra_props: BTreeMap::from([
                ("time".to_string(), serde_json::json!("2021-01-01T00:00:00.000Z")),
                ("threshold".to_string(), serde_json::json!(100)),
            ]),
        }
    }

    /// Parameters in effect: `current` (the latest binding output) when
    /// present, otherwise the layer's initial extra props.
    pub fn effective_params<'a>(
        &'a self,
        current: Option<&'a BTreeMap<String, serde_json::Value>>,
    ) -> &'a BTreeMap<String, serde_json::Value> {
        current.unwrap_or(&self.extra_props)
    }

    /// Build a WMS 1.1.1 GetMap URL in EPSG:4326.
    pub fn get_map_url(
        &self,
        bbox: &BoundingBox,
        width: u32,
        height: u32,
        params: &BTreeMap<String, serde_json::Value>,
    ) -> Result<String, AdapterError> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| AdapterError::Config(format!("invalid WMS url '{}': {}", self.url, e)))?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("SERVICE", "WMS")
                .append_pair("VERSION", "1.1.1")
                .append_pair("REQUEST", "GetMap")
                .append_pair("LAYERS", &self.layers)
                .append_pair("STYLES", "")
                .append_pair("FORMAT", &self.format)
                .append_pair("TRANSPARENT", if self.transparent { "true" } else { "false" })
                .append_pair("SRS", "EPSG:4326")
                .append_pair("BBOX", &bbox.to_wms_string())
                .append_pair("WIDTH", &width.to_string())
                .append_pair("HEIGHT", &height.to_string());

            for (key, value) in params {
                let text = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                query.append_pair(key, &text);
            }
        }

        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flood_layer_defaults() {
        let layer = WmsLayer::flood("https://example.org/");
        assert_eq!(layer.url, "https://example.org/wms");
        assert_eq!(layer.extra_props["threshold"], 100);
    }

    #[test]
    fn test_effective_params_replaced_wholesale() {
        let layer = WmsLayer::flood("https://example.org");
        let current = BTreeMap::from([("threshold".to_string(), serde_json::json!(115.0))]);
        let params = layer.effective_params(Some(&current));
        assert_eq!(params.len(), 1);
        assert_eq!(params["threshold"], 115.0);

        assert_eq!(layer.effective_params(None).len(), 2);
    }

    #[test]
    fn test_get_map_url() {
        let layer = WmsLayer::flood("https://example.org");
        let bbox = BoundingBox::new(146.0, -30.5, 146.6, -29.5);
        let url = layer
            .get_map_url(&bbox, 256, 256, &layer.extra_props)
            .unwrap();

        assert!(url.starts_with("https://example.org/wms?SERVICE=WMS"));
        assert!(url.contains("LAYERS=Flood"));
        assert!(url.contains("BBOX=146%2C-30.5%2C146.6%2C-29.5"));
        assert!(url.contains("threshold=100"));
        assert!(url.contains("time=2021-01-01T00%3A00%3A00.000Z"));
    }
}
