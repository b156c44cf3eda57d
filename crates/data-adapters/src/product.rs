//! Per-product configuration for the remote services.
//!
//! The adapters share one request/parse/reshape pipeline; what differs per
//! product lives here as data: the endpoint, the product name sent upstream,
//! the response format and the reshaping rules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::AdapterError;

/// Default host of the processing services.
pub const DEFAULT_SERVICE_URL: &str = "https://h2ohack-mtmenipwta-ts.a.run.app";

/// Fill value used by the float32 coverage products for "no data".
pub const FLOAT32_FILL: f64 = -3.4028234663852886e38;

/// How a product's response body is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// CSV with a date index in the first column.
    Csv,
    /// NumPy `.npy` 2-D array.
    Npy,
    /// Comma/whitespace separated 1-D array.
    Delimited,
}

/// Resampling interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Month,
    Year,
}

/// Aggregation applied within each resampling bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Mean,
    Last,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResampleConfig {
    pub interval: Interval,
    pub aggregation: Aggregation,
}

/// Reshaping rules, applied in the order the fields are declared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Sentinel value mapped to "missing".
    #[serde(default)]
    pub fill_value: Option<f64>,

    /// Columns to keep; empty keeps all.
    #[serde(default)]
    pub keep: Vec<String>,

    /// Multiplicative factor per column (e.g. m² → ha is 0.0001).
    #[serde(default)]
    pub scale: BTreeMap<String, f64>,

    #[serde(default)]
    pub resample: Option<ResampleConfig>,

    /// Old column name → display name.
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
}

/// One remote product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductConfig {
    /// Full URL the request is POSTed to.
    pub endpoint: String,

    /// Product name sent in the request body.
    pub product: String,

    pub format: ResponseFormat,

    #[serde(default)]
    pub transform: TransformConfig,
}

/// All products known to the dashboard, keyed by a local name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCatalog {
    #[serde(default)]
    pub products: BTreeMap<String, ProductConfig>,
}

impl ProductCatalog {
    /// Parse a catalogue from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, AdapterError> {
        let catalog: ProductCatalog =
            serde_yaml::from_str(yaml).map_err(|e| AdapterError::Config(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalogue from a YAML file.
    pub fn load_file(path: &Path) -> Result<Self, AdapterError> {
        let content = std::fs::read_to_string(path).map_err(|e| AdapterError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let catalog = Self::from_yaml_str(&content)?;
        tracing::info!(
            products = catalog.products.len(),
            path = %path.display(),
            "Loaded product catalogue"
        );
        Ok(catalog)
    }

    /// Look up a product by key.
    pub fn get(&self, key: &str) -> Result<&ProductConfig, AdapterError> {
        self.products
            .get(key)
            .ok_or_else(|| AdapterError::UnknownProduct(key.to_string()))
    }

    fn validate(&self) -> Result<(), AdapterError> {
        for (key, product) in &self.products {
            if !(product.endpoint.starts_with("http://") || product.endpoint.starts_with("https://")) {
                return Err(AdapterError::Config(format!(
                    "product '{}' endpoint must be an http(s) URL, got '{}'",
                    key, product.endpoint
                )));
            }
            if product.transform.resample.is_some() && product.format != ResponseFormat::Csv {
                return Err(AdapterError::Config(format!(
                    "product '{}' resamples but is not a CSV product",
                    key
                )));
            }
        }
        Ok(())
    }

    /// Built-in catalogue pointing at `service_url`.
    pub fn builtin(service_url: &str) -> Self {
        let base = service_url.trim_end_matches('/');
        let mut products = BTreeMap::new();

        products.insert(
            "flood".to_string(),
            ProductConfig {
                endpoint: format!("{}/wps", base),
                product: "ELVIS_UTM".to_string(),
                format: ResponseFormat::Csv,
                // Columns are read by position: volume (m³) then area (m²).
                transform: TransformConfig::default(),
            },
        );

        products.insert(
            "terrain_surface".to_string(),
            ProductConfig {
                endpoint: format!("{}/wcs", base),
                product: "ELVIS_UTM".to_string(),
                format: ResponseFormat::Npy,
                transform: TransformConfig {
                    fill_value: Some(FLOAT32_FILL),
                    ..TransformConfig::default()
                },
            },
        );

        products.insert(
            "cross_section".to_string(),
            ProductConfig {
                endpoint: format!("{}/wcs/profile", base),
                product: "ELVIS_UTM".to_string(),
                format: ResponseFormat::Delimited,
                transform: TransformConfig {
                    fill_value: Some(FLOAT32_FILL),
                    ..TransformConfig::default()
                },
            },
        );

        products.insert(
            "rainfall".to_string(),
            ProductConfig {
                endpoint: format!("{}/wps", base),
                product: "AGCD_PRECIP".to_string(),
                format: ResponseFormat::Csv,
                transform: TransformConfig {
                    fill_value: Some(-9999.0),
                    keep: vec!["precip".to_string()],
                    resample: Some(ResampleConfig {
                        interval: Interval::Year,
                        aggregation: Aggregation::Sum,
                    }),
                    rename: BTreeMap::from([(
                        "precip".to_string(),
                        "Rainfall (mm)".to_string(),
                    )]),
                    ..TransformConfig::default()
                },
            },
        );

        products.insert(
            "forest_condition".to_string(),
            ProductConfig {
                endpoint: format!("{}/wps", base),
                product: "FOREST_CONDITION".to_string(),
                format: ResponseFormat::Csv,
                transform: TransformConfig {
                    fill_value: Some(-9999.0),
                    keep: vec!["ndvi".to_string(), "canopy".to_string()],
                    rename: BTreeMap::from([
                        ("ndvi".to_string(), "NDVI".to_string()),
                        ("canopy".to_string(), "Canopy cover (%)".to_string()),
                    ]),
                    ..TransformConfig::default()
                },
            },
        );

        products.insert(
            "water_usage".to_string(),
            ProductConfig {
                endpoint: format!("{}/wps", base),
                product: "WATER_USAGE".to_string(),
                format: ResponseFormat::Csv,
                transform: TransformConfig {
                    keep: vec!["usage".to_string()],
                    scale: BTreeMap::from([("usage".to_string(), 1e-3)]),
                    resample: Some(ResampleConfig {
                        interval: Interval::Year,
                        aggregation: Aggregation::Sum,
                    }),
                    rename: BTreeMap::from([("usage".to_string(), "Usage (ML)".to_string())]),
                    ..TransformConfig::default()
                },
            },
        );

        Self { products }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_flood_product() {
        let catalog = ProductCatalog::builtin("https://example.org/");
        let flood = catalog.get("flood").unwrap();
        assert_eq!(flood.endpoint, "https://example.org/wps");
        assert_eq!(flood.product, "ELVIS_UTM");
        assert_eq!(flood.format, ResponseFormat::Csv);
        assert_eq!(flood.transform, TransformConfig::default());
    }

    #[test]
    fn test_unknown_product() {
        let catalog = ProductCatalog::builtin(DEFAULT_SERVICE_URL);
        assert!(matches!(
            catalog.get("snowpack"),
            Err(AdapterError::UnknownProduct(_))
        ));
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
products:
  rainfall:
    endpoint: http://localhost:9000/wps
    product: AGCD_PRECIP
    format: csv
    transform:
      fill_value: -9999
      resample:
        interval: year
        aggregation: sum
"#;
        let catalog = ProductCatalog::from_yaml_str(yaml).unwrap();
        let rainfall = catalog.get("rainfall").unwrap();
        assert_eq!(rainfall.format, ResponseFormat::Csv);
        assert_eq!(rainfall.transform.fill_value, Some(-9999.0));
        assert_eq!(
            rainfall.transform.resample,
            Some(ResampleConfig {
                interval: Interval::Year,
                aggregation: Aggregation::Sum
            })
        );
    }

    #[test]
    fn test_rejects_resampled_grid() {
        let yaml = r#"
products:
  dem:
    endpoint: http://localhost:9000/wcs
    product: ELVIS_UTM
    format: npy
    transform:
      resample: {interval: month, aggregation: mean}
"#;
        assert!(matches!(
            ProductCatalog::from_yaml_str(yaml),
            Err(AdapterError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let yaml = r#"
products:
  flood:
    endpoint: ftp://example.org/wps
    product: ELVIS_UTM
    format: csv
"#;
        assert!(ProductCatalog::from_yaml_str(yaml).is_err());
    }
}
