//! Dashboard configuration loading and types.

use anyhow::{Context, Result};
use data_adapters::{ProductCatalog, Source};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Boundary dataset reference for the catchment layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchmentSource {
    pub source: Source,

    /// Feature property holding the catchment id; the feature `id` if unset.
    #[serde(default)]
    pub id_property: Option<String>,
}

/// Static datasets loaded at startup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default)]
    pub catchments: Option<CatchmentSource>,

    /// Drought index series (date-indexed CSV).
    #[serde(default)]
    pub drought: Option<Source>,

    /// Elevation matrix shown before a polygon is drawn.
    #[serde(default)]
    pub sample_surface: Option<Source>,
}

impl ReferenceConfig {
    /// Datasets used when no configuration directory is present.
    pub fn builtin() -> Self {
        Self {
            catchments: Some(CatchmentSource {
                source: Source::from("data/catchments.geojson".to_string()),
                id_property: Some("code".to_string()),
            }),
            drought: Some(Source::from("data/grace.csv".to_string())),
            sample_surface: Some(Source::from(
                "https://raw.githubusercontent.com/plotly/datasets/master/api_docs/mt_bruno_elevation.csv"
                    .to_string(),
            )),
        }
    }
}

/// Everything read from the configuration directory.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub products: ProductCatalog,
    pub reference: ReferenceConfig,
}

impl DashboardConfig {
    /// Built-in catalogue against `service_url` and the built-in datasets.
    pub fn builtin(service_url: &str) -> Self {
        Self {
            products: ProductCatalog::builtin(service_url),
            reference: ReferenceConfig::builtin(),
        }
    }

    /// Load `products.yaml` and `reference.yaml` from `dir`.
    ///
    /// A missing directory falls back to the built-in configuration; a
    /// missing file inside an existing directory falls back for that file only.
    pub fn load_from_dir(dir: &str, service_url: &str) -> Result<Self> {
        let path = Path::new(dir);

        if !path.exists() {
            tracing::warn!(
                "Dashboard config directory {} does not exist, using defaults",
                dir
            );
            return Ok(Self::builtin(service_url));
        }

        let products_path = path.join("products.yaml");
        let products = if products_path.exists() {
            ProductCatalog::load_file(&products_path)
                .with_context(|| format!("Failed to load {:?}", products_path))?
        } else {
            tracing::warn!("No products.yaml in {}, using built-in catalogue", dir);
            ProductCatalog::builtin(service_url)
        };

        let reference_path = path.join("reference.yaml");
        let reference = if reference_path.exists() {
            let content = std::fs::read_to_string(&reference_path)
                .with_context(|| format!("Failed to read: {:?}", reference_path))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse: {:?}", reference_path))?
        } else {
            tracing::warn!("No reference.yaml in {}, using built-in datasets", dir);
            ReferenceConfig::builtin()
        };

        Ok(Self {
            products,
            reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_dir_uses_builtin() {
        let config = DashboardConfig::load_from_dir("/nonexistent/dashboard", "http://svc").unwrap();
        assert_eq!(config, DashboardConfig::builtin("http://svc"));
        assert_eq!(
            config.products.get("flood").unwrap().endpoint,
            "http://svc/wps"
        );
    }

    #[test]
    fn test_load_reference_yaml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("reference.yaml"),
            r#"
catchments:
  source: https://example.org/catchments.geojson
  id_property: code
drought: data/grace.csv
"#,
        )
        .unwrap();

        let config =
            DashboardConfig::load_from_dir(dir.path().to_str().unwrap(), "http://svc").unwrap();
        let catchments = config.reference.catchments.unwrap();
        assert_eq!(
            catchments.source,
            Source::Url("https://example.org/catchments.geojson".into())
        );
        assert_eq!(catchments.id_property.as_deref(), Some("code"));
        assert!(config.reference.sample_surface.is_none());
        // No products.yaml: built-in catalogue.
        assert!(config.products.get("rainfall").is_ok());
    }

    #[test]
    fn test_invalid_products_yaml_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("products.yaml"), "products: [1, 2").unwrap();
        assert!(DashboardConfig::load_from_dir(dir.path().to_str().unwrap(), "http://svc").is_err());
    }
}
