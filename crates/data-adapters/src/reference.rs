//! Static reference datasets loaded once at startup.
//!
//! Catchment/project boundaries come as a GeoJSON FeatureCollection and are
//! augmented with an `AlbersArea` property (m², EPSG:3577). The drought index
//! series and the sample elevation surface come as CSV. Everything here is
//! immutable after loading; failures are meant to abort startup.

use std::fmt;
use std::path::PathBuf;

use csv::ReaderBuilder;
use dash_common::{Feature, FeatureCollection};
use projection::{geometry_area, AlbersEqualArea};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AdapterError;
use crate::http::get_bytes;
use crate::series::{Grid, TimeSeries};
use crate::tabular::parse_csv;

/// Property holding the equal-area size of each reference feature.
pub const AREA_PROPERTY: &str = "AlbersArea";

/// Where a static dataset lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Source {
    Url(String),
    Path(PathBuf),
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            Source::Url(s)
        } else {
            Source::Path(PathBuf::from(s))
        }
    }
}

impl From<Source> for String {
    fn from(source: Source) -> Self {
        source.to_string()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => f.write_str(url),
            Source::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Catchment boundaries indexed by identifier.
#[derive(Debug, Clone)]
pub struct CatchmentIndex {
    collection: FeatureCollection,
    id_property: Option<String>,
}

impl CatchmentIndex {
    /// Index a collection, computing the equal-area size of every feature.
    pub fn new(
        mut collection: FeatureCollection,
        id_property: Option<String>,
        proj: &AlbersEqualArea,
    ) -> Self {
        for feature in &mut collection.features {
            let area = feature
                .geometry
                .as_ref()
                .map(|g| geometry_area(proj, g))
                .unwrap_or(0.0);
            feature
                .properties
                .insert(AREA_PROPERTY.to_string(), serde_json::json!(area));
        }
        Self {
            collection,
            id_property,
        }
    }

    pub fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    /// Property holding the identifier, when features are not keyed by `id`.
    pub fn id_property(&self) -> Option<&str> {
        self.id_property.as_deref()
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    /// Feature by identifier.
    pub fn get(&self, id: &str) -> Option<&Feature> {
        self.collection.find_by_id(id, self.id_property.as_deref())
    }

    /// Equal-area size (m²) of a feature.
    pub fn area_of(&self, id: &str) -> Option<f64> {
        self.get(id)?.number_property(AREA_PROPERTY)
    }

    /// (identifier, label) pairs; label is the `name` property when present.
    pub fn options(&self) -> Vec<(String, String)> {
        self.collection
            .features
            .iter()
            .filter_map(|f| {
                let id = f.identifier(self.id_property.as_deref())?;
                let label = f
                    .properties
                    .get("name")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| id.clone());
                Some((id, label))
            })
            .collect()
    }
}

/// Everything loaded at startup; shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub catchments: Option<CatchmentIndex>,
    pub drought: Option<TimeSeries>,
    pub sample_surface: Option<Grid>,
}

/// Loads static datasets from disk or over HTTP.
pub struct ReferenceLoader {
    client: Client,
    proj: AlbersEqualArea,
}

impl ReferenceLoader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            proj: AlbersEqualArea::australian_albers(),
        }
    }

    async fn read(&self, source: &Source) -> Result<Vec<u8>, AdapterError> {
        match source {
            Source::Url(url) => Ok(get_bytes(&self.client, url).await?.to_vec()),
            Source::Path(path) => tokio::fs::read(path).await.map_err(|e| AdapterError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Load and index a boundary FeatureCollection.
    pub async fn load_catchments(
        &self,
        source: &Source,
        id_property: Option<String>,
    ) -> Result<CatchmentIndex, AdapterError> {
        let bytes = self.read(source).await?;
        let collection: FeatureCollection = serde_json::from_slice(&bytes)
            .map_err(|e| AdapterError::parse("geojson", e.to_string()))?;

        let index = CatchmentIndex::new(collection, id_property, &self.proj);
        info!(source = %source, features = index.len(), "Loaded catchment boundaries");
        Ok(index)
    }

    /// Load a date-indexed CSV series.
    pub async fn load_series(&self, source: &Source) -> Result<TimeSeries, AdapterError> {
        let bytes = self.read(source).await?;
        let series = parse_csv(&bytes)?;
        if series.is_empty() {
            return Err(AdapterError::EmptyResponse(source.to_string()));
        }
        info!(source = %source, rows = series.len(), "Loaded series");
        Ok(series)
    }

    /// Load a numeric matrix CSV (header row and index column are dropped).
    pub async fn load_matrix(&self, source: &Source) -> Result<Grid, AdapterError> {
        let bytes = self.read(source).await?;
        let grid = parse_matrix_csv(&bytes)?;
        info!(source = %source, rows = grid.rows, cols = grid.cols, "Loaded matrix");
        Ok(grid)
    }
}

/// Parse a matrix CSV such as
///
/// ```text
/// ,0,1,2
/// 0,27.8,49.6,83.0
/// 1,27.7,48.5,65.2
/// ```
pub fn parse_matrix_csv(body: &[u8]) -> Result<Grid, AdapterError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(body);

    let mut values = Vec::new();
    let mut rows = 0;
    let mut cols = None;

    for record in reader.records() {
        let record = record?;
        let row: Vec<Option<f64>> = record
            .iter()
            .skip(1)
            .map(|cell| {
                if cell.is_empty() {
                    return Ok(None);
                }
                cell.parse::<f64>()
                    .map(Some)
                    .map_err(|_| AdapterError::parse("csv", format!("invalid number '{}'", cell)))
            })
            .collect::<Result<_, _>>()?;

        match cols {
            None => cols = Some(row.len()),
            Some(n) if n != row.len() => {
                return Err(AdapterError::parse("csv", "matrix rows differ in length"))
            }
            Some(_) => {}
        }
        values.extend(row);
        rows += 1;
    }

    Ok(Grid {
        rows,
        cols: cols.unwrap_or(0),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_from_string() {
        assert_eq!(
            Source::from("https://example.org/c.geojson".to_string()),
            Source::Url("https://example.org/c.geojson".to_string())
        );
        assert_eq!(
            Source::from("data/c.geojson".to_string()),
            Source::Path(PathBuf::from("data/c.geojson"))
        );
    }

    #[test]
    fn test_parse_matrix_csv() {
        let grid = parse_matrix_csv(b",0,1,2\n0,27.8,49.6,83.0\n1,27.7,,65.2\n").unwrap();
        assert_eq!((grid.rows, grid.cols), (2, 3));
        assert_eq!(grid.get(1, 1), None);
        assert_eq!(grid.get(1, 2), Some(65.2));
    }

    #[test]
    fn test_parse_matrix_rejects_ragged() {
        // csv itself rejects unequal record lengths
        assert!(parse_matrix_csv(b",0,1\n0,1,2\n1,3\n").is_err());
    }
}
