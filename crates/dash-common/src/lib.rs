//! Common types and utilities shared across the catchment dashboard crates.

pub mod bbox;
pub mod error;
pub mod geojson;
pub mod time;

pub use bbox::BoundingBox;
pub use error::DashError;
pub use geojson::{Feature, FeatureCollection, FeatureId, Geometry, GeometryKind, Position};
pub use time::{parse_timestamp, TimeParseError};
