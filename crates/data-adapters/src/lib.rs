//! Data adapters for the remote geospatial services behind the dashboard.
//!
//! Every remote product is reached through one capability, [`DataAdapter`],
//! configured per product by a [`ProductConfig`] entry in the
//! [`ProductCatalog`]. Responses are parsed into display-ready [`Payload`]s:
//! - CSV with a date index → [`TimeSeries`]
//! - NumPy `.npy` elevation grids → [`Grid`]
//! - delimited 1-D arrays (cross-sections) → profile values
//!
//! The [`reference`] module loads the static datasets needed at startup.

pub mod adapter;
pub mod arrays;
pub mod error;
pub mod http;
pub mod product;
pub mod reference;
pub mod series;
pub mod tabular;
pub mod transform;
pub mod wms;

pub use adapter::{DataAdapter, RequestBody, RequestParams};
pub use error::AdapterError;
pub use http::HttpAdapter;
pub use product::{
    Aggregation, Interval, ProductCatalog, ProductConfig, ResampleConfig, ResponseFormat,
    TransformConfig,
};
pub use reference::{CatchmentIndex, ReferenceData, ReferenceLoader, Source};
pub use series::{Column, Grid, Payload, TimeSeries};
pub use wms::WmsLayer;
