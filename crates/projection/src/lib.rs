//! Coordinate reference system transformations.
//!
//! Areas are always computed in an equal-area frame, never on raw
//! longitude/latitude.

pub mod albers;
pub mod area;

pub use albers::{AlbersEqualArea, ProjectionError};
pub use area::{geometry_area, polygon_area, ring_area};
