//! Planar area of geometries in a projected equal-area frame.

use dash_common::geojson::{Geometry, Position};

use crate::albers::AlbersEqualArea;

/// Area (m²) enclosed by a ring of geographic positions.
///
/// The ring is projected vertex by vertex and measured with the shoelace
/// formula, so the result is unsigned and independent of winding order.
/// Closing the ring explicitly is optional.
pub fn ring_area(proj: &AlbersEqualArea, ring: &[Position]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }

    let projected: Vec<(f64, f64)> = ring.iter().map(|p| proj.forward(p[0], p[1])).collect();

    let mut twice_area = 0.0;
    for i in 0..projected.len() {
        let (x1, y1) = projected[i];
        let (x2, y2) = projected[(i + 1) % projected.len()];
        twice_area += x1 * y2 - x2 * y1;
    }

    (twice_area / 2.0).abs()
}

/// Area (m²) of a polygon: exterior ring minus holes.
pub fn polygon_area(proj: &AlbersEqualArea, rings: &[Vec<Position>]) -> f64 {
    let Some((exterior, holes)) = rings.split_first() else {
        return 0.0;
    };

    let holes: f64 = holes.iter().map(|h| ring_area(proj, h)).sum();
    (ring_area(proj, exterior) - holes).max(0.0)
}

/// Area (m²) of any geometry. Points and lines have no area.
pub fn geometry_area(proj: &AlbersEqualArea, geometry: &Geometry) -> f64 {
    geometry
        .polygons()
        .into_iter()
        .map(|rings| polygon_area(proj, rings))
        .sum()
}
