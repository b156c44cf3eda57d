//! Albers Equal Area Conic projection on an ellipsoid.
//!
//! Australian catchment areas are computed in GDA94 / Australian Albers
//! (EPSG:3577), which preserves area across the continent.
//!
//! The projection parameters include:
//! - Standard parallels: lat1 and lat2 (secant cone)
//! - Latitude of origin: lat0
//! - Central meridian: lon0
//! - Ellipsoid: semi-major axis and flattening (GRS80 for GDA94)
//!
//! Formulas follow Snyder, "Map Projections: A Working Manual" (1987), §14.

use std::f64::consts::PI;

/// GRS80 semi-major axis (meters).
pub const GRS80_A: f64 = 6378137.0;
/// GRS80 inverse flattening.
pub const GRS80_INV_F: f64 = 298.257222101;

const MAX_INVERSE_ITERATIONS: usize = 25;
const INVERSE_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("Standard parallels must not be symmetric about the equator")]
    DegenerateCone,

    #[error("Inverse projection did not converge at ({x}, {y})")]
    NoConvergence { x: f64, y: f64 },
}

/// Albers Equal Area Conic projection parameters.
#[derive(Debug, Clone)]
pub struct AlbersEqualArea {
    /// Central meridian in radians
    pub lon0: f64,
    /// Latitude of origin in radians
    pub lat0: f64,
    /// False easting (meters)
    pub false_easting: f64,
    /// False northing (meters)
    pub false_northing: f64,
    /// Semi-major axis (meters)
    pub a: f64,
    /// First eccentricity
    e: f64,
    /// Cone constant
    n: f64,
    /// Snyder's C constant
    c: f64,
    /// Rho at the latitude of origin
    rho0: f64,
}

impl AlbersEqualArea {
    /// Create a projection from parameters in degrees on the GRS80 ellipsoid.
    ///
    /// # Arguments
    /// * `lat1_deg` - First standard parallel (degrees)
    /// * `lat2_deg` - Second standard parallel (degrees)
    /// * `lat0_deg` - Latitude of origin (degrees)
    /// * `lon0_deg` - Central meridian (degrees)
    pub fn new(
        lat1_deg: f64,
        lat2_deg: f64,
        lat0_deg: f64,
        lon0_deg: f64,
    ) -> Result<Self, ProjectionError> {
        Self::with_ellipsoid(lat1_deg, lat2_deg, lat0_deg, lon0_deg, GRS80_A, GRS80_INV_F)
    }

    /// Create a projection on an arbitrary ellipsoid.
    pub fn with_ellipsoid(
        lat1_deg: f64,
        lat2_deg: f64,
        lat0_deg: f64,
        lon0_deg: f64,
        a: f64,
        inv_f: f64,
    ) -> Result<Self, ProjectionError> {
        let to_rad = PI / 180.0;
        let lat1 = lat1_deg * to_rad;
        let lat2 = lat2_deg * to_rad;
        let lat0 = lat0_deg * to_rad;
        let lon0 = lon0_deg * to_rad;

        let f = 1.0 / inv_f;
        let e = (2.0 * f - f * f).sqrt();

        let m1 = m(lat1, e);
        let m2 = m(lat2, e);
        let q0 = q(lat0, e);
        let q1 = q(lat1, e);
        let q2 = q(lat2, e);

        let n = if (lat1 - lat2).abs() < 1e-10 {
            // Tangent cone
            lat1.sin()
        } else {
            (m1 * m1 - m2 * m2) / (q2 - q1)
        };

        if n.abs() < 1e-10 {
            return Err(ProjectionError::DegenerateCone);
        }

        let c = m1 * m1 + n * q1;
        let rho0 = a * (c - n * q0).sqrt() / n;

        Ok(Self {
            lon0,
            lat0,
            false_easting: 0.0,
            false_northing: 0.0,
            a,
            e,
            n,
            c,
            rho0,
        })
    }

    /// GDA94 / Australian Albers (EPSG:3577).
    ///
    /// - Standard parallels: 18°S and 36°S
    /// - Latitude of origin: 0°
    /// - Central meridian: 132°E
    /// - No false easting/northing
    pub fn australian_albers() -> Self {
        Self::new(-18.0, -36.0, 0.0, 132.0).expect("EPSG:3577 parallels define a valid cone")
    }

    /// Project geographic coordinates (degrees) to easting/northing (meters).
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let to_rad = PI / 180.0;
        let lat = lat_deg * to_rad;
        let lon = lon_deg * to_rad;

        // Normalize longitude difference to [-π, π]
        let mut dlon = lon - self.lon0;
        while dlon > PI {
            dlon -= 2.0 * PI;
        }
        while dlon < -PI {
            dlon += 2.0 * PI;
        }

        let rho = self.a * (self.c - self.n * q(lat, self.e)).sqrt() / self.n;
        let theta = self.n * dlon;

        let x = self.false_easting + rho * theta.sin();
        let y = self.false_northing + self.rho0 - rho * theta.cos();
        (x, y)
    }

    /// Unproject easting/northing (meters) to geographic coordinates (degrees).
    ///
    /// Returns (lon, lat).
    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let to_deg = 180.0 / PI;
        let dx = x - self.false_easting;
        let dy = self.rho0 - (y - self.false_northing);

        let rho = (dx * dx + dy * dy).sqrt().copysign(self.n);
        let theta = if self.n < 0.0 {
            (-dx).atan2(-dy)
        } else {
            dx.atan2(dy)
        };

        let rho_n_over_a = rho * self.n / self.a;
        let q_val = (self.c - rho_n_over_a * rho_n_over_a) / self.n;

        let lat = self.latitude_from_q(q_val).ok_or(ProjectionError::NoConvergence { x, y })?;
        let lon = self.lon0 + theta / self.n;

        Ok((lon * to_deg, lat * to_deg))
    }

    /// Iteratively solve q(φ) = q_val for φ (Snyder eq. 3-16).
    fn latitude_from_q(&self, q_val: f64) -> Option<f64> {
        let e = self.e;
        let e2 = e * e;
        let mut phi = (q_val / 2.0).clamp(-1.0, 1.0).asin();

        for _ in 0..MAX_INVERSE_ITERATIONS {
            let sin_phi = phi.sin();
            let cos_phi = phi.cos();
            let one_minus = 1.0 - e2 * sin_phi * sin_phi;

            let delta = one_minus * one_minus / (2.0 * cos_phi)
                * (q_val / (1.0 - e2) - sin_phi / one_minus
                    + (1.0 / (2.0 * e)) * ((1.0 - e * sin_phi) / (1.0 + e * sin_phi)).ln());
            phi += delta;

            if delta.abs() < INVERSE_TOLERANCE {
                return Some(phi);
            }
        }
        None
    }
}

/// Snyder eq. 14-15.
fn m(phi: f64, e: f64) -> f64 {
    let sin_phi = phi.sin();
    phi.cos() / (1.0 - e * e * sin_phi * sin_phi).sqrt()
}

/// Snyder eq. 3-12.
fn q(phi: f64, e: f64) -> f64 {
    let sin_phi = phi.sin();
    let e_sin = e * sin_phi;
    (1.0 - e * e)
        * (sin_phi / (1.0 - e_sin * e_sin) - (1.0 / (2.0 * e)) * ((1.0 - e_sin) / (1.0 + e_sin)).ln())
}
