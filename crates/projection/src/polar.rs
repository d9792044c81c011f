//! Polar Stereographic projection (variant B, standard parallel).
//!
//! Ellipsoidal form from Snyder, "Map Projections: A Working Manual",
//! eqs. 21-33 to 21-40. The south polar aspect is computed by negating
//! latitudes and longitudes, projecting as north, and negating x/y.
//!
//! Supported definitions:
//! - EPSG:3413 NSIDC Sea Ice Polar Stereographic North (lat_ts 70, lon0 -45)
//! - EPSG:3031 Antarctic Polar Stereographic (lat_ts -71, lon0 0)

use crate::ellipsoid::{wrap_pi, WGS84_A, WGS84_E2};
use std::f64::consts::FRAC_PI_2;
use std::f64::consts::FRAC_PI_4;

/// Points closer than this to the opposite pole are rejected (degrees).
const OPPOSITE_POLE_LIMIT: f64 = -89.0;

/// Polar stereographic projection on WGS84.
#[derive(Debug, Clone, Copy)]
pub struct PolarStereographic {
    /// +1 for the north polar aspect, -1 for south
    sign: f64,
    /// Central meridian in radians
    lon0: f64,
    /// `a * m_c / t_c` at the standard parallel
    scale: f64,
}

impl PolarStereographic {
    /// Build a projection from its latitude of true scale and central
    /// meridian (degrees). The sign of `lat_ts` selects the pole.
    pub fn new(lat_ts: f64, lon0: f64) -> Self {
        let sign = if lat_ts < 0.0 { -1.0 } else { 1.0 };
        let phi_c = lat_ts.abs().to_radians();
        let scale = WGS84_A * m(phi_c) / t(phi_c);
        Self {
            sign,
            lon0: lon0.to_radians(),
            scale,
        }
    }

    /// EPSG:3413
    pub fn nsidc_north() -> Self {
        Self::new(70.0, -45.0)
    }

    /// EPSG:3031
    pub fn antarctic() -> Self {
        Self::new(-71.0, 0.0)
    }

    pub fn is_north(&self) -> bool {
        self.sign > 0.0
    }

    /// Project lon/lat (degrees) to meters.
    pub fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
            return None;
        }
        if self.sign * lat <= OPPOSITE_POLE_LIMIT {
            return None;
        }

        let phi = self.sign * lat.to_radians();
        let dlon = wrap_pi(lon.to_radians() - self.lon0);
        let rho = self.scale * t(phi);

        // North: x = rho sin, y = -rho cos. South after the double negation:
        // x = rho sin, y = rho cos.
        let x = rho * dlon.sin();
        let y = -self.sign * rho * dlon.cos();
        Some((x, y))
    }

    /// Unproject meters to lon/lat (degrees).
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let rho = x.hypot(y);
        let t = rho / self.scale;
        let chi = FRAC_PI_2 - 2.0 * t.atan();
        let phi = conformal_to_geodetic(chi);

        let lambda = if rho == 0.0 {
            self.lon0
        } else {
            self.lon0 + x.atan2(-self.sign * y)
        };

        let lat = self.sign * phi.to_degrees();
        if !lat.is_finite() {
            return None;
        }
        Some((wrap_pi(lambda).to_degrees(), lat))
    }
}

/// Snyder eq. 15-9
fn t(phi: f64) -> f64 {
    let e = WGS84_E2.sqrt();
    let e_sin = e * phi.sin();
    (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - e_sin) / (1.0 + e_sin)).powf(e / 2.0)
}

/// Snyder eq. 14-15
fn m(phi: f64) -> f64 {
    let sin_phi = phi.sin();
    phi.cos() / (1.0 - WGS84_E2 * sin_phi * sin_phi).sqrt()
}

/// Series for latitude from conformal latitude, Snyder eq. 3-5.
fn conformal_to_geodetic(chi: f64) -> f64 {
    let e2 = WGS84_E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let e8 = e6 * e2;
    chi + (e2 / 2.0 + 5.0 * e4 / 24.0 + e6 / 12.0 + 13.0 * e8 / 360.0) * (2.0 * chi).sin()
        + (7.0 * e4 / 48.0 + 29.0 * e6 / 240.0 + 811.0 * e8 / 11520.0) * (4.0 * chi).sin()
        + (7.0 * e6 / 120.0 + 81.0 * e8 / 1120.0) * (6.0 * chi).sin()
        + (4279.0 * e8 / 161280.0) * (8.0 * chi).sin()
}
