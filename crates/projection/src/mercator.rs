//! Web Mercator (EPSG:3857) projection.
//!
//! Spherical Mercator on the WGS84 semi-major axis, as used by web map tiles.

use crate::ellipsoid::WGS84_A;
use std::f64::consts::PI;

/// Latitude limit where the Web Mercator square ends (degrees).
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Half the width of the projected world (meters).
pub const MAX_EXTENT: f64 = PI * WGS84_A;

/// Web Mercator projection.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl WebMercator {
    /// Project lon/lat (degrees) to meters. `None` beyond the latitude limit.
    pub fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || lat.abs() > MAX_LATITUDE + 1e-9 {
            return None;
        }
        let x = WGS84_A * lon.to_radians();
        let y = WGS84_A * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
        Some((x, y))
    }

    /// Unproject meters to lon/lat (degrees).
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let lon = (x / WGS84_A).to_degrees();
        let lat = (2.0 * (y / WGS84_A).exp().atan() - PI / 2.0).to_degrees();
        Some((lon, lat))
    }
}
