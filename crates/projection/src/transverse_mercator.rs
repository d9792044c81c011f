//! Universal Transverse Mercator projection on the WGS84 ellipsoid.
//!
//! Series expansion from Snyder, "Map Projections: A Working Manual"
//! (USGS PP 1395), eqs. 8-9 to 8-10 (forward) and 8-17 to 8-25 (inverse).
//! Accurate to the millimetre inside a zone, usable a few zones beyond it.

use crate::ellipsoid::{wrap_pi, WGS84_A, WGS84_E2};

const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Longitudes further than this from the central meridian are rejected.
const MAX_DLON_DEG: f64 = 30.0;

/// A single UTM zone.
#[derive(Debug, Clone, Copy)]
pub struct TransverseMercator {
    /// Zone number (1-60)
    pub zone: u8,
    /// Northern hemisphere (false northing 0) or southern (10 000 km)
    pub north: bool,
    /// Central meridian in radians
    lon0: f64,
}

impl TransverseMercator {
    pub fn utm(zone: u8, north: bool) -> Self {
        let lon0 = (zone as f64 * 6.0 - 183.0).to_radians();
        Self { zone, north, lon0 }
    }

    /// Central meridian in degrees.
    pub fn central_meridian(&self) -> f64 {
        self.lon0.to_degrees()
    }

    fn false_northing(&self) -> f64 {
        if self.north {
            0.0
        } else {
            FALSE_NORTHING_SOUTH
        }
    }

    /// Meridional arc length from the equator to latitude `phi` (radians).
    fn meridian_arc(phi: f64) -> f64 {
        let e2 = WGS84_E2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        WGS84_A
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }

    /// Project lon/lat (degrees) to easting/northing (meters).
    pub fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
            return None;
        }
        let dlon = wrap_pi(lon.to_radians() - self.lon0);
        if dlon.abs() > MAX_DLON_DEG.to_radians() {
            return None;
        }

        let phi = lat.to_radians();
        let e2 = WGS84_E2;
        let ep2 = e2 / (1.0 - e2);
        let (sin_phi, cos_phi) = phi.sin_cos();

        let n = WGS84_A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = (phi.tan()).powi(2);
        let c = ep2 * cos_phi * cos_phi;
        let a = dlon * cos_phi;
        let m = Self::meridian_arc(phi);

        let x = K0
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0);
        let y = K0
            * (m + n
                * phi.tan()
                * (a * a / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));

        Some((x + FALSE_EASTING, y + self.false_northing()))
    }

    /// Unproject easting/northing (meters) to lon/lat (degrees).
    pub fn inverse(&self, easting: f64, northing: f64) -> Option<(f64, f64)> {
        if !easting.is_finite() || !northing.is_finite() {
            return None;
        }
        let e2 = WGS84_E2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let ep2 = e2 / (1.0 - e2);

        let x = easting - FALSE_EASTING;
        let y = northing - self.false_northing();

        let m = y / K0;
        let mu = m / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
        let sqrt_1me2 = (1.0 - e2).sqrt();
        let e1 = (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2);

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        if cos_phi1.abs() < 1e-12 {
            return None;
        }
        let c1 = ep2 * cos_phi1 * cos_phi1;
        let t1 = phi1.tan().powi(2);
        let denom = 1.0 - e2 * sin_phi1 * sin_phi1;
        let n1 = WGS84_A / denom.sqrt();
        let r1 = WGS84_A * (1.0 - e2) / denom.powf(1.5);
        let d = x / (n1 * K0);

        let phi = phi1
            - (n1 * phi1.tan() / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);
        let lambda = self.lon0
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                    * d.powi(5)
                    / 120.0)
                / cos_phi1;

        let lat = phi.to_degrees();
        if !lat.is_finite() || lat.abs() > 90.0 {
            return None;
        }
        Some((wrap_pi(lambda).to_degrees(), lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_central_meridian() {
        assert_eq!(TransverseMercator::utm(31, true).central_meridian(), 3.0);
        assert_eq!(TransverseMercator::utm(1, true).central_meridian(), -177.0);
        assert_eq!(TransverseMercator::utm(60, false).central_meridian(), 177.0);
    }

    #[test]
    fn test_origin_of_zone() {
        let proj = TransverseMercator::utm(31, true);
        let (e, n) = proj.forward(3.0, 0.0).unwrap();
        assert!((e - 500_000.0).abs() < 1e-6);
        assert!(n.abs() < 1e-6);

        let south = TransverseMercator::utm(31, false);
        let (_, n) = south.forward(3.0, 0.0).unwrap();
        assert!((n - 10_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_central_meridian_northing() {
        // On the central meridian northing is k0 times the meridian arc:
        // 45 N lies 4 984 944.38 m from the equator on WGS84.
        let proj = TransverseMercator::utm(32, true);
        let (e, n) = proj.forward(9.0, 45.0).unwrap();
        assert!((e - 500_000.0).abs() < 1e-6);
        assert!((n - 4_982_950.40).abs() < 0.5, "northing {}", n);
    }

    #[test]
    fn test_symmetry_about_central_meridian() {
        let proj = TransverseMercator::utm(32, true);
        let (e_east, n_east) = proj.forward(10.5, 48.0).unwrap();
        let (e_west, n_west) = proj.forward(7.5, 48.0).unwrap();
        assert!((e_east - 500_000.0 + (e_west - 500_000.0)).abs() < 1e-6);
        assert!((n_east - n_west).abs() < 1e-6);
    }

    #[test]
    fn test_roundtrip() {
        let proj = TransverseMercator::utm(38, true);
        for &(lon, lat) in &[(45.0, 0.5), (45.6, 33.3), (43.1, 60.0), (47.9, 10.0)] {
            let (e, n) = proj.forward(lon, lat).unwrap();
            let (lon2, lat2) = proj.inverse(e, n).unwrap();
            assert!((lon - lon2).abs() < 1e-7, "lon {} vs {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-7, "lat {} vs {}", lat, lat2);
        }
    }

    #[test]
    fn test_far_longitude_rejected() {
        let proj = TransverseMercator::utm(31, true);
        assert!(proj.forward(120.0, 10.0).is_none());
    }
}
