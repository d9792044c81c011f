//! Reference ellipsoid constants.

/// WGS84 semi-major axis (meters)
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS84 inverse flattening
pub const WGS84_INV_F: f64 = 298.257_223_563;

/// WGS84 first eccentricity squared
pub const WGS84_E2: f64 = (2.0 - 1.0 / WGS84_INV_F) / WGS84_INV_F;

/// Wrap an angle in radians to [-π, π].
#[inline]
pub fn wrap_pi(angle: f64) -> f64 {
    use std::f64::consts::PI;
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    // rem_euclid maps +π to -π; keep the sign of the input at the seam
    if wrapped == -PI && angle > 0.0 {
        PI
    } else {
        wrapped
    }
}
