//! Coordinate reference system transformations.
//!
//! Implements the map projections of the supported CRS catalogue from
//! scratch: geographic, Web Mercator, UTM and polar stereographic, all on
//! the WGS84 ellipsoid.

pub mod ellipsoid;
pub mod error;
pub mod mercator;
pub mod polar;
pub mod transform;
pub mod transverse_mercator;

pub use error::ProjectionError;
pub use mercator::WebMercator;
pub use polar::PolarStereographic;
pub use transform::{corresponding_utm, transform_point, CrsTransform, Projection};
pub use transverse_mercator::TransverseMercator;
