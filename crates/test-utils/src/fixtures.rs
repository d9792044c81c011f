//! Common test fixtures.
//!
//! Grids in the CRSs the toolkit understands, plus reference extents.

use raster_common::{Affine, BoundingBox, CrsCode, GridModel};

/// Common bounding box definitions for testing.
pub mod bbox {
    /// Global bounding box (-180 to 180, -90 to 90)
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// Europe bounding box
    pub const EUROPE: (f64, f64, f64, f64) = (-15.0, 35.0, 45.0, 72.0);

    /// Strasbourg area, inside UTM zone 32N
    pub const STRASBOURG: (f64, f64, f64, f64) = (7.6, 48.5, 7.9, 48.7);
}

/// Common CRS identifiers.
pub mod crs {
    /// WGS84 Geographic
    pub const EPSG_4326: &str = "EPSG:4326";

    /// Web Mercator
    pub const EPSG_3857: &str = "EPSG:3857";

    /// WGS84 / UTM zone 32N
    pub const EPSG_32632: &str = "EPSG:32632";

    /// Lon/lat axis order alias of EPSG:4326
    pub const CRS_84: &str = "CRS:84";
}

/// Convert a fixture tuple into a [`BoundingBox`].
pub fn to_bbox((min_x, min_y, max_x, max_y): (f64, f64, f64, f64)) -> BoundingBox {
    BoundingBox::new(min_x, min_y, max_x, max_y)
}

/// North-up grid without CRS, origin (0, height), unit pixels.
pub fn unit_grid(width: usize, height: usize) -> GridModel {
    GridModel::new(
        Affine::from_origin(0.0, height as f64, 1.0, 1.0),
        None,
        width,
        height,
    )
    .expect("valid unit grid")
}

/// Geographic grid with its top-left corner at (west, north).
pub fn geographic_grid(west: f64, north: f64, res: f64, width: usize, height: usize) -> GridModel {
    GridModel::new(
        Affine::from_origin(west, north, res, res),
        Some(CrsCode::Epsg4326),
        width,
        height,
    )
    .expect("valid geographic grid")
}

/// Web Mercator grid with its top-left corner at (west, north) meters.
pub fn web_mercator_grid(west: f64, north: f64, res: f64, width: usize, height: usize) -> GridModel {
    GridModel::new(
        Affine::from_origin(west, north, res, res),
        Some(CrsCode::Epsg3857),
        width,
        height,
    )
    .expect("valid web mercator grid")
}

/// UTM 32N grid (60 m pixels) over Strasbourg.
pub fn utm_grid(width: usize, height: usize) -> GridModel {
    GridModel::new(
        Affine::from_origin(400_020.0, 5_400_000.0, 60.0, 60.0),
        Some(CrsCode::Utm {
            zone: 32,
            north: true,
        }),
        width,
        height,
    )
    .expect("valid utm grid")
}
