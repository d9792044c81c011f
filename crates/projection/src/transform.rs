//! CRS-to-CRS coordinate transforms.
//!
//! Every transform pivots through WGS84 longitude/latitude: the source
//! coordinates are unprojected, then projected into the target CRS.

use crate::error::ProjectionError;
use crate::mercator::WebMercator;
use crate::polar::PolarStereographic;
use crate::transverse_mercator::TransverseMercator;
use raster_common::{BoundingBox, CrsCode};
use tracing::{debug, warn};

/// Forward/inverse projection of a single CRS.
#[derive(Debug, Clone, Copy)]
pub enum Projection {
    /// Longitude/latitude in degrees
    Geographic,
    WebMercator(WebMercator),
    TransverseMercator(TransverseMercator),
    PolarStereographic(PolarStereographic),
}

impl Projection {
    /// Projection implementing a CRS code.
    pub fn for_crs(crs: CrsCode) -> Self {
        match crs {
            CrsCode::Epsg4326 | CrsCode::Epsg4269 => Projection::Geographic,
            CrsCode::Epsg3857 => Projection::WebMercator(WebMercator),
            CrsCode::Utm { zone, north } => {
                Projection::TransverseMercator(TransverseMercator::utm(zone, north))
            }
            CrsCode::Epsg3413 => Projection::PolarStereographic(PolarStereographic::nsidc_north()),
            CrsCode::Epsg3031 => Projection::PolarStereographic(PolarStereographic::antarctic()),
        }
    }

    /// lon/lat (degrees) to projected coordinates.
    pub fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        match self {
            Projection::Geographic => {
                if lon.is_finite() && lat.is_finite() && lat.abs() <= 90.0 {
                    Some((lon, lat))
                } else {
                    None
                }
            }
            Projection::WebMercator(p) => p.forward(lon, lat),
            Projection::TransverseMercator(p) => p.forward(lon, lat),
            Projection::PolarStereographic(p) => p.forward(lon, lat),
        }
    }

    /// Projected coordinates to lon/lat (degrees).
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        match self {
            Projection::Geographic => {
                if x.is_finite() && y.is_finite() && y.abs() <= 90.0 {
                    Some((x, y))
                } else {
                    None
                }
            }
            Projection::WebMercator(p) => p.inverse(x, y),
            Projection::TransverseMercator(p) => p.inverse(x, y),
            Projection::PolarStereographic(p) => p.inverse(x, y),
        }
    }
}

/// Point transform between two coordinate reference systems.
#[derive(Debug, Clone, Copy)]
pub struct CrsTransform {
    from: CrsCode,
    to: CrsCode,
    source: Projection,
    target: Projection,
    identity: bool,
}

impl CrsTransform {
    pub fn new(from: CrsCode, to: CrsCode) -> Self {
        let identity = from.is_equivalent(&to);
        debug!(from = %from, to = %to, identity, "Created CRS transform");
        Self {
            from,
            to,
            source: Projection::for_crs(from),
            target: Projection::for_crs(to),
            identity,
        }
    }

    /// Transform between two possibly unknown CRSs.
    ///
    /// When only one side is known the other is assumed to share it and the
    /// transform is the identity. Fails when neither is known.
    pub fn resolve(from: Option<CrsCode>, to: Option<CrsCode>) -> Result<Self, ProjectionError> {
        match (from, to) {
            (Some(from), Some(to)) => Ok(Self::new(from, to)),
            (Some(known), None) | (None, Some(known)) => {
                warn!(crs = %known, "One raster has no CRS, assuming {}", known);
                Ok(Self::new(known, known))
            }
            (None, None) => Err(ProjectionError::Unresolved),
        }
    }

    pub fn from_crs(&self) -> CrsCode {
        self.from
    }

    pub fn to_crs(&self) -> CrsCode {
        self.to
    }

    /// True when source and target describe the same coordinate space.
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Transform a point, `None` when it falls outside either projection.
    pub fn transform_point(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if self.identity {
            return Some((x, y));
        }
        let (lon, lat) = self.source.inverse(x, y)?;
        self.target.forward(lon, lat)
    }

    /// Transform a point, reporting the failing CRS on error.
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        if self.identity {
            return Ok((x, y));
        }
        let (lon, lat) = self.source.inverse(x, y).ok_or(ProjectionError::OutOfDomain {
            crs: self.from,
            x,
            y,
        })?;
        self.target
            .forward(lon, lat)
            .ok_or(ProjectionError::OutOfDomain {
                crs: self.to,
                x: lon,
                y: lat,
            })
    }

    /// Bounding box of `bbox` in the target CRS.
    ///
    /// Each edge is sampled at `densify + 2` points so curved edges are
    /// covered. Points outside the target domain are skipped.
    pub fn transform_bounds(
        &self,
        bbox: &BoundingBox,
        densify: usize,
    ) -> Result<BoundingBox, ProjectionError> {
        if self.identity {
            return Ok(*bbox);
        }
        let steps = densify + 1;
        let mut points = Vec::with_capacity(4 * steps);
        for i in 0..steps {
            let f = i as f64 / steps as f64;
            let x = bbox.min_x + f * bbox.width();
            let y = bbox.min_y + f * bbox.height();
            points.push((x, bbox.min_y));
            points.push((bbox.max_x, y));
            points.push((bbox.max_x - f * bbox.width(), bbox.max_y));
            points.push((bbox.min_x, bbox.max_y - f * bbox.height()));
        }

        let projected = points
            .into_iter()
            .filter_map(|(x, y)| self.transform_point(x, y));
        BoundingBox::from_points(projected).ok_or(ProjectionError::EmptyBounds {
            from: self.from,
            to: self.to,
        })
    }
}

/// Transform a single point between two CRSs.
pub fn transform_point(
    from: CrsCode,
    to: CrsCode,
    x: f64,
    y: f64,
) -> Result<(f64, f64), ProjectionError> {
    CrsTransform::new(from, to).transform(x, y)
}

/// UTM zone covering the centre of `bbox`, given in `crs`.
pub fn corresponding_utm(bbox: &BoundingBox, crs: CrsCode) -> Result<CrsCode, ProjectionError> {
    let (cx, cy) = bbox.center();
    let (lon, lat) = transform_point(crs, CrsCode::Epsg4326, cx, cy)?;
    Ok(CrsCode::utm_for_lonlat(lon, lat))
}
