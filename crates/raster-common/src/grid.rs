//! Grid model: affine georeferencing of a raster's pixel grid.

use crate::{BoundingBox, CrsCode, RasterError, RasterResult};
use serde::{Deserialize, Serialize};

/// Six-parameter affine transform from pixel (col, row) to world (x, y).
///
/// ```text
/// x = a * col + b * row + c
/// y = d * col + e * row + f
/// ```
///
/// `(c, f)` is the world position of the top-left corner of pixel (0, 0).
/// North-up rasters have `b == d == 0` and a negative `e`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// North-up transform from the top-left corner and positive pixel sizes.
    pub fn from_origin(west: f64, north: f64, x_res: f64, y_res: f64) -> Self {
        Self::new(x_res, 0.0, west, 0.0, -y_res, north)
    }

    /// Build from a GDAL geotransform `[c, a, b, f, d, e]`.
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self::new(gt[1], gt[2], gt[0], gt[4], gt[5], gt[3])
    }

    /// GDAL geotransform ordering `[c, a, b, f, d, e]`.
    pub fn to_gdal(&self) -> [f64; 6] {
        [self.c, self.a, self.b, self.f, self.d, self.e]
    }

    /// Map fractional pixel coordinates to world coordinates.
    #[inline]
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// Inverse transform (world to pixel), `None` when singular.
    pub fn inverse(&self) -> Option<Affine> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let ia = self.e / det;
        let ib = -self.b / det;
        let id = -self.d / det;
        let ie = self.a / det;
        Some(Affine::new(
            ia,
            ib,
            -ia * self.c - ib * self.f,
            id,
            ie,
            -id * self.c - ie * self.f,
        ))
    }

    /// True when the transform has no rotation or shear terms.
    pub fn is_rectilinear(&self) -> bool {
        self.b == 0.0 && self.d == 0.0
    }

    /// Pixel width and height in world units (always positive).
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.a.hypot(self.d), self.b.hypot(self.e))
    }

    /// Same transform with the origin moved by whole pixels.
    pub fn translated(&self, cols: f64, rows: f64) -> Affine {
        let (c, f) = self.apply(cols, rows);
        Affine { c, f, ..*self }
    }
}

/// Spatial footprint of a raster: transform, CRS, shape and nodata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridModel {
    /// Pixel to world transform
    pub transform: Affine,
    /// Coordinate reference system, `None` when unknown
    pub crs: Option<CrsCode>,
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
    /// Nodata sentinel written at invalid pixels
    #[serde(default, with = "crate::nonfinite::option")]
    pub nodata: Option<f64>,
}

impl GridModel {
    /// Create a validated grid model.
    pub fn new(
        transform: Affine,
        crs: Option<CrsCode>,
        width: usize,
        height: usize,
    ) -> RasterResult<Self> {
        let grid = Self {
            transform,
            crs,
            width,
            height,
            nodata: None,
        };
        grid.validate()?;
        Ok(grid)
    }

    /// North-up grid covering `bounds` at the given resolution.
    ///
    /// The grid is anchored at the top-left corner of `bounds`; width and
    /// height are rounded up so the whole box is covered.
    pub fn from_bounds(
        bounds: &BoundingBox,
        x_res: f64,
        y_res: f64,
        crs: Option<CrsCode>,
    ) -> RasterResult<Self> {
        if !(x_res > 0.0 && y_res > 0.0) {
            return Err(RasterError::invalid_grid(format!(
                "resolution must be positive, got ({}, {})",
                x_res, y_res
            )));
        }
        let width = (bounds.width() / x_res - 1e-9).ceil().max(0.0) as usize;
        let height = (bounds.height() / y_res - 1e-9).ceil().max(0.0) as usize;
        Self::new(
            Affine::from_origin(bounds.min_x, bounds.max_y, x_res, y_res),
            crs,
            width,
            height,
        )
    }

    /// Same grid with a nodata sentinel.
    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    /// Check the grid invariants: positive shape, invertible finite transform.
    pub fn validate(&self) -> RasterResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RasterError::invalid_grid(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        let t = &self.transform;
        if ![t.a, t.b, t.c, t.d, t.e, t.f].iter().all(|v| v.is_finite()) {
            return Err(RasterError::invalid_grid("transform has non-finite terms"));
        }
        if t.inverse().is_none() {
            return Err(RasterError::invalid_grid(
                "transform is singular (zero pixel size)",
            ));
        }
        Ok(())
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Check if grid has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Shape as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Pixel size (x, y) in CRS units.
    pub fn resolution(&self) -> (f64, f64) {
        self.transform.pixel_size()
    }

    /// Flat row-major index of a pixel.
    #[inline]
    pub fn flat_index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// World coordinates of a pixel center.
    pub fn xy(&self, row: usize, col: usize) -> (f64, f64) {
        self.transform.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Pixel (row, col) containing a world coordinate.
    pub fn index(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let inv = self.transform.inverse()?;
        let (col, row) = inv.apply(x, y);
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col.floor() as usize, row.floor() as usize);
        if col >= self.width || row >= self.height {
            return None;
        }
        Some((row, col))
    }

    /// Bounding box of the full pixel extent (outer pixel edges).
    pub fn bounds(&self) -> BoundingBox {
        let (w, h) = (self.width as f64, self.height as f64);
        let corners = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)]
            .map(|(col, row)| self.transform.apply(col, row));
        BoundingBox::from_points(corners)
            .unwrap_or_else(|| BoundingBox::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN))
    }

    /// True when both grids have the same transform, shape and CRS
    /// (nodata is not compared).
    pub fn same_footprint(&self, other: &GridModel) -> bool {
        self.transform == other.transform
            && self.crs == other.crs
            && self.width == other.width
            && self.height == other.height
    }
}

/// Grids are equal when transform, CRS, shape and nodata match exactly.
/// NaN nodata values compare equal to each other.
impl PartialEq for GridModel {
    fn eq(&self, other: &Self) -> bool {
        let nodata_eq = match (self.nodata, other.nodata) {
            (None, None) => true,
            (Some(a), Some(b)) => a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan()),
            _ => false,
        };
        self.same_footprint(other) && nodata_eq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid() -> GridModel {
        GridModel::new(
            Affine::from_origin(100.0, 50.0, 10.0, 10.0),
            Some(CrsCode::Epsg3857),
            4,
            3,
        )
        .unwrap()
    }

    #[test]
    fn test_affine_inverse() {
        let t = Affine::new(2.0, 0.5, 10.0, 0.25, -3.0, 20.0);
        let inv = t.inverse().unwrap();
        let (x, y) = t.apply(3.5, 7.25);
        let (col, row) = inv.apply(x, y);
        assert!((col - 3.5).abs() < 1e-9);
        assert!((row - 7.25).abs() < 1e-9);
    }

    #[test]
    fn test_singular_affine() {
        let t = Affine::new(0.0, 0.0, 10.0, 0.0, -1.0, 20.0);
        assert!(t.inverse().is_none());
        assert!(GridModel::new(t, None, 2, 2).is_err());
    }

    #[test]
    fn test_gdal_roundtrip() {
        let gt = [440720.0, 60.0, 0.0, 3751320.0, 0.0, -60.0];
        let t = Affine::from_gdal(gt);
        assert_eq!(t.a, 60.0);
        assert_eq!(t.e, -60.0);
        assert_eq!(t.to_gdal(), gt);
    }

    #[test]
    fn test_grid_rejects_empty_shape() {
        let t = Affine::from_origin(0.0, 0.0, 1.0, 1.0);
        assert!(matches!(
            GridModel::new(t, None, 0, 5),
            Err(RasterError::InvalidGrid(_))
        ));
    }

    #[test]
    fn test_grid_bounds_and_index() {
        let grid = sample_grid();
        assert_eq!(grid.bounds(), BoundingBox::new(100.0, 20.0, 140.0, 50.0));

        let (x, y) = grid.xy(0, 0);
        assert_eq!((x, y), (105.0, 45.0));
        assert_eq!(grid.index(x, y), Some((0, 0)));
        assert_eq!(grid.index(139.0, 21.0), Some((2, 3)));
        assert_eq!(grid.index(141.0, 21.0), None);
        assert_eq!(grid.index(99.0, 21.0), None);
    }

    #[test]
    fn test_from_bounds_covers_box() {
        let bbox = BoundingBox::new(0.0, 0.0, 25.0, 10.0);
        let grid = GridModel::from_bounds(&bbox, 10.0, 10.0, None).unwrap();
        assert_eq!(grid.width, 3);
        assert_eq!(grid.height, 1);

        let exact = GridModel::from_bounds(&BoundingBox::new(0.0, 0.0, 30.0, 20.0), 10.0, 10.0, None)
            .unwrap();
        assert_eq!((exact.width, exact.height), (3, 2));
    }

    #[test]
    fn test_grid_equality_with_nan_nodata() {
        let a = sample_grid().with_nodata(Some(f64::NAN));
        let b = sample_grid().with_nodata(Some(f64::NAN));
        assert_eq!(a, b);
        assert_ne!(a, sample_grid().with_nodata(Some(0.0)));
        assert!(a.same_footprint(&sample_grid()));
    }

    #[test]
    fn test_nan_nodata_survives_json() {
        let grid = sample_grid().with_nodata(Some(f64::NAN));
        let json = serde_json::to_value(&grid).unwrap();
        assert_eq!(json["nodata"], "NaN");

        let back: GridModel = serde_json::from_value(json).unwrap();
        assert_eq!(back, grid);

        let mut json = serde_json::to_value(sample_grid()).unwrap();
        json.as_object_mut().unwrap().remove("nodata");
        let back: GridModel = serde_json::from_value(json).unwrap();
        assert_eq!(back.nodata, None);
    }
}
