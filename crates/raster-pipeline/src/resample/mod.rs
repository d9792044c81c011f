//! Collocation of a raster onto another pixel grid.
//!
//! Every target pixel centre is carried into the source CRS and then into
//! source pixel space, where the source bands are sampled with the chosen
//! method. The output grid is always exactly the requested target grid.

pub mod interpolation;

pub use interpolation::{
    bilinear_interpolate, cubic_interpolate, mode_interpolate, nearest_interpolate, MaskedBand,
};

use projection::CrsTransform;
use rayon::prelude::*;
use raster_common::{Affine, GridModel, MaskedRaster, RasterError, RasterResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Resampling method for collocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResamplingMethod {
    /// Nearest neighbor (preserves exact values).
    #[default]
    Nearest,
    /// Bilinear interpolation (smooth, slight value changes).
    Bilinear,
    /// Bicubic interpolation (smoothest, more compute).
    #[serde(alias = "bicubic")]
    Cubic,
    /// Most frequent value under the target pixel (categorical data).
    Mode,
}

impl ResamplingMethod {
    /// Check if the method blends values (unsafe for integer data).
    pub fn is_interpolating(&self) -> bool {
        matches!(self, Self::Bilinear | Self::Cubic)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
            Self::Cubic => "cubic",
            Self::Mode => "mode",
        }
    }
}

impl FromStr for ResamplingMethod {
    type Err = RasterError;

    /// Parse from string (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            "cubic" | "bicubic" => Ok(Self::Cubic),
            "mode" => Ok(Self::Mode),
            _ => Err(RasterError::unsupported_method(s)),
        }
    }
}

impl fmt::Display for ResamplingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resample `source` onto `target`, reprojecting when the CRSs differ.
///
/// Output pixels without valid source data are masked and hold
/// `target.nodata`, else the source nodata, else the data type default.
pub fn collocate(
    source: &MaskedRaster,
    target: &GridModel,
    method: ResamplingMethod,
) -> RasterResult<MaskedRaster> {
    target.validate()?;
    if method.is_interpolating() && source.dtype().is_integer() {
        return Err(RasterError::unsupported_method(format!(
            "{} resampling of integer data ({})",
            method,
            source.dtype()
        )));
    }

    let src_grid = source.grid();
    let to_source = CrsTransform::resolve(target.crs, src_grid.crs)?;
    let src_inverse = src_grid
        .transform
        .inverse()
        .ok_or_else(|| RasterError::invalid_grid("source transform is singular"))?;

    let fill = target
        .nodata
        .or(src_grid.nodata)
        .unwrap_or_else(|| source.dtype().default_nodata());

    let bands: Vec<MaskedBand> = source
        .bands()
        .iter()
        .map(|b| MaskedBand::new(b, source.mask(), src_grid.width, src_grid.height))
        .collect();
    let sampler = Sampler {
        bands: &bands,
        target,
        to_source: &to_source,
        src_inverse,
        method,
    };

    let band_count = bands.len();
    let width = target.width;
    let mut interleaved = vec![fill; target.len() * band_count];
    let mut mask = vec![true; target.len()];

    // Extents are only comparable without reprojection
    let overlap = to_source
        .is_identity()
        .then(|| src_grid.bounds().intersection(&target.bounds()));
    let disjoint = matches!(overlap, Some(None));
    if !disjoint {
        interleaved
            .par_chunks_mut(width * band_count)
            .zip(mask.par_chunks_mut(width))
            .enumerate()
            .for_each(|(row, (values, row_mask))| {
                for col in 0..width {
                    let out = &mut values[col * band_count..(col + 1) * band_count];
                    row_mask[col] = !sampler.sample(row, col, out);
                    if row_mask[col] {
                        out.fill(fill);
                    }
                }
            });
    }

    let mut out_bands: Vec<Vec<f64>> = (0..band_count)
        .map(|_| Vec::with_capacity(target.len()))
        .collect();
    for pixel in interleaved.chunks_exact(band_count) {
        for (band, &v) in out_bands.iter_mut().zip(pixel) {
            band.push(v);
        }
    }

    let valid = mask.iter().filter(|m| !**m).count();
    debug!(
        method = %method,
        source_crs = ?src_grid.crs,
        target_crs = ?target.crs,
        width = target.width,
        height = target.height,
        valid,
        overlap = ?overlap.flatten(),
        "Collocated raster"
    );

    MaskedRaster::new(out_bands, mask, target.clone(), source.dtype())
}

/// Collocate `source` onto the grid of `reference`.
pub fn collocate_with(
    source: &MaskedRaster,
    reference: &MaskedRaster,
    method: ResamplingMethod,
) -> RasterResult<MaskedRaster> {
    collocate(source, reference.grid(), method)
}

/// Round values within rounding noise of an integer, so aligned grids hit
/// pixel centres exactly.
#[inline]
fn snap(v: f64) -> f64 {
    let rounded = v.round();
    if (v - rounded).abs() < 1e-9 {
        rounded
    } else {
        v
    }
}

struct Sampler<'a> {
    bands: &'a [MaskedBand<'a>],
    target: &'a GridModel,
    to_source: &'a CrsTransform,
    src_inverse: Affine,
    method: ResamplingMethod,
}

impl Sampler<'_> {
    /// Source pixel coordinates (centre-based) of a target lattice point.
    fn source_position(&self, col: f64, row: f64) -> Option<(f64, f64)> {
        let (x, y) = self.target.transform.apply(col, row);
        let (sx, sy) = self.to_source.transform_point(x, y)?;
        let (c, r) = self.src_inverse.apply(sx, sy);
        Some((snap(c - 0.5), snap(r - 0.5)))
    }

    /// Fill `out` with one value per band. Returns false when the pixel has
    /// no valid source data.
    fn sample(&self, row: usize, col: usize, out: &mut [f64]) -> bool {
        let Some((x, y)) = self.source_position(col as f64 + 0.5, row as f64 + 0.5) else {
            return false;
        };

        if self.method == ResamplingMethod::Mode {
            if let Some((x_min, x_max, y_min, y_max)) = self.footprint(row, col) {
                return self.fill_from(out, |band| {
                    mode_interpolate(band, x_min, x_max, y_min, y_max)
                });
            }
        }

        self.fill_from(out, |band| match self.method {
            ResamplingMethod::Nearest | ResamplingMethod::Mode => nearest_interpolate(band, x, y),
            ResamplingMethod::Bilinear => bilinear_interpolate(band, x, y),
            ResamplingMethod::Cubic => cubic_interpolate(band, x, y),
        })
    }

    fn fill_from<F>(&self, out: &mut [f64], kernel: F) -> bool
    where
        F: Fn(&MaskedBand) -> Option<f64>,
    {
        for (slot, band) in out.iter_mut().zip(self.bands) {
            match kernel(band) {
                Some(v) => *slot = v,
                None => return false,
            }
        }
        true
    }

    /// Window of the target pixel in source pixel space, when it covers at
    /// least one source pixel centre.
    fn footprint(&self, row: usize, col: usize) -> Option<(f64, f64, f64, f64)> {
        let (c, r) = (col as f64, row as f64);
        let mut corners = [(c, r), (c + 1.0, r), (c + 1.0, r + 1.0), (c, r + 1.0)]
            .into_iter()
            .map(|(cc, rr)| self.source_position(cc, rr));

        let (x0, y0) = corners.next()??;
        let (mut x_min, mut x_max, mut y_min, mut y_max) = (x0, x0, y0, y0);
        for corner in corners {
            let (x, y) = corner?;
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }

        let covers_centre = x_min.ceil() <= x_max.floor() && y_min.ceil() <= y_max.floor();
        covers_centre.then_some((x_min, x_max, y_min, y_max))
    }
}
