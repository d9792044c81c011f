//! Mosaicking of several rasters onto one grid.

use crate::resample::{collocate, ResamplingMethod};
use projection::CrsTransform;
use raster_common::{BoundingBox, CrsCode, DataType, GridModel, MaskedRaster, RasterError, RasterResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Points sampled along each bounds edge when reprojecting extents.
const BOUNDS_DENSIFY: usize = 21;

/// How overlapping valid pixels are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// First input (in order) with a valid value wins
    #[default]
    #[serde(alias = "first")]
    FirstValid,
    Min,
    Max,
    Mean,
}

impl MergeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstValid => "first-valid",
            Self::Min => "min",
            Self::Max => "max",
            Self::Mean => "mean",
        }
    }
}

impl FromStr for MergeStrategy {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" | "first-valid" | "first_valid" => Ok(Self::FirstValid),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "mean" => Ok(Self::Mean),
            other => Err(RasterError::invalid_parameter(
                "strategy",
                format!("unknown merge strategy '{}'", other),
            )),
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options for [`merge_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeOptions {
    pub strategy: MergeStrategy,
    /// Output CRS. Required when the inputs do not share one.
    pub crs: Option<CrsCode>,
    /// Method used to collocate every input onto the union grid
    pub method: ResamplingMethod,
}

/// Merge rasters with default options and the given strategy.
pub fn merge(rasters: &[MaskedRaster], strategy: MergeStrategy) -> RasterResult<MaskedRaster> {
    merge_with(
        rasters,
        &MergeOptions {
            strategy,
            ..Default::default()
        },
    )
}

/// Merge rasters onto the union of their extents at the finest resolution.
///
/// A pixel of the result is valid when at least one input has a valid
/// value there. The output nodata is the first input's. The output data
/// type is the promotion of every input type, and `Mean` over integers
/// gives `F64`.
pub fn merge_with(rasters: &[MaskedRaster], options: &MergeOptions) -> RasterResult<MaskedRaster> {
    let first = rasters.first().ok_or_else(|| {
        RasterError::invalid_parameter("rasters", "at least one raster is required")
    })?;
    let band_count = first.band_count();
    if let Some((i, r)) = rasters
        .iter()
        .enumerate()
        .find(|(_, r)| r.band_count() != band_count)
    {
        return Err(RasterError::shape_mismatch(format!(
            "raster {} has {} band(s), raster 0 has {}",
            i,
            r.band_count(),
            band_count
        )));
    }

    let crs = match options.crs {
        Some(crs) => Some(crs),
        None => common_crs(rasters)?,
    };
    let grid = union_grid(rasters, crs)?.with_nodata(first.grid().nodata);

    let collocated = rasters
        .iter()
        .map(|r| collocate(r, &grid, options.method))
        .collect::<RasterResult<Vec<_>>>()?;

    let dtype = rasters
        .iter()
        .map(|r| r.dtype())
        .fold(first.dtype(), DataType::promote);
    let dtype = match (options.strategy, dtype) {
        (MergeStrategy::Mean, dtype) if dtype.is_integer() => DataType::F64,
        (_, dtype) => dtype,
    };
    let fill = grid.nodata.unwrap_or_else(|| dtype.default_nodata());

    let len = grid.len();
    let mask: Vec<bool> = (0..len)
        .map(|idx| collocated.iter().all(|r| !r.is_valid(idx)))
        .collect();

    let bands = (0..band_count)
        .map(|b| {
            (0..len)
                .map(|idx| {
                    if mask[idx] {
                        return fill;
                    }
                    let mut valid = collocated
                        .iter()
                        .filter(|r| r.is_valid(idx))
                        .map(|r| r.bands()[b][idx]);
                    combine(options.strategy, &mut valid).unwrap_or(fill)
                })
                .collect()
        })
        .collect();

    debug!(
        inputs = rasters.len(),
        strategy = %options.strategy,
        crs = ?grid.crs,
        width = grid.width,
        height = grid.height,
        "Merged rasters"
    );

    MaskedRaster::new(bands, mask, grid, dtype)
}

fn combine(strategy: MergeStrategy, values: &mut dyn Iterator<Item = f64>) -> Option<f64> {
    match strategy {
        MergeStrategy::FirstValid => values.next(),
        MergeStrategy::Min => values.reduce(f64::min),
        MergeStrategy::Max => values.reduce(f64::max),
        MergeStrategy::Mean => {
            let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
            (count > 0).then(|| sum / count as f64)
        }
    }
}

/// CRS shared by every input that declares one.
fn common_crs(rasters: &[MaskedRaster]) -> RasterResult<Option<CrsCode>> {
    let mut known = rasters.iter().filter_map(|r| r.grid().crs);
    let Some(first) = known.next() else {
        return Ok(None);
    };
    for other in known {
        if !first.is_equivalent(&other) {
            return Err(RasterError::incompatible_crs(format!(
                "inputs use {} and {}; pass an explicit target CRS",
                first, other
            )));
        }
    }
    Ok(Some(first))
}

/// Grid covering every input at the finest input resolution.
fn union_grid(rasters: &[MaskedRaster], crs: Option<CrsCode>) -> RasterResult<GridModel> {
    let mut bounds: Option<BoundingBox> = None;
    let mut x_res = f64::INFINITY;
    let mut y_res = f64::INFINITY;

    for raster in rasters {
        let grid = raster.grid();
        let native = grid.bounds();
        let (extent, res) = match (grid.crs, crs) {
            (Some(from), Some(to)) if !from.is_equivalent(&to) => {
                let projected = CrsTransform::new(from, to).transform_bounds(&native, BOUNDS_DENSIFY)?;
                let res = (
                    projected.width() / grid.width as f64,
                    projected.height() / grid.height as f64,
                );
                (projected, res)
            }
            _ => (native, grid.resolution()),
        };
        x_res = x_res.min(res.0);
        y_res = y_res.min(res.1);
        bounds = Some(match bounds {
            Some(b) => b.union(&extent),
            None => extent,
        });
    }

    let bounds = bounds.ok_or_else(|| RasterError::invalid_grid("no input extent"))?;
    GridModel::from_bounds(&bounds, x_res, y_res, crs)
}
