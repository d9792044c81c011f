//! Masked rasters: band data paired with a validity mask and a grid.

use crate::{GridModel, RasterError, RasterResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage type of the band values.
///
/// Values are always held as `f64` in memory; the data type records what
/// the values represent so integer/categorical data is never interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    U8,
    U16,
    U32,
    I16,
    I32,
    F32,
    #[default]
    F64,
}

impl DataType {
    /// Check if values are integers (categorical-safe methods only).
    pub fn is_integer(&self) -> bool {
        !matches!(self, DataType::F32 | DataType::F64)
    }

    /// Fill value used at invalid pixels when the grid declares no nodata.
    pub fn default_nodata(&self) -> f64 {
        if self.is_integer() {
            0.0
        } else {
            f64::NAN
        }
    }

    /// Value range of an integer type, `None` for floats.
    fn integer_range(&self) -> Option<(f64, f64)> {
        match self {
            DataType::U8 => Some((0.0, u8::MAX as f64)),
            DataType::U16 => Some((0.0, u16::MAX as f64)),
            DataType::U32 => Some((0.0, u32::MAX as f64)),
            DataType::I16 => Some((i16::MIN as f64, i16::MAX as f64)),
            DataType::I32 => Some((i32::MIN as f64, i32::MAX as f64)),
            DataType::F32 | DataType::F64 => None,
        }
    }

    /// Smallest type representing every value of both `self` and `other`.
    ///
    /// Integers widen to the smallest integer type covering both ranges.
    /// Any float makes the result a float: `F32` when both types fit in
    /// an `f32` exactly, else `F64`.
    pub fn promote(self, other: DataType) -> DataType {
        if self == other {
            return self;
        }
        match (self.integer_range(), other.integer_range()) {
            (Some((a_min, a_max)), Some((b_min, b_max))) => {
                let (lo, hi) = (a_min.min(b_min), a_max.max(b_max));
                [DataType::U8, DataType::U16, DataType::I16, DataType::U32, DataType::I32]
                    .into_iter()
                    .find(|t| {
                        t.integer_range()
                            .is_some_and(|(min, max)| min <= lo && hi <= max)
                    })
                    .unwrap_or(DataType::F64)
            }
            _ => {
                let fits_f32 =
                    |t: DataType| matches!(t, DataType::U8 | DataType::U16 | DataType::I16 | DataType::F32);
                if fits_f32(self) && fits_f32(other) {
                    DataType::F32
                } else {
                    DataType::F64
                }
            }
        }
    }

    /// Smallest unsigned integer type holding `bits` flag bits.
    pub fn for_flag_bits(bits: u32) -> Option<DataType> {
        match bits {
            0..=8 => Some(DataType::U8),
            9..=16 => Some(DataType::U16),
            17..=32 => Some(DataType::U32),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::U8 => "u8",
            DataType::U16 => "u16",
            DataType::U32 => "u32",
            DataType::I16 => "i16",
            DataType::I32 => "i32",
            DataType::F32 => "f32",
            DataType::F64 => "f64",
        };
        write!(f, "{}", name)
    }
}

/// A stack of same-shaped bands with a shared validity mask.
///
/// Bands are stored row-major, top row first. `mask[i] == true` marks pixel
/// `i` as invalid in every band; values at masked positions carry no meaning.
///
/// Operations never mutate a raster in place: every pipeline step returns a
/// new `MaskedRaster`.
#[derive(Debug, Clone)]
pub struct MaskedRaster {
    bands: Vec<Vec<f64>>,
    mask: Vec<bool>,
    grid: GridModel,
    dtype: DataType,
}

impl MaskedRaster {
    /// Create a raster, checking every band and the mask against the grid shape.
    pub fn new(
        bands: Vec<Vec<f64>>,
        mask: Vec<bool>,
        grid: GridModel,
        dtype: DataType,
    ) -> RasterResult<Self> {
        grid.validate()?;
        let expected = grid.len();
        if bands.is_empty() {
            return Err(RasterError::shape_mismatch("raster must have at least one band"));
        }
        for (i, band) in bands.iter().enumerate() {
            if band.len() != expected {
                return Err(RasterError::shape_mismatch(format!(
                    "band {} has {} values, grid {}x{} needs {}",
                    i,
                    band.len(),
                    grid.width,
                    grid.height,
                    expected
                )));
            }
        }
        if mask.len() != expected {
            return Err(RasterError::shape_mismatch(format!(
                "mask has {} values, grid needs {}",
                mask.len(),
                expected
            )));
        }
        Ok(Self {
            bands,
            mask,
            grid,
            dtype,
        })
    }

    /// Single band raster without masked pixels.
    pub fn from_band(band: Vec<f64>, grid: GridModel, dtype: DataType) -> RasterResult<Self> {
        let mask = vec![false; band.len()];
        Self::new(vec![band], mask, grid, dtype)
    }

    /// Derive the mask from the grid's nodata sentinel.
    ///
    /// A pixel is invalid when any band holds the nodata value (or NaN).
    pub fn from_nodata(bands: Vec<Vec<f64>>, grid: GridModel, dtype: DataType) -> RasterResult<Self> {
        let len = grid.len();
        let nodata = grid.nodata;
        let mask = (0..len)
            .map(|i| {
                bands.iter().any(|band| {
                    band.get(i).is_some_and(|&v| {
                        v.is_nan() || nodata.is_some_and(|nd| v == nd)
                    })
                })
            })
            .collect();
        Self::new(bands, mask, grid, dtype)
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn bands(&self) -> &[Vec<f64>] {
        &self.bands
    }

    pub fn width(&self) -> usize {
        self.grid.width
    }

    pub fn height(&self) -> usize {
        self.grid.height
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Borrow a band by index.
    pub fn band(&self, index: usize) -> RasterResult<&[f64]> {
        self.bands
            .get(index)
            .map(|b| b.as_slice())
            .ok_or(RasterError::InvalidBand {
                index,
                count: self.bands.len(),
            })
    }

    /// Check if a flat pixel index holds valid data.
    #[inline]
    pub fn is_valid(&self, index: usize) -> bool {
        !self.mask[index]
    }

    /// Value at (band, row, col), `None` when masked or out of range.
    pub fn value(&self, band: usize, row: usize, col: usize) -> Option<f64> {
        if row >= self.grid.height || col >= self.grid.width {
            return None;
        }
        let idx = self.grid.flat_index(row, col);
        if self.mask[idx] {
            return None;
        }
        self.bands.get(band).map(|b| b[idx])
    }

    /// Number of valid pixels.
    pub fn valid_count(&self) -> usize {
        self.mask.iter().filter(|m| !**m).count()
    }

    /// Value written at invalid pixels.
    pub fn fill_value(&self) -> f64 {
        self.grid.nodata.unwrap_or_else(|| self.dtype.default_nodata())
    }

    /// Copy of a band with masked positions replaced by the fill value.
    pub fn filled_band(&self, index: usize) -> RasterResult<Vec<f64>> {
        let fill = self.fill_value();
        Ok(self
            .band(index)?
            .iter()
            .zip(&self.mask)
            .map(|(&v, &masked)| if masked { fill } else { v })
            .collect())
    }

    /// New raster holding only the selected bands, in the given order.
    pub fn select_bands(&self, indices: &[usize]) -> RasterResult<MaskedRaster> {
        let bands = indices
            .iter()
            .map(|&i| self.band(i).map(|b| b.to_vec()))
            .collect::<RasterResult<Vec<_>>>()?;
        MaskedRaster::new(bands, self.mask.clone(), self.grid.clone(), self.dtype)
    }

    /// Decompose into (bands, mask, grid, dtype).
    pub fn into_parts(self) -> (Vec<Vec<f64>>, Vec<bool>, GridModel, DataType) {
        (self.bands, self.mask, self.grid, self.dtype)
    }
}

/// Rasters are equal when grid, data type, mask and every valid value match.
/// Values under the mask are not compared.
impl PartialEq for MaskedRaster {
    fn eq(&self, other: &Self) -> bool {
        self.grid == other.grid
            && self.dtype == other.dtype
            && self.mask == other.mask
            && self.bands.len() == other.bands.len()
            && self.bands.iter().zip(&other.bands).all(|(a, b)| {
                a.iter()
                    .zip(b)
                    .zip(&self.mask)
                    .all(|((x, y), &masked)| masked || x == y)
            })
    }
}
