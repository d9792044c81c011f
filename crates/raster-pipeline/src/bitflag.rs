//! Bit-plane flag packing.
//!
//! Boolean planes are packed into one unsigned integer per pixel, flag `i`
//! in bit `i` (least significant first).

use num_traits::PrimInt;
use raster_common::{DataType, GridModel, MaskedRaster, RasterError, RasterResult};
use tracing::debug;

/// A named boolean plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagPlane {
    pub name: String,
    pub data: Vec<bool>,
}

impl FlagPlane {
    pub fn new(name: impl Into<String>, data: Vec<bool>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Number of bits in `T`.
#[inline]
pub fn bit_width<T: PrimInt>() -> u32 {
    T::zero().count_zeros()
}

fn check_flag_count<T: PrimInt>(count: usize) -> RasterResult<()> {
    let bits = bit_width::<T>();
    if count > bits as usize {
        return Err(RasterError::TooManyFlags { count, bits });
    }
    Ok(())
}

/// Pack boolean planes into integers.
///
/// All planes must have the same length. Zero planes pack to an empty array.
pub fn pack<T: PrimInt>(flags: &[Vec<bool>]) -> RasterResult<Vec<T>> {
    check_flag_count::<T>(flags.len())?;
    let Some(first) = flags.first() else {
        return Ok(Vec::new());
    };
    let len = first.len();
    if let Some((i, plane)) = flags.iter().enumerate().find(|(_, p)| p.len() != len) {
        return Err(RasterError::shape_mismatch(format!(
            "flag plane {} has {} values, plane 0 has {}",
            i,
            plane.len(),
            len
        )));
    }

    let packed = (0..len)
        .map(|px| {
            flags
                .iter()
                .enumerate()
                .filter(|(_, plane)| plane[px])
                .fold(T::zero(), |acc, (bit, _)| acc | (T::one() << bit))
        })
        .collect();

    debug!(flags = flags.len(), pixels = len, bits = bit_width::<T>(), "Packed flag planes");
    Ok(packed)
}

/// Unpack the first `flag_count` bits of every value into planes.
pub fn unpack<T: PrimInt>(packed: &[T], flag_count: usize) -> RasterResult<Vec<Vec<bool>>> {
    check_flag_count::<T>(flag_count)?;
    Ok((0..flag_count)
        .map(|bit| packed.iter().map(|&v| is_set(v, bit)).collect())
        .collect())
}

#[inline]
fn is_set<T: PrimInt>(value: T, bit: usize) -> bool {
    (value >> bit) & T::one() == T::one()
}

/// One bit of every value.
pub fn read_bit<T: PrimInt>(packed: &[T], bit: u32) -> RasterResult<Vec<bool>> {
    let bits = bit_width::<T>();
    if bit >= bits {
        return Err(RasterError::invalid_parameter(
            "bit",
            format!("bit {} does not exist in a {}-bit integer", bit, bits),
        ));
    }
    Ok(packed.iter().map(|&v| is_set(v, bit as usize)).collect())
}

/// Several bits of every value, one plane per requested bit.
pub fn read_bits<T: PrimInt>(packed: &[T], bits: &[u32]) -> RasterResult<Vec<Vec<bool>>> {
    bits.iter().map(|&bit| read_bit(packed, bit)).collect()
}

/// Pack named planes. Plane order gives the bit order.
pub fn pack_named<T: PrimInt>(planes: &[FlagPlane]) -> RasterResult<(Vec<T>, Vec<String>)> {
    let data: Vec<Vec<bool>> = planes.iter().map(|p| p.data.clone()).collect();
    let packed = pack(&data)?;
    Ok((packed, planes.iter().map(|p| p.name.clone()).collect()))
}

/// Unpack one plane per name, bit `i` for `names[i]`.
pub fn unpack_named<T: PrimInt>(packed: &[T], names: &[String]) -> RasterResult<Vec<FlagPlane>> {
    let planes = unpack(packed, names.len())?;
    Ok(names
        .iter()
        .zip(planes)
        .map(|(name, data)| FlagPlane::new(name.clone(), data))
        .collect())
}

/// Single-band raster holding the packed planes.
///
/// The data type is the smallest unsigned integer type with room for every
/// plane. No pixel is masked.
pub fn flags_to_raster(planes: &[FlagPlane], grid: GridModel) -> RasterResult<MaskedRaster> {
    let dtype = DataType::for_flag_bits(planes.len() as u32).ok_or(RasterError::TooManyFlags {
        count: planes.len(),
        bits: 32,
    })?;
    let (packed, _) = pack_named::<u32>(planes)?;
    let band: Vec<f64> = if packed.is_empty() {
        vec![0.0; grid.len()]
    } else {
        packed.into_iter().map(f64::from).collect()
    };
    MaskedRaster::from_band(band, grid, dtype)
}

/// Unpack a flag raster band into named planes.
///
/// Masked pixels unpack to `false` in every plane.
pub fn raster_to_flags(
    raster: &MaskedRaster,
    band_index: usize,
    names: &[String],
) -> RasterResult<Vec<FlagPlane>> {
    if !raster.dtype().is_integer() {
        return Err(RasterError::invalid_parameter(
            "dtype",
            format!("flag bands must hold integers, got {}", raster.dtype()),
        ));
    }
    let band = raster.band(band_index)?;
    let packed: Vec<u64> = band
        .iter()
        .zip(raster.mask())
        .map(|(&v, &masked)| if masked || v < 0.0 { 0 } else { v as u64 })
        .collect();
    unpack_named(&packed, names)
}
