//! Synthetic band and raster generators.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use raster_common::{DataType, GridModel, MaskedRaster};

/// Creates a test band with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_band;
///
/// let band = create_test_band(10, 5);
/// assert_eq!(band.len(), 50);
/// assert_eq!(band[1], 1000.0);  // col=1, row=0
/// assert_eq!(band[10], 1.0);    // col=0, row=1
/// ```
pub fn create_test_band(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f64);
        }
    }
    data
}

/// Creates a smooth field (sum of sines) in the range 0..100.
pub fn create_smooth_band(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let fx = col as f64 / width.max(1) as f64;
            let fy = row as f64 / height.max(1) as f64;
            let v1 = (fx * std::f64::consts::PI * 4.0).sin() * 20.0;
            let v2 = (fy * std::f64::consts::PI * 4.0).sin() * 20.0;
            data.push(50.0 + v1 + v2);
        }
    }
    data
}

/// Creates a categorical band of square blocks.
///
/// Block `(bx, by)` holds class `(bx + by) % classes`, giving a checkerboard
/// for two classes.
pub fn create_block_band(width: usize, height: usize, block: usize, classes: u32) -> Vec<f64> {
    let block = block.max(1);
    let classes = classes.max(1) as usize;
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(((col / block + row / block) % classes) as f64);
        }
    }
    data
}

/// Creates a categorical band of uniformly random classes `0..classes`.
pub fn create_random_classes(width: usize, height: usize, classes: u32, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..width * height)
        .map(|_| rng.gen_range(0..classes.max(1)) as f64)
        .collect()
}

/// Overwrites a random `fraction` of pixels with random `values`.
pub fn add_salt_noise(band: &mut [f64], fraction: f64, values: &[f64], seed: u64) {
    if values.is_empty() {
        return;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    for v in band.iter_mut() {
        if rng.gen_bool(fraction.clamp(0.0, 1.0)) {
            *v = values[rng.gen_range(0..values.len())];
        }
    }
}

/// Creates a random mask with `fraction` of pixels invalid.
pub fn create_random_mask(len: usize, fraction: f64, seed: u64) -> Vec<bool> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_bool(fraction.clamp(0.0, 1.0))).collect()
}

/// Creates random boolean planes for flag packing tests.
pub fn create_random_planes(count: usize, len: usize, seed: u64) -> Vec<Vec<bool>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (0..len).map(|_| rng.gen::<bool>()).collect())
        .collect()
}

/// Builds a single band raster, panicking on shape errors.
pub fn single_band_raster(band: Vec<f64>, grid: GridModel, dtype: DataType) -> MaskedRaster {
    MaskedRaster::from_band(band, grid, dtype).expect("band matches grid")
}

/// Builds a single band raster with an explicit mask.
pub fn masked_raster(band: Vec<f64>, mask: Vec<bool>, grid: GridModel, dtype: DataType) -> MaskedRaster {
    MaskedRaster::new(vec![band], mask, grid, dtype).expect("band and mask match grid")
}
