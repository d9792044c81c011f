//! Tests for raster mosaicking.

use raster_common::{CrsCode, DataType, RasterError};
use raster_pipeline::{merge, merge_with, MaskedRaster, MergeOptions, MergeStrategy};
use test_utils::{
    assert_approx_eq, geographic_grid, masked_raster, single_band_raster, unit_grid,
    web_mercator_grid,
};

/// Two 2x2 rasters overlapping in one column:
///
/// ```text
/// A: 1 2        B:   10 20
///    3 4             30 40
/// ```
fn pair() -> (MaskedRaster, MaskedRaster) {
    let a = single_band_raster(
        vec![1.0, 2.0, 3.0, 4.0],
        web_mercator_grid(0.0, 2.0, 1.0, 2, 2).with_nodata(Some(-1.0)),
        DataType::F32,
    );
    let b = single_band_raster(
        vec![10.0, 20.0, 30.0, 40.0],
        web_mercator_grid(1.0, 2.0, 1.0, 2, 2),
        DataType::F32,
    );
    (a, b)
}

// ============================================================================
// Grid tests
// ============================================================================

#[test]
fn test_union_grid() {
    let (a, b) = pair();
    let out = merge(&[a, b], MergeStrategy::FirstValid).unwrap();
    let grid = out.grid();
    assert_eq!((grid.width, grid.height), (3, 2));
    assert_eq!(grid.bounds().min_x, 0.0);
    assert_eq!(grid.bounds().max_x, 3.0);
    assert_eq!(grid.crs, Some(CrsCode::Epsg3857));
    assert_eq!(grid.nodata, Some(-1.0));
}

#[test]
fn test_finest_resolution_wins() {
    let coarse = single_band_raster(vec![1.0; 4], web_mercator_grid(0.0, 4.0, 2.0, 2, 2), DataType::F32);
    let fine = single_band_raster(vec![2.0; 4], web_mercator_grid(0.0, 4.0, 1.0, 2, 2), DataType::F32);
    let out = merge(&[coarse, fine], MergeStrategy::FirstValid).unwrap();
    assert_eq!(out.grid().resolution(), (1.0, 1.0));
    assert_eq!((out.width(), out.height()), (4, 4));
    assert_eq!(out.valid_count(), 16);
}

// ============================================================================
// Strategy tests
// ============================================================================

#[test]
fn test_strategies_on_overlap() {
    let cases = [
        (MergeStrategy::FirstValid, [1.0, 2.0, 20.0, 3.0, 4.0, 40.0]),
        (MergeStrategy::Min, [1.0, 2.0, 20.0, 3.0, 4.0, 40.0]),
        (MergeStrategy::Max, [1.0, 10.0, 20.0, 3.0, 30.0, 40.0]),
        (MergeStrategy::Mean, [1.0, 6.0, 20.0, 3.0, 17.0, 40.0]),
    ];
    for (strategy, expected) in cases {
        let (a, b) = pair();
        let out = merge(&[a, b], strategy).unwrap();
        for (v, e) in out.bands()[0].iter().zip(expected) {
            assert_approx_eq!(*v, e, 1e-12);
        }
    }
}

#[test]
fn test_order_matters_for_first_valid() {
    let (a, b) = pair();
    let out = merge(&[b, a], MergeStrategy::FirstValid).unwrap();
    assert_eq!(out.bands()[0], vec![1.0, 10.0, 20.0, 3.0, 30.0, 40.0]);
}

#[test]
fn test_mean_promotes_integer_dtype() {
    let grid = unit_grid(2, 1).with_nodata(Some(0.0));
    let mut a_grid = grid.clone();
    a_grid.crs = Some(CrsCode::Epsg3857);
    let mut b_grid = grid;
    b_grid.crs = Some(CrsCode::Epsg3857);

    let a = single_band_raster(vec![1.0, 2.0], a_grid, DataType::U8);
    let b = single_band_raster(vec![2.0, 2.0], b_grid, DataType::U8);

    let out = merge(&[a.clone(), b.clone()], MergeStrategy::Mean).unwrap();
    assert_eq!(out.dtype(), DataType::F64);
    assert_eq!(out.bands()[0], vec![1.5, 2.0]);

    let out = merge(&[a, b], MergeStrategy::Max).unwrap();
    assert_eq!(out.dtype(), DataType::U8);
}

#[test]
fn test_mixed_dtypes_promote() {
    let grid = web_mercator_grid(0.0, 1.0, 1.0, 2, 1);
    let classes = masked_raster(vec![1.0, 0.0], vec![false, true], grid.clone(), DataType::U8);
    let field = single_band_raster(vec![7.0, 2.5], grid.clone(), DataType::F32);

    for inputs in [[classes.clone(), field.clone()], [field.clone(), classes.clone()]] {
        let out = merge(&inputs, MergeStrategy::FirstValid).unwrap();
        assert_eq!(out.dtype(), DataType::F32);
    }
    let out = merge(&[classes.clone(), field], MergeStrategy::FirstValid).unwrap();
    assert_eq!(out.bands()[0], vec![1.0, 2.5]);

    let wide = single_band_raster(vec![3.0, 4.0], grid, DataType::I16);
    let out = merge(&[classes, wide], MergeStrategy::Max).unwrap();
    assert_eq!(out.dtype(), DataType::I16);
    assert_eq!(out.bands()[0], vec![3.0, 4.0]);
}

// ============================================================================
// Validity tests
// ============================================================================

#[test]
fn test_valid_where_any_input_valid() {
    let a = masked_raster(
        vec![1.0, 2.0, 3.0, 4.0],
        vec![true, false, false, false],
        web_mercator_grid(0.0, 2.0, 1.0, 2, 2),
        DataType::F32,
    );
    let b = masked_raster(
        vec![10.0, 20.0, 30.0, 40.0],
        vec![true, false, false, true],
        web_mercator_grid(1.0, 2.0, 1.0, 2, 2),
        DataType::F32,
    );

    let out = merge(&[a, b], MergeStrategy::Max).unwrap();
    // Row 0: only B is masked at the overlap, so A's 2 stands.
    assert_eq!(out.mask(), &[true, false, false, false, false, true]);
    assert_eq!(out.value(0, 0, 1), Some(2.0));
    assert_eq!(out.value(0, 1, 1), Some(30.0));
}

#[test]
fn test_masked_pixels_hold_first_nodata() {
    let a = single_band_raster(vec![1.0], web_mercator_grid(0.0, 1.0, 1.0, 1, 1).with_nodata(Some(-7.0)), DataType::F32);
    let b = single_band_raster(vec![2.0], web_mercator_grid(2.0, 1.0, 1.0, 1, 1).with_nodata(Some(-3.0)), DataType::F32);
    let out = merge(&[a, b], MergeStrategy::FirstValid).unwrap();
    assert_eq!(out.bands()[0], vec![1.0, -7.0, 2.0]);
    assert!(!out.is_valid(1));
}

// ============================================================================
// CRS tests
// ============================================================================

#[test]
fn test_mixed_crs_needs_explicit_target() {
    let geo = single_band_raster(vec![1.0; 4], geographic_grid(0.0, 0.02, 0.01, 2, 2), DataType::F32);
    let merc = single_band_raster(vec![2.0; 4], web_mercator_grid(5000.0, 2000.0, 1000.0, 2, 2), DataType::F32);

    assert!(matches!(
        merge(&[geo.clone(), merc.clone()], MergeStrategy::FirstValid),
        Err(RasterError::IncompatibleCrs(_))
    ));

    let options = MergeOptions {
        crs: Some(CrsCode::Epsg3857),
        ..Default::default()
    };
    let out = merge_with(&[geo, merc], &options).unwrap();
    assert_eq!(out.grid().crs, Some(CrsCode::Epsg3857));
    assert!(out.bands()[0].iter().zip(out.mask()).any(|(&v, &m)| !m && v == 1.0));
    assert!(out.bands()[0].iter().zip(out.mask()).any(|(&v, &m)| !m && v == 2.0));
}

#[test]
fn test_band_count_mismatch() {
    let (a, _) = pair();
    let b = MaskedRaster::new(
        vec![vec![0.0; 4], vec![0.0; 4]],
        vec![false; 4],
        web_mercator_grid(0.0, 2.0, 1.0, 2, 2),
        DataType::F32,
    )
    .unwrap();
    assert!(matches!(
        merge(&[a, b], MergeStrategy::FirstValid),
        Err(RasterError::ShapeMismatch(_))
    ));
}

#[test]
fn test_no_crs_anywhere_fails() {
    let a = single_band_raster(vec![1.0], unit_grid(1, 1), DataType::F32);
    assert!(matches!(
        merge(&[a.clone(), a], MergeStrategy::FirstValid),
        Err(RasterError::Crs(_))
    ));
}
