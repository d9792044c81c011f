//! Tests for collocation onto target grids.

use projection::transform_point;
use raster_common::{Affine, CrsCode, DataType, GridModel, RasterError};
use raster_pipeline::{collocate, collocate_with, MaskedRaster, ResamplingMethod};
use test_utils::{
    assert_approx_eq, assert_grid_equal, create_smooth_band, geographic_grid, masked_raster,
    single_band_raster, utm_grid, web_mercator_grid,
};

const ALL_METHODS: [ResamplingMethod; 4] = [
    ResamplingMethod::Nearest,
    ResamplingMethod::Bilinear,
    ResamplingMethod::Cubic,
    ResamplingMethod::Mode,
];

/// Geographic source over 7..8E, 48..49N whose values are the longitude of
/// each pixel centre.
fn longitude_raster() -> MaskedRaster {
    let grid = geographic_grid(7.0, 49.0, 0.01, 100, 100);
    let values = (0..100 * 100)
        .map(|i| 7.0 + ((i % 100) as f64 + 0.5) * 0.01)
        .collect();
    single_band_raster(values, grid, DataType::F64)
}

// ============================================================================
// Output grid tests
// ============================================================================

#[test]
fn test_output_grid_is_target() {
    let source = longitude_raster();
    let target = utm_grid(10, 10).with_nodata(Some(-1.0));
    for method in ALL_METHODS {
        let out = collocate(&source, &target, method).unwrap();
        assert_grid_equal(out.grid(), &target, 0.0);
        assert_eq!(out.grid().nodata, Some(-1.0));
        assert_eq!(out.dtype(), DataType::F64);
    }
}

#[test]
fn test_collocate_with_reference() {
    let source = longitude_raster();
    let reference = single_band_raster(vec![0.0; 16], utm_grid(4, 4), DataType::U8);
    let out = collocate_with(&source, &reference, ResamplingMethod::Nearest).unwrap();
    assert_eq!(out.grid(), reference.grid());
}

// ============================================================================
// Reprojection tests
// ============================================================================

#[test]
fn test_geographic_to_utm_bilinear() {
    let source = longitude_raster();
    let target = utm_grid(10, 10);
    let out = collocate(&source, &target, ResamplingMethod::Bilinear).unwrap();

    assert_eq!(out.valid_count(), 100);
    let utm = CrsCode::Utm {
        zone: 32,
        north: true,
    };
    for row in 0..10 {
        for col in 0..10 {
            let (x, y) = target.xy(row, col);
            let (lon, _) = transform_point(utm, CrsCode::Epsg4326, x, y).unwrap();
            assert_approx_eq!(out.value(0, row, col).unwrap(), lon, 1e-6);
        }
    }
}

#[test]
fn test_geographic_to_utm_nearest_keeps_source_values() {
    let source = longitude_raster();
    let out = collocate(&source, &utm_grid(10, 10), ResamplingMethod::Nearest).unwrap();
    for &v in out.band(0).unwrap() {
        assert!(source.band(0).unwrap().contains(&v), "{} is not a source value", v);
    }
}

#[test]
fn test_outside_source_is_masked() {
    // The UTM grid lies far from a source over the equator.
    let source = single_band_raster(vec![1.0; 4], geographic_grid(0.0, 1.0, 0.5, 2, 2), DataType::F32);
    let out = collocate(&source, &utm_grid(3, 3), ResamplingMethod::Nearest).unwrap();
    assert_eq!(out.valid_count(), 0);
}

// ============================================================================
// Same CRS tests
// ============================================================================

#[test]
fn test_partial_overlap_fill_values() {
    let source = masked_raster(
        (0..16).map(|v| v as f64).collect(),
        vec![false; 16],
        web_mercator_grid(0.0, 4.0, 1.0, 4, 4),
        DataType::F32,
    );
    // Shifted two columns east: the right half has no source data.
    let target = web_mercator_grid(2.0, 4.0, 1.0, 4, 4).with_nodata(Some(-9999.0));
    let out = collocate(&source, &target, ResamplingMethod::Nearest).unwrap();

    assert_eq!(out.value(0, 0, 0), Some(2.0));
    assert_eq!(out.value(0, 3, 1), Some(15.0));
    for row in 0..4 {
        for col in 2..4 {
            let idx = row * 4 + col;
            assert!(!out.is_valid(idx));
            assert_eq!(out.bands()[0][idx], -9999.0);
        }
    }
}

#[test]
fn test_disjoint_extents_fully_masked() {
    let source = single_band_raster(
        vec![1.0, 2.0, 3.0, 4.0],
        web_mercator_grid(0.0, 2.0, 1.0, 2, 2),
        DataType::F32,
    );
    // Touching the source's east edge without overlapping it
    let target = web_mercator_grid(2.0, 2.0, 0.5, 4, 4).with_nodata(Some(-1.0));
    for method in ALL_METHODS {
        let out = collocate(&source, &target, method).unwrap();
        assert_grid_equal(out.grid(), &target, 1e-12);
        assert_eq!(out.valid_count(), 0, "method {}", method);
        assert_eq!(out.bands()[0], vec![-1.0; 16]);
        assert_eq!(out.band_count(), 1);
    }
}

#[test]
fn test_fill_falls_back_to_source_nodata_then_dtype() {
    let source_grid = web_mercator_grid(0.0, 2.0, 1.0, 2, 2);
    let target = web_mercator_grid(10.0, 2.0, 1.0, 2, 2);

    let with_nodata = single_band_raster(vec![1.0; 4], source_grid.clone().with_nodata(Some(-5.0)), DataType::F32);
    let out = collocate(&with_nodata, &target, ResamplingMethod::Nearest).unwrap();
    assert!(out.bands()[0].iter().all(|&v| v == -5.0));

    let plain = single_band_raster(vec![1.0; 4], source_grid, DataType::U8);
    let out = collocate(&plain, &target, ResamplingMethod::Nearest).unwrap();
    assert!(out.bands()[0].iter().all(|&v| v == DataType::U8.default_nodata()));
}

#[test]
fn test_nearest_upsampling() {
    let source = single_band_raster(
        vec![1.0, 2.0, 3.0, 4.0],
        web_mercator_grid(0.0, 4.0, 2.0, 2, 2),
        DataType::U8,
    );
    let target = web_mercator_grid(0.0, 4.0, 1.0, 4, 4);
    let out = collocate(&source, &target, ResamplingMethod::Nearest).unwrap();

    #[rustfmt::skip]
    let expected = vec![
        1.0, 1.0, 2.0, 2.0,
        1.0, 1.0, 2.0, 2.0,
        3.0, 3.0, 4.0, 4.0,
        3.0, 3.0, 4.0, 4.0,
    ];
    assert_eq!(out.bands()[0], expected);
}

#[test]
fn test_mode_downsampling() {
    #[rustfmt::skip]
    let values = vec![
        1.0, 1.0, 2.0, 2.0,
        1.0, 3.0, 2.0, 2.0,
        4.0, 4.0, 5.0, 5.0,
        4.0, 4.0, 5.0, 6.0,
    ];
    let source = single_band_raster(values, web_mercator_grid(0.0, 4.0, 1.0, 4, 4), DataType::U8);
    let target = web_mercator_grid(0.0, 4.0, 2.0, 2, 2);
    let out = collocate(&source, &target, ResamplingMethod::Mode).unwrap();
    assert_eq!(out.bands()[0], vec![1.0, 2.0, 4.0, 5.0]);
}

#[test]
fn test_bilinear_downsampling_averages() {
    let values: Vec<f64> = (0..16).map(|v| v as f64).collect();
    let source = single_band_raster(values, web_mercator_grid(0.0, 4.0, 1.0, 4, 4), DataType::F32);
    let target = web_mercator_grid(0.0, 4.0, 2.0, 2, 2);
    let out = collocate(&source, &target, ResamplingMethod::Bilinear).unwrap();

    // Each target centre sits between four source centres.
    let expected = [2.5, 4.5, 10.5, 12.5];
    for (v, e) in out.bands()[0].iter().zip(expected) {
        assert_approx_eq!(*v, e, 1e-12);
    }
}

#[test]
fn test_smooth_methods_preserve_constant_field() {
    let source = single_band_raster(vec![42.0; 64], web_mercator_grid(0.0, 8.0, 1.0, 8, 8), DataType::F32);
    let target = web_mercator_grid(0.3, 7.7, 0.7, 10, 10);
    for method in [ResamplingMethod::Bilinear, ResamplingMethod::Cubic] {
        let out = collocate(&source, &target, method).unwrap();
        for (idx, &v) in out.bands()[0].iter().enumerate() {
            if out.is_valid(idx) {
                assert_approx_eq!(v, 42.0, 1e-9);
            }
        }
    }
}

#[test]
fn test_multi_band_shares_mask() {
    let grid = web_mercator_grid(0.0, 2.0, 1.0, 2, 2);
    let source = MaskedRaster::new(
        vec![vec![1.0, 2.0, 3.0, 4.0], create_smooth_band(2, 2)],
        vec![false, true, false, false],
        grid.clone(),
        DataType::F32,
    )
    .unwrap();
    let out = collocate(&source, &grid, ResamplingMethod::Nearest).unwrap();
    assert_eq!(out.band_count(), 2);
    assert_eq!(out.mask(), source.mask());
    assert_eq!(out, source);
}

// ============================================================================
// Error tests
// ============================================================================

#[test]
fn test_interpolating_integer_data_rejected() {
    let source = single_band_raster(vec![1.0; 4], web_mercator_grid(0.0, 2.0, 1.0, 2, 2), DataType::U8);
    let target = web_mercator_grid(0.0, 2.0, 0.5, 4, 4);
    for method in [ResamplingMethod::Bilinear, ResamplingMethod::Cubic] {
        assert!(matches!(
            collocate(&source, &target, method),
            Err(RasterError::UnsupportedMethod(_))
        ));
    }
    assert!(collocate(&source, &target, ResamplingMethod::Mode).is_ok());
}

#[test]
fn test_invalid_target_grid() {
    let source = longitude_raster();
    let target = GridModel {
        transform: Affine::from_origin(0.0, 0.0, 1.0, 1.0),
        crs: Some(CrsCode::Epsg4326),
        width: 0,
        height: 3,
        nodata: None,
    };
    assert!(matches!(
        collocate(&source, &target, ResamplingMethod::Nearest),
        Err(RasterError::InvalidGrid(_))
    ));
}

#[test]
fn test_missing_crs_on_one_side_assumes_the_other() {
    let grid = web_mercator_grid(0.0, 2.0, 1.0, 2, 2);
    let mut unknown = grid.clone();
    unknown.crs = None;
    let source = single_band_raster(vec![1.0, 2.0, 3.0, 4.0], unknown, DataType::F32);

    let out = collocate(&source, &grid, ResamplingMethod::Nearest).unwrap();
    assert_eq!(out.bands()[0], vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(out.grid().crs, Some(CrsCode::Epsg3857));
}

#[test]
fn test_missing_crs_on_both_sides_fails() {
    let mut grid = web_mercator_grid(0.0, 2.0, 1.0, 2, 2);
    grid.crs = None;
    let source = single_band_raster(vec![1.0; 4], grid.clone(), DataType::F32);
    assert!(matches!(
        collocate(&source, &grid, ResamplingMethod::Nearest),
        Err(RasterError::Crs(_))
    ));
}
