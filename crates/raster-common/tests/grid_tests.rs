//! Tests for grid model coordinate math and masked raster construction.

use raster_common::{Affine, BoundingBox, CrsCode, DataType, GridModel, MaskedRaster, RasterError};

fn utm_grid() -> GridModel {
    GridModel::new(
        Affine::from_origin(440_720.0, 3_751_320.0, 60.0, 60.0),
        Some(CrsCode::parse("EPSG:32611").unwrap()),
        20,
        10,
    )
    .unwrap()
}

// ============================================================================
// GridModel tests
// ============================================================================

#[test]
fn test_grid_len_and_shape() {
    let grid = utm_grid();
    assert_eq!(grid.len(), 200);
    assert_eq!(grid.shape(), (10, 20));
    assert!(!grid.is_empty());
}

#[test]
fn test_grid_resolution() {
    let grid = utm_grid();
    assert_eq!(grid.resolution(), (60.0, 60.0));
}

#[test]
fn test_grid_bounds() {
    let grid = utm_grid();
    let bounds = grid.bounds();
    assert_eq!(bounds.min_x, 440_720.0);
    assert_eq!(bounds.max_x, 440_720.0 + 20.0 * 60.0);
    assert_eq!(bounds.max_y, 3_751_320.0);
    assert_eq!(bounds.min_y, 3_751_320.0 - 10.0 * 60.0);
}

#[test]
fn test_grid_pixel_center_roundtrip() {
    let grid = utm_grid();
    for row in 0..grid.height {
        for col in 0..grid.width {
            let (x, y) = grid.xy(row, col);
            assert_eq!(grid.index(x, y), Some((row, col)));
        }
    }
}

#[test]
fn test_rotated_grid_bounds_cover_all_corners() {
    let transform = Affine::new(1.0, 0.5, 0.0, 0.5, -1.0, 10.0);
    let grid = GridModel::new(transform, None, 4, 4).unwrap();
    let bounds = grid.bounds();
    for (col, row) in [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)] {
        let (x, y) = transform.apply(col, row);
        assert!(bounds.contains_point(x, y));
    }
    assert!(!transform.is_rectilinear());
}

#[test]
fn test_translated_transform() {
    let t = Affine::from_origin(0.0, 100.0, 10.0, 10.0);
    let shifted = t.translated(2.0, 3.0);
    assert_eq!(shifted.c, 20.0);
    assert_eq!(shifted.f, 70.0);
    assert_eq!(shifted.a, t.a);
}

#[test]
fn test_from_bounds_rejects_bad_resolution() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert!(matches!(
        GridModel::from_bounds(&bbox, 0.0, 1.0, None),
        Err(RasterError::InvalidGrid(_))
    ));
    assert!(GridModel::from_bounds(&bbox, -1.0, 1.0, None).is_err());
}

#[test]
fn test_validate_catches_mutated_grid() {
    let mut grid = utm_grid();
    grid.height = 0;
    assert!(grid.validate().is_err());

    let mut grid = utm_grid();
    grid.transform.a = f64::NAN;
    assert!(grid.validate().is_err());
}

// ============================================================================
// MaskedRaster tests
// ============================================================================

#[test]
fn test_value_access() {
    let grid = GridModel::new(Affine::from_origin(0.0, 2.0, 1.0, 1.0), None, 2, 2).unwrap();
    let raster = MaskedRaster::new(
        vec![vec![1.0, 2.0, 3.0, 4.0]],
        vec![false, false, true, false],
        grid,
        DataType::I16,
    )
    .unwrap();

    assert_eq!(raster.value(0, 0, 1), Some(2.0));
    assert_eq!(raster.value(0, 1, 0), None);
    assert_eq!(raster.value(0, 5, 0), None);
    assert_eq!(raster.value(1, 0, 0), None);
    assert_eq!(raster.valid_count(), 3);
}

#[test]
fn test_equality_ignores_masked_values() {
    let grid = GridModel::new(Affine::from_origin(0.0, 1.0, 1.0, 1.0), None, 2, 1).unwrap();
    let a = MaskedRaster::new(vec![vec![1.0, f64::NAN]], vec![false, true], grid.clone(), DataType::F32)
        .unwrap();
    let b = MaskedRaster::new(vec![vec![1.0, 42.0]], vec![false, true], grid.clone(), DataType::F32)
        .unwrap();
    let c = MaskedRaster::new(vec![vec![2.0, 42.0]], vec![false, true], grid, DataType::F32).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}
