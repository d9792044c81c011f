//! Equality checks for regression tests.
//!
//! Rasters compare on grid, data type, mask and valid values only. Vector
//! features compare on value, pixel count and vertex positions.

use geo_types::{LineString, Polygon};
use raster_common::{GridModel, MaskedRaster};
use raster_pipeline::PolygonFeature;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Compare two grids, returning a description of the first difference.
pub fn grids_equal(a: &GridModel, b: &GridModel, tolerance: f64) -> Result<(), String> {
    if (a.width, a.height) != (b.width, b.height) {
        return Err(format!(
            "shape differs: {}x{} vs {}x{}",
            a.width, a.height, b.width, b.height
        ));
    }
    let crs_match = match (a.crs, b.crs) {
        (Some(x), Some(y)) => x.is_equivalent(&y),
        (None, None) => true,
        _ => false,
    };
    if !crs_match {
        return Err(format!("crs differs: {:?} vs {:?}", a.crs, b.crs));
    }
    let ta = a.transform.to_gdal();
    let tb = b.transform.to_gdal();
    if ta.iter().zip(tb.iter()).any(|(x, y)| (x - y).abs() > tolerance) {
        return Err(format!("transform differs: {:?} vs {:?}", ta, tb));
    }
    Ok(())
}

/// Compare two rasters, returning a description of the first difference.
///
/// Values under the mask are ignored. NaN equals NaN.
pub fn rasters_equal(a: &MaskedRaster, b: &MaskedRaster, tolerance: f64) -> Result<(), String> {
    grids_equal(a.grid(), b.grid(), tolerance)?;
    if a.dtype() != b.dtype() {
        return Err(format!("dtype differs: {} vs {}", a.dtype(), b.dtype()));
    }
    if a.band_count() != b.band_count() {
        return Err(format!(
            "band count differs: {} vs {}",
            a.band_count(),
            b.band_count()
        ));
    }
    if let Some(idx) = (0..a.mask().len()).find(|&i| a.mask()[i] != b.mask()[i]) {
        return Err(format!(
            "mask differs at pixel {}: {} vs {}",
            idx,
            a.mask()[idx],
            b.mask()[idx]
        ));
    }
    for (band, (ba, bb)) in a.bands().iter().zip(b.bands()).enumerate() {
        for idx in 0..ba.len() {
            if !a.is_valid(idx) {
                continue;
            }
            let (va, vb) = (ba[idx], bb[idx]);
            let same = (va.is_nan() && vb.is_nan()) || (va - vb).abs() <= tolerance;
            if !same {
                return Err(format!(
                    "band {} differs at pixel {}: {} vs {}",
                    band, idx, va, vb
                ));
            }
        }
    }
    Ok(())
}

/// Assert two grids are equal within `tolerance`.
pub fn assert_grid_equal(a: &GridModel, b: &GridModel, tolerance: f64) {
    if let Err(msg) = grids_equal(a, b, tolerance) {
        panic!("grids differ: {}", msg);
    }
}

/// Assert two rasters are equal within `tolerance`.
pub fn assert_raster_equal(a: &MaskedRaster, b: &MaskedRaster, tolerance: f64) {
    if let Err(msg) = rasters_equal(a, b, tolerance) {
        panic!("rasters differ: {}", msg);
    }
}

fn rings_equal(a: &LineString<f64>, b: &LineString<f64>, tolerance: f64) -> bool {
    a.0.len() == b.0.len()
        && a.0.iter().zip(&b.0).all(|(p, q)| {
            (p.x - q.x).abs() <= tolerance && (p.y - q.y).abs() <= tolerance
        })
}

fn polygons_equal(a: &Polygon<f64>, b: &Polygon<f64>, tolerance: f64) -> bool {
    rings_equal(a.exterior(), b.exterior(), tolerance)
        && a.interiors().len() == b.interiors().len()
        && a.interiors()
            .iter()
            .zip(b.interiors())
            .all(|(p, q)| rings_equal(p, q, tolerance))
}

/// Compare two feature lists in order.
pub fn features_equal(
    a: &[PolygonFeature],
    b: &[PolygonFeature],
    tolerance: f64,
) -> Result<(), String> {
    if a.len() != b.len() {
        return Err(format!("feature count differs: {} vs {}", a.len(), b.len()));
    }
    for (i, (fa, fb)) in a.iter().zip(b).enumerate() {
        if fa.value != fb.value {
            return Err(format!("feature {} value differs: {} vs {}", i, fa.value, fb.value));
        }
        if fa.pixel_count != fb.pixel_count {
            return Err(format!(
                "feature {} pixel count differs: {} vs {}",
                i, fa.pixel_count, fb.pixel_count
            ));
        }
        if !polygons_equal(&fa.geometry, &fb.geometry, tolerance) {
            return Err(format!("feature {} geometry differs", i));
        }
    }
    Ok(())
}

/// Assert two feature lists are equal within `tolerance`.
pub fn assert_features_equal(a: &[PolygonFeature], b: &[PolygonFeature], tolerance: f64) {
    if let Err(msg) = features_equal(a, b, tolerance) {
        panic!("features differ: {}", msg);
    }
}

fn relative_files(root: &Path) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| e.to_string())?;
        if entry.file_type().is_file() {
            let rel = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| e.to_string())?;
            files.push(rel.to_path_buf());
        }
    }
    Ok(files)
}

/// Compare two directory trees: same relative file list, same bytes.
pub fn dirs_equal(a: &Path, b: &Path) -> Result<(), String> {
    let files_a = relative_files(a)?;
    let files_b = relative_files(b)?;
    if files_a != files_b {
        return Err(format!("file lists differ: {:?} vs {:?}", files_a, files_b));
    }
    for rel in &files_a {
        let bytes_a = fs::read(a.join(rel)).map_err(|e| e.to_string())?;
        let bytes_b = fs::read(b.join(rel)).map_err(|e| e.to_string())?;
        if bytes_a != bytes_b {
            return Err(format!("{} differs", rel.display()));
        }
    }
    Ok(())
}

/// Assert two directory trees hold identical files.
pub fn assert_dir_equal(a: &Path, b: &Path) {
    if let Err(msg) = dirs_equal(a, b) {
        panic!("directories differ: {}", msg);
    }
}
