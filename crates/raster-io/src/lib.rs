//! File storage for rasters and polygon features.
//!
//! Rasters are stored as JSON documents (optionally gzip-compressed) holding
//! the grid model, data type, band names and band values, with masked pixels
//! written as `null`. Polygon features are written as GeoJSON.

pub mod format;
pub mod raster;
pub mod vector;

pub use format::RasterFormat;
pub use raster::{read_raster, read_raster_document, write_raster, write_raster_document, RasterDocument};
pub use vector::{read_vector, write_vector, FeatureCollection};
