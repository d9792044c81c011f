//! Common types shared across the raster toolkit crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;
pub mod nonfinite;
pub mod raster;

pub use bbox::BoundingBox;
pub use crs::{CrsCode, CrsParseError};
pub use error::{RasterError, RasterResult};
pub use grid::{Affine, GridModel};
pub use raster::{DataType, MaskedRaster};
