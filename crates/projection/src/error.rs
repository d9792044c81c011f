//! Projection error types.

use raster_common::{CrsCode, RasterError};
use thiserror::Error;

/// Errors raised while moving coordinates between reference systems.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("point ({x}, {y}) is outside the domain of {crs}")]
    OutOfDomain { crs: CrsCode, x: f64, y: f64 },

    #[error("neither source nor target CRS is known")]
    Unresolved,

    #[error("bounds could not be transformed from {from} to {to}: no corner or edge point is valid")]
    EmptyBounds { from: CrsCode, to: CrsCode },
}

impl From<ProjectionError> for RasterError {
    fn from(err: ProjectionError) -> Self {
        RasterError::Crs(err.to_string())
    }
}
