//! Error types for raster operations.

use thiserror::Error;

/// Result type alias using RasterError.
pub type RasterResult<T> = Result<T, RasterError>;

/// Primary error type for raster pipeline operations.
///
/// Errors are raised at the point of misuse and propagated unchanged; no
/// operation falls back to a default raster on failure.
#[derive(Debug, Error)]
pub enum RasterError {
    // === Grid / geometry errors ===
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    #[error("CRS error: {0}")]
    Crs(String),

    #[error("incompatible CRS: {0}")]
    IncompatibleCrs(String),

    // === Parameter errors ===
    #[error("unsupported resampling method: {0}")]
    UnsupportedMethod(String),

    #[error("invalid sieve threshold {0}: must be >= 1")]
    InvalidThreshold(usize),

    #[error("too many flags: {count} flags do not fit in a {bits}-bit integer")]
    TooManyFlags { count: usize, bits: u32 },

    #[error("invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Data errors ===
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("band index {index} out of range for raster with {count} band(s)")]
    InvalidBand { index: usize, count: usize },

    // === Storage errors ===
    #[error("storage error: {0}")]
    Storage(String),

    #[error("format error: {0}")]
    Format(String),
}

impl RasterError {
    /// Create an InvalidGrid error.
    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGrid(msg.into())
    }

    /// Create a Crs error.
    pub fn crs(msg: impl Into<String>) -> Self {
        Self::Crs(msg.into())
    }

    /// Create an IncompatibleCrs error.
    pub fn incompatible_crs(msg: impl Into<String>) -> Self {
        Self::IncompatibleCrs(msg.into())
    }

    /// Create an UnsupportedMethod error.
    pub fn unsupported_method(msg: impl Into<String>) -> Self {
        Self::UnsupportedMethod(msg.into())
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Whether the error comes from caller input rather than from storage.
    pub fn is_usage_error(&self) -> bool {
        !matches!(self, RasterError::Storage(_) | RasterError::Format(_))
    }
}

impl From<std::io::Error> for RasterError {
    fn from(err: std::io::Error) -> Self {
        RasterError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for RasterError {
    fn from(err: serde_json::Error) -> Self {
        RasterError::Format(format!("JSON error: {}", err))
    }
}
