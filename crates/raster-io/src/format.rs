//! Raster file formats.

use raster_common::{RasterError, RasterResult};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// On-disk encoding of a raster document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RasterFormat {
    /// Plain JSON (`.json`)
    #[default]
    Json,
    /// Gzip-compressed JSON (`.json.gz`)
    JsonGz,
}

impl RasterFormat {
    /// Detect the format from a file name.
    pub fn from_path(path: &Path) -> RasterResult<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_lowercase())
            .unwrap_or_default();

        if name.ends_with(".json.gz") {
            Ok(Self::JsonGz)
        } else if name.ends_with(".json") {
            Ok(Self::Json)
        } else {
            Err(RasterError::Format(format!(
                "cannot detect raster format of '{}' (expected .json or .json.gz)",
                path.display()
            )))
        }
    }

    /// File name suffix, including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => ".json",
            Self::JsonGz => ".json.gz",
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::JsonGz)
    }
}

impl FromStr for RasterFormat {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "json.gz" | "json-gz" | "gz" => Ok(Self::JsonGz),
            other => Err(RasterError::Format(format!("unknown raster format '{}'", other))),
        }
    }
}

impl fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::JsonGz => write!(f, "json.gz"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(RasterFormat::from_path(Path::new("a/b.json")).unwrap(), RasterFormat::Json);
        assert_eq!(RasterFormat::from_path(Path::new("B.JSON.GZ")).unwrap(), RasterFormat::JsonGz);
        assert!(matches!(
            RasterFormat::from_path(Path::new("scene.tif")),
            Err(RasterError::Format(_))
        ));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("json".parse::<RasterFormat>().unwrap(), RasterFormat::Json);
        assert_eq!("gz".parse::<RasterFormat>().unwrap(), RasterFormat::JsonGz);
        assert!("tiff".parse::<RasterFormat>().is_err());
        assert_eq!(RasterFormat::JsonGz.to_string(), "json.gz");
    }
}
