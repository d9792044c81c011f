//! JSON raster documents.

use crate::format::RasterFormat;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use raster_common::{DataType, GridModel, MaskedRaster, RasterError, RasterResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// Serialized form of a [`MaskedRaster`].
///
/// A pixel is masked when any band holds `null` there. Non-finite values
/// are written as `"NaN"`, `"inf"` or `"-inf"`, so a valid NaN stays valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterDocument {
    pub grid: GridModel,
    pub dtype: DataType,
    #[serde(default)]
    pub band_names: Vec<String>,
    /// Names of the bit planes packed into band 0, bit `i` for name `i`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flag_names: Vec<String>,
    #[serde(with = "band_values")]
    pub bands: Vec<Vec<Option<f64>>>,
}

mod band_values {
    use raster_common::nonfinite::FloatRepr;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    type Bands = Vec<Vec<Option<f64>>>;

    pub fn serialize<S: Serializer>(bands: &Bands, serializer: S) -> Result<S::Ok, S::Error> {
        let encoded: Vec<Vec<Option<FloatRepr>>> = bands
            .iter()
            .map(|band| band.iter().map(|v| v.map(FloatRepr::encode)).collect())
            .collect();
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bands, D::Error> {
        Vec::<Vec<Option<FloatRepr>>>::deserialize(deserializer)?
            .into_iter()
            .map(|band| {
                band.into_iter()
                    .map(|v| v.map(|repr| repr.decode()).transpose())
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Bands, _>>()
            .map_err(serde::de::Error::custom)
    }
}

impl RasterDocument {
    /// Document for a raster, bands named `band_1`, `band_2`, ...
    pub fn from_raster(raster: &MaskedRaster) -> Self {
        let bands = raster
            .bands()
            .iter()
            .map(|band| {
                band.iter()
                    .zip(raster.mask())
                    .map(|(&v, &masked)| (!masked).then_some(v))
                    .collect()
            })
            .collect();
        Self {
            grid: raster.grid().clone(),
            dtype: raster.dtype(),
            band_names: (1..=raster.band_count()).map(|i| format!("band_{}", i)).collect(),
            flag_names: Vec::new(),
            bands,
        }
    }

    pub fn with_band_names(mut self, names: Vec<String>) -> Self {
        self.band_names = names;
        self
    }

    pub fn with_flag_names(mut self, names: Vec<String>) -> Self {
        self.flag_names = names;
        self
    }

    /// Rebuild the raster. Masked positions hold the fill value.
    pub fn to_raster(&self) -> RasterResult<MaskedRaster> {
        if !self.band_names.is_empty() && self.band_names.len() != self.bands.len() {
            return Err(RasterError::Format(format!(
                "{} band names for {} bands",
                self.band_names.len(),
                self.bands.len()
            )));
        }
        let len = self.grid.len();
        let mask: Vec<bool> = (0..len)
            .map(|i| self.bands.iter().any(|band| band.get(i).is_some_and(|v| v.is_none())))
            .collect();
        let fill = self
            .grid
            .nodata
            .unwrap_or_else(|| self.dtype.default_nodata());
        let bands = self
            .bands
            .iter()
            .map(|band| {
                band.iter()
                    .zip(&mask)
                    .map(|(v, &masked)| if masked { fill } else { v.unwrap_or(fill) })
                    .collect()
            })
            .collect();
        MaskedRaster::new(bands, mask, self.grid.clone(), self.dtype)
    }
}

fn storage_error(path: &Path, err: impl std::fmt::Display) -> RasterError {
    RasterError::Storage(format!("{}: {}", path.display(), err))
}

/// Read a raster document, decompressing `.json.gz` files.
pub fn read_raster_document(path: &Path) -> RasterResult<RasterDocument> {
    let format = RasterFormat::from_path(path)?;
    let file = File::open(path).map_err(|e| storage_error(path, e))?;
    let reader: Box<dyn Read> = if format.is_compressed() {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    let doc: RasterDocument = serde_json::from_reader(reader)
        .map_err(|e| RasterError::Format(format!("{}: {}", path.display(), e)))?;
    debug!(
        path = %path.display(),
        format = %format,
        bands = doc.bands.len(),
        width = doc.grid.width,
        height = doc.grid.height,
        "Read raster document"
    );
    Ok(doc)
}

/// Write a raster document in the given format.
pub fn write_raster_document(doc: &RasterDocument, path: &Path, format: RasterFormat) -> RasterResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| storage_error(parent, e))?;
    }
    let file = File::create(path).map_err(|e| storage_error(path, e))?;
    let mut writer = BufWriter::new(file);
    match format {
        RasterFormat::Json => {
            serde_json::to_writer(&mut writer, doc)?;
        }
        RasterFormat::JsonGz => {
            let mut encoder = GzEncoder::new(&mut writer, Compression::default());
            serde_json::to_writer(&mut encoder, doc)?;
            encoder.finish().map_err(|e| storage_error(path, e))?;
        }
    }
    writer.flush().map_err(|e| storage_error(path, e))?;
    debug!(path = %path.display(), format = %format, "Wrote raster document");
    Ok(())
}

/// Read a raster file.
pub fn read_raster(path: &Path) -> RasterResult<MaskedRaster> {
    read_raster_document(path)?.to_raster()
}

/// Write a raster file.
pub fn write_raster(raster: &MaskedRaster, path: &Path, format: RasterFormat) -> RasterResult<()> {
    write_raster_document(&RasterDocument::from_raster(raster), path, format)
}
