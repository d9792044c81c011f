//! GeoJSON output for polygon features.

use geo_types::{Coord, LineString, Polygon};
use raster_common::{CrsCode, RasterError, RasterResult};
use raster_pipeline::PolygonFeature;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// A GeoJSON FeatureCollection of polygons.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    /// Named CRS member.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crs: Option<NamedCrs>,

    pub features: Vec<Feature>,
}

/// Legacy GeoJSON `crs` member of type "name".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedCrs {
    #[serde(rename = "type")]
    pub type_: String,
    pub properties: CrsName,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrsName {
    pub name: String,
}

impl NamedCrs {
    pub fn new(crs: CrsCode) -> Self {
        Self {
            type_: "name".to_string(),
            properties: CrsName {
                name: format!("urn:ogc:def:crs:EPSG::{}", crs.epsg()),
            },
        }
    }

    /// Parse the CRS back from its URN.
    pub fn code(&self) -> RasterResult<CrsCode> {
        let name = &self.properties.name;
        let digits = name.rsplit(':').next().unwrap_or(name);
        CrsCode::parse(digits).map_err(|e| RasterError::Format(format!("crs '{}': {}", name, e)))
    }
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    pub geometry: Geometry,

    pub properties: FeatureProperties,
}

/// Polygon geometry: first ring is the exterior, the rest are holes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureProperties {
    #[serde(with = "raster_common::nonfinite::float")]
    pub value: f64,
    #[serde(default)]
    pub pixel_count: usize,
}

fn ring_coordinates(ring: &LineString<f64>) -> Vec<[f64; 2]> {
    ring.0.iter().map(|c| [c.x, c.y]).collect()
}

fn ring_from_coordinates(coords: &[[f64; 2]]) -> LineString<f64> {
    LineString::new(coords.iter().map(|&[x, y]| Coord { x, y }).collect())
}

impl Feature {
    pub fn from_polygon(feature: &PolygonFeature) -> Self {
        let polygon = &feature.geometry;
        let rings = std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .map(ring_coordinates)
            .collect();
        Self {
            type_: "Feature".to_string(),
            geometry: Geometry::Polygon { coordinates: rings },
            properties: FeatureProperties {
                value: feature.value,
                pixel_count: feature.pixel_count,
            },
        }
    }

    pub fn to_polygon(&self, crs: Option<CrsCode>) -> RasterResult<PolygonFeature> {
        let Geometry::Polygon { coordinates } = &self.geometry;
        let (exterior, holes) = coordinates
            .split_first()
            .ok_or_else(|| RasterError::Format("polygon without rings".to_string()))?;
        Ok(PolygonFeature {
            geometry: Polygon::new(
                ring_from_coordinates(exterior),
                holes.iter().map(|h| ring_from_coordinates(h)).collect(),
            ),
            value: self.properties.value,
            crs,
            pixel_count: self.properties.pixel_count,
        })
    }
}

impl FeatureCollection {
    pub fn new(features: &[PolygonFeature], crs: Option<CrsCode>) -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            crs: crs.map(NamedCrs::new),
            features: features.iter().map(Feature::from_polygon).collect(),
        }
    }
}

/// Write features as a GeoJSON FeatureCollection.
///
/// `crs` defaults to the CRS of the first feature.
pub fn write_vector(features: &[PolygonFeature], path: &Path, crs: Option<CrsCode>) -> RasterResult<()> {
    let crs = crs.or_else(|| features.first().and_then(|f| f.crs));
    let collection = FeatureCollection::new(features, crs);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| RasterError::Storage(format!("{}: {}", parent.display(), e)))?;
    }
    let file = File::create(path)
        .map_err(|e| RasterError::Storage(format!("{}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &collection)?;
    writer.flush()?;

    debug!(path = %path.display(), features = features.len(), crs = ?crs, "Wrote GeoJSON");
    Ok(())
}

/// Read polygon features from a GeoJSON FeatureCollection.
pub fn read_vector(path: &Path) -> RasterResult<Vec<PolygonFeature>> {
    let file = File::open(path)
        .map_err(|e| RasterError::Storage(format!("{}: {}", path.display(), e)))?;
    let collection: FeatureCollection = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| RasterError::Format(format!("{}: {}", path.display(), e)))?;
    let crs = collection.crs.as_ref().map(NamedCrs::code).transpose()?;
    collection
        .features
        .iter()
        .map(|f| f.to_polygon(crs))
        .collect()
}
