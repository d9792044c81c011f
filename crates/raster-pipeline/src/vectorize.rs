//! Polygonization of raster regions.
//!
//! Every maximal 8-connected region of equal value becomes one polygon with
//! holes. Boundaries follow pixel edges, so the polygons of a band tile its
//! valid extent exactly.
//!
//! Rings are traced on the pixel-corner lattice. Each region pixel side
//! facing a pixel outside the region contributes one directed unit edge,
//! oriented so the region stays on the right when walking in screen space
//! (row axis pointing down). Where two region pixels touch only at a corner
//! the walk turns left, keeping diagonal neighbours in the same ring.

use crate::labeling::{label_components, Connectivity, UNLABELED};
use geo_types::{Coord, LineString, Polygon};
use rayon::prelude::*;
use raster_common::{Affine, CrsCode, GridModel, MaskedRaster, RasterResult};
use std::collections::HashMap;
use tracing::debug;

/// A polygon covering one raster region.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFeature {
    /// Exterior counter-clockwise, holes clockwise, in the raster CRS
    pub geometry: Polygon<f64>,
    /// Raster value of the region
    pub value: f64,
    /// CRS inherited from the source grid
    pub crs: Option<CrsCode>,
    /// Number of pixels in the region
    pub pixel_count: usize,
}

impl PolygonFeature {
    /// Area in squared CRS units (exterior minus holes).
    pub fn area(&self) -> f64 {
        let exterior = ring_area(self.geometry.exterior()).abs();
        let holes: f64 = self
            .geometry
            .interiors()
            .iter()
            .map(|ring| ring_area(ring).abs())
            .sum();
        exterior - holes
    }
}

/// Signed shoelace area of a closed ring, positive when counter-clockwise.
pub fn ring_area(ring: &LineString<f64>) -> f64 {
    ring.0
        .windows(2)
        .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
        .sum::<f64>()
        / 2.0
}

/// Polygons of every region of `band_index`.
pub fn vectorize(raster: &MaskedRaster, band_index: usize) -> RasterResult<Vec<PolygonFeature>> {
    let band = raster.band(band_index)?;
    Ok(polygonize(band, raster.mask(), raster.grid(), |_| true))
}

/// Polygons of the regions whose value is one of `values`.
pub fn vectorize_values(
    raster: &MaskedRaster,
    band_index: usize,
    values: &[f64],
) -> RasterResult<Vec<PolygonFeature>> {
    let band = raster.band(band_index)?;
    Ok(polygonize(band, raster.mask(), raster.grid(), |v| {
        values.contains(&v)
    }))
}

/// Polygons covering the valid pixels of a raster.
pub fn valid_footprint(raster: &MaskedRaster) -> Vec<PolygonFeature> {
    footprint(raster, true)
}

/// Polygons covering the masked pixels of a raster.
pub fn nodata_footprint(raster: &MaskedRaster) -> Vec<PolygonFeature> {
    footprint(raster, false)
}

fn footprint(raster: &MaskedRaster, valid: bool) -> Vec<PolygonFeature> {
    let indicator: Vec<f64> = raster
        .mask()
        .iter()
        .map(|&masked| if masked { 0.0 } else { 1.0 })
        .collect();
    let unmasked = vec![false; indicator.len()];
    let wanted = if valid { 1.0 } else { 0.0 };
    polygonize(&indicator, &unmasked, raster.grid(), |v| v == wanted)
}

fn polygonize<F>(values: &[f64], mask: &[bool], grid: &GridModel, keep: F) -> Vec<PolygonFeature>
where
    F: Fn(f64) -> bool + Sync,
{
    let (width, height) = (grid.width, grid.height);
    let comps = label_components(values, mask, width, height, Connectivity::Eight);

    let mut pixels: Vec<Vec<usize>> = vec![Vec::new(); comps.count()];
    for (idx, &label) in comps.labels.iter().enumerate() {
        if label != UNLABELED {
            pixels[label].push(idx);
        }
    }

    let flip = grid.transform.determinant() < 0.0;
    let features: Vec<PolygonFeature> = pixels
        .par_iter()
        .enumerate()
        .filter(|(label, _)| keep(comps.values[*label]))
        .map(|(label, region)| {
            let rings = trace_rings(region, &comps.labels, label, width, height);
            PolygonFeature {
                geometry: to_polygon(rings, &grid.transform, flip),
                value: comps.values[label],
                crs: grid.crs,
                pixel_count: region.len(),
            }
        })
        .collect();

    debug!(
        regions = comps.count(),
        polygons = features.len(),
        width,
        height,
        "Vectorized band"
    );
    features
}

/// Lattice point (col, row) of a pixel corner.
type Vertex = (i64, i64);

/// Unit step along the lattice.
type Dir = (i64, i64);

#[derive(Debug, Clone, Copy)]
struct Edge {
    start: Vertex,
    dir: Dir,
}

impl Edge {
    fn end(&self) -> Vertex {
        (self.start.0 + self.dir.0, self.start.1 + self.dir.1)
    }
}

/// Left turn in screen space (row axis down).
fn turn_left((dx, dy): Dir) -> Dir {
    (dy, -dx)
}

/// Closed rings of one region, in pixel-lattice coordinates.
/// Returns (exterior, holes).
fn trace_rings(
    region: &[usize],
    labels: &[usize],
    label: usize,
    width: usize,
    height: usize,
) -> (Vec<Vertex>, Vec<Vec<Vertex>>) {
    let inside = |row: i64, col: i64| {
        row >= 0
            && col >= 0
            && (row as usize) < height
            && (col as usize) < width
            && labels[row as usize * width + col as usize] == label
    };

    let mut edges = Vec::with_capacity(region.len() * 2);
    for &idx in region {
        let (r, c) = ((idx / width) as i64, (idx % width) as i64);
        if !inside(r - 1, c) {
            edges.push(Edge { start: (c, r), dir: (1, 0) });
        }
        if !inside(r, c + 1) {
            edges.push(Edge { start: (c + 1, r), dir: (0, 1) });
        }
        if !inside(r + 1, c) {
            edges.push(Edge { start: (c + 1, r + 1), dir: (-1, 0) });
        }
        if !inside(r, c - 1) {
            edges.push(Edge { start: (c, r + 1), dir: (0, -1) });
        }
    }

    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::with_capacity(edges.len());
    for (i, edge) in edges.iter().enumerate() {
        outgoing.entry(edge.start).or_default().push(i);
    }

    let next_edge = |current: &Edge| -> Option<usize> {
        let candidates = outgoing.get(&current.end())?;
        match candidates.as_slice() {
            [only] => Some(*only),
            many => {
                let left = turn_left(current.dir);
                many.iter().copied().find(|&e| edges[e].dir == left)
            }
        }
    };

    let mut used = vec![false; edges.len()];
    let mut exterior = Vec::new();
    let mut holes = Vec::new();

    for first in 0..edges.len() {
        if used[first] {
            continue;
        }
        let mut ring = Vec::new();
        let mut current = first;
        loop {
            used[current] = true;
            let edge = edges[current];
            let Some(next) = next_edge(&edge) else {
                break;
            };
            // Keep only corners where the direction changes
            if edges[next].dir != edge.dir {
                ring.push(edge.end());
            }
            if next == first {
                break;
            }
            current = next;
        }

        if lattice_area2(&ring) > 0 {
            exterior = ring;
        } else {
            holes.push(ring);
        }
    }

    (exterior, holes)
}

/// Twice the signed area of a lattice ring; positive for the exterior.
fn lattice_area2(ring: &[Vertex]) -> i64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (x0, y0) = ring[i];
            let (x1, y1) = ring[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum()
}

fn to_line_string(ring: &[Vertex], transform: &Affine, flip: bool) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = ring
        .iter()
        .map(|&(col, row)| {
            let (x, y) = transform.apply(col as f64, row as f64);
            Coord { x, y }
        })
        .collect();
    if flip {
        coords.reverse();
    }
    if let Some(&start) = coords.first() {
        coords.push(start);
    }
    LineString::new(coords)
}

fn to_polygon(
    (exterior, holes): (Vec<Vertex>, Vec<Vec<Vertex>>),
    transform: &Affine,
    flip: bool,
) -> Polygon<f64> {
    Polygon::new(
        to_line_string(&exterior, transform, flip),
        holes
            .iter()
            .map(|hole| to_line_string(hole, transform, flip))
            .collect(),
    )
}
