//! Removal of small connected regions.
//!
//! Each band is labeled into regions of equal value. Regions smaller than
//! the threshold are absorbed, smallest first, into the neighbouring value
//! that shares the longest boundary with them (ties go to the lowest value).
//! A small region without valid neighbours is masked.
//!
//! Absorbing a region merges it with every neighbour of the winning value,
//! so adjacent regions never share a value. The result is therefore a
//! fixed point: sieving it again with the same parameters changes nothing.

use crate::labeling::{label_components, neighbour, same_value, Connectivity, UnionFind};
use rayon::prelude::*;
use raster_common::{MaskedRaster, RasterError, RasterResult};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use tracing::debug;

/// Result of sieving one band.
struct SievedBand {
    values: Vec<f64>,
    /// Pixels dropped because their region had no valid neighbour
    removed: Vec<bool>,
    components: usize,
    absorbed: usize,
    masked: usize,
}

/// Replace regions smaller than `min_pixel_count` pixels by the value of
/// their dominant neighbour.
///
/// Bands are sieved independently. The output mask is the input mask plus
/// any pixel masked in one of the bands; those pixels hold the fill value
/// in every band.
pub fn sieve(
    raster: &MaskedRaster,
    min_pixel_count: usize,
    connectivity: Connectivity,
) -> RasterResult<MaskedRaster> {
    if min_pixel_count < 1 {
        return Err(RasterError::InvalidThreshold(min_pixel_count));
    }

    let width = raster.width();
    let height = raster.height();
    let mask = raster.mask();

    let sieved: Vec<SievedBand> = raster
        .bands()
        .par_iter()
        .map(|band| sieve_band(band, mask, width, height, min_pixel_count, connectivity))
        .collect();

    let mut out_mask = mask.to_vec();
    for band in &sieved {
        for (m, &removed) in out_mask.iter_mut().zip(&band.removed) {
            *m |= removed;
        }
    }

    let fill = raster.fill_value();
    let bands = sieved
        .into_iter()
        .enumerate()
        .map(|(index, band)| {
            debug!(
                band = index,
                components = band.components,
                absorbed = band.absorbed,
                masked = band.masked,
                min_pixel_count,
                connectivity = %connectivity,
                "Sieved band"
            );
            band.values
                .into_iter()
                .zip(&out_mask)
                .map(|(v, &masked)| if masked { fill } else { v })
                .collect()
        })
        .collect();

    MaskedRaster::new(bands, out_mask, raster.grid().clone(), raster.dtype())
}

/// Region graph node state, indexed by component label.
struct RegionGraph {
    forest: UnionFind,
    values: Vec<f64>,
    sizes: Vec<usize>,
    first_pixels: Vec<usize>,
    /// Neighbouring root -> number of touching pixel pairs
    adjacency: Vec<BTreeMap<usize, usize>>,
    removed: Vec<bool>,
}

impl RegionGraph {
    /// Value winning the boundary vote around `node`.
    fn vote(&self, node: usize) -> Option<f64> {
        let mut tally: Vec<(f64, usize)> = Vec::new();
        for (&n, &contacts) in &self.adjacency[node] {
            let value = self.values[n];
            match tally.iter_mut().find(|(v, _)| same_value(*v, value)) {
                Some((_, total)) => *total += contacts,
                None => tally.push((value, contacts)),
            }
        }
        tally
            .into_iter()
            .max_by(|(va, ca), (vb, cb)| ca.cmp(cb).then_with(|| vb.total_cmp(va)))
            .map(|(value, _)| value)
    }

    /// Merge `node` with every neighbour holding `value`. Returns the new root.
    fn absorb(&mut self, node: usize, value: f64) -> usize {
        let members: Vec<usize> = std::iter::once(node)
            .chain(
                self.adjacency[node]
                    .keys()
                    .copied()
                    .filter(|&n| same_value(self.values[n], value)),
            )
            .collect();

        let mut root = node;
        let mut size = 0;
        let mut first = usize::MAX;
        let mut merged_adjacency: BTreeMap<usize, usize> = BTreeMap::new();
        for &m in &members {
            size += self.sizes[m];
            first = first.min(self.first_pixels[m]);
            for (&n, &contacts) in &std::mem::take(&mut self.adjacency[m]) {
                *merged_adjacency.entry(n).or_insert(0) += contacts;
            }
            root = self.forest.union(root, m);
        }
        for m in &members {
            merged_adjacency.remove(m);
        }

        // Point every outside neighbour at the merged root
        for (&n, &contacts) in &merged_adjacency {
            let adj = &mut self.adjacency[n];
            for m in &members {
                adj.remove(m);
            }
            adj.insert(root, contacts);
        }

        self.values[root] = value;
        self.sizes[root] = size;
        self.first_pixels[root] = first;
        self.adjacency[root] = merged_adjacency;
        root
    }
}

fn sieve_band(
    values: &[f64],
    mask: &[bool],
    width: usize,
    height: usize,
    min_pixel_count: usize,
    connectivity: Connectivity,
) -> SievedBand {
    let comps = label_components(values, mask, width, height, connectivity);
    let count = comps.count();

    let mut adjacency: Vec<BTreeMap<usize, usize>> = vec![BTreeMap::new(); count];
    for row in 0..height {
        for col in 0..width {
            let idx = row * width + col;
            let label = comps.labels[idx];
            if mask[idx] {
                continue;
            }
            for &offset in connectivity.offsets() {
                if let Some(n) = neighbour(row, col, offset, width, height) {
                    if !mask[n] && comps.labels[n] != label {
                        *adjacency[label].entry(comps.labels[n]).or_insert(0) += 1;
                    }
                }
            }
        }
    }

    let mut graph = RegionGraph {
        forest: UnionFind::new(count),
        values: comps.values.clone(),
        sizes: comps.sizes.clone(),
        first_pixels: comps.first_pixels.clone(),
        adjacency,
        removed: vec![false; count],
    };

    let mut queue: BinaryHeap<Reverse<(usize, usize, usize)>> = (0..count)
        .filter(|&c| graph.sizes[c] < min_pixel_count)
        .map(|c| Reverse((graph.sizes[c], graph.first_pixels[c], c)))
        .collect();

    let mut absorbed = 0;
    let mut masked = 0;
    while let Some(Reverse((size, _, node))) = queue.pop() {
        if size >= min_pixel_count {
            break;
        }
        // Skip entries made stale by an earlier merge
        if graph.removed[node] || graph.forest.find(node) != node || graph.sizes[node] != size {
            continue;
        }

        match graph.vote(node) {
            None => {
                graph.removed[node] = true;
                masked += 1;
            }
            Some(value) => {
                let root = graph.absorb(node, value);
                absorbed += 1;
                if graph.sizes[root] < min_pixel_count {
                    queue.push(Reverse((graph.sizes[root], graph.first_pixels[root], root)));
                }
            }
        }
    }

    let mut out = values.to_vec();
    let mut removed = vec![false; values.len()];
    for (idx, &label) in comps.labels.iter().enumerate() {
        if mask[idx] {
            continue;
        }
        let root = graph.forest.find(label);
        if graph.removed[root] {
            removed[idx] = true;
        } else {
            out[idx] = graph.values[root];
        }
    }

    SievedBand {
        values: out,
        removed,
        components: count,
        absorbed,
        masked,
    }
}
