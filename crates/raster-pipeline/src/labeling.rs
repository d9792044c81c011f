//! Connected component labeling over raster pixels.
//!
//! Pixels are joined with a disjoint-set forest indexed by flat pixel
//! position. Labels are numbered in order of each component's first pixel
//! (row-major), so the same raster always yields the same labels.

use raster_common::RasterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Label assigned to masked pixels.
pub const UNLABELED: usize = usize::MAX;

/// Pixel neighbourhood used to decide which pixels touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Connectivity {
    /// Edge neighbours only
    Four,
    /// Edge and corner neighbours
    #[default]
    Eight,
}

impl Connectivity {
    /// Neighbours already visited in a row-major scan: left, up, and for
    /// 8-connectivity up-left and up-right.
    pub(crate) fn backward_offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &[(0, -1), (-1, 0)],
            Connectivity::Eight => &[(0, -1), (-1, -1), (-1, 0), (-1, 1)],
        }
    }

    /// Every neighbour offset as (drow, dcol).
    pub(crate) fn offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &[(-1, 0), (0, -1), (0, 1), (1, 0)],
            Connectivity::Eight => &[
                (-1, -1),
                (-1, 0),
                (-1, 1),
                (0, -1),
                (0, 1),
                (1, -1),
                (1, 0),
                (1, 1),
            ],
        }
    }
}

impl TryFrom<u8> for Connectivity {
    type Error = RasterError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(Connectivity::Four),
            8 => Ok(Connectivity::Eight),
            other => Err(RasterError::invalid_parameter(
                "connectivity",
                format!("expected 4 or 8, got {}", other),
            )),
        }
    }
}

impl From<Connectivity> for u8 {
    fn from(value: Connectivity) -> Self {
        match value {
            Connectivity::Four => 4,
            Connectivity::Eight => 8,
        }
    }
}

impl FromStr for Connectivity {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s.trim().parse().map_err(|_| {
            RasterError::invalid_parameter("connectivity", format!("expected 4 or 8, got '{}'", s))
        })?;
        Connectivity::try_from(n)
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// Disjoint-set forest over the indices `0..len`.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Root of the set holding `x`, halving paths on the way.
    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            let grandparent = self.parent[self.parent[x]];
            self.parent[x] = grandparent;
            x = grandparent;
        }
        x
    }

    /// Join the sets holding `a` and `b`, returning the new root.
    pub fn union(&mut self, a: usize, b: usize) -> usize {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return ra;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => {
                self.parent[ra] = rb;
                rb
            }
            std::cmp::Ordering::Greater => {
                self.parent[rb] = ra;
                ra
            }
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
                ra
            }
        }
    }
}

/// Connected regions of equal value.
#[derive(Debug, Clone)]
pub struct Components {
    /// Label per pixel, `UNLABELED` where masked
    pub labels: Vec<usize>,
    /// Value of each component
    pub values: Vec<f64>,
    /// Pixel count of each component
    pub sizes: Vec<usize>,
    /// Flat index of the first pixel of each component
    pub first_pixels: Vec<usize>,
}

impl Components {
    pub fn count(&self) -> usize {
        self.values.len()
    }
}

/// Values that belong to the same region. NaN matches NaN.
#[inline]
pub(crate) fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// Flat index of the neighbour at (drow, dcol), if inside the grid.
#[inline]
pub(crate) fn neighbour(
    row: usize,
    col: usize,
    (drow, dcol): (isize, isize),
    width: usize,
    height: usize,
) -> Option<usize> {
    let r = row.checked_add_signed(drow)?;
    let c = col.checked_add_signed(dcol)?;
    (r < height && c < width).then(|| r * width + c)
}

/// Label connected regions of equal value among unmasked pixels.
pub fn label_components(
    values: &[f64],
    mask: &[bool],
    width: usize,
    height: usize,
    connectivity: Connectivity,
) -> Components {
    let len = width * height;
    let mut forest = UnionFind::new(len);

    for row in 0..height {
        for col in 0..width {
            let idx = row * width + col;
            if mask[idx] {
                continue;
            }
            for &offset in connectivity.backward_offsets() {
                if let Some(n) = neighbour(row, col, offset, width, height) {
                    if !mask[n] && same_value(values[idx], values[n]) {
                        forest.union(idx, n);
                    }
                }
            }
        }
    }

    let mut root_label = vec![UNLABELED; len];
    let mut labels = vec![UNLABELED; len];
    let mut component_values = Vec::new();
    let mut sizes = Vec::new();
    let mut first_pixels = Vec::new();

    for idx in 0..len {
        if mask[idx] {
            continue;
        }
        let root = forest.find(idx);
        let label = match root_label[root] {
            UNLABELED => {
                let label = component_values.len();
                root_label[root] = label;
                component_values.push(values[idx]);
                sizes.push(0);
                first_pixels.push(idx);
                label
            }
            label => label,
        };
        labels[idx] = label;
        sizes[label] += 1;
    }

    Components {
        labels,
        values: component_values,
        sizes,
        first_pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_find() {
        let mut uf = UnionFind::new(6);
        uf.union(0, 1);
        uf.union(2, 3);
        uf.union(1, 3);
        assert_eq!(uf.find(0), uf.find(2));
        assert_ne!(uf.find(0), uf.find(4));
        assert_eq!(uf.len(), 6);
    }

    #[test]
    fn test_diagonal_connectivity() {
        // 1 0
        // 0 1
        let values = [1.0, 0.0, 0.0, 1.0];
        let mask = [false; 4];

        let four = label_components(&values, &mask, 2, 2, Connectivity::Four);
        assert_eq!(four.count(), 4);

        let eight = label_components(&values, &mask, 2, 2, Connectivity::Eight);
        assert_eq!(eight.count(), 2);
        assert_eq!(eight.labels, vec![0, 1, 1, 0]);
        assert_eq!(eight.sizes, vec![2, 2]);
    }

    #[test]
    fn test_masked_pixels_split_regions() {
        let values = [3.0, 3.0, 3.0];
        let mask = [false, true, false];
        let comps = label_components(&values, &mask, 3, 1, Connectivity::Eight);
        assert_eq!(comps.count(), 2);
        assert_eq!(comps.labels, vec![0, UNLABELED, 1]);
        assert_eq!(comps.first_pixels, vec![0, 2]);
    }

    #[test]
    fn test_u_shape_is_one_component() {
        // Two arms only meet on the bottom row; the scan must still merge them.
        // 1 0 1
        // 1 0 1
        // 1 1 1
        let values = [1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let mask = [false; 9];
        let comps = label_components(&values, &mask, 3, 3, Connectivity::Four);
        assert_eq!(comps.count(), 2);
        assert_eq!(comps.sizes, vec![7, 2]);
        assert_eq!(comps.values, vec![1.0, 0.0]);
    }

    #[test]
    fn test_connectivity_conversion() {
        assert_eq!(Connectivity::try_from(4).unwrap(), Connectivity::Four);
        assert_eq!(Connectivity::try_from(8).unwrap(), Connectivity::Eight);
        assert!(matches!(
            Connectivity::try_from(6),
            Err(RasterError::InvalidParameter { .. })
        ));
        assert_eq!(Connectivity::Four.to_string(), "4");
        assert_eq!(" 8 ".parse::<Connectivity>().unwrap(), Connectivity::Eight);
        assert!("four".parse::<Connectivity>().is_err());
    }
}
