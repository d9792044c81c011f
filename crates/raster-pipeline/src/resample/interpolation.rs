//! Interpolation kernels over masked bands.
//!
//! Coordinates are fractional pixel positions with pixel centres on integer
//! values: `(0.0, 0.0)` is the centre of the top-left pixel and the band
//! covers `[-0.5, width - 0.5) x [-0.5, height - 0.5)`. Masked samples never
//! contribute to a result.

/// A band with its validity mask.
#[derive(Debug, Clone, Copy)]
pub struct MaskedBand<'a> {
    pub data: &'a [f64],
    pub mask: &'a [bool],
    pub width: usize,
    pub height: usize,
}

impl<'a> MaskedBand<'a> {
    pub fn new(data: &'a [f64], mask: &'a [bool], width: usize, height: usize) -> Self {
        Self {
            data,
            mask,
            width,
            height,
        }
    }

    /// Check if (x, y) falls inside the band footprint.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= -0.5 && y >= -0.5 && x < self.width as f64 - 0.5 && y < self.height as f64 - 0.5
    }

    /// Valid value at integer position, `None` when masked or outside.
    #[inline]
    pub fn get(&self, col: i64, row: i64) -> Option<f64> {
        if col < 0 || row < 0 || col as usize >= self.width || row as usize >= self.height {
            return None;
        }
        let idx = row as usize * self.width + col as usize;
        (!self.mask[idx]).then(|| self.data[idx])
    }

    /// Value at a clamped position, `None` when masked.
    #[inline]
    fn get_clamped(&self, col: i64, row: i64) -> Option<f64> {
        self.get(
            col.clamp(0, self.width as i64 - 1),
            row.clamp(0, self.height as i64 - 1),
        )
    }
}

/// Nearest neighbor interpolation.
///
/// Returns the value of the pixel containing (x, y).
pub fn nearest_interpolate(band: &MaskedBand, x: f64, y: f64) -> Option<f64> {
    if !band.contains(x, y) {
        return None;
    }
    band.get((x + 0.5).floor() as i64, (y + 0.5).floor() as i64)
}

/// Bilinear interpolation.
///
/// Weights the four surrounding pixel centres. Masked or out-of-range
/// corners are dropped and the remaining weights renormalised.
pub fn bilinear_interpolate(band: &MaskedBand, x: f64, y: f64) -> Option<f64> {
    if !band.contains(x, y) {
        return None;
    }
    let x0 = x.floor();
    let y0 = y.floor();
    let xf = x - x0;
    let yf = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let corners = [
        (x0, y0, (1.0 - xf) * (1.0 - yf)),
        (x0 + 1, y0, xf * (1.0 - yf)),
        (x0, y0 + 1, (1.0 - xf) * yf),
        (x0 + 1, y0 + 1, xf * yf),
    ];

    let mut sum = 0.0;
    let mut weight = 0.0;
    for (col, row, w) in corners {
        if w == 0.0 {
            continue;
        }
        if let Some(v) = band.get(col, row) {
            sum += v * w;
            weight += w;
        }
    }

    if weight > 0.0 {
        Some(sum / weight)
    } else {
        None
    }
}

/// Bicubic interpolation.
///
/// Uses 16 surrounding points for smoother interpolation, replicating edge
/// pixels beyond the band. Falls back to bilinear when any sample is masked.
pub fn cubic_interpolate(band: &MaskedBand, x: f64, y: f64) -> Option<f64> {
    if !band.contains(x, y) {
        return None;
    }
    let xi = x.floor() as i64;
    let yi = y.floor() as i64;
    let xf = x - xi as f64;
    let yf = y - yi as f64;

    let mut values = [[0.0f64; 4]; 4];
    for (j, row) in values.iter_mut().enumerate() {
        for (i, value) in row.iter_mut().enumerate() {
            match band.get_clamped(xi + i as i64 - 1, yi + j as i64 - 1) {
                Some(v) => *value = v,
                None => return bilinear_interpolate(band, x, y),
            }
        }
    }

    let mut row_values = [0.0f64; 4];
    for (j, row) in values.iter().enumerate() {
        row_values[j] = cubic_1d(row[0], row[1], row[2], row[3], xf);
    }

    Some(cubic_1d(
        row_values[0],
        row_values[1],
        row_values[2],
        row_values[3],
        yf,
    ))
}

/// 1D cubic interpolation using Catmull-Rom spline.
fn cubic_1d(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;

    let a = -0.5 * p0 + 1.5 * p1 - 1.5 * p2 + 0.5 * p3;
    let b = p0 - 2.5 * p1 + 2.0 * p2 - 0.5 * p3;
    let c = -0.5 * p0 + 0.5 * p2;
    let d = p1;

    a * t3 + b * t2 + c * t + d
}

/// Most frequent value, lowest value on ties.
pub fn mode(values: &mut [f64]) -> Option<f64> {
    values.sort_by(|a, b| a.total_cmp(b));
    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < values.len() {
        let v = values[i];
        let run = values[i..].iter().take_while(|&&w| w.total_cmp(&v).is_eq()).count();
        if best.map_or(true, |(_, count)| run > count) {
            best = Some((v, run));
        }
        i += run;
    }
    best.map(|(v, _)| v)
}

/// Mode over the pixels whose centres fall in the window
/// `[x_min, x_max] x [y_min, y_max]`.
///
/// Returns `None` when no valid pixel centre lies inside the window.
pub fn mode_interpolate(band: &MaskedBand, x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Option<f64> {
    let c0 = x_min.ceil().max(0.0) as i64;
    let c1 = x_max.floor().min(band.width as f64 - 1.0) as i64;
    let r0 = y_min.ceil().max(0.0) as i64;
    let r1 = y_max.floor().min(band.height as f64 - 1.0) as i64;
    if c1 < c0 || r1 < r0 {
        return None;
    }

    let mut samples = Vec::with_capacity(((c1 - c0 + 1) * (r1 - r0 + 1)) as usize);
    for row in r0..=r1 {
        for col in c0..=c1 {
            if let Some(v) = band.get(col, row) {
                samples.push(v);
            }
        }
    }
    mode(&mut samples)
}
