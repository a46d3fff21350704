//! Seeded gradient noise sampled into dense 2-D fields.
//!
//! A field is a pure function of its size and [`NoiseParams`]: the permutation
//! table is rebuilt from the seed on every call, so no RNG state survives
//! between calls. Sampling positions are `(x + ox) / scale`, which lets a
//! chunk-sized field line up exactly with its neighbours when the offset is
//! the chunk's sample origin.

use std::f64::consts::FRAC_1_SQRT_2;

use crate::connectivity::repair_connectivity;
use crate::hash::XorShift64;

const GRADIENTS: [[f64; 2]; 8] = [
    [1.0, 0.0],
    [-1.0, 0.0],
    [0.0, 1.0],
    [0.0, -1.0],
    [FRAC_1_SQRT_2, FRAC_1_SQRT_2],
    [-FRAC_1_SQRT_2, FRAC_1_SQRT_2],
    [FRAC_1_SQRT_2, -FRAC_1_SQRT_2],
    [-FRAC_1_SQRT_2, -FRAC_1_SQRT_2],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Connectivity {
    /// Bridge brush width in cells; 0 behaves like 1.
    pub thickness: u32,
}

impl Default for Connectivity {
    fn default() -> Self {
        Self { thickness: 1 }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NoiseParams {
    pub scale: f64,
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    pub seed: u64,
    pub offset: (f64, f64),
    pub normalize: bool,
    /// Binarization threshold applied after normalization; negative disables.
    pub split: Option<f64>,
    /// Only honoured when `split` produced a binary field.
    pub connect: Option<Connectivity>,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            scale: 16.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            seed: 0,
            offset: (0.0, 0.0),
            normalize: false,
            split: None,
            connect: None,
        }
    }
}

impl NoiseParams {
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_offset(mut self, ox: f64, oy: f64) -> Self {
        self.offset = (ox, oy);
        self
    }

    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.normalize = true;
        self
    }

    #[must_use]
    pub fn with_split(mut self, split: f64) -> Self {
        self.split = Some(split);
        self
    }

    #[must_use]
    pub fn with_connectivity(mut self, thickness: u32) -> Self {
        self.connect = Some(Connectivity { thickness });
        self
    }

    #[inline]
    fn effective_scale(&self) -> f64 {
        if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            1.0
        }
    }

    #[inline]
    fn effective_split(&self) -> Option<f64> {
        self.split.filter(|s| *s >= 0.0)
    }
}

/// Dense row-major grid of noise values.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseField {
    width: usize,
    height: usize,
    values: Vec<f64>,
}

impl NoiseField {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width * height],
        }
    }

    /// Builds a binary field from booleans laid out row-major.
    pub fn from_mask(width: usize, height: usize, mask: &[bool]) -> Self {
        let mut field = Self::new(width, height);
        for (dst, &m) in field.values.iter_mut().zip(mask) {
            *dst = if m { 1.0 } else { 0.0 };
        }
        field
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.values[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f64) {
        let i = self.idx(x, y);
        self.values[i] = v;
    }

    /// Binary-mask view: a cell is set when its value is at least 0.5.
    #[inline]
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.get(x, y) >= 0.5
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn count_set(&self) -> usize {
        self.values.iter().filter(|v| **v >= 0.5).count()
    }

    pub fn min_max(&self) -> Option<(f64, f64)> {
        let mut it = self.values.iter().copied();
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Rescales to `[0, 1]` using the observed extremes; a flat field becomes all zeros.
    pub fn normalize(&mut self) {
        let Some((lo, hi)) = self.min_max() else {
            return;
        };
        let range = hi - lo;
        if range <= 0.0 || !range.is_finite() {
            self.values.iter_mut().for_each(|v| *v = 0.0);
            return;
        }
        for v in &mut self.values {
            *v = ((*v - lo) / range).clamp(0.0, 1.0);
        }
    }

    pub fn binarize(&mut self, split: f64) {
        for v in &mut self.values {
            *v = if *v >= split { 1.0 } else { 0.0 };
        }
    }
}

/// 256-entry permutation, doubled so two chained lookups never wrap.
#[derive(Clone)]
struct PermutationTable {
    perm: [u8; 512],
}

impl PermutationTable {
    fn new(seed: u64) -> Self {
        let mut perm = [0u8; 512];
        for (i, p) in perm.iter_mut().take(256).enumerate() {
            *p = i as u8;
        }
        // Fisher-Yates
        let mut rng = XorShift64::new(seed);
        for i in (1..256).rev() {
            let j = rng.below(i + 1);
            perm.swap(i, j);
        }
        for i in 0..256 {
            perm[256 + i] = perm[i];
        }
        Self { perm }
    }

    #[inline]
    fn gradient(&self, ix: i64, iy: i64) -> [f64; 2] {
        let a = self.perm[(ix & 255) as usize] as usize;
        let h = self.perm[a + (iy & 255) as usize];
        GRADIENTS[(h & 7) as usize]
    }
}

#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Classic 2-D gradient noise over a seeded permutation table.
#[derive(Clone)]
pub struct Perlin {
    table: PermutationTable,
}

impl Perlin {
    pub fn new(seed: u64) -> Self {
        Self {
            table: PermutationTable::new(seed),
        }
    }

    /// Single-octave sample, roughly in `[-1, 1]`; zero on every lattice point.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let xf = x.floor();
        let yf = y.floor();
        let ix = xf as i64;
        let iy = yf as i64;
        let tx = x - xf;
        let ty = y - yf;

        let dot = |cx: i64, cy: i64, dx: f64, dy: f64| {
            let g = self.table.gradient(cx, cy);
            g[0] * dx + g[1] * dy
        };
        let n00 = dot(ix, iy, tx, ty);
        let n10 = dot(ix + 1, iy, tx - 1.0, ty);
        let n01 = dot(ix, iy + 1, tx, ty - 1.0);
        let n11 = dot(ix + 1, iy + 1, tx - 1.0, ty - 1.0);

        let u = fade(tx);
        let v = fade(ty);
        lerp(lerp(n00, n10, u), lerp(n01, n11, u), v)
    }

    /// Octave sum; amplitude and frequency start at 1.
    pub fn fractal(&self, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        for _ in 0..octaves.max(1) {
            total += self.sample(x * frequency, y * frequency) * amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }
        total
    }
}

/// Produces a `width x height` field from `params`.
pub fn generate(width: usize, height: usize, params: &NoiseParams) -> NoiseField {
    let mut field = NoiseField::new(width, height);
    if width == 0 || height == 0 {
        return field;
    }
    let noise = Perlin::new(params.seed);
    let scale = params.effective_scale();
    let octaves = params.octaves.max(1);
    let (ox, oy) = params.offset;
    for y in 0..height {
        let py = (y as f64 + oy) / scale;
        for x in 0..width {
            let px = (x as f64 + ox) / scale;
            let v = noise.fractal(px, py, octaves, params.persistence, params.lacunarity);
            field.set(x, y, v);
        }
    }
    if params.normalize {
        field.normalize();
    }
    if let Some(split) = params.effective_split() {
        field.binarize(split);
        if let Some(conn) = params.connect {
            let bridges = repair_connectivity(&mut field, conn.thickness);
            if bridges > 0 {
                log::debug!("noise field {}x{}: {} bridge(s) drawn", width, height, bridges);
            }
        }
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_params_same_field() {
        let p = NoiseParams::default().with_seed(12345);
        assert_eq!(generate(32, 24, &p), generate(32, 24, &p));
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate(16, 16, &NoiseParams::default().with_seed(1));
        let b = generate(16, 16, &NoiseParams::default().with_seed(2));
        assert_ne!(a, b);
    }

    #[test]
    fn offset_stitches_neighbouring_fields() {
        let p = NoiseParams::default().with_seed(9);
        let wide = generate(32, 8, &p);
        let right = generate(16, 8, &p.clone().with_offset(16.0, 0.0));
        for y in 0..8 {
            for x in 0..16 {
                assert_eq!(wide.get(x + 16, y), right.get(x, y));
            }
        }
    }

    #[test]
    fn non_positive_scale_behaves_like_one() {
        let mut p = NoiseParams::default().with_seed(4);
        p.scale = 1.0;
        let one = generate(8, 8, &p);
        p.scale = 0.0;
        assert_eq!(generate(8, 8, &p), one);
        p.scale = -5.0;
        assert_eq!(generate(8, 8, &p), one);
    }

    #[test]
    fn split_yields_binary_values() {
        let p = NoiseParams::default().with_seed(5).normalized().with_split(0.5);
        let f = generate(24, 24, &p);
        assert!(f.values().iter().all(|v| *v == 0.0 || *v == 1.0));
    }

    #[test]
    fn negative_split_is_ignored() {
        let p = NoiseParams::default().with_seed(5).normalized();
        let plain = generate(12, 12, &p);
        assert_eq!(generate(12, 12, &p.clone().with_split(-1.0)), plain);
    }

    #[test]
    fn lattice_points_are_zero() {
        let n = Perlin::new(77);
        for i in -4..4 {
            assert_eq!(n.sample(f64::from(i), f64::from(i * 3)), 0.0);
        }
    }

    #[test]
    fn single_octave_stays_bounded() {
        let n = Perlin::new(31);
        for i in 0..5000 {
            let v = n.sample(i as f64 * 0.37 - 700.0, i as f64 * 0.11 + 3.0);
            assert!(v.abs() <= 1.0, "{v}");
        }
    }

    #[test]
    fn flat_field_normalizes_to_zero() {
        let mut f = NoiseField::new(4, 4);
        f.values.iter_mut().for_each(|v| *v = 3.5);
        f.normalize();
        assert!(f.values().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn empty_field_is_fine() {
        let f = generate(0, 10, &NoiseParams::default().normalized().with_split(0.5));
        assert!(f.values().is_empty());
        assert_eq!(f.min_max(), None);
    }
}
