//! Coordinate spaces for the tile world: pixel, sample, and chunk.
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Integer tile-grid coordinate, `floor(pixel / tile_size)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct SamplePos {
    pub x: i32,
    pub y: i32,
}

impl SamplePos {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for SamplePos {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<SamplePos> for (i32, i32) {
    fn from(value: SamplePos) -> Self {
        (value.x, value.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }
}

impl From<(i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<ChunkCoord> for (i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cy)
    }
}

/// Axis-aligned rectangle in pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl ViewRect {
    #[inline]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.w.is_finite() && self.h.is_finite()
    }
}

/// Inclusive rectangle of sample coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleSpan {
    pub min: SamplePos,
    pub max: SamplePos,
}

impl SampleSpan {
    #[inline]
    pub fn width(&self) -> usize {
        (i64::from(self.max.x) - i64::from(self.min.x) + 1).max(0) as usize
    }

    #[inline]
    pub fn height(&self) -> usize {
        (i64::from(self.max.y) - i64::from(self.min.y) + 1).max(0) as usize
    }

    #[inline]
    pub fn contains(&self, s: SamplePos) -> bool {
        s.x >= self.min.x && s.x <= self.max.x && s.y >= self.min.y && s.y <= self.max.y
    }

    /// Row-major iteration over every sample in the span.
    pub fn iter(&self) -> impl Iterator<Item = SamplePos> + '_ {
        let (x0, x1) = (self.min.x, self.max.x);
        (self.min.y..=self.max.y).flat_map(move |y| (x0..=x1).map(move |x| SamplePos::new(x, y)))
    }
}

/// Immutable tile and chunk sizing for one world instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    tile_size: f64,
    chunk_size: i32,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(16.0, 16)
    }
}

impl Grid {
    pub fn new(tile_size: f64, chunk_size: i32) -> Self {
        let tile_size = if tile_size.is_finite() && tile_size > 0.0 {
            tile_size
        } else {
            1.0
        };
        Self {
            tile_size,
            chunk_size: chunk_size.max(1),
        }
    }

    #[inline]
    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    #[inline]
    pub fn chunk_size(&self) -> i32 {
        self.chunk_size
    }

    #[inline]
    pub fn cells_per_chunk(&self) -> usize {
        let s = self.chunk_size as usize;
        s * s
    }

    /// Returns `None` for non-finite pixels or samples outside the `i32` range.
    pub fn sample_of_pixel(&self, px: f64, py: f64) -> Option<SamplePos> {
        Some(SamplePos::new(
            self.axis_sample(px)?,
            self.axis_sample(py)?,
        ))
    }

    fn axis_sample(&self, p: f64) -> Option<i32> {
        if !p.is_finite() {
            return None;
        }
        let s = (p / self.tile_size).floor();
        if s < f64::from(i32::MIN) || s > f64::from(i32::MAX) {
            return None;
        }
        Some(s as i32)
    }

    /// Top-left pixel corner of a sample.
    #[inline]
    pub fn pixel_of_sample(&self, s: SamplePos) -> (f64, f64) {
        (f64::from(s.x) * self.tile_size, f64::from(s.y) * self.tile_size)
    }

    /// Pixel centre of a sample; always maps back to the same sample.
    #[inline]
    pub fn pixel_center_of_sample(&self, s: SamplePos) -> (f64, f64) {
        (
            (f64::from(s.x) + 0.5) * self.tile_size,
            (f64::from(s.y) + 0.5) * self.tile_size,
        )
    }

    #[inline]
    pub fn chunk_of_sample(&self, s: SamplePos) -> ChunkCoord {
        ChunkCoord::new(s.x.div_euclid(self.chunk_size), s.y.div_euclid(self.chunk_size))
    }

    #[inline]
    pub fn local_of_sample(&self, s: SamplePos) -> (usize, usize) {
        (
            s.x.rem_euclid(self.chunk_size) as usize,
            s.y.rem_euclid(self.chunk_size) as usize,
        )
    }

    /// First sample of a chunk, widened so extreme chunk coordinates cannot overflow.
    #[inline]
    pub fn chunk_origin_sample(&self, c: ChunkCoord) -> (i64, i64) {
        let s = i64::from(self.chunk_size);
        (i64::from(c.cx) * s, i64::from(c.cy) * s)
    }

    #[inline]
    pub fn chunk_origin_pixel(&self, c: ChunkCoord) -> (f64, f64) {
        let (sx, sy) = self.chunk_origin_sample(c);
        (sx as f64 * self.tile_size, sy as f64 * self.tile_size)
    }

    /// Samples covering `view`, grown by `pad` tiles on every side.
    pub fn samples_covering(&self, view: &ViewRect, pad: i32) -> Option<SampleSpan> {
        if !view.is_finite() {
            return None;
        }
        let clamp = |v: f64| v.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
        let x0 = clamp((view.x / self.tile_size).floor());
        let y0 = clamp((view.y / self.tile_size).floor());
        let x1 = clamp(((view.x + view.w.max(0.0)) / self.tile_size).floor());
        let y1 = clamp(((view.y + view.h.max(0.0)) / self.tile_size).floor());
        Some(SampleSpan {
            min: SamplePos::new(x0.saturating_sub(pad), y0.saturating_sub(pad)),
            max: SamplePos::new(x1.saturating_add(pad), y1.saturating_add(pad)),
        })
    }
}
