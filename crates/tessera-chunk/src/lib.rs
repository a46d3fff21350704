//! Chunk cell buffer.
#![forbid(unsafe_code)]

use tessera_blocks::CellValue;
use tessera_geom::{ChunkCoord, Grid, SamplePos};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub coord: ChunkCoord,
    pub width: usize,
    pub height: usize,
    pub cells: Vec<CellValue>,
}

impl Chunk {
    /// `size x size` chunk with every cell empty.
    pub fn empty(coord: ChunkCoord, size: usize) -> Self {
        Self::filled(coord, size, size, CellValue::Empty)
    }

    pub fn filled(coord: ChunkCoord, width: usize, height: usize, value: CellValue) -> Self {
        Chunk {
            coord,
            width,
            height,
            cells: vec![value; width * height],
        }
    }

    /// Builds a chunk from row-major cells, padding with `Empty` or truncating
    /// so the buffer is exactly `width * height` long. `None` when the area
    /// overflows `usize`.
    pub fn from_cells_local(
        coord: ChunkCoord,
        width: usize,
        height: usize,
        cells: Vec<CellValue>,
    ) -> Option<Self> {
        let expect = width.checked_mul(height)?;
        let mut c = cells;
        if c.len() != expect {
            c.resize(expect, CellValue::Empty);
        }
        Some(Chunk {
            coord,
            width,
            height,
            cells: c,
        })
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn contains_local(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    pub fn get_local(&self, x: usize, y: usize) -> Option<&CellValue> {
        if !self.contains_local(x, y) {
            return None;
        }
        self.cells.get(self.idx(x, y))
    }

    /// Returns false when `(x, y)` lies outside the buffer.
    #[inline]
    pub fn set_local(&mut self, x: usize, y: usize, value: CellValue) -> bool {
        if !self.contains_local(x, y) {
            return false;
        }
        let i = self.idx(x, y);
        self.cells[i] = value;
        true
    }

    /// Cell for a world sample, if this chunk owns it under `grid`.
    pub fn get_sample(&self, grid: &Grid, s: SamplePos) -> Option<&CellValue> {
        if grid.chunk_of_sample(s) != self.coord {
            return None;
        }
        let (lx, ly) = grid.local_of_sample(s);
        self.get_local(lx, ly)
    }

    pub fn set_sample(&mut self, grid: &Grid, s: SamplePos, value: CellValue) -> bool {
        if grid.chunk_of_sample(s) != self.coord {
            return false;
        }
        let (lx, ly) = grid.local_of_sample(s);
        self.set_local(lx, ly, value)
    }

    #[inline]
    pub fn occupancy(&self) -> ChunkOccupancy {
        if self.cells.iter().any(|c| !c.is_empty()) {
            ChunkOccupancy::Populated
        } else {
            ChunkOccupancy::Empty
        }
    }

    #[inline]
    pub fn is_all_empty(&self) -> bool {
        self.occupancy().is_empty()
    }

    /// Rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[CellValue]> {
        self.cells.chunks(self.width.max(1)).take(self.height)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkOccupancy {
    Empty,
    Populated,
}

impl ChunkOccupancy {
    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, ChunkOccupancy::Empty)
    }

    #[inline]
    pub fn has_blocks(self) -> bool {
        matches!(self, ChunkOccupancy::Populated)
    }
}
