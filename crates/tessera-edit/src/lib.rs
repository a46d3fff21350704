//! Sample-keyed edit overlays: permanent modifications and imported block marks.
#![forbid(unsafe_code)]

use std::collections::HashMap;

use tessera_blocks::{BlockMark, CellValue};
use tessera_geom::{ChunkCoord, Grid, SamplePos};

/// One permanent edit. `Cleared` shadows whatever lies underneath.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Modification {
    Set(CellValue),
    Cleared,
}

impl Modification {
    /// `None` and `Some(Empty)` both clear.
    pub fn from_value(value: Option<CellValue>) -> Self {
        match value {
            None | Some(CellValue::Empty) => Modification::Cleared,
            Some(v) => Modification::Set(v),
        }
    }

    /// Cell value this edit writes into a chunk.
    pub fn to_cell(&self) -> CellValue {
        match self {
            Modification::Set(v) => v.clone(),
            Modification::Cleared => CellValue::Empty,
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditStoreStats {
    pub chunk_entries: usize,
    pub modifications: usize,
    pub block_marks: usize,
    pub rev_entries: usize,
}

/// Chunk-bucketed overlays with a per-chunk revision stamp.
pub struct EditStore {
    grid: Grid,
    // key=chunk -> sample -> edit
    mods: HashMap<ChunkCoord, HashMap<SamplePos, Modification>>,
    marks: HashMap<ChunkCoord, HashMap<SamplePos, BlockMark>>,
    rev: HashMap<ChunkCoord, u64>,
    counter: u64,
}

impl EditStore {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            mods: HashMap::new(),
            marks: HashMap::new(),
            rev: HashMap::new(),
            counter: 0,
        }
    }

    pub fn stats(&self) -> EditStoreStats {
        let keys: std::collections::HashSet<&ChunkCoord> =
            self.mods.keys().chain(self.marks.keys()).collect();
        EditStoreStats {
            chunk_entries: keys.len(),
            modifications: self.mods.values().map(|m| m.len()).sum(),
            block_marks: self.marks.values().map(|m| m.len()).sum(),
            rev_entries: self.rev.len(),
        }
    }

    #[inline]
    fn chunk_key(&self, s: SamplePos) -> ChunkCoord {
        self.grid.chunk_of_sample(s)
    }

    pub fn modification(&self, s: SamplePos) -> Option<&Modification> {
        self.mods.get(&self.chunk_key(s)).and_then(|m| m.get(&s))
    }

    #[inline]
    pub fn has_modification(&self, s: SamplePos) -> bool {
        self.modification(s).is_some()
    }

    /// Records an edit and returns the new revision stamp of its chunk.
    pub fn set_modification(&mut self, s: SamplePos, m: Modification) -> u64 {
        let k = self.chunk_key(s);
        self.mods.entry(k).or_default().insert(s, m);
        self.bump(k)
    }

    pub fn block_mark(&self, s: SamplePos) -> Option<BlockMark> {
        self.marks
            .get(&self.chunk_key(s))
            .and_then(|m| m.get(&s).copied())
    }

    pub fn set_block_mark(&mut self, s: SamplePos, mark: BlockMark) -> Option<BlockMark> {
        let k = self.chunk_key(s);
        let prev = self.marks.entry(k).or_default().insert(s, mark);
        self.bump(k);
        prev
    }

    pub fn remove_block_mark(&mut self, s: SamplePos) -> Option<BlockMark> {
        let k = self.chunk_key(s);
        let bucket = self.marks.get_mut(&k)?;
        let prev = bucket.remove(&s)?;
        if bucket.is_empty() {
            self.marks.remove(&k);
        }
        self.bump(k);
        Some(prev)
    }

    /// Edits inside one chunk, in row-major sample order.
    pub fn modifications_in_chunk(&self, c: ChunkCoord) -> Vec<(SamplePos, Modification)> {
        let Some(m) = self.mods.get(&c) else {
            return Vec::new();
        };
        let mut out: Vec<(SamplePos, Modification)> =
            m.iter().map(|(k, v)| (*k, v.clone())).collect();
        out.sort_by_key(|(s, _)| (s.y, s.x));
        out
    }

    /// Latest change stamp touching chunk `c`; 0 when it was never edited.
    pub fn get_rev(&self, c: ChunkCoord) -> u64 {
        self.rev.get(&c).copied().unwrap_or(0)
    }

    fn bump(&mut self, c: ChunkCoord) -> u64 {
        self.counter = self.counter.wrapping_add(1).max(1);
        self.rev.insert(c, self.counter);
        self.counter
    }
}
