use std::sync::Arc;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use serde_json::Value;

use tessera_blocks::{BlockMark, BlockMode, BlockRegistry, CellValue};
use tessera_chunk::Chunk;
use tessera_edit::{EditStore, EditStoreStats, Modification};
use tessera_geom::{ChunkCoord, Grid, SamplePos};
use tessera_world::{SynthOptions, WorldConfig, WorldGen};

use crate::import::{ImportCell, ImportData};
use crate::observer::{StoreEvent, StoreObserver};
use crate::tile::{TileOrigin, TileSource, TileView};

/// Imported chunks may cover at most this many chunk areas.
const MAX_IMPORT_AREA: usize = 16;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub chunks: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub generated: u64,
    pub adopted: u64,
    pub imported: u64,
    pub tile_writes: u64,
}

/// Loads the block registry named by `cfg`, or an empty one with a warning.
pub fn load_registry_or_default(cfg: &WorldConfig) -> BlockRegistry {
    let Some(path) = cfg.blocks.as_deref() else {
        log::warn!("block definitions not configured; every block resolves as solid");
        return BlockRegistry::new();
    };
    match BlockRegistry::load_from_path(path) {
        Ok(reg) => reg,
        Err(e) => {
            log::warn!("block definitions unavailable ({}): {}", path.display(), e);
            BlockRegistry::new()
        }
    }
}

pub struct ChunkStoreBuilder {
    world: Arc<WorldGen>,
    registry: Arc<BlockRegistry>,
    observers: Vec<Box<dyn StoreObserver>>,
}

impl ChunkStoreBuilder {
    pub fn registry(mut self, registry: Arc<BlockRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn observer(mut self, observer: impl StoreObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn build(self) -> ChunkStore {
        let grid = *self.world.grid();
        ChunkStore {
            world: self.world,
            registry: self.registry,
            chunks: HashMap::new(),
            edits: EditStore::new(grid),
            observers: self.observers,
            stats: StoreStats::default(),
        }
    }
}

/// Owns every materialized chunk and both overlays for one world instance.
///
/// Reads resolve in a fixed order: modification overlay, then block overlay,
/// then the owning chunk (synthesized on first touch). A chunk is synthesized
/// into the cache at most once; afterwards its cells change only through
/// writes.
pub struct ChunkStore {
    world: Arc<WorldGen>,
    registry: Arc<BlockRegistry>,
    chunks: HashMap<ChunkCoord, Chunk>,
    edits: EditStore,
    observers: Vec<Box<dyn StoreObserver>>,
    stats: StoreStats,
}

impl ChunkStore {
    pub fn builder(world: Arc<WorldGen>) -> ChunkStoreBuilder {
        ChunkStoreBuilder {
            world,
            registry: Arc::new(BlockRegistry::new()),
            observers: Vec::new(),
        }
    }

    pub fn new(world: Arc<WorldGen>, registry: Arc<BlockRegistry>) -> Self {
        Self::builder(world).registry(registry).build()
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        self.world.grid()
    }

    #[inline]
    pub fn world(&self) -> &Arc<WorldGen> {
        &self.world
    }

    #[inline]
    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    #[inline]
    pub fn edits(&self) -> &EditStore {
        &self.edits
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            chunks: self.chunks.len(),
            ..self.stats
        }
    }

    #[inline]
    pub fn edit_stats(&self) -> EditStoreStats {
        self.edits.stats()
    }

    /// Change stamp of the overlays touching `coord`; 0 when never edited.
    #[inline]
    pub fn chunk_revision(&self, coord: ChunkCoord) -> u64 {
        self.edits.get_rev(coord)
    }

    #[inline]
    pub fn has_chunk(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Cached chunk without materializing it.
    #[inline]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn chunk_coords(&self) -> Vec<ChunkCoord> {
        let mut v: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
        v.sort();
        v
    }

    /// Returns the cached chunk, synthesizing it on first access.
    pub fn ensure_chunk(&mut self, cx: i32, cy: i32) -> &Chunk {
        let coord = ChunkCoord::new(cx, cy);
        if self.chunks.contains_key(&coord) {
            self.stats.cache_hits += 1;
            return &self.chunks[&coord];
        }
        self.stats.cache_misses += 1;
        log::debug!("chunk cache miss ({}, {})", cx, cy);
        let chunk = self.world.generate(coord);
        self.stats.generated += 1;
        self.install(chunk)
    }

    /// Installs a chunk synthesized elsewhere. Rejected when the coordinate
    /// is already cached so no chunk is ever synthesized into the cache twice.
    pub fn adopt_chunk(&mut self, chunk: Chunk) -> bool {
        if self.chunks.contains_key(&chunk.coord) {
            log::debug!(
                "adopt rejected: chunk ({}, {}) already cached",
                chunk.coord.cx,
                chunk.coord.cy
            );
            return false;
        }
        self.stats.adopted += 1;
        self.install(chunk);
        true
    }

    pub fn get_tile(&mut self, sx: i32, sy: i32) -> Option<TileView> {
        let s = SamplePos::new(sx, sy);
        if let Some(m) = self.edits.modification(s) {
            return match m {
                Modification::Cleared => None,
                Modification::Set(v) => TileView::resolve(&self.registry, v, TileOrigin::Modification),
            };
        }
        if let Some(mark) = self.edits.block_mark(s) {
            return Some(TileView::anonymous(mark.mode));
        }
        let grid = *self.grid();
        let coord = grid.chunk_of_sample(s);
        let (lx, ly) = grid.local_of_sample(s);
        let registry = Arc::clone(&self.registry);
        let chunk = self.ensure_chunk(coord.cx, coord.cy);
        TileView::resolve(&registry, chunk.get_local(lx, ly)?, TileOrigin::Generated)
    }

    /// `None` for non-finite or out-of-range pixels as well as empty tiles.
    pub fn get_tile_at_pixel(&mut self, px: f64, py: f64) -> Option<TileView> {
        let s = self.grid().sample_of_pixel(px, py)?;
        self.get_tile(s.x, s.y)
    }

    /// Permanent edit. `None` clears the tile. The owning chunk is patched only
    /// if it is already materialized; otherwise the edit is replayed when it is.
    pub fn set_tile(&mut self, sx: i32, sy: i32, value: Option<CellValue>) {
        let s = SamplePos::new(sx, sy);
        let m = Modification::from_value(value.clone());
        let grid = *self.grid();
        if let Some(chunk) = self.chunks.get_mut(&grid.chunk_of_sample(s)) {
            chunk.set_sample(&grid, s, m.to_cell());
        }
        self.edits.set_modification(s, m);
        self.stats.tile_writes += 1;
        self.emit(StoreEvent::TileModified { pos: s, value });
    }

    /// Dynamic write: `null`, an identifier, or `{id, rot?, invert?}`. Any
    /// other shape writes the registry's fallback solid block.
    pub fn set_tile_value(&mut self, sx: i32, sy: i32, value: &Value) {
        let cell = match CellValue::from_json(value) {
            Some(CellValue::Empty) => None,
            Some(c) => Some(c),
            None => {
                log::debug!(
                    "malformed tile value {} at ({}, {}); writing '{}'",
                    value,
                    sx,
                    sy,
                    self.registry.fallback_id()
                );
                Some(CellValue::block(self.registry.fallback_id()))
            }
        };
        self.set_tile(sx, sy, cell);
    }

    /// Drops a block-overlay entry. Modifications are untouched.
    pub fn remove_block(&mut self, sx: i32, sy: i32) -> bool {
        self.edits.remove_block_mark(SamplePos::new(sx, sy)).is_some()
    }

    /// Replaces the chunk at `(cx, cy)` with externally supplied contents.
    pub fn import_chunk(&mut self, cx: i32, cy: i32, data: ImportData) -> &Chunk {
        let coord = ChunkCoord::new(cx, cy);
        let n = self.grid().chunk_size() as usize;
        let max_cells = self.grid().cells_per_chunk().saturating_mul(MAX_IMPORT_AREA);
        let (chunk, legacy) = match data {
            ImportData::Named(name) => Some((
                self.world.generate_named(coord, &name, SynthOptions::imported()),
                Vec::new(),
            )),
            ImportData::Flat(cells) => {
                let height = cells.len().div_ceil(n);
                build_imported(coord, n, height, cells, max_cells)
            }
            ImportData::Sized {
                width,
                height,
                data,
            } => build_imported(coord, width, height, data, max_cells),
        }
        .unwrap_or_else(|| {
            log::warn!(
                "import for chunk ({}, {}) exceeds {} cells, storing an empty chunk",
                cx,
                cy,
                max_cells
            );
            (Chunk::empty(coord, n), Vec::new())
        });

        let grid = *self.grid();
        let (ox, oy) = grid.chunk_origin_sample(coord);
        let mut marked = 0usize;
        for (lx, ly) in legacy {
            // only samples this chunk owns
            if lx >= n || ly >= n {
                continue;
            }
            let (Ok(x), Ok(y)) = (
                i32::try_from(ox + lx as i64),
                i32::try_from(oy + ly as i64),
            ) else {
                continue;
            };
            let s = SamplePos::new(x, y);
            if self.edits.has_modification(s) {
                continue;
            }
            self.edits.set_block_mark(
                s,
                BlockMark {
                    mode: BlockMode::Solid,
                },
            );
            marked += 1;
        }
        log::debug!(
            "imported chunk ({}, {}) {}x{}, {} legacy solid marks",
            cx,
            cy,
            chunk.width,
            chunk.height,
            marked
        );
        self.stats.imported += 1;
        self.install(chunk)
    }

    fn install(&mut self, mut chunk: Chunk) -> &Chunk {
        let coord = chunk.coord;
        let grid = *self.grid();
        for (s, m) in self.edits.modifications_in_chunk(coord) {
            chunk.set_sample(&grid, s, m.to_cell());
        }
        self.emit(StoreEvent::ChunkGenerated { coord });
        match self.chunks.entry(coord) {
            Entry::Occupied(mut e) => {
                e.insert(chunk);
                e.into_mut()
            }
            Entry::Vacant(e) => e.insert(chunk),
        }
    }

    fn emit(&mut self, event: StoreEvent) {
        for o in &mut self.observers {
            o.on_event(&event);
        }
    }
}

/// Splits imported cells into chunk cells and the local positions of legacy
/// solid markers. `None` when `width * height` overflows or exceeds
/// `max_cells`.
fn build_imported(
    coord: ChunkCoord,
    width: usize,
    height: usize,
    cells: Vec<ImportCell>,
    max_cells: usize,
) -> Option<(Chunk, Vec<(usize, usize)>)> {
    let total = width.checked_mul(height).filter(|&t| t <= max_cells)?;
    let mut legacy = Vec::new();
    let mut out = Vec::with_capacity(total);
    for (i, cell) in cells.into_iter().take(total).enumerate() {
        if cell.is_legacy_solid() {
            legacy.push((i % width, i / width));
        }
        out.push(cell.into_cell());
    }
    Some((Chunk::from_cells_local(coord, width, height, out)?, legacy))
}

impl TileSource for ChunkStore {
    fn sample_grid(&self) -> Grid {
        *self.grid()
    }

    fn tile(&mut self, s: SamplePos) -> Option<TileView> {
        self.get_tile(s.x, s.y)
    }
}
