use std::sync::Arc;

use tessera_blocks::{BlockDef, BlockMode, BlockRegistry, CellValue, Rotation};
use tessera_geom::{Grid, SamplePos};

/// Which layer produced a resolved tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TileOrigin {
    Modification,
    BlockOverlay,
    Generated,
}

/// A non-empty tile as seen by readers.
#[derive(Clone, Debug, PartialEq)]
pub struct TileView {
    /// `None` for anonymous block-overlay tiles.
    pub id: Option<String>,
    pub mode: BlockMode,
    pub rotation: Rotation,
    pub invert: bool,
    pub def: Option<Arc<BlockDef>>,
    pub source: TileOrigin,
}

impl TileView {
    /// Resolves a stored cell; empty cells and the named empty block give `None`.
    pub fn resolve(registry: &BlockRegistry, cell: &CellValue, source: TileOrigin) -> Option<Self> {
        if cell.is_empty() {
            return None;
        }
        let id = cell.id()?;
        let def = registry.get(id).cloned();
        Some(TileView {
            id: Some(id.to_string()),
            mode: def.as_ref().map(|d| d.mode).unwrap_or_default(),
            rotation: cell.rotation(),
            invert: cell.invert(),
            def,
            source,
        })
    }

    pub fn anonymous(mode: BlockMode) -> Self {
        TileView {
            id: None,
            mode,
            rotation: Rotation::R0,
            invert: false,
            def: None,
            source: TileOrigin::BlockOverlay,
        }
    }

    #[inline]
    pub fn is_solid(&self) -> bool {
        self.mode.is_solid()
    }

    #[inline]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Anything that can resolve tiles by sample coordinate. Resolution may
/// materialize chunks, hence `&mut self`.
pub trait TileSource {
    fn sample_grid(&self) -> Grid;
    fn tile(&mut self, s: SamplePos) -> Option<TileView>;
}

impl<T: TileSource + ?Sized> TileSource for &mut T {
    fn sample_grid(&self) -> Grid {
        (**self).sample_grid()
    }

    fn tile(&mut self, s: SamplePos) -> Option<TileView> {
        (**self).tile(s)
    }
}
