//! Visible-tile sweep: resolves tiles under a view and hands them to a draw target.
#![forbid(unsafe_code)]

use std::time::Instant;

use tessera_blocks::{BlockMode, BlockRegistry, Rotation, TextureBinding};
use tessera_geom::{SamplePos, ViewRect};
use tessera_store::TileSource;

/// Brightness of a sample in `[0, 1]`; only consulted below the surface line.
pub trait LightingOracle {
    fn brightness(&self, s: SamplePos) -> f64;
}

impl<F: Fn(SamplePos) -> f64> LightingOracle for F {
    fn brightness(&self, s: SamplePos) -> f64 {
        self(s)
    }
}

/// Every sample fully lit.
#[derive(Copy, Clone, Debug, Default)]
pub struct FullBright;

impl LightingOracle for FullBright {
    fn brightness(&self, _s: SamplePos) -> f64 {
        1.0
    }
}

/// Either a tilemap cell or a flat colour for blocks without a texture.
#[derive(Clone, Debug, PartialEq)]
pub enum TileFill {
    Texture(TextureBinding),
    Placeholder([u8; 3]),
}

/// One tile to draw, already positioned in pixel space.
#[derive(Clone, Debug, PartialEq)]
pub struct TileDraw {
    pub sample: SamplePos,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub id: Option<String>,
    pub mode: BlockMode,
    pub fill: TileFill,
    pub brightness: f64,
    pub rotation: Rotation,
    pub invert: bool,
}

impl TileDraw {
    /// Source rectangle `(x, y, w, h)` inside the tilemap, for `tile_px` square cells.
    pub fn source_rect(&self, tile_px: u32) -> Option<(u32, u32, u32, u32)> {
        match &self.fill {
            TileFill::Texture(t) => Some((t.col * tile_px, t.row * tile_px, tile_px, tile_px)),
            TileFill::Placeholder(_) => None,
        }
    }

    /// Placeholder colour scaled by brightness.
    pub fn shaded_color(&self) -> Option<[u8; 3]> {
        match self.fill {
            TileFill::Placeholder(c) => {
                let k = self.brightness;
                Some(c.map(|v| (f64::from(v) * k).round() as u8))
            }
            TileFill::Texture(_) => None,
        }
    }
}

pub trait DrawTarget {
    fn draw_tile(&mut self, tile: &TileDraw);
}

impl<T: DrawTarget + ?Sized> DrawTarget for &mut T {
    fn draw_tile(&mut self, tile: &TileDraw) {
        (**self).draw_tile(tile)
    }
}

/// Collects draws; useful for tests and offscreen consumers.
#[derive(Clone, Debug, Default)]
pub struct RecordingTarget {
    pub draws: Vec<TileDraw>,
}

impl DrawTarget for RecordingTarget {
    fn draw_tile(&mut self, tile: &TileDraw) {
        self.draws.push(tile.clone());
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DrawSettings {
    /// Rows above this sample row are drawn at full brightness.
    pub surface_line: i32,
    /// Extra tiles resolved around the view.
    pub pad: i32,
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            surface_line: 0,
            pad: 1,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub visited: usize,
    pub drawn: usize,
    pub placeholders: usize,
}

pub fn placeholder_color(mode: BlockMode) -> [u8; 3] {
    match mode {
        BlockMode::Solid => [128, 128, 128],
        BlockMode::Platform => [150, 105, 60],
        BlockMode::Background => [70, 60, 55],
        BlockMode::Liquid => [50, 90, 200],
    }
}

/// Resolves every sample under `view` (plus padding) and draws the non-empty ones.
pub fn draw<D, S, L>(
    target: &mut D,
    view: &ViewRect,
    mut tiles: S,
    registry: &BlockRegistry,
    lighting: &L,
    settings: &DrawSettings,
) -> SweepStats
where
    D: DrawTarget + ?Sized,
    S: TileSource,
    L: LightingOracle + ?Sized,
{
    let t0 = Instant::now();
    let mut stats = SweepStats::default();
    let grid = tiles.sample_grid();
    let Some(span) = grid.samples_covering(view, settings.pad) else {
        log::debug!("draw skipped: non-finite view {:?}", view);
        return stats;
    };
    let size = grid.tile_size();
    for s in span.iter() {
        stats.visited += 1;
        let Some(tile) = tiles.tile(s) else {
            continue;
        };
        let fill = match tile.id().and_then(|id| registry.texture_of(id)) {
            Some(t) => TileFill::Texture(t.clone()),
            None => {
                stats.placeholders += 1;
                TileFill::Placeholder(placeholder_color(tile.mode))
            }
        };
        let brightness = if s.y < settings.surface_line {
            1.0
        } else {
            let b = lighting.brightness(s);
            if b.is_nan() { 0.0 } else { b.clamp(0.0, 1.0) }
        };
        let (x, y) = grid.pixel_of_sample(s);
        target.draw_tile(&TileDraw {
            sample: s,
            x,
            y,
            size,
            id: tile.id,
            mode: tile.mode,
            fill,
            brightness,
            rotation: tile.rotation,
            invert: tile.invert,
        });
        stats.drawn += 1;
    }
    log::info!(
        target: "perf",
        "ms={:.3} draw visited={} drawn={} placeholders={}",
        t0.elapsed().as_secs_f64() * 1000.0,
        stats.visited,
        stats.drawn,
        stats.placeholders
    );
    stats
}
