//! Turns a chunk-type spec into a chunk's cells.
//!
//! Order of operations: background fill, region stamps (document order),
//! region-scoped specials (region order), then chunk-wide specials. Every
//! random decision hashes the seed with world sample coordinates, so output
//! depends only on `(coord, spec, seed, options)`.

use tessera_blocks::CellValue;
use tessera_chunk::Chunk;
use tessera_geom::{ChunkCoord, Grid};
use tessera_noise::{generate, hash01, mix_seed};

use crate::spec::{CaveSpec, ChunkTypeSpec, OreSpec, Special};

const ORE_SALT: u64 = 0x4f52_4500_0000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SynthOptions {
    pub carve_caves: bool,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self { carve_caves: true }
    }
}

impl SynthOptions {
    /// Options for re-synthesizing a named type on import: no cave carving.
    pub const fn imported() -> Self {
        Self { carve_caves: false }
    }
}

/// Inclusive rectangle of local cells.
#[derive(Clone, Copy, Debug)]
struct Area {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

impl Area {
    #[inline]
    fn width(&self) -> usize {
        self.x1 - self.x0 + 1
    }

    #[inline]
    fn height(&self) -> usize {
        self.y1 - self.y0 + 1
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Synthesizer {
    grid: Grid,
    seed: u64,
}

impl Synthesizer {
    pub fn new(grid: Grid, seed: u64) -> Self {
        Self { grid, seed }
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn synthesize(
        &self,
        coord: ChunkCoord,
        spec: Option<&ChunkTypeSpec>,
        options: SynthOptions,
    ) -> Chunk {
        let n = self.grid.chunk_size() as usize;
        let Some(spec) = spec else {
            return Chunk::empty(coord, n);
        };
        let bg = spec
            .bg
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(CellValue::block)
            .unwrap_or_default();
        let mut chunk = Chunk::filled(coord, n, n, bg);

        for region in &spec.regions {
            let (Some(id), Some((x0, y0, x1, y1))) =
                (region.block_type.as_deref(), region.clamped(n, n))
            else {
                continue;
            };
            let value = CellValue::placed(id, region.rotation(), region.invert());
            for y in y0..=y1 {
                for x in x0..=x1 {
                    chunk.set_local(x, y, value.clone());
                }
            }
        }

        for region in &spec.regions {
            if let (Some(special), Some((x0, y0, x1, y1))) = (&region.special, region.clamped(n, n)) {
                self.apply_special(&mut chunk, special, Area { x0, y0, x1, y1 }, options);
            }
        }

        let whole = Area {
            x0: 0,
            y0: 0,
            x1: n - 1,
            y1: n - 1,
        };
        for special in &spec.specials {
            self.apply_special(&mut chunk, special, whole, options);
        }
        chunk
    }

    fn apply_special(&self, chunk: &mut Chunk, special: &Special, area: Area, options: SynthOptions) {
        match special {
            Special::Caves(caves) if options.carve_caves => self.carve_caves(chunk, caves, area),
            Special::Caves(_) => {}
            Special::Ores(ores) => self.spread_ores(chunk, ores, area),
            Special::Unknown => {
                log::warn!(
                    "chunk ({}, {}): unsupported special directive skipped",
                    chunk.coord.cx,
                    chunk.coord.cy
                );
            }
        }
    }

    fn carve_caves(&self, chunk: &mut Chunk, caves: &CaveSpec, area: Area) {
        let (ox, oy) = self.grid.chunk_origin_sample(chunk.coord);
        let params = caves.noise_params(self.seed, ox + area.x0 as i64, oy + area.y0 as i64);
        let field = generate(area.width(), area.height(), &params);
        let binary = caves.binary_split().is_some();
        let mut carved = 0usize;
        for ly in 0..area.height() {
            for lx in 0..area.width() {
                let open = if binary {
                    field.is_set(lx, ly)
                } else {
                    field.get(lx, ly) > caves.threshold
                };
                if open && chunk.set_local(area.x0 + lx, area.y0 + ly, CellValue::Empty) {
                    carved += 1;
                }
            }
        }
        log::trace!(
            "chunk ({}, {}): carved {} cells",
            chunk.coord.cx,
            chunk.coord.cy,
            carved
        );
    }

    fn spread_ores(&self, chunk: &mut Chunk, ores: &OreSpec, area: Area) {
        if ores.ores.is_empty() {
            return;
        }
        let base = self.seed.wrapping_add(ores.seed_offset);
        let streams: Vec<u64> = (0..ores.ores.len())
            .map(|i| mix_seed(base, ORE_SALT + i as u64))
            .collect();
        let (ox, oy) = self.grid.chunk_origin_sample(chunk.coord);
        for y in area.y0..=area.y1 {
            for x in area.x0..=area.x1 {
                if chunk.get_local(x, y).is_none_or(CellValue::is_empty) {
                    continue;
                }
                let (sx, sy) = (ox + x as i64, oy + y as i64);
                let hit = ores
                    .ores
                    .iter()
                    .zip(&streams)
                    .find(|(ore, stream)| hash01(**stream, sx, sy) < ore.chance);
                if let Some((ore, _)) = hit {
                    chunk.set_local(x, y, CellValue::block(ore.block_type.as_str()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ChunkTypes, OreEntry, RegionSpec};
    use tessera_blocks::Rotation;
    use tessera_noise::NoiseParams;

    fn synth() -> Synthesizer {
        Synthesizer::new(Grid::new(16.0, 16), 0)
    }

    fn plains() -> ChunkTypeSpec {
        let types: ChunkTypes = toml::from_str(
            r#"
            [plains.data]
            bg = "stone"

            [[plains.data.regions]]
            region = [[0, 0], [15, 3]]
            block_type = "air"
        "#,
        )
        .unwrap();
        types.get("plains").unwrap().clone()
    }

    fn region(a: [i64; 2], b: [i64; 2], id: &str) -> RegionSpec {
        RegionSpec {
            region: [a, b],
            block_type: Some(id.into()),
            rotation: None,
            invert: None,
            special: None,
        }
    }

    #[test]
    fn no_spec_is_all_empty() {
        let c = synth().synthesize(ChunkCoord::new(3, -2), None, SynthOptions::default());
        assert_eq!(c.cells.len(), 256);
        assert!(c.cells.iter().all(|v| *v == CellValue::Empty));
    }

    #[test]
    fn background_and_region_stamp() {
        let c = synth().synthesize(ChunkCoord::new(0, 0), Some(&plains()), SynthOptions::default());
        for y in 0..16 {
            for x in 0..16 {
                let expect = if y <= 3 { "air" } else { "stone" };
                assert_eq!(c.get_local(x, y), Some(&CellValue::block(expect)));
            }
        }
    }

    #[test]
    fn missing_background_is_empty_and_later_regions_win() {
        let spec = ChunkTypeSpec {
            bg: None,
            regions: vec![region([0, 0], [3, 3], "dirt"), region([2, 2], [5, 5], "clay")],
            specials: Vec::new(),
        };
        let c = synth().synthesize(ChunkCoord::new(0, 0), Some(&spec), SynthOptions::default());
        assert_eq!(c.get_local(1, 1), Some(&CellValue::block("dirt")));
        assert_eq!(c.get_local(3, 3), Some(&CellValue::block("clay")));
        assert_eq!(c.get_local(9, 9), Some(&CellValue::Empty));
    }

    #[test]
    fn transform_only_when_non_default() {
        let mut r = region([0, 0], [0, 0], "log");
        r.rotation = Some(180);
        let mut plain = region([1, 0], [1, 0], "log");
        plain.rotation = Some(0);
        plain.invert = Some(false);
        let spec = ChunkTypeSpec {
            bg: None,
            regions: vec![r, plain],
            specials: Vec::new(),
        };
        let c = synth().synthesize(ChunkCoord::new(0, 0), Some(&spec), SynthOptions::default());
        assert_eq!(
            c.get_local(0, 0),
            Some(&CellValue::placed("log", Rotation::R180, false))
        );
        assert_eq!(c.get_local(1, 0), Some(&CellValue::block("log")));
    }

    #[test]
    fn caves_threshold_extremes_and_import_skip() {
        let mut spec = plains();
        spec.specials.push(Special::Caves(CaveSpec {
            threshold: -1.0e9,
            ..CaveSpec::default()
        }));
        let s = synth();
        let carved = s.synthesize(ChunkCoord::new(0, 0), Some(&spec), SynthOptions::default());
        assert!(carved.is_all_empty());
        let imported = s.synthesize(ChunkCoord::new(0, 0), Some(&spec), SynthOptions::imported());
        assert_eq!(imported, s.synthesize(ChunkCoord::new(0, 0), Some(&plains()), SynthOptions::default()));
    }

    #[test]
    fn caves_are_continuous_across_chunks() {
        let caves = CaveSpec {
            threshold: 0.0,
            ..CaveSpec::default()
        };
        let mut spec = ChunkTypeSpec {
            bg: Some("stone".into()),
            ..ChunkTypeSpec::default()
        };
        spec.specials.push(Special::Caves(caves.clone()));
        let s = Synthesizer::new(Grid::new(16.0, 16), 77);
        let wide: NoiseParams = caves.noise_params(77, 0, 0);
        let field = generate(32, 16, &wide);
        for cx in 0..2 {
            let c = s.synthesize(ChunkCoord::new(cx, 0), Some(&spec), SynthOptions::default());
            for y in 0..16 {
                for x in 0..16 {
                    let open = field.get(cx as usize * 16 + x, y) > 0.0;
                    assert_eq!(c.get_local(x, y) == Some(&CellValue::Empty), open, "({cx}) {x},{y}");
                }
            }
        }
    }

    #[test]
    fn ores_replace_only_solid_cells_in_table_order() {
        let mut spec = plains();
        spec.specials.push(Special::Ores(OreSpec {
            ores: vec![
                OreEntry {
                    block_type: "gold".into(),
                    chance: 1.0,
                },
                OreEntry {
                    block_type: "iron".into(),
                    chance: 1.0,
                },
            ],
            seed_offset: 0,
        }));
        let c = synth().synthesize(ChunkCoord::new(0, 0), Some(&spec), SynthOptions::default());
        for y in 0..16 {
            for x in 0..16 {
                let expect = if y <= 3 { "air" } else { "gold" };
                assert_eq!(c.get_local(x, y), Some(&CellValue::block(expect)));
            }
        }
    }

    #[test]
    fn region_specials_stay_inside_their_region() {
        let mut r = region([4, 4], [7, 7], "stone");
        r.special = Some(Special::Ores(OreSpec {
            ores: vec![OreEntry {
                block_type: "gem".into(),
                chance: 1.0,
            }],
            seed_offset: 0,
        }));
        let spec = ChunkTypeSpec {
            bg: Some("stone".into()),
            regions: vec![r],
            specials: vec![Special::Unknown],
        };
        let c = synth().synthesize(ChunkCoord::new(0, 0), Some(&spec), SynthOptions::default());
        let gems = c.cells.iter().filter(|v| **v == CellValue::block("gem")).count();
        assert_eq!(gems, 16);
        assert_eq!(c.get_local(3, 4), Some(&CellValue::block("stone")));
    }

    #[test]
    fn synthesis_is_deterministic() {
        let mut spec = plains();
        spec.specials.push(Special::Caves(CaveSpec {
            split: Some(0.55),
            normalize: true,
            connect: true,
            ..CaveSpec::default()
        }));
        spec.specials.push(Special::Ores(OreSpec {
            ores: vec![OreEntry {
                block_type: "coal".into(),
                chance: 0.2,
            }],
            seed_offset: 3,
        }));
        let s = Synthesizer::new(Grid::new(16.0, 16), 4242);
        for (cx, cy) in [(0, 0), (-3, 7), (12, -1)] {
            let a = s.synthesize(ChunkCoord::new(cx, cy), Some(&spec), SynthOptions::default());
            let b = s.synthesize(ChunkCoord::new(cx, cy), Some(&spec), SynthOptions::default());
            assert_eq!(a, b);
        }
    }
}
