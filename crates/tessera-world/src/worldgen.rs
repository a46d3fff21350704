use std::path::Path;
use std::time::Instant;

use serde::de::DeserializeOwned;

use tessera_blocks::{DocError, doc};
use tessera_chunk::Chunk;
use tessera_geom::{ChunkCoord, Grid};

use crate::config::WorldConfig;
use crate::rules::{RuleSet, select_chunk_type};
use crate::spec::{ChunkTypeSpec, ChunkTypes};
use crate::synth::{SynthOptions, Synthesizer};

/// Everything needed to synthesize any chunk. Immutable once built, so it can
/// be shared behind an `Arc` between the store and background workers.
#[derive(Clone, Debug)]
pub struct WorldGen {
    synth: Synthesizer,
    rules: RuleSet,
    types: ChunkTypes,
}

impl WorldGen {
    pub fn new(grid: Grid, seed: u64, rules: RuleSet, types: ChunkTypes) -> Self {
        let wg = Self {
            synth: Synthesizer::new(grid, seed),
            rules,
            types,
        };
        for name in wg.rules.referenced_types() {
            if wg.types.get(name).is_none() {
                log::warn!("generation rules name unknown chunk type '{}'", name);
            }
        }
        wg
    }

    /// Loads both documents named by `cfg`; a missing path means an empty document.
    pub fn from_config(cfg: &WorldConfig) -> Result<Self, DocError> {
        let rules = match &cfg.rules {
            Some(p) => doc::load_path(p)?,
            None => RuleSet::default(),
        };
        let types = match &cfg.chunk_types {
            Some(p) => doc::load_path(p)?,
            None => ChunkTypes::default(),
        };
        Ok(Self::new(cfg.grid(), cfg.seed, rules, types))
    }

    /// Like [`from_config`](Self::from_config) but never fails: each document
    /// that cannot be loaded is replaced by an empty one.
    pub fn load_or_default(cfg: &WorldConfig) -> Self {
        let rules: RuleSet = load_or_warn(cfg.rules.as_deref(), "generation rules");
        let types: ChunkTypes = load_or_warn(cfg.chunk_types.as_deref(), "chunk types");
        log::info!(
            "worldgen: seed={} rules={} chunk_types={}",
            cfg.seed,
            rules.rules.len(),
            types.len()
        );
        Self::new(cfg.grid(), cfg.seed, rules, types)
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        self.synth.grid()
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.synth.seed()
    }

    #[inline]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    #[inline]
    pub fn chunk_types(&self) -> &ChunkTypes {
        &self.types
    }

    #[inline]
    pub fn chunk_type_for(&self, coord: ChunkCoord) -> Option<&str> {
        select_chunk_type(coord, &self.rules, self.seed(), self.grid())
    }

    #[inline]
    pub fn spec(&self, name: &str) -> Option<&ChunkTypeSpec> {
        self.types.get(name)
    }

    /// Resolves the chunk type for `coord` and synthesizes it.
    pub fn generate(&self, coord: ChunkCoord) -> Chunk {
        let t0 = Instant::now();
        let name = self.chunk_type_for(coord);
        let spec = name.and_then(|n| self.types.get(n));
        let chunk = self.synth.synthesize(coord, spec, SynthOptions::default());
        log::info!(
            target: "perf",
            "ms={:.3} chunk_gen cx={} cy={} type={}",
            t0.elapsed().as_secs_f64() * 1000.0,
            coord.cx,
            coord.cy,
            name.unwrap_or("-")
        );
        chunk
    }

    /// Synthesizes a named type with explicit options; unknown names give an empty chunk.
    pub fn generate_named(&self, coord: ChunkCoord, name: &str, options: SynthOptions) -> Chunk {
        let spec = self.types.get(name);
        if spec.is_none() {
            log::warn!("chunk ({}, {}): unknown chunk type '{}'", coord.cx, coord.cy, name);
        }
        self.synth.synthesize(coord, spec, options)
    }
}

fn load_or_warn<T: DeserializeOwned + Default>(path: Option<&Path>, what: &str) -> T {
    let Some(path) = path else {
        log::warn!("{} not configured; using an empty document", what);
        return T::default();
    };
    match doc::load_path(path) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("{} unavailable ({}): {}", what, path.display(), e);
            T::default()
        }
    }
}
