use serde::Deserialize;
use std::path::{Path, PathBuf};

use tessera_blocks::{DocError, doc};
use tessera_geom::Grid;

/// Top-level `world.toml`. Every field has a default so an empty file is valid.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct WorldConfig {
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_tile_size")]
    pub tile_size: f64,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: i32,
    // Sample rows above this line are always fully lit
    #[serde(default = "default_surface_line")]
    pub surface_line: i32,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub rules: Option<PathBuf>,
    #[serde(default)]
    pub chunk_types: Option<PathBuf>,
    #[serde(default)]
    pub blocks: Option<PathBuf>,
}

fn default_tile_size() -> f64 {
    16.0
}
fn default_chunk_size() -> i32 {
    16
}
fn default_surface_line() -> i32 {
    0
}
fn default_workers() -> usize {
    4
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            tile_size: default_tile_size(),
            chunk_size: default_chunk_size(),
            surface_line: default_surface_line(),
            workers: default_workers(),
            rules: None,
            chunk_types: None,
            blocks: None,
        }
    }
}

impl WorldConfig {
    /// Loads the config and resolves document paths relative to its directory.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, DocError> {
        let path = path.as_ref();
        let mut cfg: WorldConfig = doc::load_path(path)?;
        if let Some(dir) = path.parent() {
            cfg.resolve_paths(dir);
        }
        Ok(cfg)
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        for p in [&mut self.rules, &mut self.chunk_types, &mut self.blocks]
            .into_iter()
            .flatten()
        {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
    }

    #[inline]
    pub fn grid(&self) -> Grid {
        Grid::new(self.tile_size, self.chunk_size)
    }
}
