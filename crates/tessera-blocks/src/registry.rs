use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use super::config::{BlockEntry, BlocksConfig};
use super::doc::{self, DocError, DocFormat};
use super::types::BlockMode;

pub const DEFAULT_FALLBACK_BLOCK: &str = "stone";
const DEFAULT_HARDNESS: f64 = 1.0;

/// Cell in a named tilemap, in tile units.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureBinding {
    pub tilemap: String,
    pub col: u32,
    pub row: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlockDef {
    pub id: String,
    pub mode: BlockMode,
    pub hardness: f64,
    pub texture: Option<TextureBinding>,
    pub extra: BTreeMap<String, Value>,
}

impl BlockDef {
    pub fn new(id: impl Into<String>, mode: BlockMode) -> Self {
        Self {
            id: id.into(),
            mode,
            hardness: DEFAULT_HARDNESS,
            texture: None,
            extra: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_texture(mut self, tilemap: impl Into<String>, col: u32, row: u32) -> Self {
        self.texture = Some(TextureBinding {
            tilemap: tilemap.into(),
            col,
            row,
        });
        self
    }

    fn from_entry(id: &str, entry: BlockEntry) -> Self {
        let mode = match entry.data.mode.as_deref() {
            None => BlockMode::Solid,
            Some(s) => s.parse().unwrap_or_else(|e| {
                log::warn!("block '{}': {}; using solid", id, e);
                BlockMode::Solid
            }),
        };
        Self {
            id: id.to_string(),
            mode,
            hardness: entry.data.hardness.unwrap_or(DEFAULT_HARDNESS),
            texture: entry.texture.map(|t| TextureBinding {
                tilemap: t.tilemap,
                col: t.pos[0],
                row: t.pos[1],
            }),
            extra: entry.data.extra,
        }
    }
}

/// Identifier -> definition lookup. Definitions are shared so resolved tiles
/// can hold on to them cheaply.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    defs: HashMap<String, Arc<BlockDef>>,
    fallback_id: String,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            defs: HashMap::new(),
            fallback_id: DEFAULT_FALLBACK_BLOCK.to_string(),
        }
    }

    pub fn from_config(cfg: BlocksConfig) -> Self {
        let mut reg = BlockRegistry::new();
        if let Some(name) = cfg.fallback_block.filter(|n| !n.is_empty()) {
            reg.fallback_id = name;
        }
        for (id, entry) in cfg.blocks {
            let def = BlockDef::from_entry(&id, entry);
            reg.defs.insert(id, Arc::new(def));
        }
        if !reg.defs.is_empty() && !reg.defs.contains_key(&reg.fallback_id) {
            log::warn!(
                "fallback block '{}' has no definition; it will resolve as default solid",
                reg.fallback_id
            );
        }
        reg
    }

    pub fn from_toml_str(s: &str) -> Result<Self, DocError> {
        Ok(Self::from_config(doc::parse_str(s, DocFormat::Toml)?))
    }

    pub fn from_json_str(s: &str) -> Result<Self, DocError> {
        Ok(Self::from_config(doc::parse_str(s, DocFormat::Json)?))
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, DocError> {
        let reg = Self::from_config(doc::load_path(path.as_ref())?);
        log::info!("loaded {} block definitions from {}", reg.len(), path.as_ref().display());
        Ok(reg)
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<&Arc<BlockDef>> {
        self.defs.get(id)
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.defs.contains_key(id)
    }

    /// Mode for `id`; identifiers without a definition are solid.
    #[inline]
    pub fn mode_of(&self, id: &str) -> BlockMode {
        self.defs.get(id).map(|d| d.mode).unwrap_or_default()
    }

    #[inline]
    pub fn texture_of(&self, id: &str) -> Option<&TextureBinding> {
        self.defs.get(id)?.texture.as_ref()
    }

    #[inline]
    pub fn fallback_id(&self) -> &str {
        &self.fallback_id
    }

    pub fn set_fallback_id(&mut self, id: impl Into<String>) {
        self.fallback_id = id.into();
    }

    pub fn insert(&mut self, def: BlockDef) -> Option<Arc<BlockDef>> {
        self.defs.insert(def.id.clone(), Arc::new(def))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Identifiers in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.defs.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
