use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

// Top-level block-definition document: one table per identifier, plus an
// optional default solid identifier used when a write value is malformed.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct BlocksConfig {
    #[serde(default)]
    pub fallback_block: Option<String>,
    #[serde(flatten)]
    pub blocks: BTreeMap<String, BlockEntry>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct BlockEntry {
    #[serde(default)]
    pub data: BlockData,
    #[serde(default)]
    pub texture: Option<TextureDef>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct BlockData {
    // Parsed leniently; unknown modes fall back to solid with a warning
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub hardness: Option<f64>,
    // Anything else the game attaches to a block (drops, sounds, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TextureDef {
    pub tilemap: String,
    #[serde(default)]
    pub pos: [u32; 2],
}
