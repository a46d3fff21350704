//! Chunk-type documents: background, stamped regions, and special directives.

use serde::Deserialize;
use std::collections::BTreeMap;

use tessera_blocks::Rotation;
use tessera_noise::{NoiseParams, mix_seed};

const CAVE_SALT: u64 = 0x4341_5645;

/// `{ <type>: { data: { ... } } }`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct ChunkTypes {
    pub types: BTreeMap<String, ChunkTypeEntry>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChunkTypeEntry {
    #[serde(default)]
    pub data: ChunkTypeSpec,
}

impl ChunkTypes {
    #[inline]
    pub fn get(&self, name: &str) -> Option<&ChunkTypeSpec> {
        self.types.get(name).map(|e| &e.data)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: ChunkTypeSpec) {
        self.types.insert(name.into(), ChunkTypeEntry { data: spec });
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChunkTypeSpec {
    #[serde(default, alias = "background")]
    pub bg: Option<String>,
    #[serde(default)]
    pub regions: Vec<RegionSpec>,
    #[serde(default)]
    pub specials: Vec<Special>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RegionSpec {
    /// Two corners, any order, inclusive, in local cell coordinates.
    pub region: [[i64; 2]; 2],
    #[serde(default)]
    pub block_type: Option<String>,
    #[serde(default)]
    pub rotation: Option<i64>,
    #[serde(default)]
    pub invert: Option<bool>,
    #[serde(default)]
    pub special: Option<Special>,
}

impl RegionSpec {
    /// Normalized `(x0, y0, x1, y1)` clamped to a `w x h` chunk, or `None`
    /// when the region misses the chunk entirely.
    pub fn clamped(&self, w: usize, h: usize) -> Option<(usize, usize, usize, usize)> {
        if w == 0 || h == 0 {
            return None;
        }
        let [[ax, ay], [bx, by]] = self.region;
        let (x0, x1) = (ax.min(bx), ax.max(bx));
        let (y0, y1) = (ay.min(by), ay.max(by));
        let (wmax, hmax) = (w as i64 - 1, h as i64 - 1);
        if x1 < 0 || y1 < 0 || x0 > wmax || y0 > hmax {
            return None;
        }
        Some((
            x0.max(0) as usize,
            y0.max(0) as usize,
            x1.min(wmax) as usize,
            y1.min(hmax) as usize,
        ))
    }

    pub fn rotation(&self) -> Rotation {
        match self.rotation {
            None => Rotation::R0,
            Some(deg) => Rotation::from_degrees(deg).unwrap_or_else(|| {
                log::warn!("region rotation {} is not a quarter turn; using 0", deg);
                Rotation::R0
            }),
        }
    }

    #[inline]
    pub fn invert(&self) -> bool {
        self.invert.unwrap_or(false)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Special {
    Caves(CaveSpec),
    Ores(OreSpec),
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CaveSpec {
    #[serde(default = "default_cave_scale")]
    pub scale: f64,
    #[serde(default = "default_cave_octaves")]
    pub octaves: u32,
    #[serde(default = "default_persistence")]
    pub persistence: f64,
    #[serde(default = "default_lacunarity")]
    pub lacunarity: f64,
    // Continuous carve threshold, used when no split is given
    #[serde(default = "default_cave_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub split: Option<f64>,
    // Per-chunk normalization breaks seams between chunks; off unless asked for
    #[serde(default)]
    pub normalize: bool,
    #[serde(default)]
    pub connect: bool,
    #[serde(default = "default_thickness")]
    pub thickness: u32,
    #[serde(default)]
    pub seed_offset: u64,
}

fn default_cave_scale() -> f64 {
    24.0
}
fn default_cave_octaves() -> u32 {
    3
}
fn default_persistence() -> f64 {
    0.5
}
fn default_lacunarity() -> f64 {
    2.0
}
fn default_cave_threshold() -> f64 {
    0.35
}
fn default_thickness() -> u32 {
    1
}

impl Default for CaveSpec {
    fn default() -> Self {
        Self {
            scale: default_cave_scale(),
            octaves: default_cave_octaves(),
            persistence: default_persistence(),
            lacunarity: default_lacunarity(),
            threshold: default_cave_threshold(),
            split: None,
            normalize: false,
            connect: false,
            thickness: default_thickness(),
            seed_offset: 0,
        }
    }
}

impl CaveSpec {
    /// Noise parameters for a field whose top-left cell is sample `(ox, oy)`.
    pub fn noise_params(&self, seed: u64, ox: i64, oy: i64) -> NoiseParams {
        let mut p = NoiseParams {
            scale: self.scale,
            octaves: self.octaves,
            persistence: self.persistence,
            lacunarity: self.lacunarity,
            seed: mix_seed(seed.wrapping_add(self.seed_offset), CAVE_SALT),
            offset: (ox as f64, oy as f64),
            normalize: self.normalize,
            split: None,
            connect: None,
        };
        if let Some(split) = self.binary_split() {
            p = p.with_split(split);
            if self.connect {
                p = p.with_connectivity(self.thickness);
            }
        }
        p
    }

    #[inline]
    pub fn binary_split(&self) -> Option<f64> {
        self.split.filter(|s| *s >= 0.0)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct OreSpec {
    #[serde(default)]
    pub ores: Vec<OreEntry>,
    #[serde(default)]
    pub seed_offset: u64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct OreEntry {
    pub block_type: String,
    #[serde(default)]
    pub chance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
        [plains.data]
        bg = "stone"

        [[plains.data.regions]]
        region = [[15, 3], [0, 0]]
        block_type = "air"

        [[plains.data.regions]]
        region = [[2, 8], [4, 9]]
        block_type = "log"
        rotation = 90
        special = { type = "ores", ores = [{ block_type = "amber", chance = 0.5 }] }

        [[plains.data.specials]]
        type = "caves"
        split = 0.6
        connect = true
        thickness = 2

        [[plains.data.specials]]
        type = "volcano"

        [empty.data]
    "#;

    #[test]
    fn parses_chunk_type_document() {
        let types: ChunkTypes = toml::from_str(DOC).unwrap();
        assert_eq!(types.len(), 2);
        let plains = types.get("plains").unwrap();
        assert_eq!(plains.bg.as_deref(), Some("stone"));
        assert_eq!(plains.regions.len(), 2);
        assert_eq!(plains.regions[1].rotation(), Rotation::R90);
        assert!(matches!(plains.regions[1].special, Some(Special::Ores(_))));
        match &plains.specials[0] {
            Special::Caves(c) => {
                assert_eq!(c.binary_split(), Some(0.6));
                assert!(c.connect);
                assert_eq!(c.thickness, 2);
                assert_eq!(c.scale, default_cave_scale());
            }
            other => panic!("expected caves, got {other:?}"),
        }
        assert_eq!(plains.specials[1], Special::Unknown);
        let empty = types.get("empty").unwrap();
        assert!(empty.bg.is_none() && empty.regions.is_empty());
    }

    #[test]
    fn json_document_has_the_same_shape() {
        let json = r#"{ "plains": { "data": { "bg": "stone",
            "regions": [ { "region": [[0,0],[15,3]], "block_type": "air" } ],
            "specials": [ { "type": "ores", "ores": [ { "block_type": "iron", "chance": 0.1 } ] } ] } } }"#;
        let types: ChunkTypes = serde_json::from_str(json).unwrap();
        let plains = types.get("plains").unwrap();
        assert_eq!(plains.regions[0].clamped(16, 16), Some((0, 0, 15, 3)));
        assert!(matches!(&plains.specials[0], Special::Ores(o) if o.ores[0].block_type == "iron"));
    }

    #[test]
    fn region_clamping() {
        let r = |a: [i64; 2], b: [i64; 2]| RegionSpec {
            region: [a, b],
            block_type: None,
            rotation: None,
            invert: None,
            special: None,
        };
        assert_eq!(r([-5, -5], [3, 2]).clamped(16, 16), Some((0, 0, 3, 2)));
        assert_eq!(r([10, 20], [40, 12]).clamped(16, 16), Some((10, 12, 15, 15)));
        assert_eq!(r([16, 0], [20, 5]).clamped(16, 16), None);
        assert_eq!(r([-3, 0], [-1, 5]).clamped(16, 16), None);
        assert_eq!(r([0, 0], [0, 0]).clamped(0, 16), None);
    }

    #[test]
    fn invalid_rotation_falls_back_to_zero() {
        let mut r: RegionSpec = toml::from_str("region = [[0, 0], [1, 1]]\nrotation = 45").unwrap();
        assert_eq!(r.rotation(), Rotation::R0);
        r.rotation = Some(-90);
        assert_eq!(r.rotation(), Rotation::R270);
    }

    #[test]
    fn cave_params_only_connect_when_binarized() {
        let mut c = CaveSpec {
            connect: true,
            ..CaveSpec::default()
        };
        assert!(c.noise_params(1, 0, 0).connect.is_none());
        c.split = Some(0.5);
        let p = c.noise_params(1, 32, -16);
        assert_eq!(p.split, Some(0.5));
        assert_eq!(p.connect.map(|k| k.thickness), Some(1));
        assert_eq!(p.offset, (32.0, -16.0));
        c.split = Some(-1.0);
        assert!(c.noise_params(1, 0, 0).split.is_none());
    }
}
