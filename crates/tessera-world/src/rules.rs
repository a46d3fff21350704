//! Generation rules: map a chunk coordinate to a chunk-type name.
//!
//! Rules are evaluated in document order and the first rule whose conditions
//! all hold decides the chunk type. Every draw is a pure hash of the seed and
//! the chunk's sample origin, so the same chunk always resolves the same way.

use serde::Deserialize;

use tessera_geom::{ChunkCoord, Grid};
use tessera_noise::hash01;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub chunk_type: Option<String>,
    #[serde(default)]
    pub chunk_types: Option<Vec<Candidate>>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Condition {
    X { op: CompareOp, threshold: f64 },
    Y { op: CompareOp, threshold: f64 },
    Chance { threshold: f64 },
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(from = "String")]
pub enum CompareOp {
    Below,
    Above,
    Equal,
    Unknown(String),
}

impl From<String> for CompareOp {
    fn from(s: String) -> Self {
        match s.as_str() {
            "below" => CompareOp::Below,
            "above" => CompareOp::Above,
            "equal" => CompareOp::Equal,
            _ => CompareOp::Unknown(s),
        }
    }
}

impl CompareOp {
    fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            CompareOp::Below => value < threshold,
            CompareOp::Above => value > threshold,
            CompareOp::Equal => value == threshold,
            CompareOp::Unknown(op) => {
                log::warn!("unknown comparison '{}' in generation rule; condition fails", op);
                false
            }
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Candidate {
    pub name: String,
    #[serde(default = "default_candidate_chance", alias = "weight")]
    pub chance: f64,
}

fn default_candidate_chance() -> f64 {
    1.0
}

/// Where a chunk sits, in the units conditions are written against.
#[derive(Clone, Copy, Debug)]
struct ChunkOrigin {
    px: f64,
    py: f64,
    sx: i64,
    sy: i64,
}

impl ChunkOrigin {
    fn of(coord: ChunkCoord, grid: &Grid) -> Self {
        let (px, py) = grid.chunk_origin_pixel(coord);
        let (sx, sy) = grid.chunk_origin_sample(coord);
        Self { px, py, sx, sy }
    }
}

impl Condition {
    fn holds(&self, origin: ChunkOrigin, seed: u64) -> bool {
        match self {
            Condition::X { op, threshold } => op.holds(origin.px, *threshold),
            Condition::Y { op, threshold } => op.holds(origin.py, *threshold),
            Condition::Chance { threshold } => hash01(seed, origin.sx, origin.sy) < *threshold,
            Condition::Unknown => false,
        }
    }
}

impl Rule {
    fn matches(&self, origin: ChunkOrigin, seed: u64) -> bool {
        self.conditions.iter().all(|c| c.holds(origin, seed))
    }

    fn pick(&self, origin: ChunkOrigin, seed: u64) -> Option<&str> {
        if let Some(name) = self.chunk_type.as_deref() {
            return Some(name);
        }
        let candidates = self.chunk_types.as_deref()?;
        // same draw as the chance condition
        let draw = hash01(seed, origin.sx, origin.sy);
        pick_weighted(candidates, draw)
    }
}

/// Chooses the first candidate whose cumulative normalized weight exceeds `draw`.
pub fn pick_weighted(candidates: &[Candidate], draw: f64) -> Option<&str> {
    let last = candidates.last()?;
    let weight = |c: &Candidate| if c.chance.is_finite() { c.chance.max(0.0) } else { 0.0 };
    let total: f64 = candidates.iter().map(weight).sum();
    let uniform = !(total.is_finite() && total > 0.0);
    let n = candidates.len() as f64;
    let mut cumulative = 0.0;
    for c in candidates {
        cumulative += if uniform { 1.0 / n } else { weight(c) / total };
        if draw < cumulative {
            return Some(&c.name);
        }
    }
    Some(&last.name)
}

impl RuleSet {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every chunk-type name the rules can produce, in document order.
    pub fn referenced_types(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for r in &self.rules {
            let names = r
                .chunk_type
                .as_deref()
                .into_iter()
                .chain(r.chunk_types.iter().flatten().map(|c| c.name.as_str()));
            for n in names {
                if !out.contains(&n) {
                    out.push(n);
                }
            }
        }
        out
    }
}

/// Resolves the chunk type for `coord`; `None` means an all-empty chunk.
pub fn select_chunk_type<'a>(
    coord: ChunkCoord,
    rules: &'a RuleSet,
    seed: u64,
    grid: &Grid,
) -> Option<&'a str> {
    let origin = ChunkOrigin::of(coord, grid);
    rules
        .rules
        .iter()
        .find(|r| r.matches(origin, seed))
        .and_then(|r| r.pick(origin, seed))
}
