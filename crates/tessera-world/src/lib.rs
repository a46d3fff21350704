//! World configuration, generation rules, chunk-type documents, and chunk synthesis.
#![forbid(unsafe_code)]

pub mod config;
pub mod rules;
pub mod spec;
pub mod synth;
pub mod worldgen;

pub use config::WorldConfig;
pub use rules::{Candidate, CompareOp, Condition, Rule, RuleSet, select_chunk_type};
pub use spec::{CaveSpec, ChunkTypeSpec, ChunkTypes, OreEntry, OreSpec, RegionSpec, Special};
pub use synth::{SynthOptions, Synthesizer};
pub use tessera_blocks::DocError;
pub use worldgen::WorldGen;
