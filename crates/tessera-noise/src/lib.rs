//! Deterministic hashing, gradient-noise fields, and binary-mask connectivity repair.
#![forbid(unsafe_code)]

pub mod connectivity;
pub mod field;
pub mod hash;

pub use connectivity::{ComponentLabels, label_components, repair_connectivity};
pub use field::{Connectivity, NoiseField, NoiseParams, Perlin, generate};
pub use hash::{XorShift64, hash01, mix_seed};
