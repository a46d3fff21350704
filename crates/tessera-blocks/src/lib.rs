//! Cell values, block definitions, and the document loader they share.
#![forbid(unsafe_code)]

pub mod config;
pub mod doc;
pub mod registry;
pub mod types;

pub use doc::{DocError, DocFormat};
pub use registry::{BlockDef, BlockRegistry, TextureBinding};
pub use types::{BlockMark, BlockMode, CellValue, Rotation};
