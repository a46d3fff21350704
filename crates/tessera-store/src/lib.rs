//! Chunk cache, layered tile resolution, and the import path.
#![forbid(unsafe_code)]

pub mod import;
pub mod observer;
pub mod store;
pub mod tile;

pub use import::{ImportCell, ImportData};
pub use observer::{ChannelObserver, StoreEvent, StoreObserver};
pub use store::{ChunkStore, ChunkStoreBuilder, StoreStats, load_registry_or_default};
pub use tile::{TileOrigin, TileSource, TileView};
