use crossbeam_channel::Sender;

use tessera_blocks::CellValue;
use tessera_geom::{ChunkCoord, SamplePos};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    /// A chunk entered the cache (synthesized, adopted, or imported).
    ChunkGenerated { coord: ChunkCoord },
    /// A tile was written; `value` is what landed in the overlay (`None` clears).
    /// A malformed dynamic write reports the fallback block it stored.
    TileModified {
        pos: SamplePos,
        value: Option<CellValue>,
    },
}

/// Called synchronously on the mutating thread, inside the store call.
pub trait StoreObserver: Send {
    fn on_event(&mut self, event: &StoreEvent);
}

impl<F> StoreObserver for F
where
    F: FnMut(&StoreEvent) + Send,
{
    fn on_event(&mut self, event: &StoreEvent) {
        self(event)
    }
}

/// Forwards every event into a channel for consumers that prefer polling.
pub struct ChannelObserver {
    tx: Sender<StoreEvent>,
}

impl ChannelObserver {
    pub fn new(tx: Sender<StoreEvent>) -> Self {
        Self { tx }
    }
}

impl StoreObserver for ChannelObserver {
    fn on_event(&mut self, event: &StoreEvent) {
        if self.tx.send(event.clone()).is_err() {
            log::trace!("store event dropped: receiver gone");
        }
    }
}
