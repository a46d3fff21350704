//! Background chunk synthesis pool with per-coordinate deduplication.
#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, unbounded};
use hashbrown::HashSet;
use rayon::{ThreadPool, ThreadPoolBuilder};

use tessera_chunk::Chunk;
use tessera_geom::ChunkCoord;
use tessera_store::ChunkStore;
use tessera_world::WorldGen;

struct JobOut {
    chunk: Chunk,
    t_gen_ms: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub submitted: u64,
    pub deduplicated: u64,
    pub completed: u64,
}

/// Runs `WorldGen::generate` off the caller's thread. A coordinate stays in
/// flight from `submit` until its chunk is handed out by `drain`.
pub struct GenRuntime {
    world: Arc<WorldGen>,
    pool: Option<ThreadPool>,
    res_tx: Sender<JobOut>,
    res_rx: Receiver<JobOut>,
    inflight: HashSet<ChunkCoord>,
    ready: Vec<Chunk>,
    stats: RuntimeStats,
    pub workers: usize,
}

impl GenRuntime {
    pub fn new(world: Arc<WorldGen>, workers: usize) -> Self {
        let workers = workers.max(1);
        let (res_tx, res_rx) = unbounded::<JobOut>();
        let pool = match ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("tessera-gen-{i}"))
            .build()
        {
            Ok(p) => Some(p),
            Err(e) => {
                log::warn!("worker pool unavailable ({}); synthesizing inline", e);
                None
            }
        };
        Self {
            world,
            pool,
            res_tx,
            res_rx,
            inflight: HashSet::new(),
            ready: Vec::new(),
            stats: RuntimeStats::default(),
            workers,
        }
    }

    #[inline]
    pub fn world(&self) -> &Arc<WorldGen> {
        &self.world
    }

    #[inline]
    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    #[inline]
    pub fn is_in_flight(&self, coord: ChunkCoord) -> bool {
        self.inflight.contains(&coord)
    }

    #[inline]
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Queues synthesis of `coord`. Returns `false` if it is already in flight.
    pub fn submit(&mut self, coord: ChunkCoord) -> bool {
        if !self.inflight.insert(coord) {
            self.stats.deduplicated += 1;
            return false;
        }
        self.stats.submitted += 1;
        let world = Arc::clone(&self.world);
        let tx = self.res_tx.clone();
        let job = move || {
            let t0 = Instant::now();
            let chunk = world.generate(coord);
            let t_gen_ms = t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
            let _ = tx.send(JobOut { chunk, t_gen_ms });
        };
        match &self.pool {
            Some(pool) => pool.spawn(job),
            None => job(),
        }
        true
    }

    /// Submits `coord` unless `store` already caches it.
    pub fn request_chunk(&mut self, store: &ChunkStore, coord: ChunkCoord) -> bool {
        if store.has_chunk(coord) {
            return false;
        }
        self.submit(coord)
    }

    /// Completed chunks since the last call, in completion order.
    pub fn drain(&mut self) -> Vec<Chunk> {
        while let Ok(out) = self.res_rx.try_recv() {
            self.accept(out);
        }
        for c in &self.ready {
            self.inflight.remove(&c.coord);
        }
        std::mem::take(&mut self.ready)
    }

    /// Blocks until every submitted job has finished. Results stay queued for `drain`.
    pub fn wait_all(&mut self) {
        let mut outstanding = self.inflight.len().saturating_sub(self.ready.len());
        while outstanding > 0 {
            match self.res_rx.recv() {
                Ok(out) => {
                    self.accept(out);
                    outstanding -= 1;
                }
                Err(_) => break,
            }
        }
    }

    /// Drains completed chunks into `store`. Returns how many were installed.
    pub fn pump(&mut self, store: &mut ChunkStore) -> usize {
        let mut adopted = 0;
        for chunk in self.drain() {
            if store.adopt_chunk(chunk) {
                adopted += 1;
            }
        }
        adopted
    }

    fn accept(&mut self, out: JobOut) {
        self.stats.completed += 1;
        log::debug!(
            "bg chunk ({}, {}) ready in {}ms",
            out.chunk.coord.cx,
            out.chunk.coord.cy,
            out.t_gen_ms
        );
        self.ready.push(out.chunk);
    }
}

impl std::fmt::Debug for GenRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenRuntime")
            .field("workers", &self.workers)
            .field("in_flight", &self.inflight.len())
            .field("stats", &self.stats)
            .finish()
    }
}
