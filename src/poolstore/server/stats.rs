use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

/// Request counters updated by the dispatch loop. Shared out via Arc so
/// clients of the embedded server (and tests) can observe traffic.
#[derive(Default)]
pub struct ServerStats {
    pub writes: AtomicU64,
    pub reads: AtomicU64,
    pub removes: AtomicU64,
    pub bulk_writes: AtomicU64,
    pub bulk_reads: AtomicU64,
    /// Current sum of stored blob sizes, never exceeds the pool capacity
    pub bytes_used: AtomicU64,
}

impl ServerStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Relaxed)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Relaxed)
    }

    pub fn bytes_used(&self) -> u64 {
        self.bytes_used.load(Relaxed)
    }
}
