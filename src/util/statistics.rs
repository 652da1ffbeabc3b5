use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Counters kept across collections. Collector threads update them concurrently.
#[derive(Default)]
pub struct GCStats {
    collections: AtomicUsize,
    full_heap_collections: AtomicUsize,
    objects_copied: AtomicUsize,
    bytes_copied: AtomicUsize,
    objects_marked: AtomicUsize,
    gc_time_nanos: AtomicU64,
}

/// A point-in-time copy of [`GCStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub collections: usize,
    pub full_heap_collections: usize,
    pub objects_copied: usize,
    pub bytes_copied: usize,
    pub objects_marked: usize,
    pub gc_time: Duration,
}

impl GCStats {
    pub fn object_copied(&self, bytes: usize) {
        self.objects_copied.fetch_add(1, Ordering::Relaxed);
        self.bytes_copied.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn object_marked(&self) {
        self.objects_marked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn collection_done(&self, full_heap: bool, elapsed: Duration) {
        self.collections.fetch_add(1, Ordering::Relaxed);
        if full_heap {
            self.full_heap_collections.fetch_add(1, Ordering::Relaxed);
        }
        self.gc_time_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CollectionStats {
        CollectionStats {
            collections: self.collections.load(Ordering::Relaxed),
            full_heap_collections: self.full_heap_collections.load(Ordering::Relaxed),
            objects_copied: self.objects_copied.load(Ordering::Relaxed),
            bytes_copied: self.bytes_copied.load(Ordering::Relaxed),
            objects_marked: self.objects_marked.load(Ordering::Relaxed),
            gc_time: Duration::from_nanos(self.gc_time_nanos.load(Ordering::Relaxed)),
        }
    }
}
