use std::sync::atomic::{AtomicUsize, Ordering};

/// Page counters of one page resource.
///
/// `reserved` counts pages a space has promised to hand out, including requests still in
/// flight. `committed` counts pages actually backed by memory. Committed never exceeds
/// reserved.
#[derive(Default)]
pub struct PageAccounting {
    reserved: AtomicUsize,
    committed: AtomicUsize,
}

impl PageAccounting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for a request that is about to be attempted.
    pub fn reserve(&self, pages: usize) {
        self.reserved.fetch_add(pages, Ordering::Relaxed);
    }

    /// Withdraw a request made with [`PageAccounting::reserve`].
    pub fn clear_reserved(&self, pages: usize) {
        let old = self.reserved.fetch_sub(pages, Ordering::Relaxed);
        debug_assert!(old >= pages, "clearing {} of {} reserved pages", pages, old);
    }

    pub fn reserve_and_commit(&self, pages: usize) {
        self.reserved.fetch_add(pages, Ordering::Relaxed);
        self.committed.fetch_add(pages, Ordering::Relaxed);
    }

    /// Pages went back to the OS.
    pub fn release(&self, pages: usize) {
        let old_reserved = self.reserved.fetch_sub(pages, Ordering::Relaxed);
        let old_committed = self.committed.fetch_sub(pages, Ordering::Relaxed);
        debug_assert!(old_reserved >= pages && old_committed >= pages);
    }

    pub fn reset(&self) {
        self.reserved.store(0, Ordering::Relaxed);
        self.committed.store(0, Ordering::Relaxed);
    }

    pub fn get_reserved_pages(&self) -> usize {
        self.reserved.load(Ordering::Relaxed)
    }

    pub fn get_committed_pages(&self) -> usize {
        self.committed.load(Ordering::Relaxed)
    }
}
