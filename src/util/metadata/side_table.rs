use crate::util::memory;
use crate::util::Address;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU8, AtomicUsize};

/// Types that can live in a [`SideTable`]: atomics for which all-zero bytes are a valid value.
///
/// # Safety
/// Implementors must be valid when zero-initialized and safe to share between threads.
pub unsafe trait SideEntry: Sync + Send + 'static {}

unsafe impl SideEntry for AtomicU8 {}
unsafe impl SideEntry for AtomicUsize {}

/// An arena of per-slot metadata for one address range. Slot `i` describes the granule
/// `[start + i << log_granule, start + (i + 1) << log_granule)`.
///
/// The table is mapped lazily, so untouched parts of a large range cost no memory.
pub struct SideTable<T: SideEntry> {
    base: Address,
    covered_start: Address,
    covered_bytes: usize,
    log_granule: u8,
    table_bytes: usize,
    _entry: PhantomData<T>,
}

unsafe impl<T: SideEntry> Send for SideTable<T> {}
unsafe impl<T: SideEntry> Sync for SideTable<T> {}

impl<T: SideEntry> SideTable<T> {
    pub fn new(covered_start: Address, covered_bytes: usize, log_granule: u8) -> std::io::Result<Self> {
        let entries = (covered_bytes >> log_granule).max(1);
        let table_bytes = entries * std::mem::size_of::<T>();
        let base = memory::mmap_anon_noreserve(table_bytes)?;
        Ok(SideTable {
            base,
            covered_start,
            covered_bytes,
            log_granule,
            table_bytes,
            _entry: PhantomData,
        })
    }

    pub fn granule(&self) -> usize {
        1 << self.log_granule
    }

    pub fn covers(&self, addr: Address) -> bool {
        addr >= self.covered_start && addr < self.covered_start + self.covered_bytes
    }

    /// The slot index of the granule containing `addr`.
    pub fn slot_index(&self, addr: Address) -> usize {
        debug_assert!(
            self.covers(addr),
            "{} is outside the side table for [{}, {})",
            addr,
            self.covered_start,
            self.covered_start + self.covered_bytes
        );
        (addr - self.covered_start) >> self.log_granule
    }

    pub fn get(&self, addr: Address) -> &T {
        self.get_by_index(self.slot_index(addr))
    }

    pub fn get_by_index(&self, index: usize) -> &T {
        let offset = index * std::mem::size_of::<T>();
        assert!(offset < self.table_bytes, "side table slot {} out of range", index);
        unsafe { (self.base + offset).as_ref::<T>() }
    }

    /// Zero every slot describing `[start, start + bytes)`.
    pub fn clear_range(&self, start: Address, bytes: usize) {
        if bytes == 0 {
            return;
        }
        let first = self.slot_index(start);
        let last = self.slot_index(start + (bytes - 1));
        let size = std::mem::size_of::<T>();
        memory::zero(self.base + first * size, (last - first + 1) * size);
    }
}

impl<T: SideEntry> Drop for SideTable<T> {
    fn drop(&mut self) {
        if let Err(e) = memory::munmap(self.base, self.table_bytes) {
            warn!("failed to unmap a side table: {}", e);
        }
    }
}
