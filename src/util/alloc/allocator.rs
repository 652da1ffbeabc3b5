use crate::global_state::GlobalState;
use crate::policy::space::Space;
use crate::util::constants::*;
use crate::util::conversions::raw_align_up;
use crate::util::opaque_pointer::*;
use crate::util::options::Options;
use crate::util::Address;
use crate::vm::VMBinding;
use downcast_rs::Downcast;
use std::sync::Arc;

/// Why an allocation failed for good. Passed to
/// [`Collection::out_of_memory`](crate::vm::Collection::out_of_memory).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// The heap is exhausted even after collecting, or a single request is larger than the
    /// space it was routed to.
    HeapOutOfMemory,
    /// The OS refused to commit memory for the heap.
    MmapOutOfMemory,
}

/// The number of bytes reserved for a request of `size` bytes. Every allocation takes at
/// least [`MIN_OBJECT_SIZE`] bytes so that two objects never start in the same side table
/// granule.
pub fn allocation_size(size: usize) -> usize {
    raw_align_up(size.max(MIN_OBJECT_SIZE), MIN_ALIGNMENT)
}

/// Align `region` so that `region + offset` is a multiple of `alignment`, and fill the gap.
pub fn align_allocation<VM: VMBinding>(region: Address, alignment: usize, offset: usize) -> Address {
    let result = align_allocation_no_fill::<VM>(region, alignment, offset);
    fill_alignment_gap::<VM>(region, result);
    result
}

pub fn align_allocation_no_fill<VM: VMBinding>(
    region: Address,
    alignment: usize,
    offset: usize,
) -> Address {
    debug_assert!(alignment <= VM::MAX_ALIGNMENT, "alignment {} too large", alignment);
    debug_assert!(alignment.is_power_of_two());
    debug_assert!(offset % VM::MIN_ALIGNMENT == 0);

    if alignment <= VM::MIN_ALIGNMENT {
        return region;
    }
    let mask = alignment - 1;
    let delta = (offset.wrapping_neg().wrapping_sub(region.as_usize())) & mask;
    region + delta
}

/// Fill `[start, end)` with [`VMBinding::ALIGNMENT_VALUE`], a word at a time.
pub fn fill_alignment_gap<VM: VMBinding>(start: Address, end: Address) {
    let mut cursor = start;
    while cursor < end {
        unsafe { cursor.store::<usize>(VM::ALIGNMENT_VALUE) };
        cursor += BYTES_IN_WORD;
    }
}

/// The most bytes a request can take once padded for `alignment`.
pub fn get_maximum_aligned_size<VM: VMBinding>(size: usize, alignment: usize) -> usize {
    if alignment <= VM::MIN_ALIGNMENT {
        size
    } else {
        size + alignment - VM::MIN_ALIGNMENT
    }
}

/// State every allocator of one MMTK instance shares.
pub struct AllocatorContext {
    pub state: Arc<GlobalState>,
    pub options: Arc<Options>,
}

impl AllocatorContext {
    pub fn new(state: Arc<GlobalState>, options: Arc<Options>) -> Self {
        AllocatorContext { state, options }
    }
}

/// A thread-local allocator bound to one space.
///
/// `alloc` returns zero when the space refused the request, because a collection is needed
/// or because the heap is exhausted. The caller (the mutator, or the copy context of a
/// collector) decides what to do about it.
pub trait Allocator<VM: VMBinding>: Downcast {
    fn get_tls(&self) -> VMThread;

    fn get_space(&self) -> &'static dyn Space<VM>;

    fn get_context(&self) -> &AllocatorContext;

    /// Does this allocator keep memory in thread-local buffers?
    fn does_thread_local_allocation(&self) -> bool;

    /// The fast path.
    fn alloc(&mut self, size: usize, align: usize, offset: usize) -> Address;

    /// Get new memory from the space and allocate from it.
    fn alloc_slow_once(&mut self, size: usize, align: usize, offset: usize) -> Address;

    fn alloc_slow(&mut self, size: usize, align: usize, offset: usize) -> Address {
        let result = self.alloc_slow_once(size, align, offset);
        if result.is_zero() {
            trace!(
                "{}: allocation of {} bytes refused by the space",
                self.get_space().name(),
                size
            );
        }
        result
    }

    /// Drop any thread-local buffers. Only called at collection boundaries.
    fn reset(&mut self) {}

    fn on_mutator_destroy(&mut self) {
        self.reset();
    }
}

impl_downcast!(Allocator<VM> where VM: VMBinding);
