use super::allocator::*;
use crate::policy::space::Space;
use crate::util::constants::MIN_OBJECT_SIZE;
use crate::util::conversions::raw_align_up;
use crate::util::opaque_pointer::*;
use crate::util::Address;
use crate::vm::VMBinding;
use std::sync::Arc;

/// A bump-pointer allocator. It claims a chunk of `bump_chunk_size` bytes from its space
/// and serves requests from it without synchronization.
pub struct BumpAllocator<VM: VMBinding> {
    pub tls: VMThread,
    cursor: Address,
    limit: Address,
    space: &'static dyn Space<VM>,
    context: Arc<AllocatorContext>,
}

impl<VM: VMBinding> BumpAllocator<VM> {
    pub fn new(tls: VMThread, space: &'static dyn Space<VM>, context: Arc<AllocatorContext>) -> Self {
        BumpAllocator {
            tls,
            cursor: Address::ZERO,
            limit: Address::ZERO,
            space,
            context,
        }
    }

    /// Point the allocator at another space. The current chunk is abandoned.
    pub fn rebind(&mut self, space: &'static dyn Space<VM>) {
        self.reset();
        self.space = space;
    }

    pub fn cursor(&self) -> Address {
        self.cursor
    }

    pub fn limit(&self) -> Address {
        self.limit
    }
}

impl<VM: VMBinding> Allocator<VM> for BumpAllocator<VM> {
    fn get_tls(&self) -> VMThread {
        self.tls
    }

    fn get_space(&self) -> &'static dyn Space<VM> {
        self.space
    }

    fn get_context(&self) -> &AllocatorContext {
        &self.context
    }

    fn does_thread_local_allocation(&self) -> bool {
        true
    }

    fn alloc(&mut self, size: usize, align: usize, offset: usize) -> Address {
        let bytes = allocation_size(size);
        let result = align_allocation_no_fill::<VM>(self.cursor, align, offset);
        let new_cursor = result + bytes;
        if self.cursor.is_zero() || new_cursor > self.limit {
            self.alloc_slow(size, align, offset)
        } else {
            fill_alignment_gap::<VM>(self.cursor, result);
            self.cursor = new_cursor;
            result
        }
    }

    fn alloc_slow_once(&mut self, size: usize, align: usize, offset: usize) -> Address {
        let needed = get_maximum_aligned_size::<VM>(allocation_size(size), align);
        let chunk = raw_align_up(
            needed.max(self.context.options.bump_chunk_size),
            MIN_OBJECT_SIZE,
        );
        let start = self.space.acquire(self.tls, chunk);
        if start.is_zero() {
            return start;
        }
        trace!("{}: new chunk [{}, {})", self.space.name(), start, start + chunk);
        self.cursor = start;
        self.limit = start + chunk;
        self.alloc(size, align, offset)
    }

    fn reset(&mut self) {
        self.cursor = Address::ZERO;
        self.limit = Address::ZERO;
    }
}
