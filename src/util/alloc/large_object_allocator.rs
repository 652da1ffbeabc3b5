use super::allocator::*;
use crate::policy::largeobjectspace::LargeObjectSpace;
use crate::policy::space::Space;
use crate::util::conversions::bytes_to_pages_up;
use crate::util::opaque_pointer::*;
use crate::util::Address;
use crate::vm::VMBinding;
use std::sync::Arc;

/// Allocates each object on its own run of pages in a [`LargeObjectSpace`]. There is no
/// thread-local fast path.
pub struct LargeObjectAllocator<VM: VMBinding> {
    pub tls: VMThread,
    space: &'static LargeObjectSpace<VM>,
    context: Arc<AllocatorContext>,
}

impl<VM: VMBinding> LargeObjectAllocator<VM> {
    pub fn new(tls: VMThread, space: &'static LargeObjectSpace<VM>, context: Arc<AllocatorContext>) -> Self {
        LargeObjectAllocator {
            tls,
            space,
            context,
        }
    }
}

impl<VM: VMBinding> Allocator<VM> for LargeObjectAllocator<VM> {
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
        false
    }

    fn alloc(&mut self, size: usize, align: usize, offset: usize) -> Address {
        let cell = self.alloc_slow(size, align, offset);
        if cell.is_zero() {
            cell
        } else {
            align_allocation::<VM>(cell, align, offset)
        }
    }

    fn alloc_slow_once(&mut self, size: usize, align: usize, _offset: usize) -> Address {
        let bytes = get_maximum_aligned_size::<VM>(allocation_size(size), align);
        self.space.allocate_pages(self.tls, bytes_to_pages_up(bytes))
    }
}
