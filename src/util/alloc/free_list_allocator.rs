use super::allocator::*;
use crate::policy::marksweepspace::{size_class_for, MarkSweepSpace, NUM_SIZE_CLASSES, SIZE_CLASSES};
use crate::policy::space::Space;
use crate::util::memory;
use crate::util::opaque_pointer::*;
use crate::util::Address;
use crate::vm::VMBinding;
use std::sync::Arc;

/// A segregated free-list allocator for a [`MarkSweepSpace`].
///
/// For each size class it keeps the free list of one block. The first word of a free cell
/// links to the next free cell. When a list runs dry, the space hands over the free cells of
/// another block under its lock.
pub struct FreeListAllocator<VM: VMBinding> {
    pub tls: VMThread,
    space: &'static MarkSweepSpace<VM>,
    context: Arc<AllocatorContext>,
    free_lists: [Address; NUM_SIZE_CLASSES],
}

impl<VM: VMBinding> FreeListAllocator<VM> {
    pub fn new(tls: VMThread, space: &'static MarkSweepSpace<VM>, context: Arc<AllocatorContext>) -> Self {
        FreeListAllocator {
            tls,
            space,
            context,
            free_lists: [Address::ZERO; NUM_SIZE_CLASSES],
        }
    }

    fn class_for_request(&self, size: usize, align: usize) -> usize {
        let needed = get_maximum_aligned_size::<VM>(allocation_size(size), align);
        match size_class_for(needed) {
            Some(class) => class,
            None => panic!(
                "{}: {} bytes is larger than the largest size class",
                self.space.name(),
                needed
            ),
        }
    }
}

impl<VM: VMBinding> Allocator<VM> for FreeListAllocator<VM> {
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
        let class = self.class_for_request(size, align);
        let cell = self.free_lists[class];
        if cell.is_zero() {
            return self.alloc_slow(size, align, offset);
        }
        self.free_lists[class] = unsafe { cell.load::<Address>() };
        memory::zero(cell, SIZE_CLASSES[class]);
        align_allocation::<VM>(cell, align, offset)
    }

    fn alloc_slow_once(&mut self, size: usize, align: usize, offset: usize) -> Address {
        let class = self.class_for_request(size, align);
        let head = self.space.acquire_free_cells(self.tls, class);
        if head.is_zero() {
            return head;
        }
        self.free_lists[class] = head;
        self.alloc(size, align, offset)
    }

    /// Forget the local free lists. The cells stay unmarked, so the next sweep finds them.
    fn reset(&mut self) {
        self.free_lists = [Address::ZERO; NUM_SIZE_CLASSES];
    }
}
