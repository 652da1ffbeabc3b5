use crate::global_state::GlobalState;
use crate::plan::PlanCreateSpaceArgs;
use crate::util::alloc::AllocationError;
use crate::util::conversions::bytes_to_pages_up;
use crate::util::header_byte;
use crate::util::heap::{
    GCTrigger, HeapLayoutError, PageResource, PageResourceError, SpaceDescriptor, SpaceExtent,
};
use crate::util::opaque_pointer::*;
use crate::util::options::Options;
use crate::util::statistics::GCStats;
use crate::util::{Address, ObjectReference};
use crate::vm::{Collection, VMBinding};
use downcast_rs::Downcast;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// A region of the heap with one policy for allocating and reclaiming objects.
///
/// Every space owns a single extent reserved in the [`crate::util::heap::HeapLayout`], so an
/// address belongs to at most one space.
pub trait Space<VM: VMBinding>: 'static + Downcast + Sync + Send {
    fn as_space(&self) -> &dyn Space<VM>;

    fn common(&self) -> &CommonSpace<VM>;

    fn get_page_resource(&self) -> &dyn PageResource;

    fn name(&self) -> &'static str {
        self.common().name
    }

    fn descriptor(&self) -> SpaceDescriptor {
        self.common().descriptor
    }

    fn in_space(&self, object: ObjectReference) -> bool {
        self.address_in_space(object.to_address())
    }

    fn address_in_space(&self, addr: Address) -> bool {
        self.common().extent.contains(addr)
    }

    /// Get `bytes` of fresh zeroed memory for an allocator.
    ///
    /// Returns zero if the plan wants a collection first, or if the space is out of room.
    /// In the first case a collection has been requested. In the second case the VM has
    /// been told through [`Collection::out_of_memory`], unless a collection may still help.
    fn acquire(&self, tls: VMThread, bytes: usize) -> Address {
        let common = self.common();
        trace!("{}: acquire {} bytes", self.name(), bytes);

        if bytes > common.extent.extent {
            warn!(
                "{}: request of {} bytes exceeds the extent of {} bytes",
                self.name(),
                bytes,
                common.extent.extent
            );
            VM::VMCollection::out_of_memory(tls, AllocationError::HeapOutOfMemory);
            return Address::ZERO;
        }

        let pr = self.get_page_resource();
        let pages = bytes_to_pages_up(bytes);
        pr.reserve_pages(pages);

        if common.gc_trigger.poll(false, Some(self.as_space())) {
            pr.clear_request(pages);
            return Address::ZERO;
        }

        match pr.get_new_pages(pages, bytes) {
            Ok(start) => start,
            Err(PageResourceError::Exhausted) => {
                if common.gc_trigger.poll(true, Some(self.as_space())) {
                    return Address::ZERO;
                }
                // Collecting is not possible, either because collection is not yet
                // initialized or because a collector is copying into this space.
                error!(
                    "{}: out of space ({} pages reserved)",
                    self.name(),
                    pr.reserved_pages()
                );
                VM::VMCollection::out_of_memory(tls, AllocationError::HeapOutOfMemory);
                Address::ZERO
            }
            Err(PageResourceError::Mmap(e)) => {
                error!("{}: {}", self.name(), e);
                VM::VMCollection::out_of_memory(tls, AllocationError::MmapOutOfMemory);
                Address::ZERO
            }
        }
    }

    fn reserved_pages(&self) -> usize {
        self.get_page_resource().reserved_pages()
    }

    /// Pages this space can still hand out before its extent is full.
    fn available_physical_pages(&self) -> usize {
        self.get_page_resource().available_pages()
    }

    /// Is `object` live? Only meaningful between the closure and the release of a
    /// collection that traced this space, or for spaces that never reclaim.
    fn is_live(&self, object: ObjectReference) -> bool;

    fn is_movable(&self) -> bool;

    /// True if `object` keeps its address for the rest of the current collection.
    fn will_not_move_in_current_collection(&self, _object: ObjectReference) -> bool {
        !self.is_movable()
    }

    /// Initialize the metadata of an object the mutator just allocated in this space.
    fn post_alloc(&self, object: ObjectReference, _bytes: usize) {
        header_byte::initialize::<VM>(object, self.descriptor(), self.common().needs_log_bit);
    }

    /// Initialize the metadata of an object a collector just copied into this space.
    fn post_copy(&self, object: ObjectReference, bytes: usize);
}

impl_downcast!(Space<VM> where VM: VMBinding);

const CYCLE_IDLE: u8 = 0;
const CYCLE_PREPARED: u8 = 1;

/// State shared by all kinds of spaces.
pub struct CommonSpace<VM: VMBinding> {
    pub name: &'static str,
    pub descriptor: SpaceDescriptor,
    pub extent: SpaceExtent,
    /// Objects in this space start unlogged, so that the write barrier records the first
    /// store into each of them.
    pub needs_log_bit: bool,
    pub gc_trigger: Arc<GCTrigger<VM>>,
    pub state: Arc<GlobalState>,
    pub options: Arc<Options>,
    pub stats: Arc<GCStats>,
    cycle: AtomicU8,
}

impl<VM: VMBinding> CommonSpace<VM> {
    pub fn new(args: PlanCreateSpaceArgs<VM>) -> Result<Self, HeapLayoutError> {
        let extent = args.layout.reserve(args.name, args.vmrequest)?;
        Ok(CommonSpace {
            name: args.name,
            descriptor: extent.descriptor,
            extent,
            needs_log_bit: args.needs_log_bit,
            gc_trigger: args.global.gc_trigger.clone(),
            state: args.global.state.clone(),
            options: args.global.options.clone(),
            stats: args.global.stats.clone(),
            cycle: AtomicU8::new(CYCLE_IDLE),
        })
    }

    /// Record the start of a collection cycle for this space.
    pub fn start_cycle(&self) {
        if self.cycle.swap(CYCLE_PREPARED, Ordering::SeqCst) == CYCLE_PREPARED {
            panic!("{}: prepared twice in one collection", self.name);
        }
    }

    /// Record the end of a collection cycle for this space.
    pub fn end_cycle(&self) {
        if self.cycle.swap(CYCLE_IDLE, Ordering::SeqCst) == CYCLE_IDLE {
            panic!("{}: released twice, or released without being prepared", self.name);
        }
    }

    /// Wrap an error from allocating side metadata for this space.
    pub fn metadata_error(&self, source: std::io::Error) -> HeapLayoutError {
        HeapLayoutError::ReservationFailed {
            space: self.name,
            source,
        }
    }
}
