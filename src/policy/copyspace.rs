use crate::plan::{CopySemantics, PlanCreateSpaceArgs, TraceLocal};
use crate::policy::space::{CommonSpace, Space};
use crate::util::header_byte;
use crate::util::heap::{HeapLayoutError, MonotonePageResource, PageResource};
use crate::util::object_forwarding::{self, ForwardingTable};
use crate::util::{Address, ObjectReference};
use crate::vm::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A bump-allocated space whose live objects are evacuated during a collection.
///
/// While the space is the from-space of a collection, tracing an object claims it in the
/// forwarding table, copies it and leaves a forwarding pointer behind. Forwarding state lives
/// in side tables indexed by slot, so the object itself is never overwritten.
pub struct CopySpace<VM: VMBinding> {
    common: CommonSpace<VM>,
    pr: MonotonePageResource,
    forwarding: ForwardingTable,
    from_space: AtomicBool,
    /// Objects evacuated out of this space, over its lifetime.
    copied: AtomicUsize,
}

impl<VM: VMBinding> Space<VM> for CopySpace<VM> {
    fn as_space(&self) -> &dyn Space<VM> {
        self
    }

    fn common(&self) -> &CommonSpace<VM> {
        &self.common
    }

    fn get_page_resource(&self) -> &dyn PageResource {
        &self.pr
    }

    fn is_live(&self, object: ObjectReference) -> bool {
        if self.is_from_space() {
            return self.forwarding.is_forwarded(object);
        }
        // Slots above the cursor were released with the rest of an old from-space.
        object.to_address() < self.pr.cursor()
    }

    fn is_movable(&self) -> bool {
        true
    }

    fn will_not_move_in_current_collection(&self, object: ObjectReference) -> bool {
        !self.is_from_space() || self.forwarding.is_forwarded(object)
    }

    // Nursery and semispace objects are never logged by the write barrier.
    fn post_alloc(&self, object: ObjectReference, _bytes: usize) {
        header_byte::initialize::<VM>(object, self.descriptor(), false);
    }

    fn post_copy(&self, object: ObjectReference, _bytes: usize) {
        header_byte::initialize::<VM>(object, self.descriptor(), false);
    }
}

impl<VM: VMBinding> CopySpace<VM> {
    pub fn new(args: PlanCreateSpaceArgs<VM>, from_space: bool) -> Result<Self, HeapLayoutError> {
        let common = CommonSpace::new(args)?;
        let forwarding = ForwardingTable::new(common.extent.start, common.extent.extent)
            .map_err(|e| common.metadata_error(e))?;
        Ok(CopySpace {
            pr: MonotonePageResource::new(common.extent),
            forwarding,
            common,
            from_space: AtomicBool::new(from_space),
            copied: AtomicUsize::new(0),
        })
    }

    /// Start a collection. Objects are only evacuated if this is the from-space.
    pub fn prepare(&self, from_space: bool) {
        if from_space {
            self.common.start_cycle();
        }
        self.from_space.store(from_space, Ordering::SeqCst);
    }

    /// Drop every object of the from-space and make the space empty again.
    pub fn release(&self) {
        self.common.end_cycle();
        let (start, used) = self.pr.reset();
        self.forwarding.clear_range(start, used);
        self.from_space.store(false, Ordering::SeqCst);
        debug!("{}: released {} bytes", self.name(), used);
    }

    pub fn is_from_space(&self) -> bool {
        self.from_space.load(Ordering::SeqCst)
    }

    /// Bytes handed out since the last release.
    pub fn used_bytes(&self) -> usize {
        self.pr.cursor() - self.common.extent.start
    }

    pub fn objects_copied(&self) -> usize {
        self.copied.load(Ordering::SeqCst)
    }

    pub fn is_forwarded(&self, object: ObjectReference) -> bool {
        self.forwarding.is_forwarded(object)
    }

    /// The start of the extent. Objects are laid out from here in allocation order.
    pub fn start(&self) -> Address {
        self.common.extent.start
    }

    pub fn trace_object(
        &self,
        trace: &mut TraceLocal<VM>,
        object: ObjectReference,
        semantics: CopySemantics,
    ) -> ObjectReference {
        trace!("{}: trace_object({}, {:?})", self.name(), object, semantics);
        if !self.is_from_space() {
            return object;
        }
        let forwarding_status = self.forwarding.attempt_to_forward(object);
        if object_forwarding::state_is_forwarded_or_being_forwarded(forwarding_status) {
            self.forwarding
                .spin_and_get_forwarded_object(object, forwarding_status)
        } else {
            let new_object = self
                .forwarding
                .forward_object::<VM>(object, semantics, &mut trace.copy);
            self.copied.fetch_add(1, Ordering::SeqCst);
            self.common
                .stats
                .object_copied(VM::VMObjectModel::get_current_size(new_object));
            trace!("{}: copied {} -> {}", self.name(), object, new_object);
            trace.process_node(new_object);
            new_object
        }
    }
}
