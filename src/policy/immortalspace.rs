use crate::plan::{PlanCreateSpaceArgs, TraceLocal};
use crate::policy::space::{CommonSpace, Space};
use crate::util::constants::LOG_MIN_OBJECT_SIZE;
use crate::util::header_byte;
use crate::util::heap::{HeapLayoutError, MonotonePageResource, PageResource};
use crate::util::metadata::SideTable;
use crate::util::ObjectReference;
use crate::vm::VMBinding;
use std::sync::atomic::{AtomicU8, Ordering};

const MARK_BIT: u8 = 1;

/// A bump-allocated space that is never reclaimed. Objects are still marked during a
/// full-heap trace, so their children are found.
pub struct ImmortalSpace<VM: VMBinding> {
    common: CommonSpace<VM>,
    pr: MonotonePageResource,
    marks: SideTable<AtomicU8>,
    mark_state: AtomicU8,
}

impl<VM: VMBinding> Space<VM> for ImmortalSpace<VM> {
    fn as_space(&self) -> &dyn Space<VM> {
        self
    }

    fn common(&self) -> &CommonSpace<VM> {
        &self.common
    }

    fn get_page_resource(&self) -> &dyn PageResource {
        &self.pr
    }

    fn is_live(&self, _object: ObjectReference) -> bool {
        true
    }

    fn is_movable(&self) -> bool {
        false
    }

    fn post_alloc(&self, object: ObjectReference, _bytes: usize) {
        self.marks
            .get(object.to_address())
            .store(self.mark_state.load(Ordering::Relaxed), Ordering::SeqCst);
        header_byte::initialize::<VM>(object, self.descriptor(), self.common.needs_log_bit);
    }

    fn post_copy(&self, _object: ObjectReference, _bytes: usize) {
        panic!("{}: objects are never copied into an immortal space", self.name());
    }
}

impl<VM: VMBinding> ImmortalSpace<VM> {
    pub fn new(args: PlanCreateSpaceArgs<VM>) -> Result<Self, HeapLayoutError> {
        let common = CommonSpace::new(args)?;
        let marks = SideTable::new(common.extent.start, common.extent.extent, LOG_MIN_OBJECT_SIZE)
            .map_err(|e| common.metadata_error(e))?;
        Ok(ImmortalSpace {
            pr: MonotonePageResource::new(common.extent),
            marks,
            common,
            mark_state: AtomicU8::new(0),
        })
    }

    pub fn prepare(&self) {
        self.common.start_cycle();
        let old = self.mark_state.load(Ordering::SeqCst);
        self.mark_state.store(MARK_BIT - old, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.common.end_cycle();
    }

    fn test_and_mark(&self, object: ObjectReference) -> bool {
        let state = self.mark_state.load(Ordering::Relaxed);
        self.marks.get(object.to_address()).swap(state, Ordering::SeqCst) != state
    }

    pub fn trace_object(&self, trace: &mut TraceLocal<VM>, object: ObjectReference) -> ObjectReference {
        if self.test_and_mark(object) {
            self.common.stats.object_marked();
            trace.process_node(object);
        }
        object
    }
}
