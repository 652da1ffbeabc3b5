use crate::plan::{PlanCreateSpaceArgs, TraceLocal};
use crate::policy::space::{CommonSpace, Space};
use crate::util::constants::{BYTES_IN_PAGE, LOG_BYTES_IN_PAGE};
use crate::util::conversions::pages_to_bytes;
use crate::util::header_byte;
use crate::util::heap::{FreeListPageResource, HeapLayoutError, PageResource};
use crate::util::metadata::SideTable;
use crate::util::opaque_pointer::*;
use crate::util::treadmill::TreadMill;
use crate::util::{Address, ObjectReference};
use crate::vm::VMBinding;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

const MARK_BIT: u8 = 0b01;
const NURSERY_BIT: u8 = 0b10;
const LOS_BIT_MASK: u8 = 0b11;

/// Objects that each occupy their own run of pages. They are never moved. Dead objects give
/// their pages back to the page resource at release.
///
/// Objects allocated since the last collection are "nursery" objects and are traced and
/// reclaimed even in a nursery collection. Older objects are only traced in a full-heap
/// collection.
pub struct LargeObjectSpace<VM: VMBinding> {
    common: CommonSpace<VM>,
    pr: FreeListPageResource,
    /// One byte per page, used on the first page of each object.
    marks: SideTable<AtomicU8>,
    mark_state: AtomicU8,
    in_nursery_gc: AtomicBool,
    treadmill: TreadMill,
}

impl<VM: VMBinding> Space<VM> for LargeObjectSpace<VM> {
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
        self.mark_byte(object).load(Ordering::SeqCst) & LOS_BIT_MASK
            == self.mark_state.load(Ordering::SeqCst)
    }

    fn is_movable(&self) -> bool {
        false
    }

    fn post_alloc(&self, object: ObjectReference, _bytes: usize) {
        self.mark_byte(object).store(
            self.mark_state.load(Ordering::Relaxed) | NURSERY_BIT,
            Ordering::SeqCst,
        );
        self.treadmill.add_to_treadmill(object, true);
        header_byte::initialize::<VM>(object, self.descriptor(), self.common.needs_log_bit);
    }

    fn post_copy(&self, object: ObjectReference, _bytes: usize) {
        self.mark_byte(object)
            .store(self.mark_state.load(Ordering::Relaxed), Ordering::SeqCst);
        self.treadmill.add_to_treadmill(object, false);
        header_byte::initialize::<VM>(object, self.descriptor(), self.common.needs_log_bit);
    }
}

impl<VM: VMBinding> LargeObjectSpace<VM> {
    pub fn new(args: PlanCreateSpaceArgs<VM>) -> Result<Self, HeapLayoutError> {
        let common = CommonSpace::new(args)?;
        let marks = SideTable::new(common.extent.start, common.extent.extent, LOG_BYTES_IN_PAGE)
            .map_err(|e| common.metadata_error(e))?;
        Ok(LargeObjectSpace {
            pr: FreeListPageResource::new(common.extent),
            marks,
            common,
            mark_state: AtomicU8::new(0),
            in_nursery_gc: AtomicBool::new(false),
            treadmill: TreadMill::new(),
        })
    }

    fn mark_byte(&self, object: ObjectReference) -> &AtomicU8 {
        self.marks.get(object.to_address())
    }

    fn is_in_nursery(&self, object: ObjectReference) -> bool {
        self.mark_byte(object).load(Ordering::SeqCst) & NURSERY_BIT == NURSERY_BIT
    }

    /// Get a run of `pages` pages for one object.
    pub fn allocate_pages(&self, tls: VMThread, pages: usize) -> Address {
        self.acquire(tls, pages_to_bytes(pages))
    }

    pub fn prepare(&self, full_heap: bool) {
        self.common.start_cycle();
        if full_heap {
            let old = self.mark_state.load(Ordering::SeqCst);
            self.mark_state.store(MARK_BIT - old, Ordering::SeqCst);
        }
        self.treadmill.flip(full_heap);
        self.in_nursery_gc.store(!full_heap, Ordering::SeqCst);
    }

    pub fn release(&self, full_heap: bool) {
        self.common.end_cycle();
        let mut freed = self.sweep(self.treadmill.collect_nursery());
        if full_heap {
            freed += self.sweep(self.treadmill.collect());
        }
        debug!("{}: freed {} objects", self.name(), freed);
    }

    fn sweep(&self, dead: Vec<ObjectReference>) -> usize {
        for &object in dead.iter() {
            let start = object.to_address().align_down(BYTES_IN_PAGE);
            let pages = self.pr.release_pages(start);
            self.marks.clear_range(start, pages_to_bytes(pages));
            trace!("{}: freed {} ({} pages)", self.name(), object, pages);
        }
        dead.len()
    }

    pub fn trace_object(&self, trace: &mut TraceLocal<VM>, object: ObjectReference) -> ObjectReference {
        let nursery_object = self.is_in_nursery(object);
        if !self.in_nursery_gc.load(Ordering::Relaxed) || nursery_object {
            if self.test_and_mark(object, self.mark_state.load(Ordering::Relaxed)) {
                self.common.stats.object_marked();
                self.treadmill.copy(object, nursery_object);
                trace.process_node(object);
            }
        }
        object
    }

    /// Set the mark of `object` to `value` and clear its nursery bit. Returns false if it
    /// was already marked in this collection.
    fn test_and_mark(&self, object: ObjectReference, value: u8) -> bool {
        let mask = if self.in_nursery_gc.load(Ordering::Relaxed) {
            LOS_BIT_MASK
        } else {
            MARK_BIT
        };
        let mark = self.mark_byte(object);
        let mut old = mark.load(Ordering::SeqCst);
        loop {
            if old & mask == value {
                return false;
            }
            let new = (old & !LOS_BIT_MASK) | value;
            match mark.compare_exchange_weak(old, new, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => return true,
                Err(current) => old = current,
            }
        }
    }

    /// Number of objects the space tracks, live or not yet collected.
    pub fn object_count(&self) -> usize {
        self.treadmill.len()
    }
}
