use crate::plan::barriers::BarrierSelector;
use crate::plan::global::{BasePlan, CommonPlan, CreateGeneralPlanArgs, CreateSpecificPlanArgs};
use crate::plan::{CopyConfig, CopyContext, CopySelector, CopySemantics, Plan, PlanConstraints, TraceLocal};
use crate::policy::copyspace::CopySpace;
use crate::policy::marksweepspace::MarkSweepSpace;
use crate::policy::space::Space;
use crate::util::heap::{HeapLayoutError, VMRequest};
use crate::util::{ObjectReference, VMWorkerThread};
use crate::vm::VMBinding;
use enum_map::enum_map;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct GenCopyMS<VM: VMBinding> {
    pub nursery: CopySpace<VM>,
    pub mature: MarkSweepSpace<VM>,
    pub common: CommonPlan<VM>,
    /// Is the current (or last) collection full heap?
    gc_full_heap: AtomicBool,
    /// Must the next collection be full heap?
    next_gc_full_heap: AtomicBool,
}

pub const GENCOPYMS_CONSTRAINTS: PlanConstraints = PlanConstraints {
    moves_objects: true,
    needs_log_bit: true,
    barrier: BarrierSelector::ObjectBarrier,
    generational: true,
    ..PlanConstraints::default()
};

impl<VM: VMBinding> Plan for GenCopyMS<VM> {
    type VM = VM;

    fn constraints(&self) -> &'static PlanConstraints {
        &GENCOPYMS_CONSTRAINTS
    }

    fn create_copy_config(&'static self) -> CopyConfig<Self::VM> {
        CopyConfig {
            copy_mapping: enum_map! {
                CopySemantics::DefaultCopy => CopySelector::MarkSweepSpace(0),
                CopySemantics::Mature => CopySelector::MarkSweepSpace(0),
                CopySemantics::Los => CopySelector::LargeObjectSpace(0),
            },
            space_mapping: vec![
                (CopySelector::MarkSweepSpace(0), &self.mature as &dyn Space<VM>),
                (CopySelector::LargeObjectSpace(0), self.common.get_los() as &dyn Space<VM>),
            ],
            constraints: &GENCOPYMS_CONSTRAINTS,
        }
    }

    fn base(&self) -> &BasePlan<VM> {
        &self.common.base
    }

    fn common(&self) -> &CommonPlan<VM> {
        &self.common
    }

    fn get_spaces(&self) -> Vec<&dyn Space<VM>> {
        let mut spaces = self.common.get_spaces();
        spaces.push(&self.nursery);
        spaces.push(&self.mature);
        spaces
    }

    fn is_current_gc_nursery(&self) -> bool {
        !self.gc_full_heap.load(Ordering::SeqCst)
    }

    fn last_collection_full_heap(&self) -> bool {
        self.gc_full_heap.load(Ordering::SeqCst)
    }

    fn prepare(&self, tls: VMWorkerThread) {
        let full_heap = self.requires_full_heap_collection();
        self.gc_full_heap.store(full_heap, Ordering::SeqCst);
        info!("{}", if full_heap { "Full heap GC" } else { "Nursery GC" });

        self.common.prepare(tls, full_heap);
        if full_heap {
            self.mature.prepare();
        }
        self.nursery.prepare(true);
        self.common.base.trace.prepare(self.options().threads);
    }

    fn release(&self, tls: VMWorkerThread) {
        let full_heap = self.gc_full_heap.load(Ordering::SeqCst);
        self.nursery.release();
        self.common.release(tls, full_heap);
        if full_heap {
            self.mature.release();
        }
        self.common.base.trace.release();
        self.next_gc_full_heap.store(
            self.get_pages_avail() < self.options().max_nursery_pages(),
            Ordering::SeqCst,
        );
    }

    fn release_collector(&'static self, copy: &mut CopyContext<VM>) {
        // The sweep rebuilds every free list of the mature space.
        if self.gc_full_heap.load(Ordering::SeqCst) {
            copy.reset_free_lists();
        }
    }

    fn collection_required(&self, space_full: bool, space: Option<&dyn Space<VM>>) -> bool {
        if self.nursery.reserved_pages() > self.options().max_nursery_pages() {
            return true;
        }
        let triggered_by_nursery =
            space.map_or(false, |s| s.descriptor() == self.nursery.descriptor());
        if space_full && !triggered_by_nursery {
            self.next_gc_full_heap.store(true, Ordering::SeqCst);
        }
        self.common.base.collection_required(self, space_full)
    }

    fn get_pages_used(&self) -> usize {
        self.nursery.reserved_pages() + self.mature.reserved_pages() + self.common.get_pages_used()
    }

    /// Every nursery object may be promoted.
    fn get_collection_reserved_pages(&self) -> usize {
        self.nursery.reserved_pages()
    }

    fn trace_object(&self, trace: &mut TraceLocal<VM>, object: ObjectReference) -> ObjectReference {
        if self.nursery.in_space(object) {
            return self.nursery.trace_object(trace, object, CopySemantics::Mature);
        }
        if self.mature.in_space(object) {
            if self.gc_full_heap.load(Ordering::Relaxed) {
                return self.mature.trace_object(trace, object);
            }
            return object;
        }
        self.common.trace_object(trace, object)
    }

    fn is_live(&self, object: ObjectReference) -> bool {
        // A nursery collection leaves the marks of the mature space alone.
        if self.mature.in_space(object) && self.is_current_gc_nursery() {
            return true;
        }
        match self.space_of(object) {
            Some(space) => space.is_live(object),
            None => panic!("{} is not in any space", object),
        }
    }
}

impl<VM: VMBinding> GenCopyMS<VM> {
    pub fn new(args: CreateGeneralPlanArgs<VM>) -> Result<Self, HeapLayoutError> {
        let nursery_size = args.options.nursery_size;
        let mut plan_args = CreateSpecificPlanArgs::new(args, &GENCOPYMS_CONSTRAINTS);
        let nursery = CopySpace::new(
            plan_args.get_space_args("nursery", VMRequest::fixed_extent(nursery_size)),
            false,
        )?;
        let mature = MarkSweepSpace::new(plan_args.get_space_args("mature", VMRequest::discontiguous()))?;
        Ok(GenCopyMS {
            nursery,
            mature,
            common: CommonPlan::new(plan_args)?,
            gc_full_heap: AtomicBool::new(false),
            next_gc_full_heap: AtomicBool::new(false),
        })
    }

    /// Decide whether the collection that is starting is full heap.
    fn requires_full_heap_collection(&self) -> bool {
        let state = &self.common.base.state;
        #[allow(clippy::if_same_then_else)]
        let full_heap = if state.is_user_triggered_collection() && self.options().full_heap_system_gc {
            true
        } else if self.next_gc_full_heap.load(Ordering::SeqCst) || state.is_emergency_collection() {
            true
        } else if state.is_space_full()
            && state
                .trigger_space()
                .map_or(false, |d| d != self.nursery.descriptor())
        {
            true
        } else {
            // Not enough headroom to promote a full nursery.
            self.get_total_pages() <= self.get_pages_reserved()
        };
        full_heap
    }

    /// Make the next collection full heap.
    pub fn force_full_heap_collection(&self) {
        self.next_gc_full_heap.store(true, Ordering::SeqCst);
    }
}
