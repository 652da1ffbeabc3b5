//! The global part of a plan implementation.

use super::PlanConstraints;
use crate::global_state::GlobalState;
use crate::mmtk::MMTK;
use crate::plan::phase::Phase;
use crate::plan::{CopyConfig, CopyContext, Mutator, Trace, TraceLocal};
use crate::policy::immortalspace::ImmortalSpace;
use crate::policy::largeobjectspace::LargeObjectSpace;
use crate::policy::space::Space;
use crate::util::conversions::bytes_to_pages_up;
use crate::util::heap::{GCTrigger, HeapLayout, HeapLayoutError, VMRequest};
use crate::util::options::{Options, PlanSelector};
use crate::util::statistics::GCStats;
use crate::util::ObjectReference;
use crate::util::{VMMutatorThread, VMWorkerThread};
use crate::vm::VMBinding;
use downcast_rs::Downcast;
use enum_map::Enum;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub fn create_mutator<VM: VMBinding>(
    tls: VMMutatorThread,
    mmtk: &'static MMTK<VM>,
) -> Box<Mutator<VM>> {
    Box::new(match mmtk.options.plan {
        PlanSelector::GenCopyMS => {
            crate::plan::gencopyms::mutator::create_gencopyms_mutator(tls, mmtk)
        }
        PlanSelector::SemiSpace => crate::plan::semispace::mutator::create_ss_mutator(tls, mmtk),
    })
}

pub fn create_plan<VM: VMBinding>(
    plan: PlanSelector,
    args: CreateGeneralPlanArgs<VM>,
) -> Result<Box<dyn Plan<VM = VM>>, HeapLayoutError> {
    let plan: Box<dyn Plan<VM = VM>> = match plan {
        PlanSelector::GenCopyMS => Box::new(crate::plan::gencopyms::GenCopyMS::new(args)?),
        PlanSelector::SemiSpace => Box::new(crate::plan::semispace::SemiSpace::new(args)?),
    };
    for space in plan.get_spaces() {
        debug!(
            "{}: {:?} at {} ({} bytes)",
            space.name(),
            space.descriptor(),
            space.common().extent.start,
            space.common().extent.extent
        );
    }
    Ok(plan)
}

/// A plan describes the spaces of a heap and how a collection treats each of them.
///
/// The global phases run on the thread that drives the collection. Everything a collector
/// thread does for the plan goes through [`Plan::trace_object`],
/// [`Plan::prepare_collector`] and [`Plan::release_collector`].
pub trait Plan: 'static + Sync + Send + Downcast {
    type VM: VMBinding;

    fn constraints(&self) -> &'static PlanConstraints;

    /// The copy allocators of a collector thread. `&'static self` because the allocators hold
    /// references to the spaces of the plan.
    fn create_copy_config(&'static self) -> CopyConfig<Self::VM>;

    fn base(&self) -> &BasePlan<Self::VM>;

    fn common(&self) -> &CommonPlan<Self::VM>;

    fn options(&self) -> &Options {
        &self.base().options
    }

    fn get_spaces(&self) -> Vec<&dyn Space<Self::VM>>;

    /// The space `object` is in, looked up by address.
    fn space_of(&self, object: ObjectReference) -> Option<&dyn Space<Self::VM>> {
        let descriptor = self.base().layout.space_of(object.to_address())?;
        self.get_spaces()
            .into_iter()
            .find(|space| space.descriptor() == descriptor)
    }

    /// Is the current collection a nursery collection?
    fn is_current_gc_nursery(&self) -> bool {
        false
    }

    fn last_collection_full_heap(&self) -> bool {
        true
    }

    fn collection_phase(&self, tls: VMWorkerThread, phase: Phase) {
        match phase {
            Phase::Prepare => self.prepare(tls),
            Phase::Release => self.release(tls),
            phase => panic!("no global {:?} phase", phase),
        }
    }

    /// Prepare every space for the collection. Runs once, after the mutators stopped.
    fn prepare(&self, tls: VMWorkerThread);

    /// Reclaim memory after the closure. Runs once, before the mutators resume.
    fn release(&self, tls: VMWorkerThread);

    /// Prepare the copy allocators of one collector. `&'static self` so that allocators can
    /// be rebound to spaces of the plan.
    fn prepare_collector(&'static self, _copy: &mut CopyContext<Self::VM>) {}

    fn release_collector(&'static self, _copy: &mut CopyContext<Self::VM>) {}

    /// Ask the plan if it wants a collection.
    ///
    /// * `space_full`: a space failed to satisfy an allocation outright.
    /// * `space`: the space that is polling, if any.
    fn collection_required(&self, space_full: bool, space: Option<&dyn Space<Self::VM>>) -> bool;

    /// Pages in use by all spaces.
    fn get_pages_used(&self) -> usize;

    /// Pages held back to guarantee that the next collection can finish.
    fn get_collection_reserved_pages(&self) -> usize {
        0
    }

    fn get_pages_reserved(&self) -> usize {
        self.get_pages_used() + self.get_collection_reserved_pages()
    }

    fn get_total_pages(&self) -> usize {
        bytes_to_pages_up(self.base().options.heap_size)
    }

    fn get_pages_avail(&self) -> usize {
        // Reserved pages may exceed the total right after a copying collection.
        self.get_total_pages()
            .saturating_sub(self.get_pages_reserved())
    }

    fn trace_object(&self, trace: &mut TraceLocal<Self::VM>, object: ObjectReference) -> ObjectReference;

    fn is_live(&self, object: ObjectReference) -> bool {
        match self.space_of(object) {
            Some(space) => space.is_live(object),
            None => panic!("{} is not in any space", object),
        }
    }

    fn will_not_move_in_current_collection(&self, object: ObjectReference) -> bool {
        self.space_of(object)
            .map_or(true, |space| space.will_not_move_in_current_collection(object))
    }
}

impl_downcast!(Plan assoc VM);

/// Args needed for creating any plan. This is passed to each plan's constructor.
pub struct CreateGeneralPlanArgs<VM: VMBinding> {
    pub options: Arc<Options>,
    pub state: Arc<GlobalState>,
    pub gc_trigger: Arc<GCTrigger<VM>>,
    pub stats: Arc<GCStats>,
}

/// Args needed for creating a specific plan. Spaces are created from it with
/// [`CreateSpecificPlanArgs::get_space_args`], and then it is consumed by [`BasePlan::new`].
pub struct CreateSpecificPlanArgs<VM: VMBinding> {
    pub global_args: CreateGeneralPlanArgs<VM>,
    pub constraints: &'static PlanConstraints,
    pub layout: HeapLayout,
}

impl<VM: VMBinding> CreateSpecificPlanArgs<VM> {
    pub fn new(global_args: CreateGeneralPlanArgs<VM>, constraints: &'static PlanConstraints) -> Self {
        let layout = HeapLayout::new(global_args.options.heap_size);
        CreateSpecificPlanArgs {
            global_args,
            constraints,
            layout,
        }
    }

    /// Get a PlanCreateSpaceArgs that can be used to create a space
    pub fn get_space_args(&mut self, name: &'static str, vmrequest: VMRequest) -> PlanCreateSpaceArgs<'_, VM> {
        PlanCreateSpaceArgs {
            name,
            vmrequest,
            needs_log_bit: self.constraints.needs_log_bit,
            layout: &mut self.layout,
            global: &self.global_args,
        }
    }
}

/// Everything a space needs at creation.
pub struct PlanCreateSpaceArgs<'a, VM: VMBinding> {
    pub name: &'static str,
    pub vmrequest: VMRequest,
    pub needs_log_bit: bool,
    pub layout: &'a mut HeapLayout,
    pub global: &'a CreateGeneralPlanArgs<VM>,
}

/// State every plan has.
pub struct BasePlan<VM: VMBinding> {
    pub options: Arc<Options>,
    pub state: Arc<GlobalState>,
    pub gc_trigger: Arc<GCTrigger<VM>>,
    pub stats: Arc<GCStats>,
    /// The extents of all spaces of the plan.
    pub layout: HeapLayout,
    pub trace: Arc<Trace>,
}

impl<VM: VMBinding> BasePlan<VM> {
    pub fn new(args: CreateSpecificPlanArgs<VM>) -> BasePlan<VM> {
        BasePlan {
            options: args.global_args.options,
            state: args.global_args.state,
            gc_trigger: args.global_args.gc_trigger,
            stats: args.global_args.stats,
            layout: args.layout,
            trace: Arc::new(Trace::new()),
        }
    }

    /// Collect when a space is full or when the plan has reserved more pages than the heap
    /// allows.
    pub fn collection_required<P: Plan + ?Sized>(&self, plan: &P, space_full: bool) -> bool {
        let heap_full = plan.get_pages_reserved() > plan.get_total_pages();
        trace!(
            "collection_required: space_full={}, reserved={}, total={}",
            space_full,
            plan.get_pages_reserved(),
            plan.get_total_pages()
        );
        space_full || heap_full
    }
}

/// Spaces every plan has: an immortal space and a large object space.
pub struct CommonPlan<VM: VMBinding> {
    pub immortal: ImmortalSpace<VM>,
    pub los: LargeObjectSpace<VM>,
    pub base: BasePlan<VM>,
    full_heap: AtomicBool,
}

impl<VM: VMBinding> CommonPlan<VM> {
    pub fn new(mut args: CreateSpecificPlanArgs<VM>) -> Result<CommonPlan<VM>, HeapLayoutError> {
        let immortal_size = args.global_args.options.immortal_size;
        Ok(CommonPlan {
            immortal: ImmortalSpace::new(
                args.get_space_args("immortal", VMRequest::fixed_extent(immortal_size)),
            )?,
            los: LargeObjectSpace::new(args.get_space_args("los", VMRequest::discontiguous()))?,
            base: BasePlan::new(args),
            full_heap: AtomicBool::new(true),
        })
    }

    pub fn get_spaces(&self) -> Vec<&dyn Space<VM>> {
        vec![&self.immortal, &self.los]
    }

    pub fn get_pages_used(&self) -> usize {
        self.immortal.reserved_pages() + self.los.reserved_pages()
    }

    pub fn trace_object(&self, trace: &mut TraceLocal<VM>, object: ObjectReference) -> ObjectReference {
        if self.los.in_space(object) {
            return self.los.trace_object(trace, object);
        }
        if self.immortal.in_space(object) {
            // A nursery collection does not trace the immortal space. Immortal objects that
            // point into the nursery are in the remembered set.
            if self.full_heap.load(Ordering::Relaxed) {
                return self.immortal.trace_object(trace, object);
            }
            return object;
        }
        panic!("{} is not in any space", object)
    }

    pub fn prepare(&self, _tls: VMWorkerThread, full_heap: bool) {
        self.full_heap.store(full_heap, Ordering::Relaxed);
        if full_heap {
            self.immortal.prepare();
        }
        self.los.prepare(full_heap);
    }

    pub fn release(&self, _tls: VMWorkerThread, full_heap: bool) {
        self.los.release(full_heap);
        if full_heap {
            self.immortal.release();
        }
    }

    pub fn get_immortal(&self) -> &ImmortalSpace<VM> {
        &self.immortal
    }

    pub fn get_los(&self) -> &LargeObjectSpace<VM> {
        &self.los
    }
}

/// Allocation semantics that the plans provide.
/// Each allocation request requires a desired semantic for the object to allocate.
#[repr(i32)]
#[derive(Clone, Copy, Debug, Enum, PartialEq, Eq)]
pub enum AllocationSemantics {
    /// The default semantic. The actual space depends on the plan: the nursery of a
    /// generational plan, or the current semispace.
    Default = 0,
    /// Immortal objects will not be reclaimed. They are still traced in full-heap
    /// collections.
    Immortal = 1,
    /// Large objects are allocated with page granularity and will not be moved. Requests
    /// above `max_non_los_default_alloc_bytes` are routed here whatever semantic they ask for.
    Los = 2,
    /// Pretenure into the mature space, or the default space in plans without one.
    Mature = 3,
}
