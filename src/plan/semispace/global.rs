use crate::plan::global::{BasePlan, CommonPlan, CreateGeneralPlanArgs, CreateSpecificPlanArgs};
use crate::plan::{CopyConfig, CopyContext, CopySelector, CopySemantics, Plan, PlanConstraints, TraceLocal};
use crate::policy::copyspace::CopySpace;
use crate::policy::space::Space;
use crate::util::heap::{HeapLayoutError, VMRequest};
use crate::util::{ObjectReference, VMWorkerThread};
use crate::vm::VMBinding;
use enum_map::enum_map;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct SemiSpace<VM: VMBinding> {
    pub hi: AtomicBool,
    pub copyspace0: CopySpace<VM>,
    pub copyspace1: CopySpace<VM>,
    pub common: CommonPlan<VM>,
}

pub const SS_CONSTRAINTS: PlanConstraints = PlanConstraints {
    moves_objects: true,
    ..PlanConstraints::default()
};

impl<VM: VMBinding> Plan for SemiSpace<VM> {
    type VM = VM;

    fn constraints(&self) -> &'static PlanConstraints {
        &SS_CONSTRAINTS
    }

    fn create_copy_config(&'static self) -> CopyConfig<Self::VM> {
        CopyConfig {
            copy_mapping: enum_map! {
                CopySemantics::DefaultCopy => CopySelector::CopySpace(0),
                CopySemantics::Mature => CopySelector::CopySpace(0),
                CopySemantics::Los => CopySelector::LargeObjectSpace(0),
            },
            space_mapping: vec![
                // Rebound to the to-space before every collection.
                (CopySelector::CopySpace(0), self.tospace() as &dyn Space<VM>),
                (CopySelector::LargeObjectSpace(0), self.common.get_los() as &dyn Space<VM>),
            ],
            constraints: &SS_CONSTRAINTS,
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
        spaces.push(&self.copyspace0);
        spaces.push(&self.copyspace1);
        spaces
    }

    fn prepare(&self, tls: VMWorkerThread) {
        self.common.prepare(tls, true);
        // Flip the semispaces.
        self.hi.fetch_xor(true, Ordering::SeqCst);
        let hi = self.hi.load(Ordering::SeqCst);
        self.copyspace0.prepare(hi);
        self.copyspace1.prepare(!hi);
        self.common.base.trace.prepare(self.options().threads);
    }

    fn prepare_collector(&'static self, copy: &mut CopyContext<VM>) {
        copy.rebind(0, self.tospace_static());
    }

    fn release(&self, tls: VMWorkerThread) {
        self.common.release(tls, true);
        self.fromspace().release();
        self.common.base.trace.release();
    }

    fn collection_required(&self, space_full: bool, _space: Option<&dyn Space<VM>>) -> bool {
        self.common.base.collection_required(self, space_full)
    }

    fn get_pages_used(&self) -> usize {
        self.tospace().reserved_pages() + self.common.get_pages_used()
    }

    /// Everything in the to-space may survive.
    fn get_collection_reserved_pages(&self) -> usize {
        self.tospace().reserved_pages()
    }

    fn get_pages_avail(&self) -> usize {
        self.get_total_pages()
            .saturating_sub(self.get_pages_reserved())
            >> 1
    }

    fn trace_object(&self, trace: &mut TraceLocal<VM>, object: ObjectReference) -> ObjectReference {
        if self.copyspace0.in_space(object) {
            return self
                .copyspace0
                .trace_object(trace, object, CopySemantics::DefaultCopy);
        }
        if self.copyspace1.in_space(object) {
            return self
                .copyspace1
                .trace_object(trace, object, CopySemantics::DefaultCopy);
        }
        self.common.trace_object(trace, object)
    }
}

impl<VM: VMBinding> SemiSpace<VM> {
    pub fn new(args: CreateGeneralPlanArgs<VM>) -> Result<Self, HeapLayoutError> {
        let mut plan_args = CreateSpecificPlanArgs::new(args, &SS_CONSTRAINTS);
        let copyspace0 = CopySpace::new(
            plan_args.get_space_args("copyspace0", VMRequest::discontiguous()),
            false,
        )?;
        let copyspace1 = CopySpace::new(
            plan_args.get_space_args("copyspace1", VMRequest::discontiguous()),
            true,
        )?;
        Ok(SemiSpace {
            hi: AtomicBool::new(false),
            copyspace0,
            copyspace1,
            common: CommonPlan::new(plan_args)?,
        })
    }

    /// The space mutators allocate into, and survivors are copied into.
    pub fn tospace(&self) -> &CopySpace<VM> {
        if self.hi.load(Ordering::SeqCst) {
            &self.copyspace1
        } else {
            &self.copyspace0
        }
    }

    pub fn fromspace(&self) -> &CopySpace<VM> {
        if self.hi.load(Ordering::SeqCst) {
            &self.copyspace0
        } else {
            &self.copyspace1
        }
    }

    /// [`SemiSpace::tospace`] with the lifetime of the plan, for binding allocators.
    pub fn tospace_static(&'static self) -> &'static CopySpace<VM> {
        self.tospace()
    }
}
