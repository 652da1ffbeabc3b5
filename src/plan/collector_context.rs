use crate::plan::phase::Phase;
use crate::plan::{CopyContext, Plan, TraceLocal};
use crate::util::alloc::AllocatorContext;
use crate::util::opaque_pointer::*;
use crate::vm::VMBinding;
use std::sync::Arc;

/// The state of one collector thread: its half of the trace and its copy allocators.
pub struct CollectorContext<VM: VMBinding> {
    trace: TraceLocal<VM>,
    plan: &'static dyn Plan<VM = VM>,
}

impl<VM: VMBinding> CollectorContext<VM> {
    pub fn new(
        ordinal: usize,
        tls: VMWorkerThread,
        plan: &'static dyn Plan<VM = VM>,
        context: Arc<AllocatorContext>,
    ) -> Self {
        let copy = CopyContext::new(tls, context, plan.create_copy_config());
        CollectorContext {
            trace: TraceLocal::new(ordinal, tls, plan, copy),
            plan,
        }
    }

    pub fn ordinal(&self) -> usize {
        self.trace.ordinal()
    }

    pub fn is_primary(&self) -> bool {
        self.trace.is_primary()
    }

    pub fn trace(&mut self) -> &mut TraceLocal<VM> {
        &mut self.trace
    }

    /// Run one collector phase.
    pub fn collection_phase(&mut self, phase: Phase) {
        trace!("collector {}: {:?}", self.ordinal(), phase);
        match phase {
            Phase::Prepare => {
                self.trace.prepare();
                self.plan.prepare_collector(&mut self.trace.copy);
            }
            Phase::Roots => self.trace.process_roots(),
            Phase::Closure => self.trace.complete_trace(),
            Phase::Release => {
                self.plan.release_collector(&mut self.trace.copy);
                self.trace.release();
            }
        }
    }
}
