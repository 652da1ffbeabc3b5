use crate::global_state::GlobalState;
use crate::plan::Plan;
use crate::policy::space::Space;
use crate::vm::VMBinding;
use atomic_refcell::AtomicRefCell;
use std::sync::Arc;

/// Decides, on behalf of the spaces, when a collection is due. Every decision is delegated
/// to [`Plan::collection_required`]; the trigger only adds the bookkeeping of a request.
pub struct GCTrigger<VM: VMBinding> {
    /// Unset until the plan has a fixed address. Polls return false until then.
    plan: AtomicRefCell<Option<&'static dyn Plan<VM = VM>>>,
    state: Arc<GlobalState>,
}

impl<VM: VMBinding> GCTrigger<VM> {
    pub fn new(state: Arc<GlobalState>) -> Self {
        GCTrigger {
            plan: AtomicRefCell::new(None),
            state,
        }
    }

    pub fn set_plan(&self, plan: &'static dyn Plan<VM = VM>) {
        *self.plan.borrow_mut() = Some(plan);
    }

    fn plan(&self) -> Option<&'static dyn Plan<VM = VM>> {
        *self.plan.borrow()
    }

    /// Called by a space before it takes new pages, and by the allocation fast path through
    /// `memory_manager::collection_required`.
    ///
    /// * `space_full`: the space failed to satisfy a request outright.
    /// * `space`: the space that is polling, if any.
    ///
    /// Returns true if a collection was requested. The space must then refuse the request.
    pub fn poll(&self, space_full: bool, space: Option<&dyn Space<VM>>) -> bool {
        let plan = match self.plan() {
            Some(plan) => plan,
            None => return false,
        };
        if !self.state.is_collection_enabled() {
            return false;
        }
        if plan.collection_required(space_full, space) {
            info!(
                "[POLL] {}{}",
                space.map_or(String::new(), |s| format!("{}: ", s.name())),
                if space_full {
                    "Space full"
                } else {
                    "Triggering collection"
                }
            );
            self.state
                .request_collection(space.map(|s| s.descriptor()), space_full, false);
            return true;
        }
        false
    }

    /// Are more pages reserved than the heap allows?
    pub fn is_heap_full(&self) -> bool {
        self.plan()
            .is_some_and(|plan| plan.get_pages_reserved() > plan.get_total_pages())
    }
}
