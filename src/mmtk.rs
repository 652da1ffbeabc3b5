//! MMTK instance.
use crate::global_state::GlobalState;
use crate::plan::global::create_plan;
use crate::plan::{ControllerCollectorContext, CreateGeneralPlanArgs, Plan};
use crate::util::alloc::AllocatorContext;
use crate::util::heap::{GCTrigger, HeapLayoutError};
use crate::util::options::Options;
use crate::util::statistics::GCStats;
use crate::util::VMMutatorThread;
use crate::vm::VMBinding;
use std::default::Default;
use std::sync::Arc;

/// MMTk builder. This is used to set options before actually creating an MMTk instance.
pub struct MMTKBuilder {
    /// The options for this instance.
    pub options: Options,
}

impl MMTKBuilder {
    /// Create an MMTK builder with default options, overridden by `MMTK_*` environment
    /// variables.
    pub fn new() -> Self {
        MMTKBuilder {
            options: Options::default(),
        }
    }

    /// Create an MMTK builder with default options, ignoring the environment.
    pub fn new_no_env_vars() -> Self {
        MMTKBuilder {
            options: Options::new_defaults(),
        }
    }

    /// Set an option by name. Returns false if the name is unknown or the value is invalid.
    pub fn set_option(&mut self, name: &str, val: &str) -> bool {
        self.options.set_from_str(name, val)
    }

    /// Build an MMTk instance from the builder.
    pub fn build<VM: VMBinding>(&self) -> Result<MMTK<VM>, HeapLayoutError> {
        MMTK::new(Arc::new(self.options.clone()))
    }
}

impl Default for MMTKBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An MMTk instance. MMTk allows multiple instances to run independently, and each instance
/// gives users a separate heap.
///
/// *Note that multi-instances is not fully supported yet*
pub struct MMTK<VM: VMBinding> {
    pub(crate) options: Arc<Options>,
    pub(crate) state: Arc<GlobalState>,
    pub(crate) stats: Arc<GCStats>,
    pub(crate) gc_trigger: Arc<GCTrigger<VM>>,
    pub(crate) plan: Box<dyn Plan<VM = VM>>,
    pub(crate) allocator_context: Arc<AllocatorContext>,
    pub(crate) controller: ControllerCollectorContext<VM>,
}

impl<VM: VMBinding> MMTK<VM> {
    pub fn new(options: Arc<Options>) -> Result<Self, HeapLayoutError> {
        let state = Arc::new(GlobalState::default());
        let stats = Arc::new(GCStats::default());
        let gc_trigger = Arc::new(GCTrigger::new(state.clone()));
        let plan = create_plan(
            options.plan,
            CreateGeneralPlanArgs {
                options: options.clone(),
                state: state.clone(),
                gc_trigger: gc_trigger.clone(),
                stats: stats.clone(),
            },
        )?;
        Ok(MMTK {
            allocator_context: Arc::new(AllocatorContext::new(state.clone(), options.clone())),
            options,
            state,
            stats,
            gc_trigger,
            plan,
            controller: ControllerCollectorContext::new(),
        })
    }

    /// Run a stop-the-world collection on the calling thread, if one is still requested.
    pub(crate) fn collect(&'static self, tls: VMMutatorThread) {
        self.controller.collect(self, tls);
    }

    pub fn get_plan(&self) -> &dyn Plan<VM = VM> {
        self.plan.as_ref()
    }

    pub fn get_options(&self) -> &Options {
        &self.options
    }
}
