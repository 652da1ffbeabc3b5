//! Collection plans and the machinery they share.
//!
//! A plan consists of a few parts:
//! * A plan type that implements the [`Plan`] trait, which defines the spaces of the plan,
//!   how each of them is prepared, traced and released, and its page accounting.
//! * A mutator definition, which maps allocation semantics to allocators and allocators to
//!   spaces, and picks the write barrier.
//! * A constant [`PlanConstraints`].
//! * A [`CopyConfig`] that maps copy semantics to the spaces survivors are copied into.
//!
//! Collections run the [`phase::COLLECTION`] schedule on a [`ParallelCollectorGroup`]. The
//! closure itself is done by one [`TraceLocal`] per collector thread over a shared [`Trace`].

pub mod barriers;
mod collector_context;
mod controller_collector_context;
mod copy_context;
pub mod global;
pub mod mutator_context;
mod parallel_collector_group;
pub mod phase;
pub mod plan_constraints;
mod trace;
pub mod tracelocal;

pub use self::collector_context::CollectorContext;
pub use self::controller_collector_context::ControllerCollectorContext;
pub use self::copy_context::{CopyConfig, CopyContext, CopySelector, CopySemantics};
pub use self::global::{
    AllocationSemantics, BasePlan, CommonPlan, CreateGeneralPlanArgs, CreateSpecificPlanArgs,
    Plan, PlanCreateSpaceArgs,
};
pub use self::mutator_context::{Mutator, MutatorConfig};
pub use self::parallel_collector_group::ParallelCollectorGroup;
pub use self::plan_constraints::PlanConstraints;
pub use self::trace::Trace;
pub use self::tracelocal::{TraceLocal, TraceState};

pub mod gencopyms;
pub mod semispace;
