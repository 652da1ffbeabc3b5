// Mock tests drive whole collections through the public API. They allocate objects in the
// layout of `MockVM`, root some of them in the mock, and check the heap after collecting.

use crate::plan::gencopyms::GenCopyMS;
use crate::plan::semispace::SemiSpace;
use crate::util::test_util::mock_vm::MockVM;
use crate::util::{Address, ObjectReference};
use crate::MMTK;

// Common includes for mock tests.
pub(crate) mod mock_test_prelude {
    pub use super::{gencopyms, outside_object, semispace};
    pub use crate::memory_manager;
    pub use crate::plan::gencopyms::GenCopyMS;
    pub use crate::plan::{AllocationSemantics, Plan};
    pub use crate::policy::space::Space;
    pub use crate::util::options::PlanSelector;
    pub use crate::util::test_util::fixtures::*;
    pub use crate::util::test_util::mock_vm::*;
    pub use crate::util::ObjectReference;
    pub use crate::vm::*;
}

pub fn gencopyms(mmtk: &'static MMTK<MockVM>) -> &'static GenCopyMS<MockVM> {
    mmtk.get_plan()
        .downcast_ref::<GenCopyMS<MockVM>>()
        .expect("not a GenCopyMS heap")
}

pub fn semispace(mmtk: &'static MMTK<MockVM>) -> &'static SemiSpace<MockVM> {
    mmtk.get_plan()
        .downcast_ref::<SemiSpace<MockVM>>()
        .expect("not a SemiSpace heap")
}

/// A reference to memory outside of any heap. The box is leaked so the address stays unused.
pub fn outside_object() -> ObjectReference {
    let memory: &'static [usize; 4] = Box::leak(Box::new([0usize; 4]));
    ObjectReference::from_raw_address(Address::from_ref(memory))
}

mod mock_test_allocate_small_objects;
mod mock_test_api;
mod mock_test_concurrent_mutators;
mod mock_test_copy_race;
mod mock_test_generational;
mod mock_test_heap_layout;
mod mock_test_ignore_system_gc;
mod mock_test_large_object_routing;
mod mock_test_mark_sweep_reclaim;
mod mock_test_oom;
mod mock_test_protocol_violations;
mod mock_test_random_graph;
mod mock_test_self_reference;
mod mock_test_semispace_gc;
mod mock_test_trace_idempotent;
mod mock_test_unknown_reference;
