use super::GenCopyMS;
use crate::plan::barriers::ObjectBarrier;
use crate::plan::mutator_context::{Mutator, MutatorConfig};
use crate::plan::AllocationSemantics;
use crate::util::alloc::{Allocator, AllocatorSelector, BumpAllocator, FreeListAllocator, SpaceMapping};
use crate::util::{VMMutatorThread, VMWorkerThread};
use crate::vm::VMBinding;
use crate::MMTK;
use enum_map::{enum_map, EnumMap};

lazy_static! {
    pub static ref ALLOCATOR_MAPPING: EnumMap<AllocationSemantics, AllocatorSelector> = enum_map! {
        AllocationSemantics::Default => AllocatorSelector::BumpPointer(0),
        AllocationSemantics::Immortal => AllocatorSelector::BumpPointer(1),
        AllocationSemantics::Los => AllocatorSelector::LargeObject(0),
        AllocationSemantics::Mature => AllocatorSelector::FreeList(0),
    };
}

/// A full-heap collection sweeps the mature space, so local free lists must be dropped first.
pub fn gencopyms_mutator_prepare<VM: VMBinding>(mutator: &mut Mutator<VM>, _tls: VMWorkerThread) {
    if !mutator.mmtk.plan.is_current_gc_nursery() {
        mutator
            .allocators
            .get_typed_allocator_mut::<FreeListAllocator<VM>>(
                ALLOCATOR_MAPPING[AllocationSemantics::Mature],
            )
            .reset();
    }
}

/// The nursery is empty after every collection.
pub fn gencopyms_mutator_release<VM: VMBinding>(mutator: &mut Mutator<VM>, _tls: VMWorkerThread) {
    mutator
        .allocators
        .get_typed_allocator_mut::<BumpAllocator<VM>>(ALLOCATOR_MAPPING[AllocationSemantics::Default])
        .reset();
}

pub fn create_gencopyms_mutator<VM: VMBinding>(
    mutator_tls: VMMutatorThread,
    mmtk: &'static MMTK<VM>,
) -> Mutator<VM> {
    let plan = match mmtk.plan.downcast_ref::<GenCopyMS<VM>>() {
        Some(plan) => plan,
        None => panic!("create_gencopyms_mutator with another plan"),
    };
    let mut space_mapping: SpaceMapping<VM> = vec![];
    space_mapping.push((AllocatorSelector::BumpPointer(0), &plan.nursery));
    space_mapping.push((AllocatorSelector::BumpPointer(1), plan.common.get_immortal()));
    space_mapping.push((AllocatorSelector::FreeList(0), &plan.mature));
    space_mapping.push((AllocatorSelector::LargeObject(0), plan.common.get_los()));

    let config = MutatorConfig {
        allocator_mapping: *ALLOCATOR_MAPPING,
        space_mapping: Box::new(space_mapping),
        prepare_func: &gencopyms_mutator_prepare,
        release_func: &gencopyms_mutator_release,
    };
    let barrier = Box::new(ObjectBarrier::<VM>::new(plan.common.base.trace.clone()));
    Mutator::new(mutator_tls, mmtk, barrier, config)
}
