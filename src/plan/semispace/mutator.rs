use super::SemiSpace;
use crate::plan::barriers::NoBarrier;
use crate::plan::mutator_context::{Mutator, MutatorConfig};
use crate::plan::AllocationSemantics;
use crate::util::alloc::{AllocatorSelector, BumpAllocator, SpaceMapping};
use crate::util::{VMMutatorThread, VMWorkerThread};
use crate::vm::VMBinding;
use crate::MMTK;
use enum_map::{enum_map, EnumMap};

lazy_static! {
    pub static ref ALLOCATOR_MAPPING: EnumMap<AllocationSemantics, AllocatorSelector> = enum_map! {
        AllocationSemantics::Default | AllocationSemantics::Mature => AllocatorSelector::BumpPointer(0),
        AllocationSemantics::Immortal => AllocatorSelector::BumpPointer(1),
        AllocationSemantics::Los => AllocatorSelector::LargeObject(0),
    };
}

fn plan_of<VM: VMBinding>(mmtk: &'static MMTK<VM>) -> &'static SemiSpace<VM> {
    match mmtk.plan.downcast_ref::<SemiSpace<VM>>() {
        Some(plan) => plan,
        None => panic!("SemiSpace mutator used with another plan"),
    }
}

pub fn ss_mutator_prepare<VM: VMBinding>(_mutator: &mut Mutator<VM>, _tls: VMWorkerThread) {}

/// Rebind the default allocator to the new to-space.
pub fn ss_mutator_release<VM: VMBinding>(mutator: &mut Mutator<VM>, _tls: VMWorkerThread) {
    let tospace = plan_of(mutator.mmtk).tospace_static();
    mutator
        .allocators
        .get_typed_allocator_mut::<BumpAllocator<VM>>(ALLOCATOR_MAPPING[AllocationSemantics::Default])
        .rebind(tospace);
}

pub fn create_ss_mutator<VM: VMBinding>(
    mutator_tls: VMMutatorThread,
    mmtk: &'static MMTK<VM>,
) -> Mutator<VM> {
    let plan = plan_of(mmtk);
    let mut space_mapping: SpaceMapping<VM> = vec![];
    space_mapping.push((AllocatorSelector::BumpPointer(0), plan.tospace_static()));
    space_mapping.push((AllocatorSelector::BumpPointer(1), plan.common.get_immortal()));
    space_mapping.push((AllocatorSelector::LargeObject(0), plan.common.get_los()));

    let config = MutatorConfig {
        allocator_mapping: *ALLOCATOR_MAPPING,
        space_mapping: Box::new(space_mapping),
        prepare_func: &ss_mutator_prepare,
        release_func: &ss_mutator_release,
    };
    Mutator::new(mutator_tls, mmtk, Box::new(NoBarrier), config)
}
