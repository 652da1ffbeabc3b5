use super::mock_test_prelude::*;
use crate::util::constants::MAX_NON_LOS_ALLOC_BYTES;

const LARGE: usize = MAX_NON_LOS_ALLOC_BYTES + 1808;

#[test]
pub fn large_objects_go_to_los_and_never_move() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create_with_plan(PlanSelector::GenCopyMS);
            let plan = gencopyms(fixture.mmtk);
            let los = plan.common.get_los();

            // Asked for the default space, served by the large object space.
            let kept = alloc_object_with_size(fixture.mutator, LARGE, 1, AllocationSemantics::Default);
            let dropped = alloc_object_with_size(fixture.mutator, LARGE, 0, AllocationSemantics::Default);
            assert!(los.in_space(kept));
            assert!(los.in_space(dropped));
            assert!(!plan.nursery.in_space(kept));
            assert!(kept.to_address().is_aligned_to(crate::util::constants::BYTES_IN_PAGE));
            assert!(memory_manager::will_never_move(fixture.mmtk, kept));
            assert_eq!(los.object_count(), 2);

            // A large object can hold a nursery object.
            let child = alloc_with_id(fixture.mutator, 0, 7, AllocationSemantics::Default);
            set_ref(fixture.mutator, kept, 0, child);
            let index = add_root(kept);

            fixture.collect();
            assert!(!memory_manager::last_gc_was_full_heap(fixture.mmtk));
            assert_eq!(root(index), kept);
            assert_eq!(los.object_count(), 1);
            let child = get_ref(kept, 0);
            assert!(plan.mature.in_space(child));
            assert_eq!(id_of(child), 7);

            plan.force_full_heap_collection();
            fixture.collect();
            assert!(memory_manager::last_gc_was_full_heap(fixture.mmtk));
            assert_eq!(root(index), kept);
            assert_eq!(los.object_count(), 1);
            assert_eq!(MockVM::get_current_size(kept), LARGE);

            clear_roots();
            plan.force_full_heap_collection();
            fixture.collect();
            assert_eq!(los.object_count(), 0);
            assert_eq!(los.reserved_pages(), 0);
        },
        no_cleanup,
    )
}

#[test]
pub fn explicit_los_semantics() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create_with_plan(PlanSelector::SemiSpace);
            let plan = semispace(fixture.mmtk);
            let small = alloc_object(fixture.mutator, 2, AllocationSemantics::Los);
            assert!(plan.common.get_los().in_space(small));
            let index = add_root(small);

            fixture.collect();
            assert_eq!(root(index), small);
            assert!(memory_manager::will_never_move(fixture.mmtk, small));
            assert_eq!(plan.common.get_los().object_count(), 1);
        },
        no_cleanup,
    )
}
