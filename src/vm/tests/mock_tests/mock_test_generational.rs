use super::mock_test_prelude::*;
use crate::util::header_byte;

#[test]
pub fn remembered_set_keeps_young_objects_alive() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create_with_plan(PlanSelector::GenCopyMS);
            let plan = gencopyms(fixture.mmtk);

            let old = alloc_with_id(fixture.mutator, 1, 1, AllocationSemantics::Mature);
            assert!(header_byte::is_unlogged::<MockVM>(old));
            let index = add_root(old);
            let young = alloc_with_id(fixture.mutator, 1, 2, AllocationSemantics::Default);
            // The only reference to `young` is in a mature object.
            set_ref(fixture.mutator, old, 0, young);
            assert!(!header_byte::is_unlogged::<MockVM>(old));

            fixture.collect();
            assert!(!memory_manager::last_gc_was_full_heap(fixture.mmtk));
            assert_eq!(root(index), old);
            let promoted = get_ref(old, 0);
            assert_ne!(promoted, young);
            assert!(plan.mature.in_space(promoted));
            assert_eq!(id_of(promoted), 2);
            // Both can be logged again.
            assert!(header_byte::is_unlogged::<MockVM>(old));
            assert!(header_byte::is_unlogged::<MockVM>(promoted));

            // A store into the promoted object is remembered too.
            let younger = alloc_with_id(fixture.mutator, 0, 3, AllocationSemantics::Default);
            set_ref(fixture.mutator, promoted, 0, younger);
            fixture.collect();
            assert_eq!(get_ref(old, 0), promoted);
            let younger = get_ref(promoted, 0);
            assert!(plan.mature.in_space(younger));
            assert_eq!(id_of(younger), 3);

            plan.force_full_heap_collection();
            fixture.collect();
            assert!(memory_manager::last_gc_was_full_heap(fixture.mmtk));
            assert_eq!(memory_manager::gc_count(fixture.mmtk), 3);
            let stats = memory_manager::collection_stats(fixture.mmtk);
            assert_eq!(stats.collections, 3);
            assert_eq!(stats.full_heap_collections, 1);
        },
        no_cleanup,
    )
}

#[test]
pub fn full_nursery_triggers_a_collection() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create_with_plan(PlanSelector::GenCopyMS);
            let plan = gencopyms(fixture.mmtk);
            let max_nursery = fixture.mmtk.get_options().max_nursery;
            let kept = alloc_with_id(fixture.mutator, 0, 0, AllocationSemantics::Default);
            let index = add_root(kept);

            let mut allocated = 0;
            while allocated <= 2 * max_nursery {
                alloc_object_with_size(fixture.mutator, 64, 0, AllocationSemantics::Default);
                allocated += 64;
            }
            assert!(memory_manager::gc_count(fixture.mmtk) >= 1);
            assert!(read_mockvm(|mock| mock.stop_count) >= 1);
            assert!(plan.mature.in_space(root(index)));
            assert_eq!(id_of(root(index)), 0);
        },
        no_cleanup,
    )
}

#[test]
pub fn user_collection_can_be_full_heap() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create_with_builder(
                |builder| builder.options.full_heap_system_gc = true,
                true,
            );
            alloc_object(fixture.mutator, 0, AllocationSemantics::Default);
            fixture.collect();
            assert!(memory_manager::last_gc_was_full_heap(fixture.mmtk));
        },
        no_cleanup,
    )
}
