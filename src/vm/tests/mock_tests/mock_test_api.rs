use super::mock_test_prelude::*;
use crate::util::constants::{BYTES_IN_PAGE, MIN_OBJECT_SIZE};

#[test]
pub fn object_queries() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create_with_plan(PlanSelector::GenCopyMS);
            let mmtk = fixture.mmtk;
            let young = alloc_object(fixture.mutator, 0, AllocationSemantics::Default);
            let immortal = alloc_object(fixture.mutator, 0, AllocationSemantics::Immortal);
            let large = alloc_object_with_size(fixture.mutator, 4 * BYTES_IN_PAGE, 0, AllocationSemantics::Los);

            assert!(memory_manager::is_in_mmtk_spaces(mmtk, young));
            assert!(memory_manager::is_in_mmtk_spaces(mmtk, immortal));
            assert!(memory_manager::is_in_mmtk_spaces(mmtk, large));
            assert!(!memory_manager::is_in_mmtk_spaces(mmtk, ObjectReference::NULL));
            assert!(!memory_manager::is_in_mmtk_spaces(mmtk, outside_object()));

            assert!(!memory_manager::will_never_move(mmtk, young));
            assert!(memory_manager::will_never_move(mmtk, immortal));
            assert!(memory_manager::will_never_move(mmtk, large));
            assert!(memory_manager::is_live_object(mmtk, immortal));
        },
        no_cleanup,
    )
}

fn stale_copy_space_objects_are_dead(plan: PlanSelector) {
    let fixture = MutatorFixture::create_with_plan(plan);
    let mmtk = fixture.mmtk;
    let garbage = alloc_object(fixture.mutator, 0, AllocationSemantics::Default);
    let kept = alloc_object(fixture.mutator, 0, AllocationSemantics::Default);
    let index = add_root(kept);
    assert!(memory_manager::is_live_object(mmtk, garbage));

    fixture.collect();

    assert!(!memory_manager::is_live_object(mmtk, garbage));
    assert!(memory_manager::is_live_object(mmtk, root(index)));
}

#[test]
pub fn released_nursery_objects_are_dead() {
    with_mockvm(
        default_setup,
        || stale_copy_space_objects_are_dead(PlanSelector::GenCopyMS),
        no_cleanup,
    )
}

#[test]
pub fn released_semispace_objects_are_dead() {
    with_mockvm(
        default_setup,
        || stale_copy_space_objects_are_dead(PlanSelector::SemiSpace),
        no_cleanup,
    )
}

#[test]
#[should_panic(expected = "is not in any space")]
pub fn will_never_move_outside_the_heap() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create();
            memory_manager::will_never_move(fixture.mmtk, outside_object());
        },
        no_cleanup,
    )
}

#[test]
pub fn full_space_requires_collection() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create_with_plan(PlanSelector::GenCopyMS);
            let mmtk = fixture.mmtk;
            let nursery: &dyn Space<MockVM> = &gencopyms(mmtk).nursery;
            assert!(!memory_manager::collection_required(mmtk, false, Some(nursery)));
            assert!(memory_manager::collection_required(mmtk, true, Some(nursery)));
            assert_eq!(memory_manager::gc_count(mmtk), 0);

            fixture.collect();
            assert_eq!(memory_manager::gc_count(mmtk), 1);
            assert!(!memory_manager::collection_required(mmtk, false, None));
        },
        no_cleanup,
    )
}

#[test]
pub fn page_accounting() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create_with_plan(PlanSelector::GenCopyMS);
            let mmtk = fixture.mmtk;
            let total = memory_manager::get_total_pages(mmtk);
            assert_eq!(total, TEST_HEAP_SIZE / BYTES_IN_PAGE);
            let used = memory_manager::get_pages_used(mmtk);
            assert!(!memory_manager::collection_required(mmtk, false, None));

            let large = alloc_object_with_size(fixture.mutator, 8 * BYTES_IN_PAGE, 0, AllocationSemantics::Los);
            assert!(!large.is_null());
            assert!(memory_manager::get_pages_used(mmtk) >= used + 8);
            assert!(
                memory_manager::get_pages_avail(mmtk) <= total - memory_manager::get_pages_used(mmtk)
            );

            // Dead large objects give their pages back in the next collection.
            fixture.collect();
            assert_eq!(memory_manager::get_pages_used(mmtk), used);
        },
        no_cleanup,
    )
}

#[test]
pub fn collection_counters() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create_with_plan(PlanSelector::SemiSpace);
            let mmtk = fixture.mmtk;
            assert_eq!(memory_manager::collection_stats(mmtk), crate::CollectionStats::default());

            const KEPT: usize = 10;
            for id in 0..2 * KEPT {
                let object = alloc_with_id(fixture.mutator, 0, id, AllocationSemantics::Default);
                if id % 2 == 0 {
                    add_root(object);
                }
            }
            fixture.collect();

            let stats = memory_manager::collection_stats(mmtk);
            assert_eq!(stats.collections, 1);
            assert_eq!(stats.full_heap_collections, 1);
            assert_eq!(stats.objects_copied, KEPT);
            // An object with a payload and no slots has the minimum size.
            assert_eq!(stats.bytes_copied, KEPT * MIN_OBJECT_SIZE);
            assert_eq!(memory_manager::gc_count(mmtk), 1);
            assert!(memory_manager::last_gc_was_full_heap(mmtk));
        },
        no_cleanup,
    )
}

#[test]
pub fn bind_and_destroy_mutators() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create();
            let mmtk = fixture.mmtk;

            let mut second = memory_manager::bind_mutator(mmtk, mutator_tls(1));
            register_mutator(&mut second);
            assert_eq!(second.get_tls(), mutator_tls(1));
            assert!(<MockVM as ActivePlan<MockVM>>::is_mutator(mutator_tls(1).0));
            let object = alloc_with_id(&mut second, 0, 1, AllocationSemantics::Default);
            let index = add_root(object);

            fixture.collect();
            assert_eq!(id_of(root(index)), 1);
            assert_eq!(<MockVM as ActivePlan<MockVM>>::number_of_mutators(), 2);

            memory_manager::flush_mutator(&mut second);
            unregister_mutator(&second);
            memory_manager::destroy_mutator(second);
            assert_eq!(<MockVM as ActivePlan<MockVM>>::number_of_mutators(), 1);

            alloc_object(fixture.mutator, 0, AllocationSemantics::Default);
            fixture.collect();
            assert_eq!(memory_manager::gc_count(mmtk), 2);
            assert_eq!(id_of(root(index)), 1);
        },
        no_cleanup,
    )
}

#[test]
pub fn alloc_with_site_and_alignment() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create();
            let align = MockVM::MAX_ALIGNMENT;
            for site in 0..16 {
                let address = memory_manager::alloc_with_site(
                    fixture.mutator,
                    24,
                    align,
                    0,
                    AllocationSemantics::Default,
                    site,
                );
                assert!(address.is_aligned_to(align));
            }
        },
        no_cleanup,
    )
}
