use super::mock_test_prelude::*;

const OBJECTS: usize = 1000;

#[test]
pub fn allocate_small_objects() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create_with_builder(
                |builder| {
                    builder.options.plan = PlanSelector::GenCopyMS;
                    builder.options.bump_chunk_size = 64;
                },
                true,
            );
            let plan = gencopyms(fixture.mmtk);

            let mut rooted = vec![];
            for id in 0..OBJECTS {
                let object = alloc_with_id(fixture.mutator, 0, id, AllocationSemantics::Default);
                assert_eq!(object_bytes(0), 16);
                assert!(plan.nursery.in_space(object));
                if id % 10 == 0 {
                    rooted.push((add_root(object), id, object));
                }
            }
            assert!(plan.nursery.reserved_pages() > 0);

            fixture.collect();

            assert_eq!(memory_manager::gc_count(fixture.mmtk), 1);
            assert!(!memory_manager::last_gc_was_full_heap(fixture.mmtk));
            assert_eq!(plan.nursery.reserved_pages(), 0);
            assert_eq!(plan.nursery.objects_copied(), rooted.len());
            for (index, id, old) in rooted {
                let new = root(index);
                assert_ne!(new, old);
                assert!(plan.mature.in_space(new));
                assert_eq!(id_of(new), id);
                assert_eq!(MockVM::get_current_size(new), 16);
            }

            // The nursery is reused from its start.
            let fresh = alloc_with_id(fixture.mutator, 0, OBJECTS, AllocationSemantics::Default);
            assert_eq!(fresh.to_address(), plan.nursery.start());
        },
        no_cleanup,
    )
}
