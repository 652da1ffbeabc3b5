use super::mock_test_prelude::*;

const LENGTH: usize = 100;

#[test]
pub fn semispace_flips_and_keeps_a_list() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create_with_plan(PlanSelector::SemiSpace);
            let plan = semispace(fixture.mmtk);
            assert!(!plan.hi.load(std::sync::atomic::Ordering::SeqCst));

            // A singly linked list, head rooted.
            let mut head = ObjectReference::NULL;
            for id in (0..LENGTH).rev() {
                let node = alloc_with_id(fixture.mutator, 1, id, AllocationSemantics::Default);
                assert!(plan.copyspace0.in_space(node));
                set_ref(fixture.mutator, node, 0, head);
                head = node;
            }
            let index = add_root(head);
            // Garbage.
            for id in 0..LENGTH {
                alloc_with_id(fixture.mutator, 0, LENGTH + id, AllocationSemantics::Default);
            }

            fixture.collect();
            assert!(plan.hi.load(std::sync::atomic::Ordering::SeqCst));
            assert!(memory_manager::last_gc_was_full_heap(fixture.mmtk));
            assert_eq!(plan.fromspace().used_bytes(), 0);
            assert_eq!(plan.copyspace1.objects_copied(), 0);
            assert_eq!(plan.copyspace0.objects_copied(), LENGTH);
            assert!(plan.tospace().used_bytes() > 0);

            let mut node = root(index);
            for id in 0..LENGTH {
                assert!(plan.copyspace1.in_space(node));
                assert_eq!(id_of(node), id);
                node = get_ref(node, 0);
            }
            assert!(node.is_null());

            // Mutators allocate into the new to-space.
            let fresh = alloc_object(fixture.mutator, 0, AllocationSemantics::Default);
            assert!(plan.copyspace1.in_space(fresh));

            // And the next collection flips back.
            fixture.collect();
            assert!(!plan.hi.load(std::sync::atomic::Ordering::SeqCst));
            let mut node = root(index);
            for id in 0..LENGTH {
                assert!(plan.copyspace0.in_space(node));
                assert_eq!(id_of(node), id);
                node = get_ref(node, 0);
            }
            assert_eq!(plan.copyspace1.used_bytes(), 0);
        },
        no_cleanup,
    )
}
