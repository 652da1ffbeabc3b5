use super::mock_test_prelude::*;
use crate::util::alloc::AllocationError;

const OBJECT_BYTES: usize = 1024;

fn small_semispace_heap() -> MutatorFixture {
    MutatorFixture::create_with_builder(
        |builder| {
            builder.options.plan = PlanSelector::SemiSpace;
            builder.options.heap_size = 4 << 20;
        },
        true,
    )
}

// Everything stays rooted, so collections cannot free anything and the heap runs out.
#[test]
pub fn live_heap_exhausted_returns_null() {
    with_mockvm(
        oom_returns_setup,
        || {
            let fixture = small_semispace_heap();
            let mut allocated = 0;
            loop {
                let object =
                    alloc_object_with_size(fixture.mutator, OBJECT_BYTES, 0, AllocationSemantics::Default);
                if object.is_null() {
                    break;
                }
                add_root(object);
                allocated += 1;
                assert!(allocated < 4096, "a 4MB heap cannot hold {} KB", allocated);
            }
            assert!(allocated > 0);
            assert!(memory_manager::gc_count(fixture.mmtk) > 0);
            read_mockvm(|mock| assert_eq!(mock.oom_calls, vec![AllocationError::HeapOutOfMemory]));
        },
        no_cleanup,
    )
}

#[test]
pub fn oversized_request_returns_null() {
    with_mockvm(
        oom_returns_setup,
        || {
            let fixture = MutatorFixture::create();
            let address = memory_manager::alloc(
                fixture.mutator,
                2 * TEST_HEAP_SIZE,
                MockVM::MIN_ALIGNMENT,
                0,
                AllocationSemantics::Default,
            );
            assert!(address.is_zero());
            assert_eq!(memory_manager::gc_count(fixture.mmtk), 0);
            read_mockvm(|mock| assert_eq!(mock.oom_calls, vec![AllocationError::HeapOutOfMemory]));

            // The heap is still usable.
            let object = alloc_object(fixture.mutator, 0, AllocationSemantics::Default);
            assert!(!object.is_null());
        },
        no_cleanup,
    )
}

#[test]
#[should_panic(expected = "Out of memory with HeapOutOfMemory")]
pub fn oversized_request_panics_by_default() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create();
            memory_manager::alloc(
                fixture.mutator,
                2 * TEST_HEAP_SIZE,
                MockVM::MIN_ALIGNMENT,
                0,
                AllocationSemantics::Los,
            );
        },
        no_cleanup,
    )
}
