use super::mock_test_prelude::*;

// A root that points outside the heap aborts the collection on every collector, and the
// panic reaches the thread that requested it.
#[test]
#[should_panic(expected = "is not in any space")]
pub fn root_outside_the_heap() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create_with_builder(
                |builder| {
                    builder.options.plan = PlanSelector::GenCopyMS;
                    builder.options.threads = 2;
                },
                true,
            );
            let object = alloc_object(fixture.mutator, 0, AllocationSemantics::Default);
            add_root(object);
            add_root(outside_object());
            fixture.collect();
        },
        no_cleanup,
    )
}
