use super::mock_test_prelude::*;

#[test]
pub fn user_request_ignored() {
    with_mockvm(
        default_setup,
        || {
            let fixture =
                MutatorFixture::create_with_builder(|builder| builder.options.ignore_system_gc = true, true);
            alloc_object(fixture.mutator, 0, AllocationSemantics::Default);
            fixture.collect();
            assert_eq!(memory_manager::gc_count(fixture.mmtk), 0);
            assert_eq!(read_mockvm(|mock| mock.stop_count), 0);
        },
        no_cleanup,
    )
}

#[test]
pub fn user_request_collects() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create();
            alloc_object(fixture.mutator, 0, AllocationSemantics::Default);
            fixture.collect();
            assert_eq!(memory_manager::gc_count(fixture.mmtk), 1);
            read_mockvm(|mock| {
                assert_eq!(mock.stop_count, 1);
                assert_eq!(mock.resume_count, 1);
            });
        },
        no_cleanup,
    )
}

#[test]
pub fn user_request_before_initialize_collection() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create_with_builder(|_| {}, false);
            alloc_object(fixture.mutator, 0, AllocationSemantics::Default);
            fixture.collect();
            assert_eq!(memory_manager::gc_count(fixture.mmtk), 0);
            assert_eq!(read_mockvm(|mock| mock.stop_count), 0);
        },
        no_cleanup,
    )
}
