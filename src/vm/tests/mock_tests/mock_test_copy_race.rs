use super::mock_test_prelude::*;

const HOLDERS: usize = 2000;

// Many collectors reach one object through different holders at once. Exactly one of them
// may copy it, and every holder must end up pointing at that copy.
#[test]
pub fn shared_object_is_copied_once() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create_with_builder(
                |builder| {
                    builder.options.plan = PlanSelector::GenCopyMS;
                    builder.options.threads = 4;
                },
                true,
            );
            let plan = gencopyms(fixture.mmtk);

            let shared = alloc_with_id(fixture.mutator, 0, usize::MAX, AllocationSemantics::Default);
            let holders: Vec<usize> = (0..HOLDERS)
                .map(|id| {
                    let holder = alloc_with_id(fixture.mutator, 1, id, AllocationSemantics::Default);
                    set_ref(fixture.mutator, holder, 0, shared);
                    add_root(holder)
                })
                .collect();

            fixture.collect();

            assert_eq!(plan.nursery.objects_copied(), HOLDERS + 1);
            let stats = memory_manager::collection_stats(fixture.mmtk);
            assert_eq!(stats.objects_copied, HOLDERS + 1);

            let copy = get_ref(root(holders[0]), 0);
            assert_ne!(copy, shared);
            assert!(plan.mature.in_space(copy));
            assert_eq!(id_of(copy), usize::MAX);
            for (id, &index) in holders.iter().enumerate() {
                let holder = root(index);
                assert!(plan.mature.in_space(holder));
                assert_eq!(id_of(holder), id);
                assert_eq!(get_ref(holder, 0), copy);
            }
        },
        no_cleanup,
    )
}
