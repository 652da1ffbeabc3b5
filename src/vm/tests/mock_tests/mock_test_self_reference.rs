use super::mock_test_prelude::*;

fn self_reference_survives(plan: PlanSelector) {
    let fixture = MutatorFixture::create_with_plan(plan);
    let object = alloc_with_id(fixture.mutator, 2, 11, AllocationSemantics::Default);
    set_ref(fixture.mutator, object, 0, object);
    let index = add_root(object);

    fixture.collect();
    let moved = root(index);
    assert_ne!(moved, object);
    assert_eq!(get_ref(moved, 0), moved);
    assert!(get_ref(moved, 1).is_null());
    assert_eq!(id_of(moved), 11);

    fixture.collect();
    let again = root(index);
    assert_eq!(get_ref(again, 0), again);
    assert_eq!(id_of(again), 11);
}

#[test]
pub fn self_reference_gencopyms() {
    with_mockvm(
        default_setup,
        || self_reference_survives(PlanSelector::GenCopyMS),
        no_cleanup,
    )
}

#[test]
pub fn self_reference_semispace() {
    with_mockvm(
        default_setup,
        || self_reference_survives(PlanSelector::SemiSpace),
        no_cleanup,
    )
}
