use super::mock_test_prelude::*;
use crate::util::header_byte;
use crate::util::heap::HeapLayoutError;
use crate::MMTKBuilder;

fn assert_disjoint(mmtk: &'static crate::MMTK<MockVM>) {
    let extents: Vec<_> = mmtk.get_plan().base().layout.spaces().collect();
    assert_eq!(extents.len(), mmtk.get_plan().get_spaces().len());
    for (i, (a_name, a)) in extents.iter().enumerate() {
        for (b_name, b) in extents.iter().skip(i + 1) {
            assert!(
                a.end() <= b.start || b.end() <= a.start,
                "{} and {} overlap",
                a_name,
                b_name
            );
        }
    }
}

/// Exactly one space holds `object`, and both the layout and the header agree on which.
fn assert_in_one_space(mmtk: &'static crate::MMTK<MockVM>, object: ObjectReference) {
    let plan = mmtk.get_plan();
    let owners: Vec<_> = plan
        .get_spaces()
        .into_iter()
        .filter(|space| space.in_space(object))
        .collect();
    assert_eq!(owners.len(), 1, "{} is in {} spaces", object, owners.len());
    let descriptor = owners[0].descriptor();
    assert_eq!(plan.base().layout.space_of(object.to_address()), Some(descriptor));
    assert_eq!(header_byte::read_space_tag::<MockVM>(object), Some(descriptor));
}

fn every_object_in_one_space(selector: PlanSelector) {
    let fixture = MutatorFixture::create_with_plan(selector);
    let mmtk = fixture.mmtk;
    assert_disjoint(mmtk);

    let mut indices = vec![];
    for semantics in [
        AllocationSemantics::Default,
        AllocationSemantics::Immortal,
        AllocationSemantics::Los,
        AllocationSemantics::Mature,
    ] {
        let object = alloc_object(fixture.mutator, 1, semantics);
        assert_in_one_space(mmtk, object);
        indices.push(add_root(object));
    }
    let large = alloc_object_with_size(fixture.mutator, 3 * 4096, 0, AllocationSemantics::Default);
    assert_in_one_space(mmtk, large);
    indices.push(add_root(large));

    // Survivors are tagged by the space they were copied into.
    fixture.collect();
    for index in indices {
        assert_in_one_space(mmtk, root(index));
    }
}

#[test]
pub fn space_partition_gencopyms() {
    with_mockvm(
        default_setup,
        || every_object_in_one_space(PlanSelector::GenCopyMS),
        no_cleanup,
    )
}

#[test]
pub fn space_partition_semispace() {
    with_mockvm(
        default_setup,
        || every_object_in_one_space(PlanSelector::SemiSpace),
        no_cleanup,
    )
}

#[test]
pub fn bounded_spaces_larger_than_the_heap() {
    with_mockvm(
        default_setup,
        || {
            let mut builder = MMTKBuilder::new_no_env_vars();
            builder.options.plan = PlanSelector::GenCopyMS;
            builder.options.heap_size = 4 << 20;
            builder.options.nursery_size = 4 << 20;
            builder.options.immortal_size = 1 << 20;
            match memory_manager::mmtk_init::<MockVM>(&builder) {
                Err(HeapLayoutError::HeapTooSmall {
                    requested, heap_size, ..
                }) => {
                    assert_eq!(heap_size, 4 << 20);
                    assert_eq!(requested, 5 << 20);
                }
                Err(e) => panic!("unexpected error: {}", e),
                Ok(_) => panic!("a 4MB heap cannot hold 5MB of bounded spaces"),
            }
        },
        no_cleanup,
    )
}

#[test]
pub fn set_option_by_name() {
    let mut builder = MMTKBuilder::new_no_env_vars();
    assert!(builder.set_option("plan", "SemiSpace"));
    assert_eq!(builder.options.plan, PlanSelector::SemiSpace);
    assert!(builder.set_option("threads", "3"));
    assert_eq!(builder.options.threads, 3);
    // Smaller than a chunk.
    assert!(!builder.set_option("heap_size", "4096"));
    assert!(!builder.set_option("no_such_option", "1"));
    assert!(!builder.set_option("plan", "NoGC"));
    assert_eq!(builder.options.plan, PlanSelector::SemiSpace);
}
