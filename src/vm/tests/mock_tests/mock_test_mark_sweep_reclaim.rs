use super::mock_test_prelude::*;
use crate::policy::marksweepspace::BLOCK_SIZE;

const CELL: usize = 32;
// Enough 32-byte cells to need a second block.
const OBJECTS: usize = BLOCK_SIZE / CELL + BLOCK_SIZE / CELL / 2;

#[test]
pub fn full_heap_collection_sweeps_the_mature_space() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create_with_plan(PlanSelector::GenCopyMS);
            let plan = gencopyms(fixture.mmtk);

            let objects: Vec<ObjectReference> = (0..OBJECTS)
                .map(|_| alloc_object_with_size(fixture.mutator, CELL, 0, AllocationSemantics::Mature))
                .collect();
            assert!(objects.iter().all(|o| plan.mature.in_space(*o)));
            assert_eq!(objects[1].to_address() - objects[0].to_address(), CELL);
            assert_eq!(plan.mature.block_count(), 2);
            let index = add_root(objects[0]);

            // A nursery collection leaves the mature space alone.
            fixture.collect();
            assert!(!memory_manager::last_gc_was_full_heap(fixture.mmtk));
            assert_eq!(plan.mature.block_count(), 2);
            assert!(memory_manager::is_live_object(fixture.mmtk, objects[1]));

            plan.force_full_heap_collection();
            fixture.collect();
            assert!(memory_manager::last_gc_was_full_heap(fixture.mmtk));
            assert_eq!(root(index), objects[0]);
            assert!(plan.mature.is_marked(objects[0]));
            assert!(!plan.mature.is_marked(objects[1]));
            assert!(memory_manager::is_live_object(fixture.mmtk, objects[0]));
            // The second block held only garbage and went back to the page resource.
            assert_eq!(plan.mature.block_count(), 1);
            assert!(memory_manager::collection_stats(fixture.mmtk).objects_marked >= 1);

            // Freed cells are reused lowest address first.
            let reused = alloc_object_with_size(fixture.mutator, CELL, 0, AllocationSemantics::Mature);
            assert_eq!(reused, objects[1]);
            assert!(!plan.mature.is_marked(reused));

            // The survivor stays marked across another full-heap collection.
            plan.force_full_heap_collection();
            fixture.collect();
            assert!(plan.mature.is_marked(objects[0]));
            assert!(!plan.mature.is_marked(reused));
        },
        no_cleanup,
    )
}
