use criterion::Criterion;

use mmtk_plans::memory_manager;
use mmtk_plans::util::options::PlanSelector;
use mmtk_plans::util::test_util::fixtures::*;
use mmtk_plans::util::test_util::mock_vm::*;
use mmtk_plans::AllocationSemantics;

const OBJECTS_PER_COLLECTION: usize = 1000;

pub fn bench(c: &mut Criterion) {
    // The nursery fills up during the run, so this includes the cost of nursery
    // collections with nothing to copy.
    let mut fixture = MutatorFixture::create_with_plan(PlanSelector::GenCopyMS);
    c.bench_function("alloc", |b| {
        b.iter(|| {
            let _addr = memory_manager::alloc(fixture.mutator, 16, 8, 0, AllocationSemantics::Default);
        })
    });

    // Allocate a batch, keep a tenth of it alive and collect.
    write_mockvm(|mock| *mock = default_setup());
    let mut fixture = MutatorFixture::create_with_plan(PlanSelector::SemiSpace);
    c.bench_function("alloc_and_collect", |b| {
        b.iter(|| {
            clear_roots();
            for id in 0..OBJECTS_PER_COLLECTION {
                let object = alloc_with_id(fixture.mutator, 1, id, AllocationSemantics::Default);
                if id % 10 == 0 {
                    add_root(object);
                }
            }
            fixture.collect();
        })
    });
}
