use super::mock_test_prelude::*;
use crate::plan::phase::Phase;
use crate::plan::CollectorContext;
use crate::util::{VMThread, VMWorkerThread};

const TLS: VMWorkerThread = VMWorkerThread(VMThread::UNINITIALIZED);

/// A heap with one collector that is not driven by a collector group, prepared for a
/// nursery collection.
fn prepared_collector(fixture: &mut MutatorFixture) -> CollectorContext<MockVM> {
    let mmtk = fixture.mmtk;
    let mut collector = CollectorContext::new(0, TLS, mmtk.get_plan(), mmtk.allocator_context.clone());
    mmtk.get_plan().collection_phase(TLS, Phase::Prepare);
    fixture.mutator.collection_phase(TLS, Phase::Prepare);
    collector.collection_phase(Phase::Prepare);
    collector
}

fn hand_driven_fixture() -> MutatorFixture {
    MutatorFixture::create_with_builder(
        |builder| {
            builder.options.plan = PlanSelector::GenCopyMS;
            builder.options.threads = 1;
        },
        false,
    )
}

#[test]
#[should_panic(expected = "is not in any space")]
pub fn trace_object_outside_the_heap() {
    with_mockvm(
        default_setup,
        || {
            let mut fixture = hand_driven_fixture();
            let mut collector = prepared_collector(&mut fixture);
            collector.trace().trace_object(outside_object());
        },
        no_cleanup,
    )
}

#[test]
#[should_panic(expected = "in state Release")]
pub fn trace_object_after_release() {
    with_mockvm(
        default_setup,
        || {
            let mut fixture = hand_driven_fixture();
            let object = alloc_object(fixture.mutator, 0, AllocationSemantics::Default);
            let mut collector = prepared_collector(&mut fixture);
            collector.collection_phase(Phase::Closure);
            collector.collection_phase(Phase::Release);
            collector.trace().trace_object(object);
        },
        no_cleanup,
    )
}

#[test]
#[should_panic(expected = "release without a closure")]
pub fn release_without_closure() {
    with_mockvm(
        default_setup,
        || {
            let mut fixture = hand_driven_fixture();
            let mut collector = prepared_collector(&mut fixture);
            collector.collection_phase(Phase::Release);
        },
        no_cleanup,
    )
}

#[test]
#[should_panic(expected = "prepare in state Prepare")]
pub fn prepare_twice() {
    with_mockvm(
        default_setup,
        || {
            let mut fixture = hand_driven_fixture();
            let mut collector = prepared_collector(&mut fixture);
            collector.collection_phase(Phase::Prepare);
        },
        no_cleanup,
    )
}

#[test]
#[should_panic(expected = "closure in state Unused")]
pub fn closure_before_prepare() {
    with_mockvm(
        default_setup,
        || {
            let fixture = hand_driven_fixture();
            let mmtk = fixture.mmtk;
            let mut collector = CollectorContext::new(0, TLS, mmtk.get_plan(), mmtk.allocator_context.clone());
            collector.collection_phase(Phase::Closure);
        },
        no_cleanup,
    )
}
